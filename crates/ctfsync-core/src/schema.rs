//! Arrow schema declaration of the challenge catalog.
//!
//! Every field carries `computed` and (when useful) `description` metadata,
//! which is what the host framework renders into its documentation.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Fields, Schema};
use serde_json::Value;
use thiserror::Error;

pub const META_COMPUTED: &str = "computed";
pub const META_DESCRIPTION: &str = "description";
pub const META_SENSITIVE: &str = "sensitive";

fn attr(name: &str, data_type: DataType, nullable: bool, description: Option<&str>) -> Field {
    let mut metadata = HashMap::from([(META_COMPUTED.to_string(), "true".to_string())]);
    if let Some(desc) = description {
        metadata.insert(META_DESCRIPTION.to_string(), desc.to_string());
    }
    Field::new(name, data_type, nullable).with_metadata(metadata)
}

fn string_list() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, false)))
}

fn struct_list(fields: Vec<Field>) -> DataType {
    DataType::List(Arc::new(Field::new(
        "item",
        DataType::Struct(Fields::from(fields)),
        false,
    )))
}

fn flag_fields() -> Vec<Field> {
    let content = attr("content", DataType::Utf8, false, Some("The actual flag to match."));
    let mut metadata = content.metadata().clone();
    metadata.insert(META_SENSITIVE.to_string(), "true".to_string());
    let content = content.with_metadata(metadata);
    vec![
        attr("id", DataType::Utf8, false, Some("Identifier of the flag.")),
        content,
        attr(
            "data",
            DataType::Utf8,
            false,
            Some("The flag sensitivity information, either case_sensitive or case_insensitive."),
        ),
        attr(
            "type",
            DataType::Utf8,
            false,
            Some("The type of the flag, could be either static or regex."),
        ),
    ]
}

fn hint_fields() -> Vec<Field> {
    vec![
        attr("id", DataType::Utf8, false, Some("Identifier of the hint.")),
        attr("content", DataType::Utf8, false, Some("Content of the hint as displayed to the end-user.")),
        attr("cost", DataType::Int64, false, Some("Cost of the hint.")),
        attr(
            "requirements",
            string_list(),
            false,
            Some("Other hints required to be consumed before getting this one."),
        ),
    ]
}

fn file_fields() -> Vec<Field> {
    vec![
        attr("id", DataType::Utf8, false, Some("Identifier of the file.")),
        attr("type", DataType::Utf8, false, None),
        attr("name", DataType::Utf8, false, Some("Name of the file as displayed to end-users.")),
        attr("location", DataType::Utf8, false, Some("Location where the file is stored on the CTFd instance.")),
        attr("sha1sum", DataType::Utf8, true, Some("The sha1 sum of the file.")),
    ]
}

/// Fields of one challenge.
pub fn challenge_fields() -> Vec<Field> {
    vec![
        attr("id", DataType::Utf8, false, Some("Identifier of the challenge.")),
        attr("name", DataType::Utf8, false, Some("Name of the challenge, displayed as it.")),
        attr(
            "category",
            DataType::Utf8,
            false,
            Some("Category of the challenge that CTFd groups by on the web UI."),
        ),
        attr("description", DataType::Utf8, false, Some("Description of the challenge.")),
        attr(
            "connection_info",
            DataType::Utf8,
            true,
            Some("Connection Information to connect to the challenge instance."),
        ),
        attr(
            "max_attempts",
            DataType::Int64,
            false,
            Some("Maximum amount of attempts before being unable to flag the challenge."),
        ),
        attr(
            "function",
            DataType::Utf8,
            false,
            Some("Decay function to define how the challenge value evolve through solves."),
        ),
        attr("value", DataType::Int64, true, None),
        attr("initial", DataType::Int64, true, None),
        attr("decay", DataType::Int64, true, None),
        attr("minimum", DataType::Int64, true, None),
        attr("state", DataType::Utf8, false, Some("State of the challenge, either hidden or visible.")),
        attr(
            "type",
            DataType::Utf8,
            false,
            Some("Type of the challenge defining its layout, either standard or dynamic."),
        ),
        attr(
            "requirements",
            DataType::Struct(Fields::from(vec![
                attr("behavior", DataType::Utf8, false, Some("Behavior if not unlocked, either hidden or anonymized.")),
                attr("prerequisites", string_list(), false, Some("List of the challenges ID.")),
            ])),
            false,
            Some("List of required challenges that needs to get flagged before this one being accessible."),
        ),
        attr("flags", struct_list(flag_fields()), false, Some("List of challenge flags that solves it.")),
        attr(
            "tags",
            string_list(),
            false,
            Some("List of challenge tags that will be displayed to the end-user."),
        ),
        attr(
            "topics",
            string_list(),
            false,
            Some("List of challenge topics that are displayed to the administrators."),
        ),
        attr("hints", struct_list(hint_fields()), false, Some("List of hints about the challenge displayed to the end-user.")),
        attr("files", struct_list(file_fields()), false, Some("List of files given to players to flag the challenge.")),
    ]
}

/// Schema of the `challenges` data source: a synthetic id plus every challenge.
pub fn challenges_schema() -> Schema {
    Schema::new(vec![
        attr("id", DataType::Utf8, false, None),
        attr("challenges", struct_list(challenge_fields()), false, None),
    ])
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaMismatch {
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("undeclared field `{0}`")]
    UndeclaredField(String),
    #[error("field `{path}` should be {expected}")]
    WrongType { path: String, expected: String },
}

/// Check that a JSON rendering has exactly the declared field set and nesting.
pub fn conforms(schema: &Schema, value: &Value) -> Result<(), SchemaMismatch> {
    check_struct(schema.fields(), value, "")
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn check_struct(fields: &Fields, value: &Value, path: &str) -> Result<(), SchemaMismatch> {
    let Some(obj) = value.as_object() else {
        return Err(SchemaMismatch::WrongType {
            path: if path.is_empty() { "<root>".into() } else { path.into() },
            expected: "an object".into(),
        });
    };

    for key in obj.keys() {
        if fields.find(key).is_none() {
            return Err(SchemaMismatch::UndeclaredField(join(path, key)));
        }
    }
    for field in fields.iter() {
        let child = join(path, field.name());
        match obj.get(field.name()) {
            Some(v) => check_value(field.data_type(), field.is_nullable(), v, &child)?,
            None => return Err(SchemaMismatch::MissingField(child)),
        }
    }
    Ok(())
}

fn check_value(
    data_type: &DataType,
    nullable: bool,
    value: &Value,
    path: &str,
) -> Result<(), SchemaMismatch> {
    let wrong = |expected: &str| SchemaMismatch::WrongType {
        path: path.to_string(),
        expected: expected.to_string(),
    };

    if value.is_null() {
        return if nullable { Ok(()) } else { Err(wrong("non-null")) };
    }

    match data_type {
        DataType::Utf8 if value.is_string() => Ok(()),
        DataType::Utf8 => Err(wrong("a string")),
        DataType::Int64 if value.is_i64() => Ok(()),
        DataType::Int64 => Err(wrong("an integer")),
        DataType::Boolean if value.is_boolean() => Ok(()),
        DataType::Boolean => Err(wrong("a boolean")),
        DataType::List(item) => {
            let Some(items) = value.as_array() else {
                return Err(wrong("a list"));
            };
            for (i, v) in items.iter().enumerate() {
                check_value(item.data_type(), item.is_nullable(), v, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        DataType::Struct(fields) => check_struct(fields, value, path),
        other => Err(wrong(&format!("{other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_challenge() -> Value {
        json!({
            "id": "1",
            "name": "warmup",
            "category": "misc",
            "description": "say hi",
            "connection_info": null,
            "max_attempts": 0,
            "function": "static",
            "value": 100,
            "initial": null,
            "decay": null,
            "minimum": null,
            "state": "visible",
            "type": "standard",
            "requirements": { "behavior": "hidden", "prerequisites": [] },
            "flags": [{ "id": "1", "content": "CTF{hi}", "data": "", "type": "static" }],
            "tags": ["intro"],
            "topics": [],
            "hints": [{ "id": "4", "content": "look", "cost": 0, "requirements": [] }],
            "files": [{ "id": "2", "type": "challenge", "name": "a.txt", "location": "x/a.txt", "sha1sum": null }]
        })
    }

    #[test]
    fn challenges_schema_has_expected_fields() {
        let schema = challenges_schema();
        assert_eq!(schema.fields().len(), 2);
        assert!(schema.field_with_name("challenges").is_ok());
        assert_eq!(challenge_fields().len(), 19);
    }

    #[test]
    fn every_field_is_computed() {
        for field in challenge_fields() {
            assert_eq!(
                field.metadata().get(META_COMPUTED).map(String::as_str),
                Some("true"),
                "{} should be computed",
                field.name()
            );
        }
    }

    #[test]
    fn flag_content_is_sensitive() {
        let content = flag_fields()
            .into_iter()
            .find(|f| f.name() == "content")
            .unwrap();
        assert_eq!(
            content.metadata().get(META_SENSITIVE).map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn sample_snapshot_conforms() {
        let value = json!({ "id": "placeholder", "challenges": [sample_challenge()] });
        assert_eq!(conforms(&challenges_schema(), &value), Ok(()));
    }

    #[test]
    fn missing_field_rejected() {
        let mut chall = sample_challenge();
        chall.as_object_mut().unwrap().remove("topics");
        let value = json!({ "id": "placeholder", "challenges": [chall] });
        assert_eq!(
            conforms(&challenges_schema(), &value),
            Err(SchemaMismatch::MissingField("challenges[0].topics".into()))
        );
    }

    #[test]
    fn undeclared_field_rejected() {
        let mut chall = sample_challenge();
        chall["next"] = json!(3);
        let value = json!({ "id": "placeholder", "challenges": [chall] });
        assert_eq!(
            conforms(&challenges_schema(), &value),
            Err(SchemaMismatch::UndeclaredField("challenges[0].next".into()))
        );
    }

    #[test]
    fn wrong_nested_type_rejected() {
        let mut chall = sample_challenge();
        chall["hints"][0]["cost"] = json!("free");
        let value = json!({ "id": "placeholder", "challenges": [chall] });
        assert!(matches!(
            conforms(&challenges_schema(), &value),
            Err(SchemaMismatch::WrongType { path, .. }) if path == "challenges[0].hints[0].cost"
        ));
    }
}

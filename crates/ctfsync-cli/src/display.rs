//! Vertical card display for challenges and the schema declaration.
//!
//! Flag contents never reach the terminal; only their type and matching mode do.

use std::fmt::Write;

use arrow::datatypes::{DataType, Field, Schema};
use ctfsync_core::schema::{META_COMPUTED, META_DESCRIPTION, META_SENSITIVE};
use ctfsync_core::{Challenge, Diagnostic, Severity};

const MAX_LIST_ITEMS: usize = 10;

// ── Public API ──

pub fn print_challenge_card(challenge: &Challenge) {
    print!("{}", render_challenge_card(challenge));
}

pub fn print_schema(schema: &Schema) {
    print!("{}", render_schema(schema));
}

/// Log a diagnostic at the level matching its severity.
pub fn log_diagnostic(diag: &Diagnostic) {
    match diag.severity {
        Severity::Warning => tracing::warn!(
            challenge = ?diag.challenge.map(|id| id.0),
            attribute = ?diag.attribute,
            "{}: {}", diag.summary, diag.detail
        ),
        Severity::Error | Severity::Fatal => tracing::error!(
            challenge = ?diag.challenge.map(|id| id.0),
            attribute = ?diag.attribute,
            fatal = diag.severity == Severity::Fatal,
            "{}: {}", diag.summary, diag.detail
        ),
    }
}

pub fn render_challenge_card(c: &Challenge) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== [{}] {} ===", c.id, c.name);
    if !c.category.is_empty() {
        let _ = writeln!(out, "{}", c.category);
    }
    out.push('\n');

    section(&mut out, "Identity", &[
        ("state", Some(c.state.clone())),
        ("type", Some(c.kind.clone())),
        ("connection_info", c.connection_info.clone()),
        ("max_attempts", Some(c.max_attempts.to_string())),
    ]);
    section(&mut out, "Scoring", &[
        ("function", Some(c.function.clone())),
        ("value", c.value.map(|v| v.to_string())),
        ("initial", c.initial.map(|v| v.to_string())),
        ("decay", c.decay.map(|v| v.to_string())),
        ("minimum", c.minimum.map(|v| v.to_string())),
    ]);

    let prereqs: Vec<String> = c
        .requirements
        .prerequisites
        .iter()
        .map(|id| id.to_string())
        .collect();
    section(&mut out, "Requirements", &[
        (
            "behavior",
            (!prereqs.is_empty()).then(|| c.requirements.behavior.as_str().to_string()),
        ),
        ("prerequisites", (!prereqs.is_empty()).then(|| prereqs.join(", "))),
    ]);

    section(&mut out, "Labels", &[
        ("tags", (!c.tags.is_empty()).then(|| c.tags.join(", "))),
        ("topics", (!c.topics.is_empty()).then(|| c.topics.join(", "))),
    ]);

    list(&mut out, "flags", c.flags.iter().map(|f| {
        if f.data.is_empty() {
            format!("#{} {}", f.id, f.kind)
        } else {
            format!("#{} {} ({})", f.id, f.kind, f.data)
        }
    }));
    list(&mut out, "hints", c.hints.iter().map(|h| {
        let mut line = format!("#{} cost {}: {}", h.id, h.cost, shorten(&h.content, 50));
        if !h.requirements.is_empty() {
            let _ = write!(line, " (after {})", h.requirements.join(", "));
        }
        line
    }));
    list(&mut out, "files", c.files.iter().map(|f| match &f.sha1sum {
        Some(sum) => format!("{} [{}]", f.name, shorten(sum, 12)),
        None => f.name.clone(),
    }));

    if !c.description.is_empty() {
        out.push_str("Description\n");
        for line in c.description.lines() {
            let _ = writeln!(out, "  {line}");
        }
        out.push('\n');
    }
    out
}

pub fn render_schema(schema: &Schema) -> String {
    let mut out = String::new();
    for field in schema.fields() {
        render_field(&mut out, field, 0);
    }
    out
}

// ── Rendering ──

fn section(out: &mut String, header: &str, rows: &[(&str, Option<String>)]) {
    let rows: Vec<_> = rows
        .iter()
        .filter_map(|(name, value)| value.as_ref().filter(|v| !v.is_empty()).map(|v| (name, v)))
        .collect();
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "{header}");
    for (name, value) in rows {
        let _ = writeln!(out, "  {:<20} {}", name, value);
    }
    out.push('\n');
}

fn list(out: &mut String, name: &str, items: impl ExactSizeIterator<Item = String>) {
    let len = items.len();
    if len == 0 {
        return;
    }
    let _ = writeln!(out, "  {} ({}):", name, len);
    for item in items.take(MAX_LIST_ITEMS) {
        let _ = writeln!(out, "    {item}");
    }
    if len > MAX_LIST_ITEMS {
        let _ = writeln!(out, "    ... and {} more", len - MAX_LIST_ITEMS);
    }
    out.push('\n');
}

fn render_field(out: &mut String, field: &Field, depth: usize) {
    let indent = "  ".repeat(depth);
    let meta = field.metadata();
    let mut flags = Vec::new();
    if meta.get(META_COMPUTED).is_some_and(|v| v == "true") {
        flags.push("computed");
    }
    if meta.get(META_SENSITIVE).is_some_and(|v| v == "true") {
        flags.push("sensitive");
    }
    if field.is_nullable() {
        flags.push("nullable");
    }

    let _ = write!(out, "{indent}{:<20} {:<14}", field.name(), type_label(field.data_type()));
    if !flags.is_empty() {
        let _ = write!(out, " [{}]", flags.join(", "));
    }
    out.push('\n');
    if let Some(desc) = meta.get(META_DESCRIPTION) {
        let _ = writeln!(out, "{indent}  {desc}");
    }

    let nested = match field.data_type() {
        DataType::Struct(fields) => Some(fields),
        DataType::List(item) => match item.data_type() {
            DataType::Struct(fields) => Some(fields),
            _ => None,
        },
        _ => None,
    };
    if let Some(fields) = nested {
        for child in fields.iter() {
            render_field(out, child, depth + 1);
        }
    }
}

fn type_label(data_type: &DataType) -> String {
    match data_type {
        DataType::Utf8 => "string".into(),
        DataType::Int64 => "int64".into(),
        DataType::Boolean => "bool".into(),
        DataType::Struct(_) => "object".into(),
        DataType::List(item) => match item.data_type() {
            DataType::Struct(_) => "list<object>".into(),
            other => format!("list<{}>", type_label(other)),
        },
        other => format!("{other}"),
    }
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

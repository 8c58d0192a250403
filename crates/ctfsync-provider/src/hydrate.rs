//! Hydration: fetch one challenge and every nested sub-collection.
//!
//! Hydration never fails. Problems land in the returned diagnostics and the
//! challenge keeps whatever was fetched successfully.

use ctfsync_client::wire::{
    ChallengeDetail, FileRecord, FlagRecord, HintRecord, RequirementsRecord, TagRecord,
    TopicRecord,
};
use ctfsync_client::{CatalogApi, ClientError};
use ctfsync_core::{
    Behavior, Challenge, ChallengeId, Diagnostic, Diagnostics, File, Flag, Hint, Requirements,
    Severity,
};
use tracing::{debug, warn};

/// Outcome of hydrating one challenge.
#[derive(Debug, Clone)]
pub struct Hydration {
    pub challenge: Challenge,
    pub diagnostics: Diagnostics,
    /// The challenge itself was not found remotely.
    pub missing: bool,
}

/// Fetch challenge `id` and all of its sub-collections.
///
/// The detail fetch runs first; if it fails the seeded challenge is returned
/// as is. The six sub-collections are then fetched concurrently and each
/// failure only empties its own attribute.
pub async fn hydrate(client: &dyn CatalogApi, id: ChallengeId) -> Hydration {
    let mut challenge = Challenge::seeded(id);
    let mut diagnostics = Diagnostics::new();

    let detail = match client.get_challenge(id).await {
        Ok(detail) => detail,
        Err(err) => {
            warn!(challenge = %id, error = %err, "unable to read challenge");
            let missing = err.is_not_found();
            diagnostics.push(
                Diagnostic::new(
                    Severity::Error,
                    "Client Error",
                    format!("Unable to read challenge {id}, got error: {err}"),
                )
                .for_challenge(id),
            );
            return Hydration {
                challenge,
                diagnostics,
                missing,
            };
        }
    };
    apply_detail(&mut challenge, detail, &mut diagnostics);

    let (requirements, flags, hints, files, tags, topics) = futures::join!(
        client.get_requirements(id),
        client.get_flags(id),
        client.get_hints(id),
        client.get_files(id),
        client.get_tags(id),
        client.get_topics(id),
    );

    if let Some(reqs) = fetched(&mut diagnostics, id, "requirements", requirements) {
        challenge.requirements = to_requirements(reqs);
    }
    if let Some(flags) = fetched(&mut diagnostics, id, "flags", flags) {
        challenge.flags = owned_by(&mut diagnostics, id, "flags", flags, |f: &FlagRecord| f.challenge_id)
            .into_iter()
            .map(to_flag)
            .collect();
    }
    if let Some(hints) = fetched(&mut diagnostics, id, "hints", hints) {
        challenge.hints = owned_by(&mut diagnostics, id, "hints", hints, |h: &HintRecord| h.challenge_id)
            .into_iter()
            .map(to_hint)
            .collect();
    }
    if let Some(files) = fetched(&mut diagnostics, id, "files", files) {
        challenge.files = files.into_iter().map(to_file).collect();
    }
    if let Some(tags) = fetched(&mut diagnostics, id, "tags", tags) {
        challenge.tags = owned_by(&mut diagnostics, id, "tags", tags, |t: &TagRecord| t.challenge_id)
            .into_iter()
            .map(|t| t.value)
            .collect();
    }
    if let Some(topics) = fetched(&mut diagnostics, id, "topics", topics) {
        challenge.topics = owned_by(&mut diagnostics, id, "topics", topics, |t: &TopicRecord| {
            t.challenge_id
        })
        .into_iter()
        .map(|t| t.value)
        .collect();
    }

    debug!(
        challenge = %id,
        flags = challenge.flags.len(),
        hints = challenge.hints.len(),
        files = challenge.files.len(),
        diagnostics = diagnostics.len(),
        "hydrated challenge"
    );
    Hydration {
        challenge,
        diagnostics,
        missing: false,
    }
}

fn apply_detail(challenge: &mut Challenge, detail: ChallengeDetail, diagnostics: &mut Diagnostics) {
    if detail.id != challenge.id.0 {
        diagnostics.push(
            Diagnostic::new(
                Severity::Warning,
                "Inconsistent CTFd Data",
                format!(
                    "asked for challenge {}, server answered with challenge {}",
                    challenge.id, detail.id
                ),
            )
            .for_challenge(challenge.id),
        );
    }

    challenge.name = detail.name;
    challenge.category = detail.category;
    challenge.description = detail.description.unwrap_or_default();
    challenge.connection_info = detail.connection_info;
    challenge.max_attempts = detail.max_attempts.unwrap_or(0);
    challenge.function = detail.function.unwrap_or_else(|| "static".to_string());
    challenge.value = detail.value;
    challenge.initial = detail.initial;
    challenge.decay = detail.decay;
    challenge.minimum = detail.minimum;
    challenge.state = detail.state;
    challenge.kind = detail.kind;
}

/// Turn a sub-collection fetch result into a value or a diagnostic.
fn fetched<T>(
    diagnostics: &mut Diagnostics,
    id: ChallengeId,
    attribute: &str,
    result: Result<T, ClientError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(challenge = %id, attribute, error = %err, "unable to read challenge sub-collection");
            diagnostics.push(
                Diagnostic::new(
                    Severity::Error,
                    "Client Error",
                    format!("Unable to read challenge {id} {attribute}, got error: {err}"),
                )
                .for_challenge(id)
                .at(attribute),
            );
            None
        }
    }
}

/// Drop records that name another challenge as their owner.
fn owned_by<T>(
    diagnostics: &mut Diagnostics,
    id: ChallengeId,
    attribute: &str,
    records: Vec<T>,
    owner: impl Fn(&T) -> Option<u64>,
) -> Vec<T> {
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        match owner(&record) {
            Some(other) if other != id.0 => diagnostics.push(
                Diagnostic::new(
                    Severity::Warning,
                    "Inconsistent CTFd Data",
                    format!("a {attribute} record of challenge {other} was returned for challenge {id}, ignoring it"),
                )
                .for_challenge(id)
                .at(attribute),
            ),
            _ => kept.push(record),
        }
    }
    kept
}

fn to_requirements(record: RequirementsRecord) -> Requirements {
    Requirements {
        behavior: Behavior::from_anonymize(record.anonymize.unwrap_or(false)),
        prerequisites: record.prerequisites.into_iter().map(ChallengeId).collect(),
    }
}

fn to_flag(record: FlagRecord) -> Flag {
    Flag {
        id: record.id.to_string(),
        content: record.content,
        data: record.data.unwrap_or_default(),
        kind: record.kind,
    }
}

fn to_hint(record: HintRecord) -> Hint {
    Hint {
        id: record.id.to_string(),
        content: record.content,
        cost: record.cost,
        requirements: record
            .requirements
            .map(|r| r.prerequisites.iter().map(u64::to_string).collect())
            .unwrap_or_default(),
    }
}

fn to_file(record: FileRecord) -> File {
    File {
        id: record.id.to_string(),
        name: File::name_from_location(&record.location),
        kind: record.kind,
        location: record.location,
        sha1sum: record.sha1sum,
    }
}

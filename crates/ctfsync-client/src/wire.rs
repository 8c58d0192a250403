//! CTFd `/api/v1` response shapes.
//!
//! Only the fields the catalog read uses are declared; everything else the
//! server sends is ignored.

use serde::Deserialize;
use serde_json::Value;

/// Envelope wrapping every CTFd API response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Human-readable reason carried by a `success: false` response.
    pub fn failure_reason(&self) -> String {
        if let Some(msg) = &self.message {
            return msg.clone();
        }
        match &self.errors {
            Some(errors) => errors.to_string(),
            None => "request was not successful".to_string(),
        }
    }
}

/// Entry of `GET /challenges?view=admin`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChallengeStub {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// `GET /challenges/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeDetail {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub connection_info: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<i64>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub initial: Option<i64>,
    #[serde(default)]
    pub decay: Option<i64>,
    #[serde(default)]
    pub minimum: Option<i64>,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// `GET /challenges/{id}/requirements`. CTFd answers `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequirementsRecord {
    #[serde(default)]
    pub prerequisites: Vec<u64>,
    #[serde(default)]
    pub anonymize: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagRecord {
    pub id: u64,
    #[serde(default)]
    pub challenge_id: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HintRequirements {
    #[serde(default)]
    pub prerequisites: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HintRecord {
    pub id: u64,
    #[serde(default)]
    pub challenge_id: Option<u64>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub requirements: Option<HintRequirements>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRecord {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub sha1sum: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagRecord {
    pub id: u64,
    /// Older CTFd releases name the owner `challenge`.
    #[serde(alias = "challenge", default)]
    pub challenge_id: Option<u64>,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicRecord {
    pub id: u64,
    #[serde(default)]
    pub challenge_id: Option<u64>,
    pub value: String,
}

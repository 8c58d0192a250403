//! Challenge catalog types shared between the CTFd client and the provider.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Platform-assigned challenge identifier.
///
/// CTFd hands out integers; the declarative surface renders them as decimal
/// strings, so serialization always writes a string and deserialization
/// accepts either form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChallengeId(pub u64);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChallengeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ChallengeId)
    }
}

impl Serialize for ChallengeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChallengeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(ChallengeId(n)),
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Behavior of a locked challenge while its prerequisites are unsolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    #[default]
    Hidden,
    Anonymized,
}

impl Behavior {
    /// CTFd stores the behavior as an `anonymize` boolean.
    pub fn from_anonymize(anonymize: bool) -> Self {
        if anonymize {
            Behavior::Anonymized
        } else {
            Behavior::Hidden
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Hidden => "hidden",
            Behavior::Anonymized => "anonymized",
        }
    }
}

/// Unlock requirements of a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Requirements {
    pub behavior: Behavior,
    pub prerequisites: Vec<ChallengeId>,
}

/// A match rule that solves a challenge.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub id: String,
    /// Sensitive: the secret itself.
    pub content: String,
    /// `case_insensitive` or empty.
    pub data: String,
    /// `static` or `regex`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("id", &self.id)
            .field("content", &"<redacted>")
            .field("data", &self.data)
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub id: String,
    pub content: String,
    pub cost: i64,
    /// Ids of hints that must be unlocked first.
    pub requirements: Vec<String>,
}

/// A downloadable attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub location: String,
    pub sha1sum: Option<String>,
}

impl File {
    /// File name as CTFd stores it: the last segment of `location`.
    pub fn name_from_location(location: &str) -> String {
        location
            .rsplit('/')
            .next()
            .unwrap_or(location)
            .to_string()
    }
}

/// A fully hydrated challenge.
///
/// Lists keep the order the platform returned them in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub connection_info: Option<String>,
    pub max_attempts: i64,
    /// Decay function: `static`, `linear` or `logarithmic`.
    pub function: String,
    pub value: Option<i64>,
    pub initial: Option<i64>,
    pub decay: Option<i64>,
    pub minimum: Option<i64>,
    /// `visible` or `hidden`.
    pub state: String,
    /// `standard` or `dynamic`.
    #[serde(rename = "type")]
    pub kind: String,
    pub requirements: Requirements,
    pub flags: Vec<Flag>,
    pub tags: Vec<String>,
    pub topics: Vec<String>,
    pub hints: Vec<Hint>,
    pub files: Vec<File>,
}

impl Challenge {
    /// A challenge that only knows its identifier, ready for hydration.
    pub fn seeded(id: ChallengeId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Synthetic identifier of every snapshot.
pub const SNAPSHOT_ID: &str = "placeholder";

/// The whole catalog as observed by one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub challenges: Vec<Challenge>,
}

impl Snapshot {
    pub fn new(challenges: Vec<Challenge>) -> Self {
        Self {
            id: SNAPSHOT_ID.to_string(),
            challenges,
        }
    }
}

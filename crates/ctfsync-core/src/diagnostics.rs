//! Structured problem reports raised while reading the catalog.
//!
//! A diagnostic is not a failure: reads keep going and hand the list back
//! alongside whatever they managed to build. Only `Severity::Fatal` means the
//! result must not be trusted at all.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Challenge the problem belongs to, `None` for batch-level problems.
    pub challenge: Option<ChallengeId>,
    /// Attribute path inside the challenge (`flags`, `hints`, ...).
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
            challenge: None,
            attribute: None,
        }
    }

    pub fn for_challenge(mut self, id: ChallengeId) -> Self {
        self.challenge = Some(id);
        self
    }

    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        match (&self.challenge, &self.attribute) {
            (Some(id), Some(attr)) => write!(f, " [challenge {id}, {attr}]")?,
            (Some(id), None) => write!(f, " [challenge {id}]")?,
            (None, Some(attr)) => write!(f, " [{attr}]")?,
            (None, None) => {}
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Append-only list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn add_fatal(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Fatal, summary, detail));
    }

    /// Append every diagnostic of `other`, keeping its order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// True when anything at `Error` or above was recorded.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity >= Severity::Error)
    }

    pub fn has_fatal(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Fatal)
    }

    pub fn for_challenge(&self, id: ChallengeId) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.challenge == Some(id))
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! Shared types used across modules
//!
//! Identity types for users and courses. They live here so the store,
//! the monitor and the notifier can share them without circular imports.

use serde::{Deserialize, Serialize};

/// Opaque user identifier (a UUID string in the YAML store)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Course reference number of a single section
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Crn(String);

impl<'de> Deserialize<'de> for Crn {
    // Hand-edited store files often carry CRNs as bare integers
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Crn::from(s.as_str()),
            Raw::Number(n) => Crn(n.to_string()),
        })
    }
}

impl Crn {
    pub fn new(crn: impl Into<String>) -> Self {
        Self(crn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Crn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Crn {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

/// Registrar term code, e.g. `202508` for fall 2025
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermCode(String);

impl TermCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TermCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one tracked course for one user. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseRef {
    user: UserId,
    crn: Crn,
    term: TermCode,
}

impl CourseRef {
    pub fn new(user: UserId, crn: Crn, term: TermCode) -> Self {
        Self { user, crn, term }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn crn(&self) -> &Crn {
        &self.crn
    }

    pub fn term(&self) -> &TermCode {
        &self.term
    }

    /// Key used for the course name cache, `<term>:<crn>`
    pub fn name_key(&self) -> String {
        format!("{}:{}", self.term, self.crn)
    }
}

impl std::fmt::Display for CourseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.user, self.crn, self.term)
    }
}

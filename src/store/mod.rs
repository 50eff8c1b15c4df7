//! User store
//!
//! Users, their tracked CRNs and the active term. The monitor only reads
//! through the `UserStore` trait; the API layer also writes through it.
//!
//! Backends:
//! - `YamlUserStore`: the on-disk `users.yaml` document
//! - `MemoryUserStore`: in-process, for embedding and tests

pub mod memory;
pub mod yaml;

pub use memory::MemoryUserStore;
pub use yaml::YamlUserStore;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::course::term_code;
use crate::error::{Result, WatchError};
use crate::types::{CourseRef, Crn, TermCode, UserId};

/// Prefix of every generated ntfy topic
pub const NTFY_TOPIC_PREFIX: &str = "gt_registration_";

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub ntfy_topic: Option<String>,
    pub logfile: Option<String>,
    pub courses: Vec<Crn>,
}

impl UserRecord {
    /// Build a fresh record with a generated id, topic and log file name
    pub fn generate(name: &str) -> Self {
        Self {
            id: UserId::new(uuid::Uuid::new_v4().to_string()),
            name: name.to_string(),
            ntfy_topic: Some(ntfy_topic_for(name)),
            logfile: Some(logfile_for(name)),
            courses: Vec::new(),
        }
    }
}

/// Journal file name for a display name; never contains a path separator
pub fn logfile_for(name: &str) -> String {
    let stem: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}_log.txt", stem.trim_start_matches('.'))
}

/// Derive a user's ntfy topic from their display name
pub fn ntfy_topic_for(name: &str) -> String {
    let encoded = BASE64.encode(name.as_bytes());
    format!("{}{}", NTFY_TOPIC_PREFIX, encoded.trim_end_matches('='))
}

/// Source of users and tracked courses.
///
/// Implementations must be safe to call from several monitor tasks at once.
pub trait UserStore: Send + Sync {
    /// All users, in registration order
    fn users(&self) -> Result<Vec<UserRecord>>;

    /// Active term name ("spring", "summer" or "fall")
    fn term(&self) -> Result<String>;

    /// Cached display name of a course, if one was recorded
    fn course_name(&self, course: &CourseRef) -> Result<Option<String>>;

    /// Record a course's display name for later lookups
    fn remember_course_name(&self, course: &CourseRef, name: &str) -> Result<()>;

    /// Register a new user
    fn add_user(&self, name: &str) -> Result<UserRecord>;

    /// Append a CRN to a user's tracked list
    fn add_course(&self, user: &UserId, crn: &Crn) -> Result<()>;

    fn user(&self, id: &UserId) -> Result<Option<UserRecord>> {
        Ok(self.users()?.into_iter().find(|u| &u.id == id))
    }

    fn find_user_by_name(&self, name: &str) -> Result<Option<UserId>> {
        Ok(self.users()?.into_iter().find(|u| u.name == name).map(|u| u.id))
    }

    fn term_code(&self) -> Result<TermCode> {
        term_code(&self.term()?)
    }

    /// Tracked courses of a user, in the order they were added
    fn tracked_courses(&self, id: &UserId) -> Result<Vec<CourseRef>> {
        let user = self.user(id)?.ok_or_else(|| WatchError::UnknownUser(id.clone()))?;
        let term = self.term_code()?;
        Ok(user
            .courses
            .into_iter()
            .map(|crn| CourseRef::new(id.clone(), crn, term.clone()))
            .collect())
    }
}

/// Per-user fields as laid out in the YAML document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserEntry {
    name: String,
    #[serde(default)]
    ntfy_topic: Option<String>,
    #[serde(default)]
    logfile: Option<String>,
    #[serde(default)]
    courses: Vec<Crn>,
}

fn default_term() -> String {
    "fall".to_string()
}

/// Whole store document, shared by both backends.
///
/// Users are kept as a list of single-key maps (`- <uuid>: {...}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoreDocument {
    #[serde(rename = "Term", default = "default_term")]
    term: String,
    #[serde(rename = "Users", default)]
    users: Vec<BTreeMap<UserId, UserEntry>>,
    #[serde(rename = "CourseNames", default, skip_serializing_if = "BTreeMap::is_empty")]
    course_names: BTreeMap<String, String>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            term: default_term(),
            users: Vec::new(),
            course_names: BTreeMap::new(),
        }
    }
}

impl StoreDocument {
    pub(crate) fn with_term(term: &str) -> Self {
        Self { term: term.to_string(), ..Default::default() }
    }

    pub(crate) fn term(&self) -> &str {
        &self.term
    }

    pub(crate) fn users(&self) -> Vec<UserRecord> {
        self.users
            .iter()
            .flat_map(|entry| entry.iter())
            .map(|(id, u)| UserRecord {
                id: id.clone(),
                name: u.name.clone(),
                ntfy_topic: u.ntfy_topic.clone(),
                logfile: u.logfile.clone(),
                courses: u.courses.clone(),
            })
            .collect()
    }

    pub(crate) fn course_name(&self, course: &CourseRef) -> Option<String> {
        self.course_names.get(&course.name_key()).cloned()
    }

    pub(crate) fn remember_course_name(&mut self, course: &CourseRef, name: &str) -> bool {
        let key = course.name_key();
        if self.course_names.get(&key).map(String::as_str) == Some(name) {
            return false;
        }
        self.course_names.insert(key, name.to_string());
        true
    }

    pub(crate) fn insert_user(&mut self, record: &UserRecord) {
        let entry = UserEntry {
            name: record.name.clone(),
            ntfy_topic: record.ntfy_topic.clone(),
            logfile: record.logfile.clone(),
            courses: record.courses.clone(),
        };
        let mut map = BTreeMap::new();
        map.insert(record.id.clone(), entry);
        self.users.push(map);
    }

    pub(crate) fn add_course(&mut self, user: &UserId, crn: &Crn) -> Result<()> {
        let entry = self
            .users
            .iter_mut()
            .find_map(|m| m.get_mut(user))
            .ok_or_else(|| WatchError::UnknownUser(user.clone()))?;

        if entry.courses.contains(crn) {
            return Err(WatchError::CourseAlreadyTracked {
                user: user.clone(),
                crn: crn.clone(),
            });
        }
        entry.courses.push(crn.clone());
        Ok(())
    }
}

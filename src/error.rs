//! Error types for seat-watch.
//!
//! Monitor-facing failures are strongly typed so callers can tell a
//! degraded reading apart from a missing user.

use thiserror::Error;

use crate::types::{Crn, UserId};

/// Errors raised by the store, the fetcher, the notifier and the registry.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Registration source unavailable for CRN {crn}: {reason}")]
    SourceUnavailable {
        crn: Crn,
        reason: String,
    },

    #[error("Malformed availability data for CRN {crn}: {reason}")]
    MalformedSnapshot {
        crn: Crn,
        reason: String,
    },

    #[error("Failed to deliver notification to {user}: {reason}")]
    NotificationDeliveryFailed {
        user: UserId,
        reason: String,
    },

    #[error("User not found: {0}")]
    UnknownUser(UserId),

    #[error("CRN {crn} is already tracked for user {user}")]
    CourseAlreadyTracked {
        user: UserId,
        crn: Crn,
    },

    #[error("Invalid term '{0}'. Use 'spring', 'summer', or 'fall'.")]
    InvalidTerm(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl WatchError {
    /// True for errors the API layer should report as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, WatchError::UnknownUser(_))
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;

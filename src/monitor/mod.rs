//! Seat monitors
//!
//! One background task per user polls that user's tracked courses on a
//! fixed interval and turns seat changes into notifications.
//!
//! - `MonitorContext`: collaborators shared by every task
//! - `task`: the per-user polling loop
//! - `registry`: start/stop supervision, at most one task per user

pub mod registry;
pub mod task;

pub use registry::{StartOutcome, TaskRegistry};
pub use task::{MonitorCommand, MonitorTask};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::course::CourseStatus;
use crate::fetcher::{RegistrationPageFetcher, SnapshotFetcher};
use crate::journal::{ActivityJournal, FileJournal};
use crate::notify::{Notifier, NtfyNotifier};
use crate::store::{UserStore, YamlUserStore};
use crate::types::UserId;

/// Collaborators handed to the registry and every monitor task
#[derive(Clone)]
pub struct MonitorContext {
    pub store: Arc<dyn UserStore>,
    pub fetcher: Arc<dyn SnapshotFetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub journal: Arc<dyn ActivityJournal>,
    pub poll_interval: Duration,
}

impl MonitorContext {
    /// Wire the production collaborators from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn UserStore> = Arc::new(YamlUserStore::new(config.store_path()?));
        let fetcher = Arc::new(RegistrationPageFetcher::new(&config.registration)?);
        let notifier = Arc::new(NtfyNotifier::new(&config.ntfy, store.clone())?);
        let journal = Arc::new(FileJournal::new(config.journal_dir()?, store.clone()));

        Ok(Self {
            store,
            fetcher,
            notifier,
            journal,
            poll_interval: config.monitor.poll_interval(),
        })
    }
}

/// Lifecycle of a monitor task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    Idle,
    Initializing,
    Polling,
    Cancelled,
}

impl std::fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorPhase::Idle => write!(f, "Idle"),
            MonitorPhase::Initializing => write!(f, "Initializing"),
            MonitorPhase::Polling => write!(f, "Polling"),
            MonitorPhase::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Monitor statistics
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStats {
    pub user: UserId,
    pub phase: MonitorPhase,
    pub ticks: u64,
    pub last_tick: Option<DateTime<Utc>>,
    pub courses: usize,
}

/// What a running task publishes for read-only inspection
#[derive(Debug, Clone)]
pub struct MonitorBoard {
    pub stats: MonitorStats,
    pub statuses: Vec<CourseStatus>,
}

impl MonitorBoard {
    pub fn new(user: UserId) -> Self {
        Self {
            stats: MonitorStats {
                user,
                phase: MonitorPhase::Idle,
                ticks: 0,
                last_tick: None,
                courses: 0,
            },
            statuses: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_idle() {
        let board = MonitorBoard::new(UserId::from("u"));
        assert_eq!(board.stats.phase, MonitorPhase::Idle);
        assert_eq!(board.stats.ticks, 0);
        assert!(board.statuses.is_empty());
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MonitorPhase::Polling).unwrap(), "\"polling\"");
        assert_eq!(MonitorPhase::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_context_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store.path = Some(dir.path().join("users.yaml"));
        config.journal.dir = Some(dir.path().join("logs"));
        config.monitor.poll_interval_secs = 3;

        let ctx = MonitorContext::from_config(&config).unwrap();
        assert_eq!(ctx.poll_interval, Duration::from_secs(3));
        assert_eq!(ctx.notifier.name(), "ntfy");
        assert!(ctx.store.users().unwrap().is_empty());
    }
}

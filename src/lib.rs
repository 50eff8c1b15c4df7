//! Seat Watch - Course Seat Availability Library
//!
//! Per-user monitors that poll course registration pages and push alerts
//! when seats or waitlist spots change:
//! - Registration page fetcher and seat snapshot parser
//! - Pure state-transition evaluator producing alert messages
//! - One background task per user, supervised by a task registry
//! - ntfy notifications and per-user activity journals
//! - YAML user store, TOML configuration, HTTP API and CLI
//!
//! # Example
//!
//! ```ignore
//! use seat_watch::{Config, MonitorContext, TaskRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let registry = TaskRegistry::new(MonitorContext::from_config(&config)?);
//!     registry.start_all().await?;
//!     tokio::signal::ctrl_c().await?;
//!     registry.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod error;
pub mod config;
pub mod course;
pub mod store;
pub mod fetcher;
pub mod notify;
pub mod journal;
pub mod monitor;
pub mod server;
pub mod cli;

pub use config::Config;
pub use error::{Result, WatchError};
pub use types::{CourseRef, Crn, TermCode, UserId};

pub use course::{evaluate, CourseState, CourseStatus, Evaluation, SeatCounts, Snapshot};

pub use store::{MemoryUserStore, UserRecord, UserStore, YamlUserStore};

pub use fetcher::{RegistrationPageFetcher, SnapshotFetcher};

pub use notify::{Notifier, NtfyNotifier};

pub use journal::{ActivityJournal, FileJournal};

pub use monitor::{MonitorContext, MonitorPhase, MonitorStats, StartOutcome, TaskRegistry};

pub use server::{start as start_server, ServerState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

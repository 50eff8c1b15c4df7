//! Seat availability sources
//!
//! A fetcher turns a `CourseRef` into a `Snapshot`. "No data" is not an
//! error: implementations return `Snapshot::sentinel()` for it and only
//! fail on transport problems.

pub mod oscar;

pub use oscar::RegistrationPageFetcher;

use async_trait::async_trait;

use crate::course::Snapshot;
use crate::error::Result;
use crate::types::CourseRef;

/// Display name used when a course name cannot be resolved
pub const UNKNOWN_COURSE_NAME: &str = "Unknown";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch the current seat counts of a course
    async fn fetch(&self, course: &CourseRef) -> Result<Snapshot>;

    /// Fetch the display name of a course
    async fn fetch_name(&self, course: &CourseRef) -> Result<String>;
}

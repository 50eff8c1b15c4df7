//! Course availability model
//!
//! - `Snapshot`: one reading of a section's seat and waitlist counts
//! - `CourseState`: what the monitor remembers between polls
//! - `evaluator`: turns (previous state, new snapshot) into alerts
//! - `term`: term name to registrar code conversion

pub mod evaluator;
pub mod term;

pub use evaluator::{evaluate, Evaluation};
pub use term::term_code;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seat counts for one pool (regular seats or waitlist)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatCounts {
    pub seats: u32,
    pub taken: u32,
    pub vacant: u32,
}

/// One fetched reading of a course section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub seats: u32,
    pub taken: u32,
    pub vacant: u32,
    pub waitlist: SeatCounts,
}

impl Snapshot {
    /// All-zero reading used whenever the source cannot be read
    pub const fn sentinel() -> Self {
        Self {
            seats: 0,
            taken: 0,
            vacant: 0,
            waitlist: SeatCounts { seats: 0, taken: 0, vacant: 0 },
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }

    pub fn is_open(&self) -> bool {
        self.vacant > 0
    }

    pub fn waitlist_available(&self) -> bool {
        self.waitlist.vacant > 0
    }
}

/// Derived state carried from one poll to the next.
///
/// The default value means "closed, zero seats", so the first real poll
/// of an open course reports it as newly opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseState {
    pub is_open: bool,
    pub waitlist_available: bool,
    pub seats_available: u32,
    pub waitlist_seats: u32,
    /// Reserved for de-duplication; the evaluator only carries it forward
    pub last_notification: Option<DateTime<Utc>>,
}

/// Read-only view of a tracked course, as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseStatus {
    pub crn: String,
    pub name: String,
    pub snapshot: Option<Snapshot>,
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        match &self.snapshot {
            Some(snap) => {
                writeln!(f, "seats:\t{}", snap.seats)?;
                writeln!(f, "taken:\t{}", snap.taken)?;
                writeln!(f, "vacant:\t{}", snap.vacant)?;
                writeln!(
                    f,
                    "waitlist open: {}",
                    if snap.waitlist_available() { "yes" } else { "no" }
                )
            }
            None => writeln!(f, "awaiting first poll"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_all_zero() {
        let snap = Snapshot::sentinel();
        assert!(snap.is_sentinel());
        assert!(!snap.is_open());
        assert!(!snap.waitlist_available());
        assert_eq!(snap, Snapshot::default());
    }

    #[test]
    fn test_default_state_is_closed() {
        let state = CourseState::default();
        assert!(!state.is_open);
        assert_eq!(state.seats_available, 0);
        assert!(state.last_notification.is_none());
    }

    #[test]
    fn test_status_display_with_snapshot() {
        let status = CourseStatus {
            crn: "81234".to_string(),
            name: "Intro to Computing - 81234 - CS 1301 - A".to_string(),
            snapshot: Some(Snapshot {
                seats: 30,
                taken: 28,
                vacant: 2,
                waitlist: SeatCounts { seats: 10, taken: 0, vacant: 10 },
            }),
        };
        assert_eq!(
            status.to_string(),
            "Intro to Computing - 81234 - CS 1301 - A\nseats:\t30\ntaken:\t28\nvacant:\t2\nwaitlist open: yes\n"
        );
    }

    #[test]
    fn test_status_display_before_first_poll() {
        let status = CourseStatus {
            crn: "81234".to_string(),
            name: "CS 1301".to_string(),
            snapshot: None,
        };
        assert_eq!(status.to_string(), "CS 1301\nawaiting first poll\n");
    }
}

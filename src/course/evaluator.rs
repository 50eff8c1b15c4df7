//! State transition evaluator
//!
//! Compares the previous poll's derived state with a fresh snapshot and
//! produces the alerts a user should see. Pure: no clock, no I/O.
//!
//! Branch order matters. The open/closed edge is checked on its own; the
//! seat alerts, the waitlist-opened alert and the waitlist count alerts
//! form a single if/else-if chain, so while a course has open seats no
//! waitlist alert is produced even if the waitlist changed.

use super::{CourseState, Snapshot};

/// Remaining-seat count at or below which a "low seats" alert fires
pub const LOW_SEAT_THRESHOLD: u32 = 5;

/// Minimum increase in vacancies reported as a burst of new seats
pub const BURST_THRESHOLD: i64 = 3;

/// Output of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub next: CourseState,
    pub messages: Vec<String>,
}

/// Evaluate a new snapshot against the previous state of a course.
pub fn evaluate(prev: &CourseState, snap: &Snapshot, name: &str) -> Evaluation {
    let new_is_open = snap.is_open();
    let new_waitlist_available = snap.waitlist_available();

    let mut messages = Vec::new();

    if new_is_open && !prev.is_open {
        messages.push(format!("Course open: {}", name));
    } else if !new_is_open && prev.is_open {
        messages.push(format!("Course closed: {}", name));
    }

    if new_is_open {
        let delta = i64::from(snap.vacant) - i64::from(prev.seats_available);
        if snap.vacant <= LOW_SEAT_THRESHOLD && prev.seats_available > LOW_SEAT_THRESHOLD {
            messages.push(format!("Only {} seats remaining for {}", snap.vacant, name));
        } else if delta >= BURST_THRESHOLD {
            messages.push(format!("{} new seats opened for {}", delta, name));
        }
    } else if new_waitlist_available && !prev.waitlist_available {
        messages.push(format!("Waitlist now available for {}", name));
    } else if new_waitlist_available {
        let vacant = snap.waitlist.vacant;
        let delta = i64::from(vacant) - i64::from(prev.waitlist_seats);
        if vacant <= LOW_SEAT_THRESHOLD && prev.waitlist_seats > LOW_SEAT_THRESHOLD {
            messages.push(format!("Only {} waitlist spots remaining for {}", vacant, name));
        } else if delta >= BURST_THRESHOLD {
            messages.push(format!("{} new waitlist spots opened for {}", delta, name));
        }
    }

    let next = CourseState {
        is_open: new_is_open,
        waitlist_available: new_waitlist_available,
        seats_available: snap.vacant,
        waitlist_seats: snap.waitlist.vacant,
        last_notification: prev.last_notification,
    };

    Evaluation { next, messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::SeatCounts;

    fn snap(vacant: u32, waitlist_vacant: u32) -> Snapshot {
        Snapshot {
            seats: 50,
            taken: 50 - vacant.min(50),
            vacant,
            waitlist: SeatCounts {
                seats: 20,
                taken: 20 - waitlist_vacant.min(20),
                vacant: waitlist_vacant,
            },
        }
    }

    fn open_state(seats: u32) -> CourseState {
        CourseState {
            is_open: true,
            seats_available: seats,
            ..Default::default()
        }
    }

    #[test]
    fn test_course_opens() {
        // Opening from zero also counts as a burst once vacancies reach 3
        let out = evaluate(&CourseState::default(), &snap(5, 0), "X");
        assert_eq!(out.messages, vec!["Course open: X", "5 new seats opened for X"]);
        assert!(out.next.is_open);
        assert_eq!(out.next.seats_available, 5);
    }

    #[test]
    fn test_course_opens_without_burst() {
        let out = evaluate(&CourseState::default(), &snap(2, 0), "X");
        assert_eq!(out.messages, vec!["Course open: X"]);
        assert!(out.next.is_open);
        assert_eq!(out.next.seats_available, 2);
    }

    #[test]
    fn test_open_with_burst_reports_both() {
        let out = evaluate(&CourseState::default(), &snap(12, 0), "X");
        assert_eq!(out.messages, vec!["Course open: X", "12 new seats opened for X"]);
    }

    #[test]
    fn test_low_seats() {
        let out = evaluate(&open_state(8), &snap(4, 0), "X");
        assert_eq!(out.messages, vec!["Only 4 seats remaining for X"]);
    }

    #[test]
    fn test_seat_burst() {
        let out = evaluate(&open_state(2), &snap(6, 0), "X");
        assert_eq!(out.messages, vec!["4 new seats opened for X"]);
    }

    #[test]
    fn test_small_increase_is_quiet() {
        let out = evaluate(&open_state(2), &snap(4, 0), "X");
        assert!(out.messages.is_empty());
    }

    #[test]
    fn test_low_seats_boundary() {
        let out = evaluate(&open_state(6), &snap(5, 0), "X");
        assert_eq!(out.messages, vec!["Only 5 seats remaining for X"]);
    }

    #[test]
    fn test_waitlist_opens() {
        let out = evaluate(&CourseState::default(), &snap(0, 3), "X");
        assert_eq!(out.messages, vec!["Waitlist now available for X"]);
        assert!(out.next.waitlist_available);
        assert_eq!(out.next.waitlist_seats, 3);
    }

    #[test]
    fn test_waitlist_low() {
        let prev = CourseState {
            waitlist_available: true,
            waitlist_seats: 9,
            ..Default::default()
        };
        let out = evaluate(&prev, &snap(0, 2), "X");
        assert_eq!(out.messages, vec!["Only 2 waitlist spots remaining for X"]);
    }

    #[test]
    fn test_waitlist_burst() {
        let prev = CourseState {
            waitlist_available: true,
            waitlist_seats: 1,
            ..Default::default()
        };
        let out = evaluate(&prev, &snap(0, 7), "X");
        assert_eq!(out.messages, vec!["6 new waitlist spots opened for X"]);
    }

    #[test]
    fn test_sentinel_closes_open_course() {
        let out = evaluate(&open_state(3), &Snapshot::sentinel(), "X");
        assert_eq!(out.messages, vec!["Course closed: X"]);
        assert_eq!(out.next, CourseState::default());
    }

    #[test]
    fn test_closing_with_waitlist_opening() {
        let out = evaluate(&open_state(3), &snap(0, 4), "X");
        assert_eq!(
            out.messages,
            vec!["Course closed: X", "Waitlist now available for X"]
        );
    }

    #[test]
    fn test_zero_vacancy_never_reports_seats() {
        let prevs = [
            CourseState::default(),
            open_state(1),
            open_state(6),
            open_state(40),
        ];
        for prev in &prevs {
            for waitlist in [0, 1, 3, 6, 20] {
                let out = evaluate(prev, &snap(0, waitlist), "X");
                assert!(
                    !out.messages.iter().any(|m| m.contains("seats")),
                    "unexpected seat alert for {:?} / {}: {:?}",
                    prev, waitlist, out.messages
                );
            }
        }
    }

    #[test]
    fn test_open_course_shadows_waitlist() {
        let prevs = [
            CourseState::default(),
            CourseState { waitlist_available: true, waitlist_seats: 10, ..open_state(3) },
            CourseState { waitlist_available: false, ..open_state(8) },
        ];
        for prev in &prevs {
            for vacant in [1, 4, 9, 30] {
                for waitlist in [0, 2, 5, 15] {
                    let out = evaluate(prev, &snap(vacant, waitlist), "X");
                    assert!(
                        !out.messages.iter().any(|m| m.contains("aitlist")),
                        "waitlist alert while open: {:?}",
                        out.messages
                    );
                }
            }
        }
    }

    #[test]
    fn test_edge_fires_once() {
        let s = snap(7, 0);
        let first = evaluate(&CourseState::default(), &s, "X");
        assert!(first.messages.contains(&"Course open: X".to_string()));

        let second = evaluate(&first.next, &s, "X");
        assert!(second.messages.is_empty());

        let closed = evaluate(&second.next, &Snapshot::sentinel(), "X");
        assert_eq!(closed.messages, vec!["Course closed: X"]);
        let again = evaluate(&closed.next, &Snapshot::sentinel(), "X");
        assert!(again.messages.is_empty());
    }

    #[test]
    fn test_last_notification_carried_forward() {
        let stamp = chrono::Utc::now();
        let prev = CourseState { last_notification: Some(stamp), ..open_state(4) };
        let out = evaluate(&prev, &snap(4, 0), "X");
        assert_eq!(out.next.last_notification, Some(stamp));
    }
}

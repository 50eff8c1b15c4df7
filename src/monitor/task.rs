//! Per-user monitor task
//!
//! Initializes the user's tracked courses, then polls them in insertion
//! order, sleeps for the configured interval and repeats. The sleep is
//! the only point where shutdown or reload requests are observed, so a
//! polling pass always runs to completion.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{MonitorBoard, MonitorContext, MonitorPhase};
use crate::course::{evaluate, CourseState, CourseStatus, Evaluation, Snapshot};
use crate::types::{CourseRef, UserId};

/// Requests a running task accepts between polling passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Re-read the tracked course list from the store
    Reload,
}

/// A tracked course and everything the task remembers about it
#[derive(Debug, Clone)]
struct TrackedCourse {
    course: CourseRef,
    name: String,
    state: CourseState,
    last_snapshot: Option<Snapshot>,
}

impl TrackedCourse {
    fn status(&self) -> CourseStatus {
        CourseStatus {
            crn: self.course.crn().to_string(),
            name: self.name.clone(),
            snapshot: self.last_snapshot,
        }
    }
}

/// The polling loop of one user
pub struct MonitorTask {
    user: UserId,
    ctx: MonitorContext,
    courses: Vec<TrackedCourse>,
    board: Arc<RwLock<MonitorBoard>>,
}

impl MonitorTask {
    pub fn new(user: UserId, ctx: MonitorContext, board: Arc<RwLock<MonitorBoard>>) -> Self {
        Self {
            user,
            ctx,
            courses: Vec::new(),
            board,
        }
    }

    /// Load the tracked course list from the store.
    ///
    /// Courses that were already tracked keep their state; new ones start
    /// from the default "closed" state. If the store cannot be read the
    /// current list is kept.
    pub async fn initialize(&mut self) {
        self.set_phase(MonitorPhase::Initializing).await;

        let refs = match self.ctx.store.tracked_courses(&self.user) {
            Ok(refs) => refs,
            Err(e) => {
                warn!("Could not load tracked courses for {}: {}", self.user, e);
                return;
            }
        };

        let mut previous = std::mem::take(&mut self.courses);
        let mut courses = Vec::with_capacity(refs.len());
        for course in refs {
            match previous.iter().position(|t| t.course == course) {
                Some(idx) => courses.push(previous.swap_remove(idx)),
                None => {
                    let name = self.resolve_name(&course).await;
                    debug!("Tracking {} as '{}'", course, name);
                    courses.push(TrackedCourse {
                        course,
                        name,
                        state: CourseState::default(),
                        last_snapshot: None,
                    });
                }
            }
        }
        self.courses = courses;

        info!("Monitoring {} course(s) for user {}", self.courses.len(), self.user);
        self.publish().await;
    }

    /// Display name from the store cache, else from the source
    async fn resolve_name(&self, course: &CourseRef) -> String {
        match self.ctx.store.course_name(course) {
            Ok(Some(name)) => return name,
            Ok(None) => {}
            Err(e) => warn!("Course name lookup failed for {}: {}", course, e),
        }

        match self.ctx.fetcher.fetch_name(course).await {
            Ok(name) if name != crate::fetcher::UNKNOWN_COURSE_NAME => {
                if let Err(e) = self.ctx.store.remember_course_name(course, &name) {
                    warn!("Failed to cache course name for {}: {}", course, e);
                }
                name
            }
            Ok(_) => format!("CRN {}", course.crn()),
            Err(e) => {
                warn!("Failed to fetch course name for {}: {}", course, e);
                format!("CRN {}", course.crn())
            }
        }
    }

    /// Run one polling pass over every tracked course
    pub async fn poll_once(&mut self) {
        for tracked in &mut self.courses {
            let snapshot = match self.ctx.fetcher.fetch(&tracked.course).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Fetch failed for {}, treating as no seats: {}", tracked.course, e);
                    Snapshot::sentinel()
                }
            };

            let Evaluation { mut next, messages } = evaluate(&tracked.state, &snapshot, &tracked.name);

            for message in &messages {
                info!("[{}] {}", self.user, message);
                if let Err(e) = self.ctx.notifier.send(&self.user, message).await {
                    warn!("{} delivery failed for {}: {}", self.ctx.notifier.name(), self.user, e);
                }
                self.ctx.journal.record(&self.user, message);
            }

            if !messages.is_empty() {
                next.last_notification = Some(Utc::now());
            }
            tracked.state = next;
            tracked.last_snapshot = Some(snapshot);
        }

        {
            let mut board = self.board.write().await;
            board.stats.ticks += 1;
            board.stats.last_tick = Some(Utc::now());
        }
        self.publish().await;
    }

    /// Run until a shutdown signal arrives or the registry drops its handle
    pub async fn run(
        mut self,
        mut shutdown_rx: broadcast::Receiver<()>,
        mut command_rx: mpsc::Receiver<MonitorCommand>,
    ) {
        self.initialize().await;
        info!("Monitor started for user {}", self.user);

        'polling: loop {
            self.set_phase(MonitorPhase::Polling).await;
            self.poll_once().await;

            let deadline = Instant::now() + self.ctx.poll_interval;
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.recv() => {
                        break 'polling;
                    }

                    cmd = command_rx.recv() => match cmd {
                        Some(MonitorCommand::Reload) => {
                            self.initialize().await;
                            self.set_phase(MonitorPhase::Polling).await;
                        }
                        None => break 'polling,
                    },

                    _ = tokio::time::sleep_until(deadline) => break,
                }
            }
        }

        self.set_phase(MonitorPhase::Cancelled).await;
        info!("Monitor stopped for user {}", self.user);
    }

    /// Current state of a tracked course
    pub fn course_state(&self, course: &CourseRef) -> Option<&CourseState> {
        self.courses.iter().find(|t| &t.course == course).map(|t| &t.state)
    }

    async fn set_phase(&self, phase: MonitorPhase) {
        self.board.write().await.stats.phase = phase;
    }

    async fn publish(&self) {
        let mut board = self.board.write().await;
        board.stats.courses = self.courses.len();
        board.statuses = self.courses.iter().map(TrackedCourse::status).collect();
    }
}

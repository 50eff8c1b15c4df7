//! Task registry
//!
//! Owns the handle of every running monitor task, keyed by user. All
//! start/stop requests for any user go through one lock, so two tasks for
//! the same user can never coexist.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{MonitorBoard, MonitorCommand, MonitorContext, MonitorStats, MonitorTask};
use crate::course::{CourseStatus, Snapshot};
use crate::error::{Result, WatchError};
use crate::fetcher::UNKNOWN_COURSE_NAME;
use crate::store::{UserRecord, UserStore};
use crate::types::{Crn, UserId};

/// Commands buffered per task; reloads beyond this collapse into one
const COMMAND_BUFFER: usize = 8;

/// What `start` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new task was spawned
    Started,
    /// A task was already running and will reload its courses
    Reloaded,
}

struct MonitorHandle {
    shutdown_tx: broadcast::Sender<()>,
    command_tx: mpsc::Sender<MonitorCommand>,
    join: JoinHandle<()>,
    board: Arc<RwLock<MonitorBoard>>,
}

impl MonitorHandle {
    fn is_live(&self) -> bool {
        !self.join.is_finished() && !self.command_tx.is_closed()
    }

    async fn shut_down(self, user: &UserId) {
        // Err only means the task already exited
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join.await {
            warn!("Monitor task for {} ended abnormally: {}", user, e);
        }
    }
}

pub struct TaskRegistry {
    ctx: MonitorContext,
    monitors: Mutex<HashMap<UserId, MonitorHandle>>,
}

impl TaskRegistry {
    pub fn new(ctx: MonitorContext) -> Self {
        Self {
            ctx,
            monitors: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.ctx.store
    }

    fn require_user(&self, user: &UserId) -> Result<UserRecord> {
        self.ctx
            .store
            .user(user)?
            .ok_or_else(|| WatchError::UnknownUser(user.clone()))
    }

    /// Ensure a monitor runs for `user`.
    ///
    /// A running task is told to reload its course list; a missing or
    /// finished one is replaced by a fresh task.
    pub async fn start(&self, user: &UserId) -> Result<StartOutcome> {
        self.require_user(user)?;
        let mut monitors = self.monitors.lock().await;

        if let Some(handle) = monitors.get(user) {
            if handle.is_live() {
                match handle.command_tx.try_send(MonitorCommand::Reload) {
                    Ok(()) | Err(TrySendError::Full(_)) => {
                        debug!("Monitor for {} already running, reloading", user);
                        return Ok(StartOutcome::Reloaded);
                    }
                    Err(TrySendError::Closed(_)) => {}
                }
            }
            if let Some(stale) = monitors.remove(user) {
                debug!("Replacing finished monitor for {}", user);
                stale.shut_down(user).await;
            }
        }

        let board = Arc::new(RwLock::new(MonitorBoard::new(user.clone())));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let task = MonitorTask::new(user.clone(), self.ctx.clone(), board.clone());
        let join = tokio::spawn(task.run(shutdown_rx, command_rx));

        monitors.insert(
            user.clone(),
            MonitorHandle {
                shutdown_tx,
                command_tx,
                join,
                board,
            },
        );
        info!("Started monitor for {}", user);
        Ok(StartOutcome::Started)
    }

    /// Cancel the user's monitor and wait for it to finish.
    ///
    /// Returns `false` if no monitor was running.
    pub async fn stop(&self, user: &UserId) -> Result<bool> {
        self.require_user(user)?;
        let mut monitors = self.monitors.lock().await;
        match monitors.remove(user) {
            Some(handle) => {
                handle.shut_down(user).await;
                info!("Stopped monitor for {}", user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Track a new CRN; a running monitor picks it up before its next pass
    pub async fn add_course(&self, user: &UserId, crn: &Crn) -> Result<()> {
        self.ctx.store.add_course(user, crn)?;
        info!("User {} now tracking CRN {}", user, crn);

        let monitors = self.monitors.lock().await;
        if let Some(handle) = monitors.get(user) {
            if let Err(TrySendError::Closed(_)) = handle.command_tx.try_send(MonitorCommand::Reload) {
                warn!("Monitor for {} is gone; CRN {} applies on next start", user, crn);
            }
        }
        Ok(())
    }

    /// Register a user and start monitoring them right away
    pub async fn register_user(&self, name: &str) -> Result<UserRecord> {
        let record = self.ctx.store.add_user(name)?;
        info!("Registered user {} ({})", record.name, record.id);
        self.start(&record.id).await?;
        Ok(record)
    }

    /// Start a monitor for every stored user. Returns how many were spawned.
    pub async fn start_all(&self) -> Result<usize> {
        let mut started = 0;
        for user in self.ctx.store.users()? {
            if self.start(&user.id).await? == StartOutcome::Started {
                started += 1;
            }
        }
        info!("{} monitor(s) started", started);
        Ok(started)
    }

    /// Stop every running monitor
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.monitors.lock().await.drain().collect();
        for (user, handle) in drained {
            handle.shut_down(&user).await;
        }
        info!("All monitors stopped");
    }

    /// Summaries of the user's tracked courses, in tracking order
    pub async fn list_course_statuses(&self, user: &UserId) -> Result<Vec<CourseStatus>> {
        self.require_user(user)?;

        let board = self.monitors.lock().await.get(user).map(|h| h.board.clone());
        if let Some(board) = board {
            let board = board.read().await;
            // An initializing task has not published yet
            if !board.statuses.is_empty() {
                return Ok(board.statuses.clone());
            }
        }

        self.ctx
            .store
            .tracked_courses(user)?
            .into_iter()
            .map(|course| {
                let name = self
                    .ctx
                    .store
                    .course_name(&course)?
                    .unwrap_or_else(|| format!("CRN {}", course.crn()));
                Ok(CourseStatus {
                    crn: course.crn().to_string(),
                    name,
                    snapshot: None,
                })
            })
            .collect()
    }

    /// Fetch every tracked course once, outside of any monitor
    pub async fn check(&self, user: &UserId) -> Result<Vec<CourseStatus>> {
        self.require_user(user)?;

        let mut statuses = Vec::new();
        for course in self.ctx.store.tracked_courses(user)? {
            let snapshot = match self.ctx.fetcher.fetch(&course).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Fetch failed for {}: {}", course, e);
                    Snapshot::sentinel()
                }
            };
            let name = match self.ctx.store.course_name(&course)? {
                Some(name) => name,
                None => match self.ctx.fetcher.fetch_name(&course).await {
                    Ok(name) if name != UNKNOWN_COURSE_NAME => name,
                    _ => format!("CRN {}", course.crn()),
                },
            };
            statuses.push(CourseStatus {
                crn: course.crn().to_string(),
                name,
                snapshot: Some(snapshot),
            });
        }
        Ok(statuses)
    }

    /// Users with a live monitor, sorted
    pub async fn active_users(&self) -> Vec<UserId> {
        let monitors = self.monitors.lock().await;
        let mut users: Vec<UserId> = monitors
            .iter()
            .filter(|(_, h)| h.is_live())
            .map(|(u, _)| u.clone())
            .collect();
        users.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        users
    }

    pub async fn is_running(&self, user: &UserId) -> bool {
        self.monitors
            .lock()
            .await
            .get(user)
            .is_some_and(MonitorHandle::is_live)
    }

    /// Statistics of every registered monitor, sorted by user
    pub async fn stats(&self) -> Vec<MonitorStats> {
        let boards: Vec<_> = self
            .monitors
            .lock()
            .await
            .values()
            .map(|h| h.board.clone())
            .collect();

        let mut stats = Vec::with_capacity(boards.len());
        for board in boards {
            stats.push(board.read().await.stats.clone());
        }
        stats.sort_by(|a, b| a.user.as_str().cmp(b.user.as_str()));
        stats
    }
}

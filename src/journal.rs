//! Per-user activity journal
//!
//! Every alert sent to a user is also appended to that user's log file
//! (the `logfile` field of the user record) under the journal directory.
//! Files are opened once per user and kept for the life of the journal,
//! so restarting a user's monitor never opens a second handle.

use chrono::Local;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::store::UserStore;
use crate::types::UserId;

/// Structured sink for per-user activity lines
pub trait ActivityJournal: Send + Sync {
    fn record(&self, user: &UserId, message: &str);
}

/// Outcome of resolving a user's journal file
enum Opened {
    File(File),
    /// The user has no usable log file; remembered for good
    Disabled,
    /// Lookup or open failed; try again on the next entry
    Retry,
}

/// True if `name` is a single normal path component
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Journal writing one plain-text file per user
pub struct FileJournal {
    dir: PathBuf,
    store: Arc<dyn UserStore>,
    /// `None` marks users without a usable log file
    files: Mutex<HashMap<UserId, Option<File>>>,
}

impl FileJournal {
    pub fn new(dir: impl Into<PathBuf>, store: Arc<dyn UserStore>) -> Self {
        Self {
            dir: dir.into(),
            store,
            files: Mutex::new(HashMap::new()),
        }
    }

    fn open(&self, user: &UserId) -> Opened {
        let logfile = match self.store.user(user) {
            Ok(Some(record)) => match record.logfile {
                Some(logfile) => logfile,
                None => return Opened::Disabled,
            },
            Ok(None) => return Opened::Retry,
            Err(e) => {
                warn!("Could not look up log file for {}: {}", user, e);
                return Opened::Retry;
            }
        };

        if !is_plain_file_name(&logfile) {
            warn!("Refusing journal file '{}' for {}: not a plain file name", logfile, user);
            return Opened::Disabled;
        }

        let path = self.dir.join(logfile);
        let opened = std::fs::create_dir_all(&self.dir).and_then(|()| {
            OpenOptions::new().create(true).append(true).open(&path)
        });
        match opened {
            Ok(file) => {
                debug!("Opened activity journal {}", path.display());
                Opened::File(file)
            }
            Err(e) => {
                warn!("Failed to open activity journal {}: {}", path.display(), e);
                Opened::Retry
            }
        }
    }

    /// Number of users with an open file handle
    pub fn open_files(&self) -> usize {
        self.files
            .lock()
            .map(|files| files.values().filter(|f| f.is_some()).count())
            .unwrap_or(0)
    }
}

impl ActivityJournal for FileJournal {
    fn record(&self, user: &UserId, message: &str) {
        let Ok(mut files) = self.files.lock() else {
            warn!("Activity journal lock poisoned, dropping entry for {}", user);
            return;
        };

        if !files.contains_key(user) {
            match self.open(user) {
                Opened::File(file) => {
                    files.insert(user.clone(), Some(file));
                }
                Opened::Disabled => {
                    files.insert(user.clone(), None);
                }
                Opened::Retry => return,
            }
        }

        if let Some(Some(file)) = files.get_mut(user) {
            let line = format!("{} - INFO - {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
            if let Err(e) = file.write_all(line.as_bytes()) {
                warn!("Failed to write activity journal for {}: {}", user, e);
            }
        }
    }
}

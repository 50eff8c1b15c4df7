//! YAML file backed user store
//!
//! The document is re-read on every call so hand edits are picked up
//! without a restart. Writes are serialized through a process-local lock.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::{StoreDocument, UserRecord, UserStore};
use crate::error::{Result, WatchError};
use crate::types::{CourseRef, Crn, UserId};

pub struct YamlUserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl YamlUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn write(&self, doc: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_yaml::to_string(doc)?;
        std::fs::write(&self.path, contents)?;
        debug!("Saved user store to {}", self.path.display());
        Ok(())
    }

    /// Read-modify-write under the store lock
    fn update<T>(&self, f: impl FnOnce(&mut StoreDocument) -> Result<(T, bool)>) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| WatchError::Store("user store lock poisoned".to_string()))?;
        let mut doc = self.read()?;
        let (value, dirty) = f(&mut doc)?;
        if dirty {
            self.write(&doc)?;
        }
        Ok(value)
    }
}

impl UserStore for YamlUserStore {
    fn users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.read()?.users())
    }

    fn term(&self) -> Result<String> {
        Ok(self.read()?.term().to_string())
    }

    fn course_name(&self, course: &CourseRef) -> Result<Option<String>> {
        Ok(self.read()?.course_name(course))
    }

    fn remember_course_name(&self, course: &CourseRef, name: &str) -> Result<()> {
        self.update(|doc| Ok(((), doc.remember_course_name(course, name))))
    }

    fn add_user(&self, name: &str) -> Result<UserRecord> {
        self.update(|doc| {
            let record = UserRecord::generate(name);
            doc.insert_user(&record);
            Ok((record, true))
        })
    }

    fn add_course(&self, user: &UserId, crn: &Crn) -> Result<()> {
        self.update(|doc| doc.add_course(user, crn).map(|()| ((), true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlUserStore::new(dir.path().join("users.yaml"));
        assert!(store.users().unwrap().is_empty());
        assert_eq!(store.term().unwrap(), "fall");
    }

    #[test]
    fn test_add_user_and_course_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.yaml");
        let store = YamlUserStore::new(&path);

        let record = store.add_user("Dana").unwrap();
        store.add_course(&record.id, &Crn::from("81234")).unwrap();
        store.add_course(&record.id, &Crn::from("80001")).unwrap();

        // A second handle sees the same document
        let reopened = YamlUserStore::new(&path);
        let user = reopened.user(&record.id).unwrap().unwrap();
        assert_eq!(user.name, "Dana");
        assert_eq!(user.courses, vec![Crn::from("81234"), Crn::from("80001")]);
        assert_eq!(reopened.find_user_by_name("Dana").unwrap(), Some(record.id.clone()));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Users:"));
        assert!(raw.contains("ntfy_topic: gt_registration_"));
    }

    #[test]
    fn test_tracked_courses_use_term_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.yaml");
        std::fs::write(
            &path,
            "Term: summer\nUsers:\n- u1:\n    name: Eve\n    courses: [81234, 80001]\n",
        )
        .unwrap();
        let store = YamlUserStore::new(&path);

        let courses = store.tracked_courses(&UserId::from("u1")).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].crn().as_str(), "81234");
        assert!(courses[0].term().as_str().ends_with("05"));

        let err = store.tracked_courses(&UserId::from("u2")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_course_name_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlUserStore::new(dir.path().join("users.yaml"));
        let record = store.add_user("Finn").unwrap();
        store.add_course(&record.id, &Crn::from("81234")).unwrap();
        let course = store.tracked_courses(&record.id).unwrap().remove(0);

        assert_eq!(store.course_name(&course).unwrap(), None);
        store.remember_course_name(&course, "Data Structures").unwrap();
        assert_eq!(store.course_name(&course).unwrap().as_deref(), Some("Data Structures"));
    }
}

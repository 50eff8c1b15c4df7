//! In-memory user store

use std::sync::{Mutex, MutexGuard};

use super::{StoreDocument, UserRecord, UserStore};
use crate::error::{Result, WatchError};
use crate::types::{CourseRef, Crn, UserId};

pub struct MemoryUserStore {
    doc: Mutex<StoreDocument>,
}

impl MemoryUserStore {
    pub fn new(term: &str) -> Self {
        Self {
            doc: Mutex::new(StoreDocument::with_term(term)),
        }
    }

    /// Insert a user with a known id (fixtures, imports)
    pub fn insert(&self, record: UserRecord) -> Result<()> {
        self.lock()?.insert_user(&record);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreDocument>> {
        self.doc
            .lock()
            .map_err(|_| WatchError::Store("user store lock poisoned".to_string()))
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new("fall")
    }
}

impl UserStore for MemoryUserStore {
    fn users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.lock()?.users())
    }

    fn term(&self) -> Result<String> {
        Ok(self.lock()?.term().to_string())
    }

    fn course_name(&self, course: &CourseRef) -> Result<Option<String>> {
        Ok(self.lock()?.course_name(course))
    }

    fn remember_course_name(&self, course: &CourseRef, name: &str) -> Result<()> {
        self.lock()?.remember_course_name(course, name);
        Ok(())
    }

    fn add_user(&self, name: &str) -> Result<UserRecord> {
        let record = UserRecord::generate(name);
        self.lock()?.insert_user(&record);
        Ok(record)
    }

    fn add_course(&self, user: &UserId, crn: &Crn) -> Result<()> {
        self.lock()?.add_course(user, crn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_with_fixed_id() {
        let store = MemoryUserStore::default();
        store
            .insert(UserRecord {
                id: UserId::from("fixed"),
                name: "Gus".to_string(),
                ntfy_topic: None,
                logfile: None,
                courses: vec![Crn::from("1")],
            })
            .unwrap();

        let courses = store.tracked_courses(&UserId::from("fixed")).unwrap();
        assert_eq!(courses.len(), 1);
        assert!(courses[0].term().as_str().ends_with("08"));
    }

    #[test]
    fn test_invalid_term_surfaces() {
        let store = MemoryUserStore::new("winter");
        let record = store.add_user("Hal").unwrap();
        let err = store.tracked_courses(&record.id).unwrap_err();
        assert!(matches!(err, WatchError::InvalidTerm(_)));
    }
}

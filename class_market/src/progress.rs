//! Lesson completion, kept locally per user and course.

use crate::{
    models::Course,
    store::{LocalStore, StoreResult},
};
use log::warn;
use std::{collections::BTreeSet, sync::Arc};

/// A lesson's position in a course outline: (module index, lesson index).
pub type LessonRef = (usize, usize);

pub struct ProgressStore {
    store: Arc<dyn LocalStore>,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    fn key(email: &str, course_id: &str) -> String {
        format!("progress:{}:{}", email.trim().to_lowercase(), course_id)
    }

    pub fn completed(&self, email: &str, course_id: &str) -> BTreeSet<LessonRef> {
        let Some(raw) = self.store.get(&Self::key(email, course_id)) else {
            return BTreeSet::new();
        };
        serde_json::from_str::<Vec<LessonRef>>(&raw)
            .map(|v| v.into_iter().collect())
            .unwrap_or_else(|e| {
                warn!("Discarding unreadable progress for {}: {}", course_id, e);
                BTreeSet::new()
            })
    }

    /// Toggle a lesson; returns whether it is now complete.
    pub fn toggle(&self, email: &str, course_id: &str, lesson: LessonRef) -> StoreResult<bool> {
        let mut done = self.completed(email, course_id);
        let now_complete = if done.remove(&lesson) {
            false
        } else {
            done.insert(lesson);
            true
        };
        self.save(email, course_id, &done)?;
        Ok(now_complete)
    }

    /// Completed share of the course's lessons, as a whole percentage.
    /// Entries pointing past the current outline are ignored.
    pub fn percent(&self, email: &str, course: &Course) -> u8 {
        let total: usize = course.modules.iter().map(|m| m.lessons.len()).sum();
        if total == 0 {
            return 0;
        }
        let done = self
            .completed(email, &course.id)
            .into_iter()
            .filter(|(m, l)| course.modules.get(*m).is_some_and(|module| *l < module.lessons.len()))
            .count();
        ((done * 100) / total).min(100) as u8
    }

    fn save(&self, email: &str, course_id: &str, done: &BTreeSet<LessonRef>) -> StoreResult<()> {
        let key = Self::key(email, course_id);
        if done.is_empty() {
            return self.store.remove(&key);
        }
        let list: Vec<&LessonRef> = done.iter().collect();
        self.store.set(&key, &serde_json::to_string(&list)?)
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown lesson status: {0}")]
pub struct ParseStatusError(pub String);

/// Completion state of a single lesson for one learner.
///
/// `Completed` is terminal: nothing in this crate moves a lesson out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::NotStarted => "not_started",
            LessonStatus::InProgress => "in_progress",
            LessonStatus::Completed => "completed",
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, LessonStatus::Completed)
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Per-lesson status snapshot for one learner and one course.
///
/// Lessons without an entry are `NotStarted`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonProgress {
    statuses: BTreeMap<LessonId, LessonStatus>,
}

impl LessonProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(lesson, status)` pairs.
    ///
    /// A lesson listed more than once keeps `Completed` if any entry says so.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (LessonId, LessonStatus)>) -> Self {
        let mut progress = Self::new();
        for (lesson, status) in entries {
            progress.record(lesson, status);
        }
        progress
    }

    fn record(&mut self, lesson: LessonId, status: LessonStatus) {
        let slot = self.statuses.entry(lesson).or_default();
        if !slot.is_completed() {
            *slot = status;
        }
    }

    /// Status of `lesson`; absence means not started.
    #[must_use]
    pub fn status_of(&self, lesson: LessonId) -> LessonStatus {
        self.statuses.get(&lesson).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_completed(&self, lesson: LessonId) -> bool {
        self.status_of(lesson).is_completed()
    }

    /// Returns a copy with `lesson` marked completed. Idempotent.
    #[must_use]
    pub fn mark_complete(&self, lesson: LessonId) -> Self {
        let mut next = self.clone();
        next.statuses.insert(lesson, LessonStatus::Completed);
        next
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Recorded entries in lesson id order.
    pub fn iter(&self) -> impl Iterator<Item = (LessonId, LessonStatus)> + '_ {
        self.statuses.iter().map(|(id, status)| (*id, *status))
    }
}

/// `round(100 * part / whole)` with halves rounded up, and 0 for an empty whole.
///
/// `part` is clamped to `whole` so the result never exceeds 100.
#[must_use]
pub fn percent_of(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    let whole = whole as u128;
    let rounded = (200 * part + whole) / (2 * whole);
    u8::try_from(rounded).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_lesson_is_not_started() {
        let progress = LessonProgress::new();
        assert_eq!(progress.status_of(LessonId::new(5)), LessonStatus::NotStarted);
    }

    #[test]
    fn mark_complete_is_idempotent_and_leaves_before_untouched() {
        let before = LessonProgress::from_entries([(LessonId::new(1), LessonStatus::InProgress)]);
        let once = before.mark_complete(LessonId::new(2));
        let twice = once.mark_complete(LessonId::new(2));

        assert_eq!(once, twice);
        assert_eq!(before.status_of(LessonId::new(2)), LessonStatus::NotStarted);
        assert_eq!(twice.status_of(LessonId::new(1)), LessonStatus::InProgress);
    }

    #[test]
    fn completed_entries_do_not_regress() {
        let progress = LessonProgress::from_entries([
            (LessonId::new(1), LessonStatus::Completed),
            (LessonId::new(1), LessonStatus::InProgress),
        ]);
        assert_eq!(progress.status_of(LessonId::new(1)), LessonStatus::Completed);
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in [
            LessonStatus::NotStarted,
            LessonStatus::InProgress,
            LessonStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<LessonStatus>().unwrap(), status);
        }
        assert!("done".parse::<LessonStatus>().is_err());
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(1, 8), 13); // 12.5
        assert_eq!(percent_of(1, 200), 1); // 0.5
        assert_eq!(percent_of(3, 3), 100);
    }

    #[test]
    fn percent_of_empty_whole_is_zero() {
        assert_eq!(percent_of(0, 0), 0);
        assert_eq!(percent_of(4, 0), 0);
    }
}

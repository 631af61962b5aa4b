//! Lesson sequencing and progress over a course snapshot.
//!
//! Every function here is pure: it reads an immutable `Course` (and
//! optionally a `LessonProgress`) and returns borrowed views into it.
//! The canonical order is module-major, lesson-minor; modules without
//! lessons contribute nothing to it.

use thiserror::Error;

use crate::model::{
    Course, CourseId, Lesson, LessonId, LessonProgress, LessonStatus, Module, ModuleId,
    percent_of,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("lesson {lesson} not found in course {course}")]
    LessonNotFound { course: CourseId, lesson: LessonId },

    #[error("lesson {lesson} is not part of module {module} in course {course}")]
    PositionNotFound {
        course: CourseId,
        module: ModuleId,
        lesson: LessonId,
    },
}

/// A lesson together with the module that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonRef<'a> {
    pub module: &'a Module,
    pub lesson: &'a Lesson,
}

impl LessonRef<'_> {
    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            module: self.module.id(),
            lesson: self.lesson.id(),
        }
    }
}

/// Result of `locate`: the lesson, its module, and its index in `flatten` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'a> {
    pub module: &'a Module,
    pub lesson: &'a Lesson,
    pub index: usize,
}

impl<'a> Located<'a> {
    #[must_use]
    pub fn lesson_ref(&self) -> LessonRef<'a> {
        LessonRef {
            module: self.module,
            lesson: self.lesson,
        }
    }
}

/// The learner's location in a course, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub module: ModuleId,
    pub lesson: LessonId,
}

/// Completed/total counts for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleProgress {
    pub module: ModuleId,
    pub completed: usize,
    pub total: usize,
}

impl ModuleProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

fn lessons(course: &Course) -> impl DoubleEndedIterator<Item = LessonRef<'_>> {
    course.modules().iter().flat_map(|module| {
        module
            .lessons()
            .iter()
            .map(move |lesson| LessonRef { module, lesson })
    })
}

/// All lessons of `course` in canonical order.
#[must_use]
pub fn flatten(course: &Course) -> Vec<LessonRef<'_>> {
    lessons(course).collect()
}

/// Find `lesson` in `course`.
///
/// # Errors
///
/// Returns `NavigationError::LessonNotFound` if the lesson is not part of the course.
pub fn locate(course: &Course, lesson: LessonId) -> Result<Located<'_>, NavigationError> {
    lessons(course)
        .enumerate()
        .find(|(_, r)| r.lesson.id() == lesson)
        .map(|(index, r)| Located {
            module: r.module,
            lesson: r.lesson,
            index,
        })
        .ok_or(NavigationError::LessonNotFound {
            course: course.id(),
            lesson,
        })
}

/// Check that `position` names a lesson inside the module it claims.
///
/// # Errors
///
/// Returns `NavigationError::PositionNotFound` otherwise.
pub fn resolve(course: &Course, position: Position) -> Result<Located<'_>, NavigationError> {
    match locate(course, position.lesson) {
        Ok(found) if found.module.id() == position.module => Ok(found),
        _ => Err(NavigationError::PositionNotFound {
            course: course.id(),
            module: position.module,
            lesson: position.lesson,
        }),
    }
}

/// Lesson after `current`, crossing module boundaries. `None` at the end of the course.
///
/// # Errors
///
/// Returns `NavigationError::LessonNotFound` if `current` is not part of the course.
pub fn next(course: &Course, current: LessonId) -> Result<Option<LessonRef<'_>>, NavigationError> {
    let found = locate(course, current)?;
    Ok(lessons(course).nth(found.index + 1))
}

/// Lesson before `current`, crossing module boundaries. `None` at the start of the course.
///
/// # Errors
///
/// Returns `NavigationError::LessonNotFound` if `current` is not part of the course.
pub fn previous(
    course: &Course,
    current: LessonId,
) -> Result<Option<LessonRef<'_>>, NavigationError> {
    let found = locate(course, current)?;
    Ok(found
        .index
        .checked_sub(1)
        .and_then(|index| lessons(course).nth(index)))
}

/// Where a freshly opened course starts. `None` when no module has lessons.
#[must_use]
pub fn first(course: &Course) -> Option<LessonRef<'_>> {
    lessons(course).next()
}

/// Final lesson in canonical order, skipping trailing empty modules.
#[must_use]
pub fn last(course: &Course) -> Option<LessonRef<'_>> {
    lessons(course).next_back()
}

/// Status lookup; unknown lessons are `NotStarted`.
#[must_use]
pub fn status_of(progress: &LessonProgress, lesson: LessonId) -> LessonStatus {
    progress.status_of(lesson)
}

/// Local mirror of the remote "mark complete" effect.
#[must_use]
pub fn mark_complete(progress: &LessonProgress, lesson: LessonId) -> LessonProgress {
    progress.mark_complete(lesson)
}

/// Number of the course's lessons that are completed. Entries for foreign lessons are ignored.
#[must_use]
pub fn completed_count(course: &Course, progress: &LessonProgress) -> usize {
    lessons(course)
        .filter(|r| progress.is_completed(r.lesson.id()))
        .count()
}

/// Rounded completion percentage, 0 for a course without lessons.
#[must_use]
pub fn percent_complete(course: &Course, progress: &LessonProgress) -> u8 {
    percent_of(completed_count(course, progress), course.lesson_count())
}

/// Completed and total lesson counts per module, in module order.
///
/// Empty modules report `0/0` and never count as complete.
#[must_use]
pub fn module_progress(course: &Course, progress: &LessonProgress) -> Vec<ModuleProgress> {
    course
        .modules()
        .iter()
        .map(|module| ModuleProgress {
            module: module.id(),
            completed: module
                .lessons()
                .iter()
                .filter(|l| progress.is_completed(l.id()))
                .count(),
            total: module.lessons().len(),
        })
        .collect()
}

/// Sum of estimated lesson durations. Saturates instead of overflowing.
#[must_use]
pub fn total_duration_minutes(course: &Course) -> u32 {
    course
        .modules()
        .iter()
        .map(Module::duration_minutes)
        .fold(0, u32::saturating_add)
}

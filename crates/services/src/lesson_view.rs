use std::sync::Arc;

use api::{ApiError, CourseRepository, ProgressRepository};
use course_core::model::{Course, CourseId, LessonId, LessonProgress, LessonStatus, ModuleId};
use course_core::navigation::{self, LessonRef, ModuleProgress, Position};
use tracing::{debug, info};

use crate::error::LessonViewError;
use crate::snapshot::{SlotUpdate, SnapshotSlot};

/// State of one open course-lesson page.
///
/// The course is fixed for the life of the view; progress is replaced
/// wholesale whenever a re-fetch lands.
pub struct LessonView {
    course: Arc<Course>,
    progress: SnapshotSlot<LessonProgress>,
    position: Option<Position>,
}

impl LessonView {
    #[must_use]
    pub fn new(course: Course, progress: LessonProgress) -> Self {
        let position = navigation::first(&course).map(|r| r.position());
        Self {
            course: Arc::new(course),
            progress: SnapshotSlot::new(progress),
            position,
        }
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn progress(&self) -> Arc<LessonProgress> {
        self.progress.current()
    }

    /// `None` only for a course without lessons.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    #[must_use]
    pub fn current(&self) -> Option<LessonRef<'_>> {
        let position = self.position?;
        navigation::resolve(&self.course, position)
            .ok()
            .map(|found| found.lesson_ref())
    }

    #[must_use]
    pub fn peek_next(&self) -> Option<LessonRef<'_>> {
        let position = self.position?;
        navigation::next(&self.course, position.lesson).ok().flatten()
    }

    #[must_use]
    pub fn peek_previous(&self) -> Option<LessonRef<'_>> {
        let position = self.position?;
        navigation::previous(&self.course, position.lesson)
            .ok()
            .flatten()
    }

    /// Move forward. Returns `None` (and stays put) at the last lesson.
    pub fn go_next(&mut self) -> Option<LessonRef<'_>> {
        let target = self.peek_next()?.position();
        self.position = Some(target);
        self.current()
    }

    /// Move back. Returns `None` (and stays put) at the first lesson.
    pub fn go_previous(&mut self) -> Option<LessonRef<'_>> {
        let target = self.peek_previous()?.position();
        self.position = Some(target);
        self.current()
    }

    /// Jump to a lesson chosen from the outline.
    ///
    /// # Errors
    ///
    /// Returns `LessonViewError::Navigation` if the lesson is not in this course.
    pub fn go_to(&mut self, lesson: LessonId) -> Result<LessonRef<'_>, LessonViewError> {
        let target = navigation::locate(&self.course, lesson)?.lesson_ref().position();
        self.position = Some(target);
        Ok(navigation::resolve(&self.course, target)?.lesson_ref())
    }

    #[must_use]
    pub fn status_of(&self, lesson: LessonId) -> LessonStatus {
        navigation::status_of(&self.progress.current(), lesson)
    }

    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        navigation::percent_complete(&self.course, &self.progress.current())
    }

    #[must_use]
    pub fn module_progress(&self) -> Vec<ModuleProgress> {
        navigation::module_progress(&self.course, &self.progress.current())
    }

    /// True when positioned on the course's last lesson.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.position.is_some() && self.peek_next().is_none()
    }

    /// Module whose quiz is offered: the current one, once the learner has
    /// reached the final lesson.
    #[must_use]
    pub fn quiz_module(&self) -> Option<ModuleId> {
        if self.is_at_end() {
            self.position.map(|p| p.module)
        } else {
            None
        }
    }

    /// Unmount the view; fetches still in flight will be discarded.
    pub fn close(&self) {
        self.progress.unmount();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.progress.is_mounted()
    }
}

// The progress endpoints answer 403 to learners who are not enrolled.
fn scoped(course: CourseId, err: ApiError) -> LessonViewError {
    if err.is_forbidden() {
        LessonViewError::NotEnrolled(course)
    } else {
        LessonViewError::Api(err)
    }
}

/// Loads lesson views and performs the mark-complete round trip.
#[derive(Clone)]
pub struct LessonViewService {
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl LessonViewService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { courses, progress }
    }

    /// Fetch the course and the learner's progress together and open on the first lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonViewError::NotEnrolled` if the learner has not joined the
    /// course, or `LessonViewError::Api` if either fetch fails.
    pub async fn open(&self, course_id: CourseId) -> Result<LessonView, LessonViewError> {
        let (course, progress) = tokio::try_join!(
            self.courses.get_course(course_id),
            self.progress.get_progress(course_id),
        )
        .map_err(|e| scoped(course_id, e))?;
        info!(
            course = %course_id,
            lessons = course.lesson_count(),
            "opened lesson view"
        );
        Ok(LessonView::new(course, progress))
    }

    /// Re-fetch progress and hand it to the view.
    ///
    /// # Errors
    ///
    /// Returns `LessonViewError::Api` if the fetch fails.
    pub async fn refresh_progress(&self, view: &LessonView) -> Result<SlotUpdate, LessonViewError> {
        let course_id = view.course().id();
        let ticket = view.progress.begin();
        let fetched = self
            .progress
            .get_progress(course_id)
            .await
            .map_err(|e| scoped(course_id, e))?;
        Ok(view.progress.apply(ticket, fetched))
    }

    /// Mark `lesson` completed remotely, then re-fetch progress.
    ///
    /// # Errors
    ///
    /// Returns `LessonViewError::Navigation` if the lesson is not in the view's
    /// course, or `LessonViewError::Api` if the update or the re-fetch fails.
    pub async fn mark_complete(
        &self,
        view: &LessonView,
        lesson: LessonId,
    ) -> Result<SlotUpdate, LessonViewError> {
        navigation::locate(view.course(), lesson)?;
        debug!(lesson = %lesson, "marking lesson complete");
        self.progress
            .update_lesson_progress(lesson, LessonStatus::Completed)
            .await
            .map_err(|e| scoped(view.course().id(), e))?;
        self.refresh_progress(view).await
    }

    /// # Errors
    ///
    /// Returns `LessonViewError::NoCurrentLesson` for a course without lessons,
    /// otherwise as `mark_complete`.
    pub async fn mark_current_complete(
        &self,
        view: &LessonView,
    ) -> Result<SlotUpdate, LessonViewError> {
        let lesson = view
            .position()
            .ok_or(LessonViewError::NoCurrentLesson)?
            .lesson;
        self.mark_complete(view, lesson).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{Lesson, LessonContent, Module, ModuleId};

    fn view() -> LessonView {
        let lesson = |id: u64| {
            Lesson::new(
                LessonId::new(id),
                format!("L{id}"),
                LessonContent::Text("t".into()),
                5,
            )
        };
        let course = Course::new(
            CourseId::new(1),
            "C",
            vec![
                Module::new(ModuleId::new(1), "M1", vec![lesson(1), lesson(2)]),
                Module::new(ModuleId::new(2), "M2", vec![]),
                Module::new(ModuleId::new(3), "M3", vec![lesson(3)]),
            ],
        )
        .unwrap();
        LessonView::new(course, LessonProgress::new())
    }

    #[test]
    fn opens_on_first_lesson() {
        let v = view();
        assert_eq!(
            v.position(),
            Some(Position {
                module: ModuleId::new(1),
                lesson: LessonId::new(1)
            })
        );
        assert!(v.peek_previous().is_none());
        assert!(!v.is_at_end());
    }

    #[test]
    fn walks_forward_and_back_across_empty_module() {
        let mut v = view();
        assert_eq!(v.go_next().unwrap().lesson.id(), LessonId::new(2));
        let third = v.go_next().unwrap();
        assert_eq!(third.module.id(), ModuleId::new(3));
        assert!(v.is_at_end());
        assert_eq!(v.quiz_module(), Some(ModuleId::new(3)));
        assert!(v.go_next().is_none());
        assert_eq!(v.position().unwrap().lesson, LessonId::new(3));

        assert_eq!(v.go_previous().unwrap().lesson.id(), LessonId::new(2));
        assert_eq!(v.quiz_module(), None);
    }

    #[test]
    fn go_to_foreign_lesson_fails_and_keeps_position() {
        let mut v = view();
        let err = v.go_to(LessonId::new(99)).unwrap_err();
        assert!(matches!(err, LessonViewError::Navigation(_)));
        assert_eq!(v.position().unwrap().lesson, LessonId::new(1));

        assert_eq!(v.go_to(LessonId::new(3)).unwrap().lesson.id(), LessonId::new(3));
    }

    #[test]
    fn empty_course_has_no_position() {
        let course = Course::new(
            CourseId::new(2),
            "Empty",
            vec![Module::new(ModuleId::new(1), "M", vec![])],
        )
        .unwrap();
        let mut v = LessonView::new(course, LessonProgress::new());
        assert!(v.current().is_none());
        assert!(v.go_next().is_none());
        assert!(v.go_previous().is_none());
        assert!(!v.is_at_end());
        assert_eq!(v.quiz_module(), None);
        assert_eq!(v.percent_complete(), 0);
    }
}

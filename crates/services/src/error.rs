//! Shared error types for the services crate.

use thiserror::Error;

use api::{ApiError, SessionStoreError};
use course_core::model::{CourseId, QuizError};
use course_core::navigation::NavigationError;

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

/// Errors emitted by `LessonViewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonViewError {
    #[error("course has no lessons")]
    NoCurrentLesson,
    #[error("not enrolled in course {0}")]
    NotEnrolled(CourseId),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("course not found")]
    UnknownCourse,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("this module has no quiz")]
    NoQuiz,
    #[error(transparent)]
    Answers(#[from] QuizError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

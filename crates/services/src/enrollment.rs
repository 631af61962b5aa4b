use std::sync::Arc;

use api::{ApiError, EnrollmentRepository};
use course_core::model::{CourseFilter, CourseId, Enrollment};
use tracing::info;

use crate::error::EnrollmentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled,
    /// The server already had the learner on the course.
    AlreadyEnrolled,
}

/// Joins courses and lists the learner's enrollments.
#[derive(Clone)]
pub struct EnrollmentService {
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(enrollments: Arc<dyn EnrollmentRepository>) -> Self {
        Self { enrollments }
    }

    /// Enroll in `course`. Enrolling twice is reported, not treated as a failure.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::UnknownCourse` if the course does not exist,
    /// or `EnrollmentError::Api` for other failures.
    pub async fn enroll(&self, course: CourseId) -> Result<EnrollOutcome, EnrollmentError> {
        match self.enrollments.enroll(course).await {
            Ok(()) => {
                info!(course = %course, "enrolled");
                Ok(EnrollOutcome::Enrolled)
            }
            Err(err) if err.is_conflict() => Ok(EnrollOutcome::AlreadyEnrolled),
            Err(ApiError::NotFound) => Err(EnrollmentError::UnknownCourse),
            Err(err) => Err(err.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::Api` if the list cannot be fetched.
    pub async fn my_courses(&self, filter: CourseFilter) -> Result<Vec<Enrollment>, EnrollmentError> {
        let all = self.enrollments.my_courses().await?;
        Ok(filter.apply(all))
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::Api` if the list cannot be fetched.
    pub async fn is_enrolled(&self, course: CourseId) -> Result<bool, EnrollmentError> {
        let all = self.enrollments.my_courses().await?;
        Ok(all.iter().any(|e| e.course == course))
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CourseId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown enrollment status: {0}")]
pub struct ParseEnrollmentStatusError(pub String);

/// Where a learner stands in a course they signed up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    Completed,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = ParseEnrollmentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "enrolled" => Ok(Self::Enrolled),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnrollmentStatusError(other.to_string())),
        }
    }
}

/// One row of the learner's "my courses" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub course: CourseId,
    pub title: String,
    pub category: Option<String>,
    pub status: EnrollmentStatus,
    pub progress_percentage: u8,
}

/// Tabs of the "my courses" page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseFilter {
    #[default]
    All,
    InProgress,
    Completed,
}

impl CourseFilter {
    #[must_use]
    pub fn matches(self, enrollment: &Enrollment) -> bool {
        match self {
            CourseFilter::All => true,
            CourseFilter::InProgress => enrollment.status == EnrollmentStatus::Enrolled,
            CourseFilter::Completed => enrollment.status == EnrollmentStatus::Completed,
        }
    }

    /// Keep the enrollments this tab shows, in their original order.
    #[must_use]
    pub fn apply(self, enrollments: Vec<Enrollment>) -> Vec<Enrollment> {
        enrollments.into_iter().filter(|e| self.matches(e)).collect()
    }
}

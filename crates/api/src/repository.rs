use async_trait::async_trait;
use course_core::model::{
    Answer, AttemptId, AuthToken, Course, CourseId, Enrollment, LessonId, LessonProgress,
    LessonStatus, ModuleId, Quiz, QuizId, QuizScore, Role, User,
};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the remote API collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("request failed with status {status}{}", detail(.message))]
    HttpStatus {
        status: reqwest::StatusCode,
        message: Option<String>,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(String),
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiError {
    pub(crate) fn status(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::HttpStatus {
            status,
            message: Some(message.into()),
        }
    }

    /// The server refused a signed-in caller (e.g. not enrolled in the course).
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::HttpStatus { status, .. } if *status == StatusCode::FORBIDDEN)
    }

    /// The request clashed with existing state (e.g. already enrolled).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::HttpStatus { status, .. } if *status == StatusCode::CONFLICT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Sign-up form. Admin accounts are never self-registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub role: Role,
}

/// Token and profile handed out by a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: AuthToken,
    pub user: User,
}

/// Course-fetch collaborator.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Fetch a full course snapshot (modules and lessons).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the course does not exist.
    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError>;
}

/// Progress-fetch and progress-update collaborators.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the learner's progress snapshot for a course.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the learner is not enrolled or the request fails.
    async fn get_progress(&self, course_id: CourseId) -> Result<LessonProgress, ApiError>;

    /// Persist a lesson status remotely.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown lessons, or other API errors.
    async fn update_lesson_progress(
        &self,
        lesson_id: LessonId,
        status: LessonStatus,
    ) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials.
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the account cannot be created.
    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError>;

    /// Resolve the user behind `token`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is unknown or expired.
    async fn me(&self, token: &AuthToken) -> Result<User, ApiError>;
}

/// Enrollment collaborator for the signed-in learner.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Sign the learner up for a course.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown courses and a conflict
    /// `ApiError::HttpStatus` when already enrolled.
    async fn enroll(&self, course_id: CourseId) -> Result<(), ApiError>;

    /// Courses the learner is enrolled in, with their progress.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn my_courses(&self) -> Result<Vec<Enrollment>, ApiError>;
}

/// Module quiz collaborator. Answers are graded remotely.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the module has no quiz.
    async fn quiz_for_module(&self, module_id: ModuleId) -> Result<Quiz, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown quizzes.
    async fn start_attempt(&self, quiz_id: QuizId) -> Result<AttemptId, ApiError>;

    /// Submit every answer of an attempt and get the graded score back.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown or already submitted attempts.
    async fn submit_answers(
        &self,
        attempt_id: AttemptId,
        answers: &[Answer],
    ) -> Result<QuizScore, ApiError>;
}

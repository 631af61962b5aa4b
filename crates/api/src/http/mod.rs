mod mapping;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use course_core::model::{
    Answer, AttemptId, AuthToken, Course, CourseId, Enrollment, LessonId, LessonProgress,
    LessonStatus, ModuleId, Quiz, QuizId, QuizScore, User,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::repository::{
    ApiError, AuthGrant, AuthRepository, CourseRepository, Credentials, EnrollmentRepository,
    ProgressRepository, QuizRepository, Registration,
};
use mapping::{
    AnswersBody, AttemptEnvelope, CourseEnvelope, ErrorBody, GrantDto, LoginBody, MyCoursesDto,
    ProgressDto, QuizEnvelope, RegisterBody, ScoreDto, StatusBody, UserEnvelope,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url: parsed,
            timeout,
        })
    }

    /// Reads `LEARN_API_URL` and `LEARN_API_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `LEARN_API_URL` is set to an unusable value.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = env::var("LEARN_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout_secs = env::var("LEARN_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(&base_url, Duration::from_secs(timeout_secs))
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// REST client for the course, progress, enrollment, quiz and auth endpoints.
///
/// The bearer token travels with the client value; `authorized` returns a
/// copy bound to a session token.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    config: ApiConfig,
    token: Option<AuthToken>,
}

impl HttpApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            token: None,
        })
    }

    #[must_use]
    pub fn authorized(&self, token: AuthToken) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            token: Some(token),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn with_auth(&self, builder: RequestBuilder, token: Option<&AuthToken>) -> RequestBuilder {
        match token.or(self.token.as_ref()) {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(|e| ApiError::Serialization(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        debug!(%url, "GET");
        self.send(self.with_auth(self.client.get(url), None)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        debug!(%url, "POST");
        let mut builder = self.with_auth(self.client.post(url), None);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await
    }

    // For endpoints whose success body carries nothing we use.
    async fn post_discarding<B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let url = self.config.endpoint(path);
        debug!(%url, "POST");
        let mut builder = self.with_auth(self.client.post(url), None);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        check_status(builder.send().await?).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        _ => {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error);
            Err(ApiError::HttpStatus { status, message })
        }
    }
}

#[async_trait]
impl CourseRepository for HttpApi {
    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError> {
        let envelope: CourseEnvelope = self.get(&format!("courses/{id}")).await?;
        envelope.course.into_course()
    }
}

#[async_trait]
impl ProgressRepository for HttpApi {
    async fn get_progress(&self, course_id: CourseId) -> Result<LessonProgress, ApiError> {
        let dto: ProgressDto = self.get(&format!("my/courses/{course_id}/progress")).await?;
        dto.into_progress()
    }

    async fn update_lesson_progress(
        &self,
        lesson_id: LessonId,
        status: LessonStatus,
    ) -> Result<(), ApiError> {
        debug!(%lesson_id, %status, "updating lesson progress");
        self.post_discarding(
            &format!("lessons/{lesson_id}/progress"),
            Some(&StatusBody { status }),
        )
        .await
    }
}

#[async_trait]
impl EnrollmentRepository for HttpApi {
    async fn enroll(&self, course_id: CourseId) -> Result<(), ApiError> {
        self.post_discarding::<()>(&format!("courses/{course_id}/enroll"), None)
            .await
    }

    async fn my_courses(&self) -> Result<Vec<Enrollment>, ApiError> {
        let dto: MyCoursesDto = self.get("my/courses").await?;
        dto.into_enrollments()
    }
}

#[async_trait]
impl QuizRepository for HttpApi {
    async fn quiz_for_module(&self, module_id: ModuleId) -> Result<Quiz, ApiError> {
        let envelope: QuizEnvelope = self.get(&format!("modules/{module_id}/quiz")).await?;
        envelope.quiz.into_quiz(module_id)
    }

    async fn start_attempt(&self, quiz_id: QuizId) -> Result<AttemptId, ApiError> {
        let envelope: AttemptEnvelope = self
            .post::<_, ()>(&format!("quizzes/{quiz_id}/attempts"), None)
            .await?;
        Ok(envelope.attempt_id())
    }

    async fn submit_answers(
        &self,
        attempt_id: AttemptId,
        answers: &[Answer],
    ) -> Result<QuizScore, ApiError> {
        let body = AnswersBody::from_answers(answers);
        let dto: ScoreDto = self
            .post(&format!("quiz-attempts/{attempt_id}/answers"), Some(&body))
            .await?;
        dto.into_score()
    }
}

#[async_trait]
impl AuthRepository for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let url = self.config.endpoint("auth/login");
        debug!(%url, "POST");
        let body = LoginBody {
            email: &credentials.email,
            password: &credentials.password,
        };
        let grant: GrantDto = self.send(self.client.post(url).json(&body)).await?;
        Ok(AuthGrant {
            token: AuthToken::new(grant.token),
            user: grant.user,
        })
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError> {
        let url = self.config.endpoint("auth/register");
        debug!(%url, "POST");
        let body = RegisterBody {
            name: &registration.name,
            email: &registration.email,
            password: &registration.password,
            bio: registration.bio.as_deref(),
            role: registration.role,
        };
        let grant: GrantDto = self.send(self.client.post(url).json(&body)).await?;
        Ok(AuthGrant {
            token: AuthToken::new(grant.token),
            user: grant.user,
        })
    }

    async fn me(&self, token: &AuthToken) -> Result<User, ApiError> {
        let url = self.config.endpoint("auth/me");
        debug!(%url, "GET");
        let envelope: UserEnvelope = self
            .send(self.with_auth(self.client.get(url), Some(token)))
            .await?;
        Ok(envelope.user)
    }
}

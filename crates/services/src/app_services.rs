use std::sync::Arc;

use api::{ApiConfig, HttpApi, SessionStore};
use course_core::Clock;
use course_core::model::Session;

use crate::enrollment::EnrollmentService;
use crate::error::AppServicesError;
use crate::lesson_view::LessonViewService;
use crate::quiz::QuizService;
use crate::session::SessionService;

/// Composition root: wires the HTTP collaborators into app-facing services.
#[derive(Clone)]
pub struct AppServices {
    api: HttpApi,
    sessions: Arc<SessionService>,
}

impl AppServices {
    /// # Errors
    ///
    /// Returns `AppServicesError::Api` if the HTTP client cannot be built.
    pub fn new_http(
        config: ApiConfig,
        store: Arc<dyn SessionStore>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let api = HttpApi::new(config)?;
        let sessions = Arc::new(SessionService::new(clock, Arc::new(api.clone()), store));
        Ok(Self { api, sessions })
    }

    /// Init step: bring back the stored session, if it is still valid.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Session` if the session store fails.
    pub async fn restore_session(&self) -> Result<Option<Session>, AppServicesError> {
        Ok(self.sessions.restore().await?)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    fn api_for(&self, session: Option<&Session>) -> Arc<HttpApi> {
        let api = match session {
            Some(session) => self.api.authorized(session.token().clone()),
            None => self.api.clone(),
        };
        Arc::new(api)
    }

    /// Lesson views that call the API on behalf of `session`.
    #[must_use]
    pub fn lesson_views(&self, session: Option<&Session>) -> LessonViewService {
        let api = self.api_for(session);
        LessonViewService::new(api.clone(), api)
    }

    #[must_use]
    pub fn enrollments(&self, session: &Session) -> EnrollmentService {
        EnrollmentService::new(self.api_for(Some(session)))
    }

    #[must_use]
    pub fn quizzes(&self, session: &Session) -> QuizService {
        QuizService::new(self.api_for(Some(session)))
    }

    #[must_use]
    pub fn api_config(&self) -> &ApiConfig {
        self.api.config()
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use course_core::model::{
    Answer, AttemptId, AuthToken, Course, CourseId, Enrollment, EnrollmentStatus, LessonId,
    LessonProgress, LessonStatus, ModuleId, OptionId, QuestionId, Quiz, QuizId, QuizScore, User,
    UserId,
};
use course_core::navigation;
use reqwest::StatusCode;

use crate::repository::{
    ApiError, AuthGrant, AuthRepository, CourseRepository, Credentials, EnrollmentRepository,
    ProgressRepository, QuizRepository, Registration,
};

/// Expected answers for one quiz, used by `InMemoryApi` to grade attempts.
#[derive(Debug, Clone, Default)]
pub struct QuizKey {
    options: HashMap<QuestionId, BTreeSet<OptionId>>,
    texts: HashMap<QuestionId, String>,
}

impl QuizKey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A choice question is right when exactly these options are selected.
    #[must_use]
    pub fn options(mut self, question: QuestionId, correct: impl IntoIterator<Item = OptionId>) -> Self {
        self.options.insert(question, correct.into_iter().collect());
        self
    }

    /// A short-text question is right when the answer matches, ignoring case
    /// and surrounding whitespace.
    #[must_use]
    pub fn text(mut self, question: QuestionId, expected: impl Into<String>) -> Self {
        self.texts.insert(question, expected.into());
        self
    }

    fn is_correct(&self, question: QuestionId, answers: &[&Answer]) -> bool {
        if let Some(expected) = self.options.get(&question) {
            let chosen: BTreeSet<OptionId> = answers
                .iter()
                .filter_map(|a| match a {
                    Answer::Choice { option, .. } => Some(*option),
                    Answer::Text { .. } => None,
                })
                .collect();
            return chosen == *expected;
        }
        let Some(expected) = self.texts.get(&question) else {
            return false;
        };
        matches!(
            answers,
            [Answer::Text { text, .. }] if text.trim().eq_ignore_ascii_case(expected.trim())
        )
    }
}

#[derive(Default)]
struct InMemoryState {
    courses: HashMap<CourseId, Course>,
    // An entry here is the enrollment.
    progress: BTreeMap<CourseId, LessonProgress>,
    quizzes: HashMap<QuizId, (Quiz, QuizKey)>,
    attempts: HashMap<AttemptId, QuizId>,
    accounts: HashMap<String, (String, User)>,
    tokens: HashMap<String, UserId>,
    next_user_id: u64,
    next_token: u64,
    next_attempt: u64,
}

impl InMemoryState {
    fn course_of_lesson(&self, lesson: LessonId) -> Option<CourseId> {
        self.courses
            .values()
            .find(|c| c.contains_lesson(lesson))
            .map(Course::id)
    }

    fn enrolled_progress(&mut self, course_id: CourseId) -> Result<&mut LessonProgress, ApiError> {
        if !self.courses.contains_key(&course_id) {
            return Err(ApiError::NotFound);
        }
        self.progress
            .get_mut(&course_id)
            .ok_or_else(|| ApiError::status(StatusCode::FORBIDDEN, "not enrolled"))
    }
}

/// In-memory stand-in for the remote API, for tests and offline demos.
///
/// Serves a single learner: progress and enrollments are not keyed by user.
#[derive(Clone, Default)]
pub struct InMemoryApi {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, ApiError> {
        self.state
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))
    }

    /// Seed or replace a course. The learner is not enrolled in it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the state lock is poisoned.
    pub fn insert_course(&self, course: Course) -> Result<(), ApiError> {
        self.lock()?.courses.insert(course.id(), course);
        Ok(())
    }

    /// Seed a progress snapshot for a course, enrolling the learner.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the state lock is poisoned.
    pub fn set_progress(&self, course_id: CourseId, progress: LessonProgress) -> Result<(), ApiError> {
        self.lock()?.progress.insert(course_id, progress);
        Ok(())
    }

    /// Attach a quiz to its module, with the answers it is graded against.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the state lock is poisoned.
    pub fn insert_quiz(&self, quiz: Quiz, key: QuizKey) -> Result<(), ApiError> {
        self.lock()?.quizzes.insert(quiz.id(), (quiz, key));
        Ok(())
    }

    /// Drop every issued token, as a server-side session expiry would.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the state lock is poisoned.
    pub fn revoke_tokens(&self) -> Result<(), ApiError> {
        self.lock()?.tokens.clear();
        Ok(())
    }

    // Tokens come from a counter that never rewinds, so a revoked token is never reissued.
    fn issue_token(state: &mut InMemoryState, user: &User) -> AuthToken {
        state.next_token += 1;
        let token = format!("token-{}-{}", user.id, state.next_token);
        state.tokens.insert(token.clone(), user.id);
        AuthToken::new(token)
    }
}

#[async_trait]
impl CourseRepository for InMemoryApi {
    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError> {
        self.lock()?.courses.get(&id).cloned().ok_or(ApiError::NotFound)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryApi {
    async fn get_progress(&self, course_id: CourseId) -> Result<LessonProgress, ApiError> {
        let mut guard = self.lock()?;
        let progress = guard.enrolled_progress(course_id)?.clone();
        Ok(progress)
    }

    async fn update_lesson_progress(
        &self,
        lesson_id: LessonId,
        status: LessonStatus,
    ) -> Result<(), ApiError> {
        let mut guard = self.lock()?;
        let course_id = guard
            .course_of_lesson(lesson_id)
            .ok_or(ApiError::NotFound)?;

        let current = guard.enrolled_progress(course_id)?;
        *current = match status {
            LessonStatus::Completed => current.mark_complete(lesson_id),
            other => LessonProgress::from_entries(
                current.iter().chain(std::iter::once((lesson_id, other))),
            ),
        };
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryApi {
    async fn enroll(&self, course_id: CourseId) -> Result<(), ApiError> {
        let mut guard = self.lock()?;
        if !guard.courses.contains_key(&course_id) {
            return Err(ApiError::NotFound);
        }
        if guard.progress.contains_key(&course_id) {
            return Err(ApiError::status(StatusCode::CONFLICT, "already enrolled"));
        }
        guard.progress.insert(course_id, LessonProgress::new());
        Ok(())
    }

    async fn my_courses(&self) -> Result<Vec<Enrollment>, ApiError> {
        let guard = self.lock()?;
        let rows = guard
            .progress
            .iter()
            .filter_map(|(id, progress)| {
                let course = guard.courses.get(id)?;
                let percent = navigation::percent_complete(course, progress);
                let status = if course.lesson_count() > 0 && percent == 100 {
                    EnrollmentStatus::Completed
                } else {
                    EnrollmentStatus::Enrolled
                };
                Some(Enrollment {
                    course: *id,
                    title: course.title().to_string(),
                    category: None,
                    status,
                    progress_percentage: percent,
                })
            })
            .collect();
        Ok(rows)
    }
}

#[async_trait]
impl QuizRepository for InMemoryApi {
    async fn quiz_for_module(&self, module_id: ModuleId) -> Result<Quiz, ApiError> {
        self.lock()?
            .quizzes
            .values()
            .map(|(quiz, _)| quiz)
            .find(|quiz| quiz.module() == module_id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn start_attempt(&self, quiz_id: QuizId) -> Result<AttemptId, ApiError> {
        let mut guard = self.lock()?;
        if !guard.quizzes.contains_key(&quiz_id) {
            return Err(ApiError::NotFound);
        }
        guard.next_attempt += 1;
        let attempt = AttemptId::new(guard.next_attempt);
        guard.attempts.insert(attempt, quiz_id);
        Ok(attempt)
    }

    async fn submit_answers(
        &self,
        attempt_id: AttemptId,
        answers: &[Answer],
    ) -> Result<QuizScore, ApiError> {
        let mut guard = self.lock()?;
        let quiz_id = guard
            .attempts
            .remove(&attempt_id)
            .ok_or(ApiError::NotFound)?;
        let (quiz, key) = guard.quizzes.get(&quiz_id).ok_or(ApiError::NotFound)?;

        let correct = quiz
            .questions()
            .iter()
            .filter(|question| {
                let given: Vec<&Answer> = answers
                    .iter()
                    .filter(|a| a.question() == question.id)
                    .collect();
                key.is_correct(question.id, &given)
            })
            .count();
        let total = quiz.questions().len();

        let to_u32 = |n: usize| u32::try_from(n).map_err(|e| ApiError::Serialization(e.to_string()));
        QuizScore::new(to_u32(correct)?, to_u32(total)?)
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl AuthRepository for InMemoryApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let mut guard = self.lock()?;
        let user = match guard.accounts.get(&credentials.email) {
            Some((password, user)) if *password == credentials.password => user.clone(),
            _ => return Err(ApiError::Unauthorized),
        };
        let token = Self::issue_token(&mut guard, &user);
        Ok(AuthGrant { token, user })
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError> {
        let mut guard = self.lock()?;
        if guard.accounts.contains_key(&registration.email) {
            return Err(ApiError::status(
                StatusCode::CONFLICT,
                "email already registered",
            ));
        }
        guard.next_user_id += 1;
        let user = User {
            id: UserId::new(guard.next_user_id),
            name: registration.name.clone(),
            email: registration.email.clone(),
            role: registration.role,
            bio: registration.bio.clone(),
        };
        guard.accounts.insert(
            registration.email.clone(),
            (registration.password.clone(), user.clone()),
        );
        let token = Self::issue_token(&mut guard, &user);
        Ok(AuthGrant { token, user })
    }

    async fn me(&self, token: &AuthToken) -> Result<User, ApiError> {
        let guard = self.lock()?;
        let user_id = guard
            .tokens
            .get(token.expose())
            .copied()
            .ok_or(ApiError::Unauthorized)?;
        guard
            .accounts
            .values()
            .map(|(_, user)| user)
            .find(|user| user.id == user_id)
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

use std::sync::Arc;

use api::{ApiError, QuizRepository};
use course_core::model::{Answer, ModuleId, Quiz, QuizScore};
use tracing::{debug, info};

use crate::error::QuizServiceError;

/// Loads module quizzes and runs one graded attempt per submission.
#[derive(Clone)]
pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { quizzes }
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::NoQuiz` if the module has no quiz, or
    /// `QuizServiceError::Api` for other failures.
    pub async fn load(&self, module: ModuleId) -> Result<Quiz, QuizServiceError> {
        self.quizzes
            .quiz_for_module(module)
            .await
            .map_err(|err| match err {
                ApiError::NotFound => QuizServiceError::NoQuiz,
                other => QuizServiceError::Api(other),
            })
    }

    /// Check `answers` locally, then start an attempt and submit them.
    ///
    /// Nothing is sent when the answers do not fit the quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Answers` for an incomplete or ill-formed
    /// submission, or `QuizServiceError::Api` if either request fails.
    pub async fn submit(
        &self,
        quiz: &Quiz,
        answers: &[Answer],
    ) -> Result<QuizScore, QuizServiceError> {
        quiz.check_answers(answers)?;
        let attempt = self.quizzes.start_attempt(quiz.id()).await?;
        debug!(quiz = %quiz.id(), attempt = %attempt, "attempt started");
        let score = self.quizzes.submit_answers(attempt, answers).await?;
        info!(
            quiz = %quiz.id(),
            correct = score.correct(),
            total = score.total(),
            passed = score.passed(),
            "quiz graded"
        );
        Ok(score)
    }
}

//! Wire shapes of the REST API and their conversion into domain types.

use course_core::model::{
    Answer, AnswerOption, AttemptId, ContentType, Course, CourseId, Enrollment, EnrollmentStatus,
    Lesson, LessonContent, LessonId, LessonProgress, LessonStatus, Module, ModuleId, OptionId,
    Question, QuestionId, QuestionKind, Quiz, QuizId, QuizScore, User,
};
use serde::{Deserialize, Serialize};

use crate::repository::ApiError;

fn ser<E: core::fmt::Display>(e: E) -> ApiError {
    ApiError::Serialization(e.to_string())
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseEnvelope {
    pub course: CourseDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub modules: Vec<ModuleDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LessonDto {
    pub id: u64,
    pub title: String,
    pub content_type: String,
    #[serde(default)]
    pub content_url_or_text: Option<String>,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
}

impl LessonDto {
    fn into_lesson(self) -> Result<Lesson, ApiError> {
        let kind: ContentType = self.content_type.parse().map_err(ser)?;
        let content = LessonContent::parse(kind, self.content_url_or_text.unwrap_or_default())
            .map_err(ser)?;
        Ok(Lesson::new(
            LessonId::new(self.id),
            self.title,
            content,
            self.estimated_duration_minutes.unwrap_or(0),
        ))
    }
}

impl CourseDto {
    pub(crate) fn into_course(self) -> Result<Course, ApiError> {
        let modules = self
            .modules
            .into_iter()
            .map(|m| {
                let lessons = m
                    .lessons
                    .into_iter()
                    .map(LessonDto::into_lesson)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Module::new(ModuleId::new(m.id), m.title, lessons))
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Course::new(CourseId::new(self.id), self.title, modules).map_err(ser)
    }
}

/// `GET /my/courses/{id}/progress` body: the course tree annotated with statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProgressDto {
    #[serde(default)]
    pub modules: Vec<ProgressModuleDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressModuleDto {
    #[serde(default)]
    pub lessons: Vec<ProgressLessonDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressLessonDto {
    pub id: u64,
    #[serde(default)]
    pub progress_status: Option<String>,
}

impl ProgressDto {
    /// Lessons without a status are left out, which reads back as not started.
    pub(crate) fn into_progress(self) -> Result<LessonProgress, ApiError> {
        let mut entries = Vec::new();
        for lesson in self.modules.into_iter().flat_map(|m| m.lessons) {
            if let Some(raw) = lesson.progress_status {
                let status: LessonStatus = raw.parse().map_err(ser)?;
                entries.push((LessonId::new(lesson.id), status));
            }
        }
        Ok(LessonProgress::from_entries(entries))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusBody {
    pub status: LessonStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<&'a str>,
    pub role: course_core::model::Role,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GrantDto {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

/// `GET /my/courses` body.
#[derive(Debug, Deserialize)]
pub(crate) struct MyCoursesDto {
    #[serde(default)]
    pub courses: Vec<EnrollmentDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
}

impl MyCoursesDto {
    pub(crate) fn into_enrollments(self) -> Result<Vec<Enrollment>, ApiError> {
        self.courses
            .into_iter()
            .map(|row| {
                let status: EnrollmentStatus = row.status.parse().map_err(ser)?;
                Ok(Enrollment {
                    course: CourseId::new(row.id),
                    title: row.title,
                    category: row.category,
                    status,
                    progress_percentage: clamp_percent(row.progress_percentage.unwrap_or(0.0)),
                })
            })
            .collect()
    }
}

// Servers report a float; NaN and out-of-range values are pinned to 0..=100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_percent(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// `GET /modules/{id}/quiz` body.
#[derive(Debug, Deserialize)]
pub(crate) struct QuizEnvelope {
    pub quiz: QuizDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizDto {
    pub id: u64,
    #[serde(default)]
    pub module_id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDto {
    pub id: u64,
    pub question_text: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Vec<OptionDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionDto {
    pub id: u64,
    pub option_text: String,
}

impl QuizDto {
    /// `requested` fills in the module when the body leaves it out.
    pub(crate) fn into_quiz(self, requested: ModuleId) -> Result<Quiz, ApiError> {
        let questions = self
            .questions
            .into_iter()
            .map(|q| {
                let kind: QuestionKind = q.kind.parse().map_err(ser)?;
                Ok(Question {
                    id: QuestionId::new(q.id),
                    text: q.question_text,
                    kind,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| AnswerOption {
                            id: OptionId::new(o.id),
                            text: o.option_text,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        let module = self.module_id.map_or(requested, ModuleId::new);
        Quiz::new(QuizId::new(self.id), module, self.title, questions).map_err(ser)
    }
}

/// `POST /quizzes/{id}/attempts` body.
#[derive(Debug, Deserialize)]
pub(crate) struct AttemptEnvelope {
    pub attempt: AttemptDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptDto {
    pub id: u64,
}

impl AttemptEnvelope {
    pub(crate) fn attempt_id(&self) -> AttemptId {
        AttemptId::new(self.attempt.id)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswersBody {
    pub answers: Vec<AnswerDto>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerDto {
    pub question_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
}

impl AnswersBody {
    pub(crate) fn from_answers(answers: &[Answer]) -> Self {
        let answers = answers
            .iter()
            .map(|answer| match answer {
                Answer::Choice { question, option } => AnswerDto {
                    question_id: question.value(),
                    selected_option_id: Some(option.value()),
                    answer_text: None,
                },
                Answer::Text { question, text } => AnswerDto {
                    question_id: question.value(),
                    selected_option_id: None,
                    answer_text: Some(text.clone()),
                },
            })
            .collect();
        Self { answers }
    }
}

/// Graded attempt. `score` is informational; the percentage is recomputed
/// from the counts.
#[derive(Debug, Deserialize)]
pub(crate) struct ScoreDto {
    pub correct_count: u32,
    pub total: u32,
}

impl ScoreDto {
    pub(crate) fn into_score(self) -> Result<QuizScore, ApiError> {
        QuizScore::new(self.correct_count, self.total).map_err(ser)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

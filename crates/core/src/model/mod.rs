mod course;
mod enrollment;
mod ids;
mod progress;
mod quiz;
mod user;

pub use ids::{
    AttemptId, CourseId, LessonId, ModuleId, OptionId, ParseIdError, QuestionId, QuizId, UserId,
};

pub use course::{ContentType, Course, CourseError, Lesson, LessonContent, Module};
pub use enrollment::{CourseFilter, Enrollment, EnrollmentStatus, ParseEnrollmentStatusError};
pub use progress::{LessonProgress, LessonStatus, ParseStatusError, percent_of};
pub use quiz::{
    Answer, AnswerOption, PASSING_PERCENTAGE, Question, QuestionKind, Quiz, QuizError, QuizScore,
    QuizScoreError,
};
pub use user::{AuthToken, ParseRoleError, Role, Session, User};

//! Module quizzes: questions, learner answers and the graded score.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ModuleId, OptionId, QuestionId, QuizId};
use crate::model::progress::percent_of;

/// Minimum rounded percentage that counts as a pass.
pub const PASSING_PERCENTAGE: u8 = 70;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizScoreError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Outcome of a submitted quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    correct: u32,
    total: u32,
}

impl QuizScore {
    /// # Errors
    ///
    /// Returns `QuizScoreError::CorrectExceedsTotal` when `correct > total`.
    pub fn new(correct: u32, total: u32) -> Result<Self, QuizScoreError> {
        if correct > total {
            return Err(QuizScoreError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self { correct, total })
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total - self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        percent_of(self.correct as usize, self.total as usize)
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.percentage() >= PASSING_PERCENTAGE
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("unknown question type: {0}")]
    UnknownKind(String),
    #[error("question {0} appears twice")]
    DuplicateQuestion(QuestionId),
    #[error("choice question {0} has no options")]
    MissingOptions(QuestionId),
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error("question {question} expects a {kind} answer")]
    WrongAnswerKind {
        question: QuestionId,
        kind: QuestionKind,
    },
    #[error("question {0} takes a single answer")]
    TooManyAnswers(QuestionId),
    #[error("answer to question {0} is empty")]
    EmptyAnswer(QuestionId),
    #[error("question {0} has no answer")]
    Unanswered(QuestionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    ShortText,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::ShortText => "short_text",
        }
    }

    #[must_use]
    pub fn is_choice(self) -> bool {
        !matches!(self, QuestionKind::ShortText)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single_choice" => Ok(Self::SingleChoice),
            "multiple_choice" => Ok(Self::MultipleChoice),
            "short_text" => Ok(Self::ShortText),
            other => Err(QuizError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<AnswerOption>,
}

impl Question {
    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// One learner answer. A multiple-choice question gets one `Choice` per
/// selected option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Choice {
        question: QuestionId,
        option: OptionId,
    },
    Text {
        question: QuestionId,
        text: String,
    },
}

impl Answer {
    #[must_use]
    pub fn question(&self) -> QuestionId {
        match self {
            Answer::Choice { question, .. } | Answer::Text { question, .. } => *question,
        }
    }
}

/// Quiz attached to a course module. Grading happens server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    module: ModuleId,
    title: String,
    questions: Vec<Question>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::DuplicateQuestion` when a question id repeats and
    /// `QuizError::MissingOptions` for a choice question without options.
    pub fn new(
        id: QuizId,
        module: ModuleId,
        title: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id) {
                return Err(QuizError::DuplicateQuestion(question.id));
            }
            if question.kind.is_choice() && question.options.is_empty() {
                return Err(QuizError::MissingOptions(question.id));
            }
        }
        Ok(Self {
            id,
            module,
            title: title.into(),
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Validate a submission before it is sent: every answer must fit its
    /// question and every question must be answered.
    ///
    /// # Errors
    ///
    /// Returns the first `QuizError` found, in answer order, then question order.
    pub fn check_answers(&self, answers: &[Answer]) -> Result<(), QuizError> {
        let mut counts: HashMap<QuestionId, usize> = HashMap::new();
        for answer in answers {
            let id = answer.question();
            let question = self.question(id).ok_or(QuizError::UnknownQuestion(id))?;
            match (answer, question.kind) {
                (Answer::Choice { option, .. }, kind) if kind.is_choice() => {
                    if question.option(*option).is_none() {
                        return Err(QuizError::UnknownOption {
                            question: id,
                            option: *option,
                        });
                    }
                }
                (Answer::Text { text, .. }, QuestionKind::ShortText) => {
                    if text.trim().is_empty() {
                        return Err(QuizError::EmptyAnswer(id));
                    }
                }
                (_, kind) => {
                    return Err(QuizError::WrongAnswerKind { question: id, kind });
                }
            }

            let count = counts.entry(id).or_default();
            *count += 1;
            if *count > 1 && question.kind != QuestionKind::MultipleChoice {
                return Err(QuizError::TooManyAnswers(id));
            }
        }

        match self.questions.iter().find(|q| !counts.contains_key(&q.id)) {
            Some(missing) => Err(QuizError::Unanswered(missing.id)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz() -> Quiz {
        let option = |id: u64| AnswerOption {
            id: OptionId::new(id),
            text: format!("option {id}"),
        };
        Quiz::new(
            QuizId::new(1),
            ModuleId::new(3),
            "Traits check",
            vec![
                Question {
                    id: QuestionId::new(1),
                    text: "Pick one".into(),
                    kind: QuestionKind::SingleChoice,
                    options: vec![option(10), option(11)],
                },
                Question {
                    id: QuestionId::new(2),
                    text: "Pick any".into(),
                    kind: QuestionKind::MultipleChoice,
                    options: vec![option(20), option(21), option(22)],
                },
                Question {
                    id: QuestionId::new(3),
                    text: "Explain".into(),
                    kind: QuestionKind::ShortText,
                    options: vec![],
                },
            ],
        )
        .unwrap()
    }

    fn choice(question: u64, option: u64) -> Answer {
        Answer::Choice {
            question: QuestionId::new(question),
            option: OptionId::new(option),
        }
    }

    fn text(question: u64, text: &str) -> Answer {
        Answer::Text {
            question: QuestionId::new(question),
            text: text.into(),
        }
    }

    #[test]
    fn complete_submission_passes_checks() {
        let quiz = sample_quiz();
        let answers = [choice(1, 10), choice(2, 20), choice(2, 22), text(3, "dyn")];
        assert_eq!(quiz.check_answers(&answers), Ok(()));
    }

    #[test]
    fn rejects_answers_that_do_not_fit() {
        let quiz = sample_quiz();
        let base = [choice(2, 20), text(3, "dyn")];

        let mut two_singles = base.to_vec();
        two_singles.extend([choice(1, 10), choice(1, 11)]);
        assert_eq!(
            quiz.check_answers(&two_singles),
            Err(QuizError::TooManyAnswers(QuestionId::new(1)))
        );

        assert_eq!(
            quiz.check_answers(&[choice(1, 20)]),
            Err(QuizError::UnknownOption {
                question: QuestionId::new(1),
                option: OptionId::new(20)
            })
        );
        assert_eq!(
            quiz.check_answers(&[text(1, "ten")]),
            Err(QuizError::WrongAnswerKind {
                question: QuestionId::new(1),
                kind: QuestionKind::SingleChoice
            })
        );
        assert_eq!(
            quiz.check_answers(&[text(3, "   ")]),
            Err(QuizError::EmptyAnswer(QuestionId::new(3)))
        );
        assert_eq!(
            quiz.check_answers(&[choice(9, 1)]),
            Err(QuizError::UnknownQuestion(QuestionId::new(9)))
        );
        assert_eq!(
            quiz.check_answers(&base),
            Err(QuizError::Unanswered(QuestionId::new(1)))
        );
    }

    #[test]
    fn construction_rejects_bad_question_sets() {
        let q = |id: u64, kind| Question {
            id: QuestionId::new(id),
            text: String::new(),
            kind,
            options: vec![],
        };
        assert_eq!(
            Quiz::new(
                QuizId::new(1),
                ModuleId::new(1),
                "Q",
                vec![q(1, QuestionKind::ShortText), q(1, QuestionKind::ShortText)]
            ),
            Err(QuizError::DuplicateQuestion(QuestionId::new(1)))
        );
        assert_eq!(
            Quiz::new(QuizId::new(1), ModuleId::new(1), "Q", vec![q(2, QuestionKind::SingleChoice)]),
            Err(QuizError::MissingOptions(QuestionId::new(2)))
        );
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let score = QuizScore::new(7, 10).unwrap();
        assert_eq!(score.percentage(), 70);
        assert!(score.passed());
        assert_eq!(score.incorrect(), 3);
    }

    #[test]
    fn rounding_can_push_over_threshold() {
        // 69.5% rounds to 70
        let score = QuizScore::new(139, 200).unwrap();
        assert!(score.passed());
        let score = QuizScore::new(2, 3).unwrap();
        assert_eq!(score.percentage(), 67);
        assert!(!score.passed());
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let score = QuizScore::new(0, 0).unwrap();
        assert_eq!(score.percentage(), 0);
        assert!(!score.passed());
    }

    #[test]
    fn rejects_more_correct_than_total() {
        assert_eq!(
            QuizScore::new(4, 3),
            Err(QuizScoreError::CorrectExceedsTotal { correct: 4, total: 3 })
        );
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use course_core::model::{
    Answer, CourseFilter, CourseId, LessonId, ModuleId, OptionId, QuestionId, Role,
};

#[derive(Debug, Parser)]
#[command(name = "learn", version, about = "Course progress and lesson navigation")]
pub struct Cli {
    /// Base URL of the learning API.
    #[arg(long, env = "LEARN_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Where the signed-in session is kept between runs.
    #[arg(
        long,
        env = "LEARN_SESSION_FILE",
        default_value = ".learn-session.json",
        global = true
    )]
    pub session_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Show where a path would take the current user.
    Route { path: String },
    /// Open a course and show the current lesson.
    Course(CourseArgs),
    /// Mark a lesson completed.
    Complete { course: CourseId, lesson: LessonId },
    /// Join a course.
    Enroll { course: CourseId },
    /// List the courses you are enrolled in.
    MyCourses {
        #[arg(long, value_enum, default_value_t = CoursesTab::All)]
        filter: CoursesTab,
    },
    /// Show a module quiz, or answer it.
    Quiz(QuizArgs),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long, value_enum, default_value_t = SignupRole::Trainee)]
    pub role: SignupRole,
}

#[derive(Debug, Args)]
pub struct CourseArgs {
    pub course: CourseId,
    /// Jump to this lesson before moving.
    #[arg(long)]
    pub lesson: Option<LessonId>,
    #[arg(long, conflicts_with = "previous")]
    pub next: bool,
    #[arg(long)]
    pub previous: bool,
}

#[derive(Debug, Args)]
pub struct QuizArgs {
    pub module: ModuleId,
    /// Select an option, as QUESTION=OPTION. Repeat for several options.
    #[arg(long = "choose", value_name = "QUESTION=OPTION", value_parser = parse_choice)]
    pub choices: Vec<(QuestionId, OptionId)>,
    /// Answer a short-text question, as QUESTION=TEXT.
    #[arg(long = "write", value_name = "QUESTION=TEXT", value_parser = parse_text)]
    pub texts: Vec<(QuestionId, String)>,
}

impl QuizArgs {
    /// `false` means "just show the questions".
    pub fn has_answers(&self) -> bool {
        !self.choices.is_empty() || !self.texts.is_empty()
    }

    pub fn answers(&self) -> Vec<Answer> {
        let choices = self
            .choices
            .iter()
            .map(|&(question, option)| Answer::Choice { question, option });
        let texts = self.texts.iter().map(|(question, text)| Answer::Text {
            question: *question,
            text: text.clone(),
        });
        choices.chain(texts).collect()
    }
}

fn split_pair(raw: &str) -> Result<(QuestionId, &str), String> {
    let (question, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=VALUE, got `{raw}`"))?;
    let question = question
        .parse::<QuestionId>()
        .map_err(|e| e.to_string())?;
    Ok((question, rest))
}

fn parse_choice(raw: &str) -> Result<(QuestionId, OptionId), String> {
    let (question, option) = split_pair(raw)?;
    let option = option.parse::<OptionId>().map_err(|e| e.to_string())?;
    Ok((question, option))
}

fn parse_text(raw: &str) -> Result<(QuestionId, String), String> {
    let (question, text) = split_pair(raw)?;
    Ok((question, text.to_string()))
}

/// Tabs of the enrolled-courses list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoursesTab {
    All,
    InProgress,
    Completed,
}

impl From<CoursesTab> for CourseFilter {
    fn from(tab: CoursesTab) -> Self {
        match tab {
            CoursesTab::All => CourseFilter::All,
            CoursesTab::InProgress => CourseFilter::InProgress,
            CoursesTab::Completed => CourseFilter::Completed,
        }
    }
}

/// Roles open to self-registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SignupRole {
    Trainee,
    Trainer,
}

impl From<SignupRole> for Role {
    fn from(role: SignupRole) -> Self {
        match role {
            SignupRole::Trainee => Role::Trainee,
            SignupRole::Trainer => Role::Trainer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_course_navigation() {
        let cli = Cli::parse_from(["learn", "course", "7", "--lesson", "3", "--next"]);
        let Command::Course(args) = cli.command else {
            panic!("expected course command");
        };
        assert_eq!(args.course, CourseId::new(7));
        assert_eq!(args.lesson, Some(LessonId::new(3)));
        assert!(args.next);
        assert!(!args.previous);
    }

    #[test]
    fn next_and_previous_conflict() {
        let parsed = Cli::try_parse_from(["learn", "course", "7", "--next", "--previous"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_quiz_answers_in_order() {
        let cli = Cli::parse_from([
            "learn", "quiz", "3", "--choose", "1=10", "--write", "2= move ", "--choose", "1=12",
        ]);
        let Command::Quiz(args) = cli.command else {
            panic!("expected quiz command");
        };
        assert_eq!(args.module, ModuleId::new(3));
        assert!(args.has_answers());
        assert_eq!(
            args.answers(),
            vec![
                Answer::Choice {
                    question: QuestionId::new(1),
                    option: OptionId::new(10),
                },
                Answer::Choice {
                    question: QuestionId::new(1),
                    option: OptionId::new(12),
                },
                Answer::Text {
                    question: QuestionId::new(2),
                    text: " move ".into(),
                },
            ]
        );
    }

    #[test]
    fn quiz_without_answers_only_shows_questions() {
        let cli = Cli::parse_from(["learn", "quiz", "3"]);
        let Command::Quiz(args) = cli.command else {
            panic!("expected quiz command");
        };
        assert!(!args.has_answers());
    }

    #[test]
    fn malformed_choice_is_rejected() {
        assert!(Cli::try_parse_from(["learn", "quiz", "3", "--choose", "1"]).is_err());
        assert!(Cli::try_parse_from(["learn", "quiz", "3", "--choose", "x=2"]).is_err());
    }

    #[test]
    fn my_courses_filter_uses_kebab_case() {
        let cli = Cli::parse_from(["learn", "my-courses", "--filter", "in-progress"]);
        let Command::MyCourses { filter } = cli.command else {
            panic!("expected my-courses command");
        };
        assert_eq!(CourseFilter::from(filter), CourseFilter::InProgress);

        let cli = Cli::parse_from(["learn", "enroll", "7"]);
        assert!(matches!(cli.command, Command::Enroll { course } if course == CourseId::new(7)));
    }

    #[test]
    fn admin_cannot_self_register() {
        let parsed = Cli::try_parse_from([
            "learn", "register", "--name", "A", "--email", "a@b.c", "--password", "p", "--role",
            "admin",
        ]);
        assert!(parsed.is_err());
    }
}

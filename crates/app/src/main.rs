mod cli;

use std::sync::Arc;

use api::{ApiConfig, FileSessionStore, Registration};
use clap::Parser;
use course_core::access::{self, Route, RouteDecision};
use course_core::format::{format_duration, truncate_text};
use course_core::model::{
    CourseFilter, Enrollment, LessonContent, PASSING_PERCENTAGE, Quiz, QuizScore, Session,
};
use course_core::navigation;
use services::{AppServices, Clock, EnrollOutcome, LessonView, SlotUpdate};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Command, CourseArgs, QuizArgs, RegisterArgs};

const PREVIEW_CHARS: usize = 280;

#[derive(Debug, Error)]
enum CliError {
    #[error("not signed in; run `learn login` first")]
    NotSignedIn,
    #[error("{route} is not available to you (redirects to {target})")]
    Forbidden { route: Route, target: Route },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn api_config(cli: &Cli) -> Result<ApiConfig, api::ApiError> {
    let config = ApiConfig::from_env()?;
    match cli.api_url.as_deref() {
        Some(url) => ApiConfig::new(url, config.timeout),
        None => Ok(config),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    tracing::debug!(session_file = %cli.session_file.display(), "starting");
    let store = Arc::new(FileSessionStore::new(cli.session_file.clone()));
    let services = AppServices::new_http(api_config(&cli)?, store, Clock::system())?;
    let sessions = services.sessions();

    match cli.command {
        Command::Login { email, password } => {
            let session = sessions.login(&email, &password).await?;
            print_signed_in(&session);
        }
        Command::Register(args) => {
            let session = sessions.register(&registration(args)).await?;
            print_signed_in(&session);
        }
        Command::Logout => match services.restore_session().await? {
            Some(session) => {
                sessions.logout(session).await?;
                println!("Signed out.");
            }
            None => println!("Not signed in."),
        },
        Command::Whoami => match services.restore_session().await? {
            Some(session) => print_whoami(&session),
            None => println!("Not signed in."),
        },
        Command::Route { path } => {
            let session = services.restore_session().await?;
            let user = session.as_ref().map(Session::user);
            match access::authorize_path(&path, user) {
                RouteDecision::Render(route) => println!("render {route}"),
                RouteDecision::Redirect(route) => println!("redirect {route}"),
            }
        }
        Command::Course(args) => {
            let session = signed_in(&services, Route::Learn(args.course)).await?;
            let lessons = services.lesson_views(Some(&session));
            let mut view = lessons.open(args.course).await?;
            navigate(&mut view, &args)?;
            print_view(&view);
            view.close();
        }
        Command::Complete { course, lesson } => {
            let session = signed_in(&services, Route::Learn(course)).await?;
            let lessons = services.lesson_views(Some(&session));
            let mut view = lessons.open(course).await?;
            view.go_to(lesson)?;
            let update = lessons.mark_complete(&view, lesson).await?;
            if let SlotUpdate::Applied { .. } = update {
                println!(
                    "Lesson {lesson} completed. Course progress: {}%",
                    view.percent_complete()
                );
            }
            if let Some(next) = view.peek_next() {
                println!("Up next: {}", next.lesson.title());
            } else {
                println!("That was the last lesson.");
            }
            view.close();
        }
        Command::Enroll { course } => {
            let session = signed_in(&services, Route::Learn(course)).await?;
            match services.enrollments(&session).enroll(course).await? {
                EnrollOutcome::Enrolled => println!("Enrolled in course {course}."),
                EnrollOutcome::AlreadyEnrolled => println!("Already enrolled in course {course}."),
            }
        }
        Command::MyCourses { filter } => {
            let session = signed_in(&services, Route::MyCourses).await?;
            let rows = services
                .enrollments(&session)
                .my_courses(filter.into())
                .await?;
            print_my_courses(&rows, filter.into());
        }
        Command::Quiz(args) => {
            let session = signed_in(&services, Route::Dashboard).await?;
            let quizzes = services.quizzes(&session);
            let quiz = quizzes.load(args.module).await?;
            if args.has_answers() {
                let score = quizzes.submit(&quiz, &args.answers()).await?;
                print_score(&quiz, score);
            } else {
                print_quiz(&quiz, &args);
            }
        }
    }
    Ok(())
}

/// Restore the session and check it may open `route`.
async fn signed_in(
    services: &AppServices,
    route: Route,
) -> Result<Session, Box<dyn std::error::Error>> {
    let session = services
        .restore_session()
        .await?
        .ok_or(CliError::NotSignedIn)?;
    match access::authorize(route, Some(session.user())) {
        RouteDecision::Render(_) => Ok(session),
        RouteDecision::Redirect(target) => Err(CliError::Forbidden { route, target }.into()),
    }
}

fn registration(args: RegisterArgs) -> Registration {
    Registration {
        name: args.name,
        email: args.email.trim().to_string(),
        password: args.password,
        bio: args.bio.filter(|b| !b.trim().is_empty()),
        role: args.role.into(),
    }
}

fn navigate(view: &mut LessonView, args: &CourseArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(lesson) = args.lesson {
        view.go_to(lesson)?;
    }
    if args.next && view.go_next().is_none() {
        println!("Already at the last lesson.");
    }
    if args.previous && view.go_previous().is_none() {
        println!("Already at the first lesson.");
    }
    Ok(())
}

fn print_signed_in(session: &Session) {
    let dashboard = access::Dashboard::for_role(session.role()).route();
    println!("Signed in as {} ({}).", session.user().name, session.role());
    println!("Dashboard: {dashboard}");
}

fn print_whoami(session: &Session) {
    let user = session.user();
    println!("{} <{}>", user.name, user.email);
    println!("role: {}", user.role);
    if let Some(bio) = &user.bio {
        println!("bio: {}", truncate_text(bio, 80));
    }
    let elapsed = Clock::system().minutes_since(session.started_at());
    println!(
        "signed in: {} ({} ago)",
        session.started_at().to_rfc3339(),
        format_duration(elapsed)
    );
}

fn print_my_courses(rows: &[Enrollment], filter: CourseFilter) {
    if rows.is_empty() {
        match filter {
            CourseFilter::All => println!("You are not enrolled in any course yet."),
            CourseFilter::InProgress => println!("No course in progress."),
            CourseFilter::Completed => println!("No completed course yet."),
        }
        return;
    }
    for row in rows {
        let category = row.category.as_deref().unwrap_or("-");
        println!(
            "{:>5}  {:<9} {:>3}%  {} [{category}]",
            row.course.value(),
            row.status.as_str(),
            row.progress_percentage,
            row.title
        );
    }
}

fn print_quiz(quiz: &Quiz, args: &QuizArgs) {
    println!("{} ({} questions)", quiz.title(), quiz.questions().len());
    for question in quiz.questions() {
        println!("  Q{} [{}] {}", question.id, question.kind, question.text);
        for option in &question.options {
            println!("      {}) {}", option.id, option.text);
        }
    }
    println!(
        "Answer with `learn quiz {} --choose Q=O --write Q=TEXT`.",
        args.module
    );
}

fn print_score(quiz: &Quiz, score: QuizScore) {
    println!("{}: {}%", quiz.title(), score.percentage());
    println!(
        "correct: {}  incorrect: {}  total: {}",
        score.correct(),
        score.incorrect(),
        score.total()
    );
    if score.passed() {
        println!("Passed.");
    } else {
        println!("Not passed; {PASSING_PERCENTAGE}% is needed.");
    }
}

fn print_view(view: &LessonView) {
    let course = view.course();
    println!(
        "{} ({}%, {} total)",
        course.title(),
        view.percent_complete(),
        format_duration(navigation::total_duration_minutes(course))
    );

    let current = view.position().map(|p| p.lesson);
    for (module, summary) in course.modules().iter().zip(view.module_progress()) {
        println!(
            "  {} [{}/{}]",
            module.title(),
            summary.completed,
            summary.total
        );
        for lesson in module.lessons() {
            let marker = if Some(lesson.id()) == current { '>' } else { ' ' };
            let check = if view.status_of(lesson.id()).is_completed() {
                'x'
            } else {
                ' '
            };
            println!(
                "   {marker}[{check}] {} ({}, {})",
                lesson.title(),
                lesson.content_type(),
                format_duration(lesson.estimated_duration_minutes())
            );
        }
    }

    let Some(found) = view.current() else {
        println!("This course has no lessons yet.");
        return;
    };
    println!();
    println!("{} / {}", found.module.title(), found.lesson.title());
    match found.lesson.content() {
        LessonContent::Text(body) => println!("{}", truncate_text(body, PREVIEW_CHARS)),
        LessonContent::Video(url) => {
            let player = if found.lesson.content().is_embedded_video() {
                "embedded"
            } else {
                "file"
            };
            println!("video ({player}): {url}");
        }
        LessonContent::Pdf(url) => println!("pdf: {url}"),
        LessonContent::Link(url) => println!("link: {url}"),
    }

    let previous = view.peek_previous().map(|r| r.lesson.title().to_string());
    let next = view.peek_next().map(|r| r.lesson.title().to_string());
    println!(
        "previous: {}  next: {}",
        previous.as_deref().unwrap_or("-"),
        next.as_deref().unwrap_or("-")
    );
    if let Some(module) = view.quiz_module() {
        println!("End of the course. Take the module quiz: learn quiz {module}");
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // Binary glue: print once and exit.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

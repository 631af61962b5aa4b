use std::sync::Arc;
use std::time::Duration;

use api::{
    ApiConfig, ApiError, AuthRepository, CourseRepository, Credentials, EnrollmentRepository,
    HttpApi, ProgressRepository, QuizRepository,
};
use course_core::model::{
    Answer, AttemptId, AuthToken, CourseId, EnrollmentStatus, LessonId, LessonStatus, ModuleId,
    OptionId, QuestionId, QuestionKind, QuizId, Role,
};
use course_core::navigation;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> HttpApi {
    let config = ApiConfig::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
    HttpApi::new(config).unwrap()
}

fn course_body() -> serde_json::Value {
    json!({
        "course": {
            "id": 7,
            "title": "Rust Basics",
            "modules": [
                {
                    "id": 1,
                    "title": "Ownership",
                    "lessons": [
                        {
                            "id": 1,
                            "title": "Moves",
                            "content_type": "video",
                            "content_url_or_text": "https://www.youtube.com/watch?v=abc",
                            "estimated_duration_minutes": 12
                        },
                        {
                            "id": 2,
                            "title": "Borrowing",
                            "content_type": "text",
                            "content_url_or_text": "References never outlive their referent."
                        }
                    ]
                },
                { "id": 2, "title": "Empty", "lessons": [] },
                {
                    "id": 3,
                    "title": "Traits",
                    "lessons": [
                        {
                            "id": 3,
                            "title": "Slides",
                            "content_type": "pdf",
                            "content_url_or_text": "https://cdn.example.com/traits.pdf",
                            "estimated_duration_minutes": 30
                        }
                    ]
                }
            ]
        }
    })
}

#[tokio::test]
async fn fetches_course_and_progress_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/courses/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(course_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/my/courses/7/progress"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modules": [
                { "lessons": [
                    { "id": 1, "progress_status": "completed" },
                    { "id": 2, "progress_status": null }
                ] },
                { "lessons": [] },
                { "lessons": [ { "id": 3, "progress_status": "in_progress" } ] }
            ]
        })))
        .mount(&server)
        .await;

    let api = Arc::new(client(&server).await.authorized(AuthToken::new("tok-1")));
    let courses: Arc<dyn CourseRepository> = api.clone();
    let progress: Arc<dyn ProgressRepository> = api;

    let course = courses.get_course(CourseId::new(7)).await.unwrap();
    assert_eq!(course.lesson_count(), 3);
    assert_eq!(navigation::total_duration_minutes(&course), 42);
    let first = navigation::first(&course).unwrap();
    assert!(first.lesson.content().is_embedded_video());
    let after_second = navigation::next(&course, LessonId::new(2)).unwrap().unwrap();
    assert_eq!(after_second.lesson.id(), LessonId::new(3));

    let snapshot = progress.get_progress(CourseId::new(7)).await.unwrap();
    assert_eq!(snapshot.status_of(LessonId::new(1)), LessonStatus::Completed);
    assert_eq!(snapshot.status_of(LessonId::new(2)), LessonStatus::NotStarted);
    assert_eq!(snapshot.status_of(LessonId::new(3)), LessonStatus::InProgress);
    assert_eq!(navigation::percent_complete(&course, &snapshot), 33);
}

#[tokio::test]
async fn posts_completed_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/lessons/2/progress"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server).await.authorized(AuthToken::new("tok-1"));
    api.update_lesson_progress(LessonId::new(2), LessonStatus::Completed)
        .await
        .unwrap();
}

#[tokio::test]
async fn maps_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(path("/api/courses/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/api/my/courses/1/progress"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(path("/api/lessons/9/progress"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "error": "not enrolled" })),
        )
        .mount(&server)
        .await;

    let api = client(&server).await;
    assert!(matches!(
        api.get_course(CourseId::new(404)).await.unwrap_err(),
        ApiError::NotFound
    ));
    assert!(matches!(
        api.get_progress(CourseId::new(1)).await.unwrap_err(),
        ApiError::Unauthorized
    ));
    let err = api
        .update_lesson_progress(LessonId::new(9), LessonStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "request failed with status 403 Forbidden: not enrolled"
    );
}

#[tokio::test]
async fn malformed_course_is_a_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(path("/api/courses/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "course": {
                "id": 5,
                "title": "Broken",
                "modules": [ { "id": 1, "title": "M", "lessons": [
                    { "id": 1, "title": "L", "content_type": "hologram" }
                ] } ]
            }
        })))
        .mount(&server)
        .await;

    let api = client(&server).await;
    assert!(matches!(
        api.get_course(CourseId::new(5)).await.unwrap_err(),
        ApiError::Serialization(_)
    ));
}

#[tokio::test]
async fn login_and_me() {
    let server = MockServer::start().await;
    let user = json!({ "id": 3, "name": "Ada", "email": "ada@example.com", "role": "TRAINER" });
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-9", "user": user })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user })))
        .mount(&server)
        .await;

    let api = client(&server).await;
    let grant = api
        .login(&Credentials {
            email: "ada@example.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();
    assert_eq!(grant.token.expose(), "tok-9");
    assert_eq!(grant.user.role, Role::Trainer);

    let me = api.me(&grant.token).await.unwrap();
    assert_eq!(me, grant.user);
}

#[tokio::test]
async fn enrolls_and_lists_my_courses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/courses/7/enroll"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/courses/8/enroll"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "already enrolled" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/my/courses"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courses": [
                { "id": 7, "title": "Rust Basics", "category": "programming",
                  "status": "enrolled", "progress_percentage": 0 },
                { "id": 8, "title": "SQL", "status": "completed", "progress_percentage": 100.0 }
            ]
        })))
        .mount(&server)
        .await;

    let api = client(&server).await.authorized(AuthToken::new("tok-1"));
    api.enroll(CourseId::new(7)).await.unwrap();
    assert!(api.enroll(CourseId::new(8)).await.unwrap_err().is_conflict());

    let rows = api.my_courses().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].course, CourseId::new(7));
    assert_eq!(rows[0].status, EnrollmentStatus::Enrolled);
    assert_eq!(rows[1].progress_percentage, 100);
    assert_eq!(rows[1].category, None);
}

#[tokio::test]
async fn quiz_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/modules/3/quiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quiz": {
                "id": 4,
                "module_id": 3,
                "title": "Traits check",
                "questions": [
                    { "id": 1, "question_text": "Which are traits?", "type": "multiple_choice",
                      "options": [
                          { "id": 10, "option_text": "Clone" },
                          { "id": 11, "option_text": "Vec" },
                          { "id": 12, "option_text": "Debug" }
                      ] },
                    { "id": 2, "question_text": "Keyword for impls?", "type": "short_text" }
                ]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/quizzes/4/attempts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "attempt": { "id": 55 } })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/quiz-attempts/55/answers"))
        .and(body_json(json!({ "answers": [
            { "question_id": 1, "selected_option_id": 10 },
            { "question_id": 1, "selected_option_id": 12 },
            { "question_id": 2, "answer_text": "impl" }
        ] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "score": 50.0, "correct_count": 1, "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server).await.authorized(AuthToken::new("tok-1"));
    let quiz = api.quiz_for_module(ModuleId::new(3)).await.unwrap();
    assert_eq!(quiz.id(), QuizId::new(4));
    assert_eq!(quiz.questions()[0].kind, QuestionKind::MultipleChoice);
    assert_eq!(quiz.questions()[0].options.len(), 3);

    let attempt = api.start_attempt(quiz.id()).await.unwrap();
    assert_eq!(attempt, AttemptId::new(55));

    let answers = [
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
            text: "impl".into(),
        },
    ];
    quiz.check_answers(&answers).unwrap();
    let score = api.submit_answers(attempt, &answers).await.unwrap();
    assert_eq!(score.correct(), 1);
    assert_eq!(score.incorrect(), 1);
    assert_eq!(score.percentage(), 50);
    assert!(!score.passed());
}

#[tokio::test]
async fn module_without_quiz_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(path("/api/modules/2/quiz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = client(&server).await;
    assert!(matches!(
        api.quiz_for_module(ModuleId::new(2)).await.unwrap_err(),
        ApiError::NotFound
    ));
}

use std::sync::Arc;

use api::InMemoryApi;
use course_core::model::{
    Course, CourseFilter, CourseId, EnrollmentStatus, Lesson, LessonContent, LessonId, Module,
    ModuleId,
};
use services::{EnrollOutcome, EnrollmentError, EnrollmentService, LessonViewService};

fn course(id: u64, lessons: &[u64]) -> Course {
    let lessons = lessons
        .iter()
        .map(|&l| {
            Lesson::new(
                LessonId::new(l),
                format!("Lesson {l}"),
                LessonContent::Text("body".into()),
                15,
            )
        })
        .collect();
    Course::new(
        CourseId::new(id),
        format!("Course {id}"),
        vec![Module::new(ModuleId::new(id), "Only", lessons)],
    )
    .unwrap()
}

fn catalogue() -> InMemoryApi {
    let api = InMemoryApi::new();
    api.insert_course(course(1, &[10, 11])).unwrap();
    api.insert_course(course(2, &[20])).unwrap();
    api
}

#[tokio::test]
async fn enroll_twice_reports_already_enrolled() {
    let api = Arc::new(catalogue());
    let svc = EnrollmentService::new(api.clone());

    assert!(!svc.is_enrolled(CourseId::new(1)).await.unwrap());
    assert_eq!(
        svc.enroll(CourseId::new(1)).await.unwrap(),
        EnrollOutcome::Enrolled
    );
    assert_eq!(
        svc.enroll(CourseId::new(1)).await.unwrap(),
        EnrollOutcome::AlreadyEnrolled
    );
    assert!(svc.is_enrolled(CourseId::new(1)).await.unwrap());
    assert_eq!(svc.my_courses(CourseFilter::All).await.unwrap().len(), 1);
}

#[tokio::test]
async fn enrolling_in_missing_course_is_unknown_course() {
    let svc = EnrollmentService::new(Arc::new(catalogue()));
    let err = svc.enroll(CourseId::new(404)).await.unwrap_err();
    assert!(matches!(err, EnrollmentError::UnknownCourse));
}

#[tokio::test]
async fn finished_course_moves_to_the_completed_tab() {
    let api = Arc::new(catalogue());
    let enrollments = EnrollmentService::new(api.clone());
    let lessons = LessonViewService::new(api.clone(), api.clone());

    enrollments.enroll(CourseId::new(1)).await.unwrap();
    enrollments.enroll(CourseId::new(2)).await.unwrap();

    let view = lessons.open(CourseId::new(2)).await.unwrap();
    lessons.mark_current_complete(&view).await.unwrap();
    view.close();

    let active = enrollments
        .my_courses(CourseFilter::InProgress)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].course, CourseId::new(1));
    assert_eq!(active[0].progress_percentage, 0);

    let done = enrollments
        .my_courses(CourseFilter::Completed)
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].course, CourseId::new(2));
    assert_eq!(done[0].status, EnrollmentStatus::Completed);
    assert_eq!(done[0].progress_percentage, 100);
}

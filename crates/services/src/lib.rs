#![forbid(unsafe_code)]

pub mod app_services;
pub mod enrollment;
pub mod error;
pub mod lesson_view;
pub mod quiz;
pub mod session;
pub mod snapshot;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use enrollment::{EnrollOutcome, EnrollmentService};
pub use error::{
    AppServicesError, EnrollmentError, LessonViewError, QuizServiceError, SessionError,
};
pub use lesson_view::{LessonView, LessonViewService};
pub use quiz::QuizService;
pub use session::SessionService;
pub use snapshot::{FetchTicket, SlotUpdate, SnapshotSlot};

#![forbid(unsafe_code)]

pub mod http;
mod memory;
pub mod repository;
pub mod session_store;

pub use http::{ApiConfig, HttpApi};
pub use memory::{InMemoryApi, QuizKey};
pub use repository::{
    ApiError, AuthGrant, AuthRepository, CourseRepository, Credentials, EnrollmentRepository,
    ProgressRepository, QuizRepository, Registration,
};
pub use session_store::{
    FileSessionStore, InMemorySessionStore, SessionStore, SessionStoreError, StoredSession,
};

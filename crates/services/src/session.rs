use std::sync::Arc;

use api::{
    ApiError, AuthGrant, AuthRepository, Credentials, Registration, SessionStore,
    SessionStoreError, StoredSession,
};
use course_core::Clock;
use course_core::model::Session;
use tracing::{info, warn};

use crate::error::SessionError;

/// Creates and tears down the explicit `Session` value.
///
/// Nothing here keeps a "current user"; callers hold the `Session` they are
/// given and pass it where it is needed.
#[derive(Clone)]
pub struct SessionService {
    clock: Clock,
    auth: Arc<dyn AuthRepository>,
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    #[must_use]
    pub fn new(clock: Clock, auth: Arc<dyn AuthRepository>, store: Arc<dyn SessionStore>) -> Self {
        Self { clock, auth, store }
    }

    /// Bring back a stored session, confirming its token with the API.
    ///
    /// A token the API no longer accepts, or an unreadable session file, is
    /// cleared and reported as "no session".
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the store cannot be read or cleared.
    pub async fn restore(&self) -> Result<Option<Session>, SessionError> {
        let stored = match self.store.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(None),
            Err(SessionStoreError::Json(err)) => {
                warn!(error = %err, "stored session unreadable; clearing");
                self.store.clear().await?;
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        match self.auth.me(&stored.token).await {
            Ok(user) => {
                if user != stored.user {
                    self.store
                        .save(&StoredSession {
                            token: stored.token.clone(),
                            user: user.clone(),
                            signed_in_at: stored.signed_in_at,
                        })
                        .await?;
                }
                info!(user = %user.id, role = %user.role, "session restored");
                let started_at = stored.signed_in_at.unwrap_or_else(|| self.clock.now());
                Ok(Some(Session::new(stored.token, user, started_at)))
            }
            Err(err) => {
                warn!(error = %err, "stored session rejected; clearing");
                self.store.clear().await?;
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidCredentials` for a rejected login, or
    /// other API / store errors.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let grant = self.auth.login(&credentials).await.map_err(|err| match err {
            ApiError::Unauthorized => SessionError::InvalidCredentials,
            other => SessionError::Api(other),
        })?;
        self.start(grant).await
    }

    /// # Errors
    ///
    /// Returns `SessionError` if registration or persisting the session fails.
    pub async fn register(&self, registration: &Registration) -> Result<Session, SessionError> {
        let grant = self.auth.register(registration).await?;
        self.start(grant).await
    }

    /// End the session and forget the stored token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the stored session cannot be removed.
    pub async fn logout(&self, session: Session) -> Result<(), SessionError> {
        self.store.clear().await?;
        info!(user = %session.user().id, "signed out");
        Ok(())
    }

    async fn start(&self, grant: AuthGrant) -> Result<Session, SessionError> {
        let now = self.clock.now();
        self.store
            .save(&StoredSession {
                token: grant.token.clone(),
                user: grant.user.clone(),
                signed_in_at: Some(now),
            })
            .await?;
        info!(user = %grant.user.id, role = %grant.user.role, "signed in");
        Ok(Session::new(grant.token, grant.user, now))
    }
}

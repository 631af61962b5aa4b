use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::model::{AuthToken, User};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionStoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("session store lock poisoned")]
    Poisoned,
}

/// What survives a restart: the token, the last known profile and when the
/// learner signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: AuthToken,
    pub user: User,
    // Absent in files written before sign-in times were kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_in_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `SessionStoreError` if the stored session cannot be read or decoded.
    async fn load(&self) -> Result<Option<StoredSession>, SessionStoreError>;

    /// # Errors
    ///
    /// Returns `SessionStoreError` if the session cannot be written.
    async fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError>;

    /// Remove the stored session. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError` if the session cannot be removed.
    async fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Keeps the session as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    slot: Mutex<Option<StoredSession>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        let guard = self.slot.lock().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(guard.clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        let mut guard = self.slot.lock().map_err(|_| SessionStoreError::Poisoned)?;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let mut guard = self.slot.lock().map_err(|_| SessionStoreError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{Role, UserId};

    fn stored() -> StoredSession {
        StoredSession {
            token: AuthToken::new("abc"),
            user: User {
                id: UserId::new(2),
                name: "Lin".into(),
                email: "lin@example.com".into(),
                role: Role::Trainer,
                bio: Some("teaches Rust".into()),
            },
            signed_in_at: Some(course_core::time::fixed_now()),
        }
    }

    #[tokio::test]
    async fn file_store_saves_loads_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().await.unwrap(), None);
        store.save(&stored()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(stored()));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let err = FileSessionStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, SessionStoreError::Json(_)));
    }

    #[tokio::test]
    async fn file_without_sign_in_time_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(
            &path,
            br#"{"token": "abc", "user": {"id": 2, "name": "Lin", "email": "lin@example.com", "role": "TRAINER"}}"#,
        )
        .await
        .unwrap();

        let loaded = FileSessionStore::new(path).load().await.unwrap().unwrap();
        assert_eq!(loaded.token, AuthToken::new("abc"));
        assert_eq!(loaded.signed_in_at, None);
    }
}

//! Credential provider for the API client.
//!
//! The access/refresh token pair and the signed-in user are held by a
//! [`CredentialStore`] that is handed to [`ApiClient`](crate::services::ApiClient)
//! at construction time. Nothing in the client reads tokens from ambient
//! global state.
//!
//! - [`MemoryCredentials`]: process-local, for tests and embedding
//! - [`FileCredentials`]: JSON file, for the CLI

pub mod file;

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::UserSummary;

// Re-export for convenience
pub use file::FileCredentials;

/// Persisted authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// The signed-in user, used as the viewer for engagement state
    #[serde(default)]
    pub user: Option<UserSummary>,
}

impl Session {
    pub fn new(user: UserSummary, access_token: String, refresh_token: String) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

/// Trait for credential storage backends.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current session; empty when nobody is signed in.
    async fn load(&self) -> Result<Session>;

    /// Replace the stored session.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Forget all credentials.
    async fn clear(&self) -> Result<()>;
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    session: Mutex<Session>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out with an existing session.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        // A poisoned lock still holds a complete session value.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn load(&self) -> Result<Session> {
        Ok(self.lock().clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.lock() = session.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.lock() = Session::default();
        Ok(())
    }
}

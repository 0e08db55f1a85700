//! Authentication endpoints.
//!
//! Successful register/login calls persist the session through the client's
//! credential store; logout always forgets it locally.

use serde::Serialize;

use crate::credentials::Session;
use crate::error::{AppError, Result};
use crate::models::AuthPayload;
use crate::services::ApiClient;

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Typed wrapper over `/auth`.
pub struct Auth<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }
}

impl Auth<'_> {
    /// `POST /auth/register`, then sign in as the new user.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "Username, email and password are required",
            ));
        }
        let payload: AuthPayload = self
            .client
            .post_public(
                "auth/register",
                &RegisterBody {
                    username: username.trim(),
                    email: email.trim(),
                    password,
                },
            )
            .await?;
        self.store(payload).await
    }

    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }
        let payload: AuthPayload = self
            .client
            .post_public(
                "auth/login",
                &LoginBody {
                    email: email.trim(),
                    password,
                },
            )
            .await?;
        self.store(payload).await
    }

    /// `POST /auth/logout`; local credentials are cleared even if the call fails.
    pub async fn logout(&self) -> Result<()> {
        let session = self.client.credentials().load().await?;
        if session.is_authenticated() {
            if let Err(e) = self
                .client
                .post_empty::<serde::de::IgnoredAny>("auth/logout")
                .await
            {
                log::warn!("Logout request failed, clearing credentials locally: {}", e);
            }
        }
        self.client.credentials().clear().await
    }

    /// Renew the access token ahead of expiry.
    ///
    /// Unlike the automatic renewal on 401, a failure here leaves the stored
    /// session untouched.
    pub async fn refresh(&self) -> Result<Session> {
        let session = self.client.credentials().load().await?;
        if !session.is_authenticated() {
            return Err(AppError::SessionExpired("Not signed in".to_string()));
        }
        self.client
            .refresh_access_token(session)
            .await
            .map_err(|e| match e {
                AppError::Rejected {
                    status: 401,
                    message,
                } => AppError::SessionExpired(message),
                other => other,
            })?;
        self.client.credentials().load().await
    }

    async fn store(&self, payload: AuthPayload) -> Result<Session> {
        log::info!("Signed in as {}", payload.user.username);
        let session = Session::new(payload.user, payload.access_token, payload.refresh_token);
        self.client.credentials().save(&session).await?;
        Ok(session)
    }
}

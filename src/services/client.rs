// src/services/client.rs

//! Core HTTP client shared by every resource wrapper.
//!
//! Attaches the bearer token from the [`CredentialStore`], performs a single
//! refresh-and-retry when the backend answers 401, and maps non-success
//! responses onto [`AppError`].

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use crate::credentials::{CredentialStore, Session};
use crate::error::{AppError, Result};
use crate::models::{ApiConfig, RefreshedToken, RetryConfig, UserSummary};
use crate::utils::{http::create_async_client, join_url, normalize_base};

/// Called after credentials were cleared because the session could not be renewed.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Response bodies arrive either wrapped as `{status, data}` or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

/// A file sent as a single-part `multipart/form-data` body.
#[derive(Debug, Clone)]
pub(crate) struct FileUpload {
    pub field: &'static str,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Forms are consumed on send, so one is built per attempt.
    fn form(&self) -> Result<Form> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(self.mime)?;
        Ok(Form::new().part(self.field, part))
    }
}

#[derive(Debug, Clone)]
enum RequestBody {
    Json(Value),
    File(FileUpload),
}

/// A request that can be sent more than once (refresh, backoff).
#[derive(Debug, Clone)]
struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    /// Attach the bearer token and refresh on 401
    authorized: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authorized: true,
        }
    }

    fn query(mut self, query: &[(&str, String)]) -> Self {
        self.query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self
    }

    fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    fn public(mut self) -> Self {
        self.authorized = false;
        self
    }
}

/// Typed client for the book-review backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    retry: RetryConfig,
    on_session_expired: Option<SessionExpiredHook>,
}

impl ApiClient {
    /// Create a new client with the given configuration and credential store.
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let base_url = normalize_base(Url::parse(&config.base_url)?);
        Ok(Self {
            http: create_async_client(config)?,
            base_url,
            credentials,
            retry: config.retry.clone(),
            on_session_expired: None,
        })
    }

    /// Register the login redirect run when a session cannot be renewed.
    pub fn with_session_expired_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// The signed-in user according to the credential store.
    pub async fn current_user(&self) -> Result<Option<UserSummary>> {
        Ok(self.credentials.load().await?.user)
    }

    // --- Verb helpers used by the resource wrappers ---

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.execute(ApiRequest::new(Method::GET, path).query(query))
            .await
    }

    /// GET without bearer token or refresh handling (public listings).
    pub(crate) async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.execute(ApiRequest::new(Method::GET, path).query(query).public())
            .await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::new(Method::POST, path).json(body)?)
            .await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(ApiRequest::new(Method::POST, path)).await
    }

    /// POST without bearer token or refresh handling (login, register).
    pub(crate) async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::new(Method::POST, path).json(body)?.public())
            .await
    }

    /// POST a file as `multipart/form-data`.
    pub(crate) async fn post_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: FileUpload,
    ) -> Result<T> {
        let mut request = ApiRequest::new(Method::POST, path);
        request.body = Some(RequestBody::File(file));
        self.execute(request).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::new(Method::PUT, path).json(body)?)
            .await
    }

    /// DELETE returning the decoded body.
    pub(crate) async fn delete_for<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(ApiRequest::new(Method::DELETE, path)).await
    }

    /// DELETE ignoring whatever body comes back.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.delete_for::<IgnoredAny>(path).await.map(|_| ())
    }

    // --- Request pipeline ---

    async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let bytes = if self.retry.max_retries == 0 {
            self.dispatch(&request).await?
        } else {
            let backoff = ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(self.retry.min_delay_ms))
                .with_max_delay(Duration::from_millis(self.retry.max_delay_ms))
                .with_max_times(self.retry.max_retries)
                .with_jitter();

            (|| async { self.dispatch(&request).await })
                .retry(backoff)
                .when(|e: &AppError| e.should_retry())
                .notify(|e: &AppError, dur: Duration| {
                    log::warn!(
                        "{} {} failed, retrying after {:.2}s: {}",
                        request.method,
                        request.path,
                        dur.as_secs_f64(),
                        e
                    )
                })
                .await?
        };
        decode(&bytes)
    }

    /// One logical attempt, including the single refresh-and-retry on 401.
    async fn dispatch(&self, request: &ApiRequest) -> Result<Vec<u8>> {
        if !request.authorized {
            return self.send(request, None).await;
        }

        let session = self.credentials.load().await?;
        match self.send(request, session.access_token.as_deref()).await {
            Err(e) if e.is_unauthorized() => {
                log::debug!("{} {} unauthorized: {}", request.method, request.path, e);
            }
            other => return other,
        }

        let token = match self.refresh_access_token(session).await {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Token refresh failed: {}", e);
                return Err(self.expire_session().await);
            }
        };

        match self.send(request, Some(&token)).await {
            Err(e) if e.is_unauthorized() => Err(self.expire_session().await),
            other => other,
        }
    }

    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Vec<u8>> {
        let url = join_url(&self.base_url, &request.path)?;
        log::debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        match &request.body {
            Some(RequestBody::Json(body)) => builder = builder.json(body),
            Some(RequestBody::File(file)) => builder = builder.multipart(file.form()?),
            None => {}
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            Ok(bytes.to_vec())
        } else {
            Err(AppError::from_status(status, &bytes))
        }
    }

    /// Exchange the stored refresh token for a new access token and persist it.
    pub(crate) async fn refresh_access_token(&self, mut session: Session) -> Result<String> {
        let refresh_token = session
            .refresh_token
            .clone()
            .ok_or_else(|| AppError::SessionExpired("No refresh token stored".to_string()))?;

        log::info!("Access token rejected, refreshing");
        let request = ApiRequest::new(Method::POST, "auth/refresh")
            .json(&json!({ "refreshToken": refresh_token }))?
            .public();
        let refreshed: RefreshedToken = decode(&self.send(&request, None).await?)?;

        session.access_token = Some(refreshed.access_token.clone());
        if let Some(rotated) = refreshed.refresh_token {
            session.refresh_token = Some(rotated);
        }
        self.credentials.save(&session).await?;
        log::info!("Access token refreshed");

        Ok(refreshed.access_token)
    }

    async fn expire_session(&self) -> AppError {
        log::warn!("Session expired, clearing stored credentials");
        if let Err(e) = self.credentials.clear().await {
            log::error!("Failed to clear credentials: {}", e);
        }
        if let Some(hook) = &self.on_session_expired {
            hook();
        }
        AppError::SessionExpired("Session expired. Please log in again.".to_string())
    }
}

/// Decode a success body, unwrapping the `data` envelope when present.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        bytes
    };
    match serde_json::from_slice::<Envelope<T>>(bytes) {
        Ok(Envelope::Wrapped { data }) | Ok(Envelope::Bare(data)) => Ok(data),
        // Untagged errors are vague; re-decode bare for a precise message.
        Err(_) => Ok(serde_json::from_slice::<T>(bytes)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Club, LikeStatus};

    #[test]
    fn test_decode_wrapped_and_bare() {
        let wrapped: LikeStatus = decode(
            br#"{"status":"success","message":"ok","data":{"likesCount":6,"isLiked":true}}"#,
        )
        .unwrap();
        assert_eq!(wrapped.likes_count, 6);
        assert!(wrapped.is_liked);

        let bare: Vec<Club> = decode(br#"[{"_id":"c1","name":"Poetry","members":[]}]"#).unwrap();
        assert_eq!(bare[0].id, "c1");
    }

    #[test]
    fn test_decode_empty_and_ignored_bodies() {
        let _: () = decode(b"").unwrap();
        let _: IgnoredAny = decode(br#"{"status":"success","message":"Comment deleted"}"#).unwrap();
    }

    #[test]
    fn test_decode_reports_shape_errors() {
        let result: Result<LikeStatus> = decode(br#"{"data":{"likesCount":"six"}}"#);
        assert!(matches!(result, Err(AppError::Json(_))));
    }
}

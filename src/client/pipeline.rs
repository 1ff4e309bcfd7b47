use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::store::{CredentialStore, MemoryCredentialStore};
use super::types::{Envelope, ErrorBody, RefreshResponse};
use super::util::{build_url, decode_body};
use crate::error::{
    ApiError, ACCESS_DENIED_MESSAGE, NETWORK_ERROR_MESSAGE, NOT_FOUND_MESSAGE,
    SERVER_ERROR_MESSAGE, VALIDATION_MESSAGE,
};

const TARGET: &str = "uninexus_cli::client::pipeline";

/// Hook fired when the session cannot be recovered, i.e. when a token
/// refresh attempt itself fails. The web platform redirects to the login
/// page here; the CLI drops back to the login menu.
pub trait AuthEvents: Send + Sync {
    fn on_session_expired(&self);
}

/// Sink for embedders that have no login entry point to return to.
pub struct NoopAuthEvents;

impl AuthEvents for NoopAuthEvents {
    fn on_session_expired(&self) {}
}

/// Latching [`AuthEvents`] sink; the owner polls and resets it between
/// interactions.
#[derive(Default)]
pub struct SessionExpiredFlag(AtomicBool);

impl SessionExpiredFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expired(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AuthEvents for SessionExpiredFlag {
    fn on_session_expired(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Backoff policy for network-level failures. Delay before retry `n` is
/// `2^(n-1) * base_delay`; with the defaults that is 1s, 2s, 4s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_network_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_network_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Outbound request description. Retry bookkeeping lives in the send loop,
/// not here, so a spec stays valid across resubmissions.
pub(crate) struct RequestSpec {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl RequestSpec {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub(crate) fn query_opt(self, key: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attaches a JSON body. Serialized once up front so every retry
    /// resubmits identical bytes.
    pub(crate) fn json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// HTTP client for the UniNexus REST backend.
///
/// Every request goes through the same pipeline: attach the stored bearer
/// token, send, and on failure either refresh-and-retry (first 401),
/// retry with exponential backoff (connectivity failures), or reject with
/// a classified error.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    auth_events: Arc<dyn AuthEvents>,
    retry: RetryPolicy,
}

pub struct ApiClientBuilder {
    base_url: Url,
    http: Option<reqwest::Client>,
    credentials: Option<Arc<dyn CredentialStore>>,
    auth_events: Option<Arc<dyn AuthEvents>>,
    retry: RetryPolicy,
}

impl ApiClientBuilder {
    pub fn http(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn credentials(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    pub fn auth_events(mut self, events: Arc<dyn AuthEvents>) -> Self {
        self.auth_events = Some(events);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> ApiClient {
        ApiClient {
            http: self.http.unwrap_or_default(),
            base_url: self.base_url,
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
            auth_events: self.auth_events.unwrap_or_else(|| Arc::new(NoopAuthEvents)),
            retry: self.retry,
        }
    }
}

impl ApiClient {
    /// Starts building a client instance. Each instance is independent;
    /// nothing is shared through globals.
    pub fn builder(base_url: Url) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url,
            http: None,
            credentials: None,
            auth_events: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Runs the full pipeline and returns the successful response.
    pub(crate) async fn send(&self, spec: RequestSpec) -> Result<Response, ApiError> {
        // Retry state is scoped to this logical call. The refresh guard is
        // one-shot: however many 401s this call accumulates, at most one
        // refresh is attempted. The network counter only ever increments.
        let mut refresh_attempted = false;
        let mut network_retries: u32 = 0;

        loop {
            match self.dispatch(&spec).await? {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        tracing::trace!(target: TARGET, %status, path = %spec.path, "request settled");
                        return Ok(response);
                    }
                    if status == StatusCode::UNAUTHORIZED && !refresh_attempted {
                        refresh_attempted = true;
                        let refresh_token = self.credentials.refresh_token()?;
                        match refresh_token {
                            Some(token) => {
                                self.refresh_session(token).await?;
                                // Resubmit through the full pipeline; the
                                // guard above prevents a second refresh.
                                continue;
                            }
                            None => {
                                tracing::debug!(target: TARGET, path = %spec.path, "401 with no stored refresh token");
                                return Err(self.classify_status(response).await);
                            }
                        }
                    }
                    return Err(self.classify_status(response).await);
                }
                Err(err) if is_network_error(&err) => {
                    if network_retries < self.retry.max_network_retries {
                        network_retries += 1;
                        let delay = self.retry.base_delay * 2u32.pow(network_retries - 1);
                        tracing::warn!(
                            target: TARGET,
                            path = %spec.path,
                            retry = network_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "network failure, backing off before retry"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    tracing::error!(
                        target: TARGET,
                        path = %spec.path,
                        attempts = network_retries + 1,
                        error = %err,
                        "network retries exhausted"
                    );
                    return Err(ApiError::NetworkExhausted {
                        attempts: network_retries + 1,
                        user_message: NETWORK_ERROR_MESSAGE,
                        source: err,
                    });
                }
                Err(err) => return Err(ApiError::Transport(err)),
            }
        }
    }

    /// Pipeline plus JSON decoding of the raw response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<T, ApiError> {
        decode_body(self.send(spec).await?).await
    }

    /// Pipeline plus unwrapping of the standard `{success, data}` envelope.
    pub(crate) async fn send_data<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.send_json(spec).await?;
        tracing::trace!(target: TARGET, success = envelope.success, "unwrapped response envelope");
        Ok(envelope.data)
    }

    /// Pipeline for calls whose response body is irrelevant.
    pub(crate) async fn send_unit(&self, spec: RequestSpec) -> Result<(), ApiError> {
        self.send(spec).await.map(drop)
    }

    /// One transport attempt. The outer `Result` is a pre-send rejection
    /// (bad URL, credential store failure) that must not be retried; the
    /// inner one is the transport outcome.
    async fn dispatch(
        &self,
        spec: &RequestSpec,
    ) -> Result<Result<Response, reqwest::Error>, ApiError> {
        let mut url = build_url(&self.base_url, &spec.path)?;
        if !spec.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &spec.query {
                pairs.append_pair(key, value);
            }
        }

        let mut request = self.http.request(spec.method.clone(), url.clone());
        if let Some(token) = self.credentials.access_token()? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        tracing::debug!(target: TARGET, method = %spec.method, %url, "dispatching request");
        Ok(request.send().await)
    }

    /// Exchanges the stored refresh token for a new access token. This call
    /// bypasses the pipeline so a 401 here cannot recurse into another
    /// refresh cycle. On any failure the session is cleared and the
    /// auth-events sink fires once.
    async fn refresh_session(&self, refresh_token: String) -> Result<(), ApiError> {
        let url = build_url(&self.base_url, "/api/auth/refresh")?;
        tracing::info!(target: TARGET, "access token rejected, attempting refresh");

        let outcome = self
            .http
            .post(url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await;

        let failure = match outcome {
            Ok(response) if response.status().is_success() => {
                match decode_body::<RefreshResponse>(response).await {
                    Ok(tokens) => {
                        self.credentials.set_access_token(&tokens.token)?;
                        if let Some(rotated) = &tokens.refresh_token {
                            self.credentials.set_refresh_token(rotated)?;
                        }
                        tracing::info!(
                            target: TARGET,
                            rotated = tokens.refresh_token.is_some(),
                            "session refreshed"
                        );
                        return Ok(());
                    }
                    Err(err) => err,
                }
            }
            Ok(response) => self.classify_status(response).await,
            Err(err) => ApiError::Transport(err),
        };

        tracing::warn!(target: TARGET, error = %failure, "refresh failed, clearing session");
        if let Err(err) = self.credentials.clear() {
            tracing::warn!(target: TARGET, error = %err, "failed to clear credentials after refresh failure");
        }
        self.auth_events.on_session_expired();
        Err(ApiError::RefreshFailed(Box::new(failure)))
    }

    /// Maps a terminal non-success response onto the error taxonomy.
    /// Annotation is additive: the raw status and body message survive on
    /// the returned error.
    async fn classify_status(&self, response: Response) -> ApiError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| body.clone());

        match status {
            StatusCode::FORBIDDEN => ApiError::Status {
                status,
                message,
                user_message: Some(ACCESS_DENIED_MESSAGE),
            },
            StatusCode::NOT_FOUND => ApiError::Status {
                status,
                message,
                user_message: Some(NOT_FOUND_MESSAGE),
            },
            StatusCode::INTERNAL_SERVER_ERROR => ApiError::Status {
                status,
                message,
                user_message: Some(SERVER_ERROR_MESSAGE),
            },
            StatusCode::BAD_REQUEST => {
                match parsed.and_then(|b| b.errors).filter(|e| !e.is_empty()) {
                    Some(errors) => ApiError::Validation {
                        status,
                        user_message: VALIDATION_MESSAGE,
                        errors,
                    },
                    None => ApiError::Status {
                        status,
                        message,
                        user_message: None,
                    },
                }
            }
            _ => ApiError::Status {
                status,
                message,
                user_message: None,
            },
        }
    }
}

/// A failure counts as a network error when no HTTP response came back and
/// the client did not time the request out itself. Deliberately coarse:
/// DNS failures, refused connections and dropped sockets all look the same
/// from here.
fn is_network_error(err: &reqwest::Error) -> bool {
    err.status().is_none() && !err.is_timeout() && !err.is_builder() && !err.is_redirect()
}

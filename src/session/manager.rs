use crate::config::ClientConfig;
use crate::domain::models::{RoleCode, Session};
use crate::error::{status_error, ClientError, Result};
use crate::session::storage::SessionStorage;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Where the session state machine currently sits.
///
/// Each entry into `Authenticated` carries a new `generation`, so observers
/// can tell a fresh sign-in apart from a token refresh (which publishes
/// nothing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Authenticated { generation: u64 },
}

/// One logical request plus its retry bookkeeping. The retry flag lives here,
/// never on the wire payload.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl RequestAttempt {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::POST, path).with_json(body)
    }

    pub fn put<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::PUT, path).with_json(body)
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_retry(&self) -> bool {
        self.retried
    }

    fn mark_retry(&mut self) {
        self.retried = true;
    }
}

/// Result of [`SessionManager::login`]. Failures are reported here rather
/// than as an `Err`.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub success: bool,
    pub role_code: Option<RoleCode>,
    pub session: Option<Session>,
    pub message: Option<String>,
}

impl LoginOutcome {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            role_code: None,
            session: None,
            message: Some(message),
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// Owns the authenticated identity and the HTTP client every request goes
/// through.
pub struct SessionManager {
    config: ClientConfig,
    http: reqwest::Client,
    storage: Arc<dyn SessionStorage>,
    session: RwLock<Option<Session>>,
    phase: watch::Sender<AuthPhase>,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(config: ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        // The refresh endpoint authenticates with an HttpOnly cookie set at
        // login, so the client keeps a cookie jar.
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        let (phase, _) = watch::channel(AuthPhase::Anonymous);
        Ok(Self {
            config,
            http,
            storage,
            session: RwLock::new(None),
            phase,
            generation: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn current(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub fn phase(&self) -> AuthPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.phase.subscribe()
    }

    /// Picks up a session persisted by an earlier run.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let Some(stored) = self.storage.load().await? else {
            return Ok(None);
        };
        if !stored.has_token() {
            tracing::warn!("Stored session for user {} has no access token, discarding", stored.id);
            self.storage.clear().await?;
            return Ok(None);
        }
        tracing::info!("Restored session for user {} ({})", stored.id, stored.role_code.label());
        self.install(stored.clone()).await;
        Ok(Some(stored))
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let response = match self
            .http
            .post(self.config.url("/auth"))
            .json(&Credentials { email, password })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Login request failed: {}", e);
                return LoginOutcome::failed(e.to_string());
            }
        };

        if !response.status().is_success() {
            let err = status_error(response).await;
            tracing::info!("Login rejected: {}", err);
            let fallback = err.to_string();
            return LoginOutcome::failed(err.user_message(&fallback));
        }

        let session = match response.json::<Session>().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Login response could not be decoded: {}", e);
                return LoginOutcome::failed(e.to_string());
            }
        };

        tracing::info!("User {} logged in as {}", session.id, session.role_code.label());
        self.install(session.clone()).await;
        LoginOutcome {
            success: true,
            role_code: Some(session.role_code),
            session: Some(session),
            message: None,
        }
    }

    /// Clears the in-memory and persisted session. Safe to call repeatedly.
    pub async fn logout(&self) {
        let previous = self.session.write().await.take();
        if let Err(e) = self.storage.clear().await {
            tracing::error!("Failed to clear persisted session: {}", e);
        }
        if let Some(previous) = previous {
            tracing::info!("User {} logged out", previous.id);
        }
        self.phase.send_if_modified(|phase| {
            if *phase == AuthPhase::Anonymous {
                false
            } else {
                *phase = AuthPhase::Anonymous;
                true
            }
        });
    }

    /// Dispatches `attempt` with the current bearer token. A 401 triggers one
    /// token refresh and one re-issue; a second 401 fails the call.
    pub async fn send(&self, mut attempt: RequestAttempt) -> Result<Response> {
        loop {
            let token = self.access_token().await;
            let response = self.dispatch(&attempt, token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                if response.status().is_success() {
                    return Ok(response);
                }
                return Err(status_error(response).await);
            }

            if attempt.is_retry() {
                tracing::warn!(
                    "{} {} still unauthorized after token refresh",
                    attempt.method(),
                    attempt.path()
                );
                return Err(ClientError::Unauthorized);
            }
            if token.is_none() {
                return Err(status_error(response).await);
            }

            attempt.mark_retry();
            tracing::info!(
                "Access token rejected on {} {}, refreshing",
                attempt.method(),
                attempt.path()
            );
            if let Err(e) = self.refresh_token().await {
                tracing::warn!("Token refresh failed, signing out: {}", e);
                self.logout().await;
                return Err(ClientError::RefreshFailed(Box::new(e)));
            }
        }
    }

    pub async fn send_json<T: DeserializeOwned>(&self, attempt: RequestAttempt) -> Result<T> {
        let response = self.send(attempt).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(RequestAttempt::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(RequestAttempt::post(path, body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(RequestAttempt::put(path, body)?).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(RequestAttempt::delete(path)).await
    }

    async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    async fn dispatch(&self, attempt: &RequestAttempt, token: Option<&str>) -> Result<Response> {
        let mut request = self
            .http
            .request(attempt.method.clone(), self.config.url(&attempt.path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &attempt.body {
            request = request.json(body);
        }
        tracing::debug!(
            method = %attempt.method,
            path = %attempt.path,
            retry = attempt.retried,
            "dispatching request"
        );
        Ok(request.send().await?)
    }

    /// Exchanges the refresh cookie for a new access token and stores it.
    /// Identity fields are left untouched.
    async fn refresh_token(&self) -> Result<String> {
        let response = self.http.get(self.config.url("/auth/refresh")).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let RefreshResponse { access_token } = response.json().await?;

        let updated = {
            let mut guard = self.session.write().await;
            let session = guard.as_mut().ok_or(ClientError::NotAuthenticated)?;
            session.access_token = access_token.clone();
            session.clone()
        };
        self.persist(&updated).await;
        tracing::info!("Access token refreshed for user {}", updated.id);
        Ok(access_token)
    }

    async fn install(&self, session: Session) {
        self.persist(&session).await;
        *self.session.write().await = Some(session);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.phase.send_replace(AuthPhase::Authenticated { generation });
    }

    async fn persist(&self, session: &Session) {
        let result = if session.has_token() {
            self.storage.save(session).await
        } else {
            self.storage.clear().await
        };
        if let Err(e) = result {
            tracing::error!("Failed to persist session for user {}: {}", session.id, e);
        }
    }
}

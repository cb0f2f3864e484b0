//! The session credential manager.
//!
//! `SessionManager` is the only owner of the stored tokens. The API client
//! calls into it before every send (to attach the bearer token) and after
//! every 401 (to refresh and replay once). The rest of the application only
//! sees session events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{header, Client, RequestBuilder};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::credentials::{self, Credentials, TokenResponse, REFRESH_TOKEN_KEY};
use super::store::TokenStore;
use super::AuthError;
use crate::api::ApiRequest;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Capacity of the session event channel.
/// Events are rare; slow subscribers only ever need the latest few.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LoggedOut,
    /// Refresh failed; the user has to log in again
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    Ended(EndReason),
}

/// What the API client should do with a request that came back 401.
#[derive(Debug, Clone, PartialEq)]
pub enum UnauthorizedOutcome {
    /// Resend this (retry-marked) request with the current token
    Retry(ApiRequest),
    /// The request was already a retry; surface the original failure
    Propagate,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

pub struct SessionManager {
    client: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    events: broadcast::Sender<SessionEvent>,
    /// Serializes refreshes so concurrent 401s trigger a single exchange
    refresh_gate: Mutex<()>,
}

impl SessionManager {
    pub fn new(client: Client, base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            events,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn state(&self) -> SessionState {
        match Credentials::load(self.store.as_ref()) {
            Ok(Some(_)) => SessionState::Active,
            Ok(None) => SessionState::NoSession,
            Err(e) => {
                warn!(error = %e, "Failed to read session state");
                SessionState::NoSession
            }
        }
    }

    /// The stored record, if complete.
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::load(self.store.as_ref()).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load credentials");
            None
        })
    }

    /// True iff an expiry is stored and lies strictly in the future.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match credentials::load_expiry(self.store.as_ref()) {
            Ok(Some(expires_at)) => now < expires_at,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Failed to read token expiry");
                false
            }
        }
    }

    /// The access token to send, if the session is currently valid.
    pub fn bearer_token(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        credentials::get_entry(self.store.as_ref(), credentials::ACCESS_TOKEN_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read access token");
                None
            })
    }

    /// Set the Authorization header when the session is valid; otherwise the
    /// request goes out unauthenticated.
    pub fn attach_credential(&self, builder: RequestBuilder) -> RequestBuilder {
        Self::with_bearer(builder, self.bearer_token().as_deref())
    }

    pub(crate) fn with_bearer(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Authenticate and store the returned credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials, AuthError> {
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, username, "Login rejected");
            return Err(AuthError::from_login_status(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("login response: {}", e)))?;
        let creds = token.into_credentials(Utc::now())?;

        if let Err(e) = creds.save(self.store.as_ref()) {
            // Never leave half a record behind
            let _ = Credentials::clear(self.store.as_ref());
            return Err(e);
        }

        info!(username, expires_at = %creds.expires_at, "Login successful");
        self.emit(SessionEvent::LoggedIn);
        Ok(creds)
    }

    /// Tell the backend we are leaving, then drop the credentials no matter
    /// what the backend said.
    pub async fn logout(&self) {
        let request = self.attach_credential(self.client.post(self.url(LOGOUT_PATH)));
        match request.send().await {
            Ok(response) if response.status().is_success() => debug!("Logout acknowledged"),
            Ok(response) => warn!(status = %response.status(), "Logout request rejected"),
            Err(e) => warn!(error = %e, "Logout request failed"),
        }

        // A refresh already in flight would write a new record after the
        // clear; let it land first, then wipe it.
        let _guard = self.refresh_gate.lock().await;
        if let Err(e) = Credentials::clear(self.store.as_ref()) {
            warn!(error = %e, "Failed to clear credentials on logout");
        }
        info!("Logged out");
        self.emit(SessionEvent::Ended(EndReason::LoggedOut));
    }

    /// Exchange the stored refresh token for a new record.
    ///
    /// Any failure clears the stored record and ends the session.
    pub async fn refresh(&self) -> Result<Credentials, AuthError> {
        let _guard = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Credentials, AuthError> {
        let result = match credentials::get_entry(self.store.as_ref(), REFRESH_TOKEN_KEY) {
            Ok(Some(refresh_token)) => self.exchange_refresh_token(&refresh_token).await,
            Ok(None) => {
                // Nothing to end: the session is already gone (logout, earlier failure)
                debug!("No refresh token stored");
                return Err(AuthError::NoSession);
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(creds) => {
                debug!(expires_at = %creds.expires_at, "Access token refreshed");
                self.emit(SessionEvent::Refreshed);
                Ok(creds)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.end_session(EndReason::Expired);
                Err(e)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<Credentials, AuthError> {
        let response = self
            .client
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_refresh_status(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("refresh response: {}", e)))?;
        let creds = token.into_credentials(Utc::now())?;
        creds.save(self.store.as_ref())?;
        Ok(creds)
    }

    fn end_session(&self, reason: EndReason) {
        if let Err(e) = Credentials::clear(self.store.as_ref()) {
            warn!(error = %e, "Failed to clear credentials");
        }
        self.emit(SessionEvent::Ended(reason));
    }

    /// Recover from a 401.
    ///
    /// `used_token` is the bearer the failed request carried. If another task
    /// already rotated the token while we waited for the gate, the new token
    /// is reused instead of refreshing a second time.
    pub async fn handle_unauthorized(
        &self,
        request: &ApiRequest,
        used_token: Option<&str>,
    ) -> Result<UnauthorizedOutcome, AuthError> {
        if request.is_retry() {
            debug!(path = request.path(), "Retried request still unauthorized");
            return Ok(UnauthorizedOutcome::Propagate);
        }

        let _guard = self.refresh_gate.lock().await;

        if let Some(current) = self.bearer_token() {
            if used_token != Some(current.as_str()) {
                debug!(path = request.path(), "Token already rotated, replaying");
                return Ok(UnauthorizedOutcome::Retry(request.as_retry()));
            }
        }

        self.refresh_locked().await?;
        Ok(UnauthorizedOutcome::Retry(request.as_retry()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;
    use chrono::Duration;

    fn manager_with(creds: Option<&Credentials>) -> SessionManager {
        let store = Arc::new(MemoryStore::new());
        if let Some(creds) = creds {
            creds.save(store.as_ref()).unwrap();
        }
        // Nothing in these tests reaches the network
        SessionManager::new(Client::new(), "http://127.0.0.1:9", store)
    }

    fn creds(expires_at: DateTime<Utc>) -> Credentials {
        Credentials {
            access_token: "tok-1".into(),
            refresh_token: "ref-1".into(),
            expires_at,
        }
    }

    #[test]
    fn test_is_valid_boundary() {
        let expires_at = DateTime::<Utc>::from_timestamp_millis(1_800_000_000_000).unwrap();
        let session = manager_with(Some(&creds(expires_at)));
        assert!(session.is_valid_at(expires_at - Duration::milliseconds(1)));
        assert!(!session.is_valid_at(expires_at));
    }

    #[test]
    fn test_no_expiry_is_invalid() {
        let session = manager_with(None);
        assert!(!session.is_valid());
        assert_eq!(session.state(), SessionState::NoSession);
        assert_eq!(session.bearer_token(), None);
    }

    #[test]
    fn test_attach_credential_when_valid() {
        let session = manager_with(Some(&creds(Utc::now() + Duration::hours(1))));
        let request = session
            .attach_credential(Client::new().get("http://localhost/api/stats"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer tok-1"
        );
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn test_attach_credential_skipped_when_expired() {
        let session = manager_with(Some(&creds(Utc::now() - Duration::seconds(1))));
        let request = session
            .attach_credential(Client::new().get("http://localhost/api/stats"))
            .build()
            .unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_retried_request_propagates_without_refresh() {
        let session = manager_with(Some(&creds(Utc::now() + Duration::hours(1))));
        let retry = ApiRequest::get("/api/stats").as_retry();

        let outcome = session.handle_unauthorized(&retry, Some("tok-1")).await.unwrap();
        assert_eq!(outcome, UnauthorizedOutcome::Propagate);
        // Credentials untouched: no refresh attempt was made
        assert_eq!(session.bearer_token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_rotated_token_is_reused() {
        let session = manager_with(Some(&creds(Utc::now() + Duration::hours(1))));
        let request = ApiRequest::get("/api/stats");

        let outcome = session
            .handle_unauthorized(&request, Some("stale-token"))
            .await
            .unwrap();
        assert_eq!(outcome, UnauthorizedOutcome::Retry(request.as_retry()));
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_no_session() {
        let session = manager_with(None);
        let mut events = session.subscribe();

        let err = session.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
        // No session existed, so none is reported as ended
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_refresh_failure_with_record_ends_session() {
        // Nothing listens on the discard port, so the exchange fails
        let session = manager_with(Some(&creds(Utc::now() + Duration::minutes(2))));
        let mut events = session.subscribe();

        assert!(session.refresh().await.is_err());
        assert_eq!(session.state(), SessionState::NoSession);
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::Ended(EndReason::Expired)
        );
    }
}

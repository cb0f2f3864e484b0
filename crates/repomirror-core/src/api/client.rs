//! API client for communicating with the RepoMirror REST API.
//!
//! Every call goes through [`ApiClient::send`], which attaches the session's
//! bearer token, recovers from a 401 by refreshing once, and backs off on
//! rate limiting.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{AuthError, Credentials, SessionManager, TokenStore, UnauthorizedOutcome};
use crate::models::{Activity, DashboardStats, Repository, SecurityStatus, UserProfile};

use super::{ApiError, ApiRequest};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

pub const ME_PATH: &str = "/api/auth/me";
pub const STATS_PATH: &str = "/api/stats";
pub const ACTIVITIES_PATH: &str = "/api/activities";
pub const SECURITY_STATUS_PATH: &str = "/api/security/status";
pub const REPOSITORIES_PATH: &str = "/repositories";

/// API client for RepoMirror.
/// Clone is cheap - the HTTP client and session manager are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client and its session manager over the given store
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let session = Arc::new(SessionManager::new(client.clone(), base_url, store));
        Ok(Self { client, session })
    }

    /// Build a client around an existing session, sharing its connection pool
    pub fn with_session(client: Client, session: Arc<SessionManager>) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials, AuthError> {
        self.session.login(username, password).await
    }

    pub async fn logout(&self) {
        self.session.logout().await
    }

    fn build(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.session.base_url(), request.path());
        let builder = self.client.request(request.method().clone(), url);
        match request.body() {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    /// Send a request through the credential pipeline.
    ///
    /// A 401 is handed to the session manager, which refreshes the token and
    /// returns a retry-marked copy; that copy is sent once. A second 401
    /// surfaces as [`ApiError::Unauthorized`].
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let mut request = request;
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let used_token = self.session.bearer_token();
            let response = SessionManager::with_bearer(self.build(&request), used_token.as_deref())
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            match status {
                StatusCode::UNAUTHORIZED => {
                    match self
                        .session
                        .handle_unauthorized(&request, used_token.as_deref())
                        .await?
                    {
                        UnauthorizedOutcome::Retry(retry) => {
                            debug!(path = retry.path(), attempt = retry.attempt(), "Replaying request");
                            request = retry;
                        }
                        UnauthorizedOutcome::Propagate => return Err(ApiError::Unauthorized),
                    }
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(path = request.path(), retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ApiError::from_status(status, &body));
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::get(path)).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", path, e)))
    }

    // ===== Data Fetching Methods =====

    /// Fetch the logged-in user's profile
    pub async fn fetch_current_user(&self) -> Result<UserProfile, ApiError> {
        self.get(ME_PATH).await
    }

    pub async fn fetch_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get(STATS_PATH).await
    }

    pub async fn fetch_activities(&self) -> Result<Vec<Activity>, ApiError> {
        self.get(ACTIVITIES_PATH).await
    }

    pub async fn fetch_security_status(&self) -> Result<SecurityStatus, ApiError> {
        self.get(SECURITY_STATUS_PATH).await
    }

    pub async fn fetch_repositories(&self) -> Result<Vec<Repository>, ApiError> {
        self.get(REPOSITORIES_PATH).await
    }

    /// Fetch stats and recent activity concurrently. Either failure fails both.
    pub async fn fetch_dashboard(&self) -> Result<(DashboardStats, Vec<Activity>), ApiError> {
        futures::try_join!(self.fetch_stats(), self.fetch_activities())
    }
}

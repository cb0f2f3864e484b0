//! Proactive token refresh.
//!
//! A background task wakes on a fixed interval and refreshes the access token
//! when it is still valid but about to expire, so requests rarely hit a 401.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::credentials::Credentials;
use super::SessionManager;

/// How often the refresh task checks the token (5 minutes)
pub const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do: no session, already expired, or not yet near expiry
    Idle,
    Refreshed,
    Failed,
}

impl SessionManager {
    /// One iteration of the refresh loop.
    pub async fn refresh_tick(&self) -> TickOutcome {
        let now = Utc::now();
        let creds = match Credentials::load(self.store()) {
            Ok(Some(creds)) => creds,
            Ok(None) => return TickOutcome::Idle,
            Err(e) => {
                warn!(error = %e, "Failed to load credentials");
                return TickOutcome::Idle;
            }
        };

        let remaining = creds.time_until_expiry_at(now);
        if !creds.needs_refresh_at(now) {
            debug!(remaining_secs = remaining.num_seconds(), "Token expired or not near expiry");
            return TickOutcome::Idle;
        }

        info!(remaining_secs = remaining.num_seconds(), "Token near expiry, refreshing");
        match self.refresh().await {
            Ok(_) => TickOutcome::Refreshed,
            Err(e) => {
                warn!(error = %e, "Proactive token refresh failed");
                TickOutcome::Failed
            }
        }
    }
}

/// Spawn the refresh loop with the default interval.
pub fn spawn_refresh_loop(session: Arc<SessionManager>) -> JoinHandle<()> {
    spawn_refresh_loop_every(session, REFRESH_CHECK_INTERVAL)
}

/// Spawn the refresh loop. The first check happens one `period` from now.
/// The loop runs until the returned handle is aborted or the runtime stops.
pub fn spawn_refresh_loop_every(session: Arc<SessionManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            session.refresh_tick().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::EXPIRY_KEY;
    use crate::auth::store::{MemoryStore, TokenStore};
    use chrono::Duration as ChronoDuration;

    fn session_expiring_in(delta: ChronoDuration) -> SessionManager {
        let store = Arc::new(MemoryStore::new());
        Credentials {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now() + delta,
        }
        .save(store.as_ref())
        .unwrap();
        SessionManager::new(reqwest::Client::new(), "http://127.0.0.1:9", store)
    }

    #[tokio::test]
    async fn test_tick_idle_when_far_from_expiry() {
        let session = session_expiring_in(ChronoDuration::minutes(30));
        assert_eq!(session.refresh_tick().await, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn test_tick_idle_when_already_expired() {
        let session = session_expiring_in(ChronoDuration::minutes(-1));
        assert_eq!(session.refresh_tick().await, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn test_tick_idle_with_incomplete_record() {
        // An expiry near its end but no tokens to go with it
        let store = Arc::new(MemoryStore::new());
        let expiry = Utc::now() + ChronoDuration::minutes(2);
        store.set(EXPIRY_KEY, &expiry.timestamp_millis().to_string()).unwrap();
        let session = SessionManager::new(reqwest::Client::new(), "http://127.0.0.1:9", store);
        assert_eq!(session.refresh_tick().await, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn test_tick_idle_without_session() {
        let session = SessionManager::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(session.refresh_tick().await, TickOutcome::Idle);
    }
}

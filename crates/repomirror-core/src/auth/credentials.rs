use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::store::TokenStore;
use super::AuthError;

/// Store key for the access token
pub const ACCESS_TOKEN_KEY: &str = "repomirror_token";

/// Store key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "repomirror_refresh_token";

/// Store key for the expiry, an epoch-millisecond integer as a string
pub const EXPIRY_KEY: &str = "repomirror_token_expiry";

/// Remaining lifetime under which a valid token is proactively refreshed (5 minutes)
pub const REFRESH_THRESHOLD_MINUTES: i64 = 5;

/// The current session's tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Body returned by both the login and refresh endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    /// Stamp the response with its expiry. Millisecond precision matches
    /// what the store can hold, so a saved record reloads unchanged.
    pub(crate) fn into_credentials(self, issued_at: DateTime<Utc>) -> Result<Credentials, AuthError> {
        let expires_ms = issued_at
            .timestamp_millis()
            .checked_add(self.expires_in.saturating_mul(1000))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!("expires_in out of range: {}", self.expires_in))
            })?;

        Ok(Credentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: expires_ms,
        })
    }
}

impl Credentials {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn time_until_expiry_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Check if the token is still valid but close enough to expiry that it
    /// should be refreshed
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.is_valid_at(now)
            && self.time_until_expiry_at(now) < Duration::minutes(REFRESH_THRESHOLD_MINUTES)
    }

    /// Load the full record. Any missing entry means there is no session.
    pub fn load(store: &dyn TokenStore) -> Result<Option<Self>, AuthError> {
        let access_token = get_entry(store, ACCESS_TOKEN_KEY)?;
        let refresh_token = get_entry(store, REFRESH_TOKEN_KEY)?;
        let expires_at = load_expiry(store)?;

        Ok(match (access_token, refresh_token, expires_at) {
            (Some(access_token), Some(refresh_token), Some(expires_at)) => Some(Self {
                access_token,
                refresh_token,
                expires_at,
            }),
            _ => None,
        })
    }

    pub fn save(&self, store: &dyn TokenStore) -> Result<(), AuthError> {
        set_entry(store, ACCESS_TOKEN_KEY, &self.access_token)?;
        set_entry(store, REFRESH_TOKEN_KEY, &self.refresh_token)?;
        set_entry(
            store,
            EXPIRY_KEY,
            &self.expires_at.timestamp_millis().to_string(),
        )
    }

    /// Remove all three entries. Every removal is attempted even if an
    /// earlier one fails; the first failure is returned.
    pub fn clear(store: &dyn TokenStore) -> Result<(), AuthError> {
        let mut first_error = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRY_KEY] {
            if let Err(e) = store.remove(key) {
                first_error.get_or_insert(AuthError::Storage(format!("{:#}", e)));
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Read the stored expiry. A missing or unparsable value reads as `None`.
pub fn load_expiry(store: &dyn TokenStore) -> Result<Option<DateTime<Utc>>, AuthError> {
    Ok(get_entry(store, EXPIRY_KEY)?
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis))
}

pub(crate) fn get_entry(store: &dyn TokenStore, key: &str) -> Result<Option<String>, AuthError> {
    store
        .get(key)
        .map_err(|e| AuthError::Storage(format!("{:#}", e)))
}

fn set_entry(store: &dyn TokenStore, key: &str, value: &str) -> Result<(), AuthError> {
    store
        .set(key, value)
        .map_err(|e| AuthError::Storage(format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;

    fn sample(expires_at: DateTime<Utc>) -> Credentials {
        Credentials {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_valid_strictly_before_expiry() {
        let expires_at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let creds = sample(expires_at);
        assert!(creds.is_valid_at(expires_at - Duration::milliseconds(1)));
        assert!(!creds.is_valid_at(expires_at));
        assert!(!creds.is_valid_at(expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_needs_refresh_threshold() {
        let now = Utc::now();
        assert!(sample(now + Duration::minutes(4)).needs_refresh_at(now));
        assert!(!sample(now + Duration::minutes(6)).needs_refresh_at(now));
        // Already expired tokens are not refreshed proactively
        assert!(!sample(now - Duration::minutes(1)).needs_refresh_at(now));
    }

    #[test]
    fn test_token_response_expiry() {
        let issued = DateTime::<Utc>::from_timestamp_millis(1_000_000).unwrap();
        let creds = TokenResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in: 3600,
        }
        .into_credentials(issued)
        .unwrap();
        assert_eq!(creds.expires_at.timestamp_millis(), 1_000_000 + 3_600_000);
    }

    #[test]
    fn test_save_load_clear() {
        let store = MemoryStore::new();
        assert_eq!(Credentials::load(&store).unwrap(), None);

        let expires_at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        let creds = sample(expires_at);
        creds.save(&store).unwrap();
        assert_eq!(
            store.get(EXPIRY_KEY).unwrap().as_deref(),
            Some("1700000000123")
        );
        assert_eq!(Credentials::load(&store).unwrap(), Some(creds));

        Credentials::clear(&store).unwrap();
        assert_eq!(Credentials::load(&store).unwrap(), None);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_partial_record_is_no_session() {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "a").unwrap();
        store.set(EXPIRY_KEY, "99999999999999").unwrap();
        assert_eq!(Credentials::load(&store).unwrap(), None);
    }

    #[test]
    fn test_unparsable_expiry_reads_as_none() {
        let store = MemoryStore::new();
        store.set(EXPIRY_KEY, "soon").unwrap();
        assert_eq!(load_expiry(&store).unwrap(), None);
    }
}

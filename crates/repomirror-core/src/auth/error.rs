use thiserror::Error;

/// Errors produced by the session credential manager.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("No active session")]
    NoSession,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unexpected status {0} from authentication endpoint")]
    UnexpectedStatus(u16),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Coarse classification used by the shell to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    AuthenticationFailed,
    SessionExpired,
    PermissionDenied,
    TransportError,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::AuthenticationFailed => AuthErrorKind::AuthenticationFailed,
            AuthError::SessionExpired | AuthError::NoSession => AuthErrorKind::SessionExpired,
            AuthError::PermissionDenied(_) => AuthErrorKind::PermissionDenied,
            AuthError::UnexpectedStatus(_)
            | AuthError::Transport(_)
            | AuthError::InvalidResponse(_)
            | AuthError::Storage(_) => AuthErrorKind::TransportError,
        }
    }

    /// Map a failed status from the login endpoint.
    pub(crate) fn from_login_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => AuthError::AuthenticationFailed,
            403 => AuthError::PermissionDenied(body.to_string()),
            code => AuthError::UnexpectedStatus(code),
        }
    }

    /// Map a failed status from the refresh endpoint. A rejected refresh
    /// token means the session is over.
    pub(crate) fn from_refresh_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => AuthError::SessionExpired,
            403 => AuthError::PermissionDenied(body.to_string()),
            code => AuthError::UnexpectedStatus(code),
        }
    }
}

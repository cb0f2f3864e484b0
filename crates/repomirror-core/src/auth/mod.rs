//! Authentication module for managing the user's session.
//!
//! This module provides:
//! - `SessionManager`: login, logout, refresh and the 401 recovery policy
//! - `Credentials`: the access/refresh token record and its expiry
//! - `TokenStore`: file, keychain and in-memory backends for the record
//! - `refresh`: the background task that refreshes tokens before they expire

pub mod credentials;
pub mod error;
pub mod refresh;
pub mod session;
pub mod store;

pub use credentials::Credentials;
pub use error::{AuthError, AuthErrorKind};
pub use refresh::{spawn_refresh_loop, TickOutcome};
pub use session::{EndReason, SessionEvent, SessionManager, SessionState, UnauthorizedOutcome};
pub use store::{FileStore, KeyringStore, MemoryStore, TokenStore};

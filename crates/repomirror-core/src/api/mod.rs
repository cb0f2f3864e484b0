//! REST API client module for the RepoMirror backend.
//!
//! This module provides the `ApiClient` for fetching dashboard statistics,
//! recent activity, security status and the repository list.
//!
//! Requests carry the session's bearer token and are replayed once after a
//! token refresh when the backend answers 401.

pub mod client;
pub mod error;
pub mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use request::ApiRequest;

//! Core library for the RepoMirror console.
//!
//! - `auth`: session credentials, token stores and background refresh
//! - `api`: REST client with bearer attachment and refresh-and-retry on 401
//! - `models`: API response types
//! - `dashboard` / `notifications`: view state consumed by the front-end
//! - `cache`, `config`, `utils`: local persistence and helpers

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod notifications;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiRequest};
pub use auth::{AuthError, Credentials, SessionEvent, SessionManager};
pub use config::Config;

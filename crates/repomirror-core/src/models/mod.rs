//! Data models for the RepoMirror API.
//!
//! These types mirror the JSON bodies returned by the backend and carry the
//! small amount of display logic the dashboard needs.

pub mod activity;
pub mod repository;
pub mod security;
pub mod stats;
pub mod user;

pub use activity::{Activity, ActivityKind, ActivityStatus};
pub use repository::Repository;
pub use security::{SecurityStatus, SecurityWarning};
pub use stats::{BackupHistoryPoint, DashboardStats, StorageSlice};
pub use user::UserProfile;

//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager`, which keeps the last fetched
//! dashboard data on disk so the dashboard has something to show behind the
//! login form. Data is cached in JSON format and considered stale after the
//! dashboard's refresh interval.

pub mod manager;

pub use manager::{CachedData, CacheManager};

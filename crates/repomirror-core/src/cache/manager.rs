use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Activity, DashboardStats, Repository, SecurityStatus};

/// Consider cache stale after 5 minutes, the dashboard's polling interval.
const CACHE_STALE_MINUTES: i64 = 5;

const STATS: &str = "stats";
const ACTIVITIES: &str = "activities";
const SECURITY: &str = "security";
const REPOSITORIES: &str = "repositories";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Includes negative ages from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() >= CACHE_STALE_MINUTES
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        debug!(name, age_minutes = cached.age_minutes(), "Loaded cache entry");
        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    pub fn load_stats(&self) -> Result<Option<CachedData<DashboardStats>>> {
        self.load(STATS)
    }

    pub fn save_stats(&self, stats: &DashboardStats) -> Result<()> {
        self.save(STATS, stats)
    }

    pub fn load_activities(&self) -> Result<Option<CachedData<Vec<Activity>>>> {
        self.load(ACTIVITIES)
    }

    pub fn save_activities(&self, activities: &[Activity]) -> Result<()> {
        self.save(ACTIVITIES, &activities)
    }

    pub fn load_security(&self) -> Result<Option<CachedData<SecurityStatus>>> {
        self.load(SECURITY)
    }

    pub fn save_security(&self, status: &SecurityStatus) -> Result<()> {
        self.save(SECURITY, status)
    }

    pub fn load_repositories(&self) -> Result<Option<CachedData<Vec<Repository>>>> {
        self.load(REPOSITORIES)
    }

    pub fn save_repositories(&self, repositories: &[Repository]) -> Result<()> {
        self.save(REPOSITORIES, &repositories)
    }

    /// Age of the dashboard snapshot for the status bar
    pub fn last_updated(&self) -> String {
        match self.load::<serde_json::Value>(STATS) {
            Ok(Some(cached)) => cached.age_display(),
            _ => "never".to_string(),
        }
    }

    /// Remove every cached file, used on logout
    pub fn clear(&self) -> Result<()> {
        for name in [STATS, ACTIVITIES, SECURITY, REPOSITORIES] {
            let path = self.cache_path(name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {}", name))?;
            }
        }
        Ok(())
    }
}

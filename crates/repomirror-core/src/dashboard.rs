//! Dashboard view state.
//!
//! Holds the latest stats and activity list and derives what the dashboard
//! renders from them: the four summary cards and the two chart series.

use chrono::{DateTime, Utc};

use crate::models::{Activity, DashboardStats};
use crate::utils::{format_date, format_storage};

/// One of the summary cards along the top of the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub stats: DashboardStats,
    pub activities: Vec<Activity>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// Replace everything with a fresh fetch
    pub fn apply(&mut self, stats: DashboardStats, activities: Vec<Activity>) {
        self.apply_at(stats, activities, Utc::now());
    }

    pub fn apply_at(&mut self, stats: DashboardStats, activities: Vec<Activity>, at: DateTime<Utc>) {
        self.stats = stats;
        self.activities = activities;
        self.last_updated = Some(at);
    }

    pub fn has_data(&self) -> bool {
        self.last_updated.is_some()
    }

    pub fn cards(&self) -> [SummaryCard; 4] {
        [
            SummaryCard {
                label: "Total Repositories",
                value: self.stats.total_repos.to_string(),
            },
            SummaryCard {
                label: "Active Backups",
                value: self.stats.active_backups.to_string(),
            },
            SummaryCard {
                label: "Storage",
                value: format_storage(self.stats.storage_used),
            },
            SummaryCard {
                label: "Last Backup",
                value: format_date(self.stats.last_backup.as_deref()),
            },
        ]
    }

    /// Backups per day, oldest first as the API returns them
    pub fn backup_series(&self) -> Vec<(&str, u64)> {
        self.stats
            .backup_history
            .iter()
            .map(|p| (p.date.as_str(), p.count))
            .collect()
    }

    /// Bytes per storage backend type
    pub fn storage_series(&self) -> Vec<(&str, u64)> {
        self.stats
            .storage_distribution
            .iter()
            .map(|s| (s.kind.as_str(), s.size))
            .collect()
    }

    /// Share of total storage per backend, in whole percent.
    /// Computed in u128 so backend-supplied sizes cannot overflow.
    pub fn storage_shares(&self) -> Vec<(&str, u64)> {
        let total: u128 = self
            .stats
            .storage_distribution
            .iter()
            .map(|s| u128::from(s.size))
            .sum();
        if total == 0 {
            return Vec::new();
        }
        self.stats
            .storage_distribution
            .iter()
            .map(|s| (s.kind.as_str(), (u128::from(s.size) * 100 / total) as u64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackupHistoryPoint, StorageSlice};

    fn sample_stats() -> DashboardStats {
        DashboardStats {
            total_repos: 7,
            active_backups: 2,
            storage_used: 1536,
            last_backup: None,
            backup_history: vec![
                BackupHistoryPoint { date: "2024-03-01".into(), count: 3 },
                BackupHistoryPoint { date: "2024-03-02".into(), count: 5 },
            ],
            storage_distribution: vec![
                StorageSlice { kind: "s3".into(), size: 300 },
                StorageSlice { kind: "local".into(), size: 100 },
            ],
        }
    }

    #[test]
    fn test_empty_state() {
        let state = DashboardState::default();
        assert!(!state.has_data());
        assert_eq!(state.cards()[3].value, "Never");
        assert!(state.storage_shares().is_empty());
    }

    #[test]
    fn test_apply_replaces_data() {
        let mut state = DashboardState::default();
        state.apply(sample_stats(), Vec::new());
        assert!(state.has_data());

        let cards = state.cards();
        assert_eq!(cards[0].value, "7");
        assert_eq!(cards[2].value, "1.50 KB");
        assert_eq!(state.backup_series(), vec![("2024-03-01", 3), ("2024-03-02", 5)]);
        assert_eq!(state.storage_series(), vec![("s3", 300), ("local", 100)]);
        assert_eq!(state.storage_shares(), vec![("s3", 75), ("local", 25)]);

        state.apply(DashboardStats::default(), Vec::new());
        assert!(state.backup_series().is_empty());
    }

    #[test]
    fn test_storage_shares_with_huge_sizes() {
        let mut stats = sample_stats();
        stats.storage_distribution = vec![
            StorageSlice { kind: "s3".into(), size: u64::MAX },
            StorageSlice { kind: "local".into(), size: u64::MAX },
        ];
        let mut state = DashboardState::default();
        state.apply(stats, Vec::new());

        assert_eq!(state.storage_shares(), vec![("s3", 50), ("local", 50)]);
    }
}

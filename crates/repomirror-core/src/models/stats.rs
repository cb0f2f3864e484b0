use serde::{Deserialize, Serialize};

/// Response body of `GET /api/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_repos: u64,
    #[serde(default)]
    pub active_backups: u64,
    /// Bytes used across all storage backends
    #[serde(default)]
    pub storage_used: u64,
    #[serde(default)]
    pub last_backup: Option<String>,
    #[serde(default)]
    pub backup_history: Vec<BackupHistoryPoint>,
    #[serde(default)]
    pub storage_distribution: Vec<StorageSlice>,
}

/// Number of backups taken on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupHistoryPoint {
    pub date: String,
    pub count: u64,
}

/// Bytes stored in one backend type (local, s3, ftp, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSlice {
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
}

impl DashboardStats {
    pub fn total_backups_in_history(&self) -> u64 {
        self.backup_history.iter().map(|p| p.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stats() {
        let json = r#"{
            "totalRepos": 12,
            "activeBackups": 3,
            "storageUsed": 1048576,
            "lastBackup": "2024-03-01T10:00:00Z",
            "backupHistory": [{"date": "2024-02-29", "count": 4}, {"date": "2024-03-01", "count": 2}],
            "storageDistribution": [{"type": "s3", "size": 1000}, {"type": "local", "size": 24}]
        }"#;
        let stats: DashboardStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_repos, 12);
        assert_eq!(stats.storage_used, 1_048_576);
        assert_eq!(stats.total_backups_in_history(), 6);
        assert_eq!(stats.storage_distribution[0].kind, "s3");
    }

    #[test]
    fn test_parse_sparse_stats() {
        // A fresh install reports nothing but counters
        let stats: DashboardStats = serde_json::from_str(r#"{"totalRepos": 0}"#).unwrap();
        assert_eq!(stats, DashboardStats::default());
    }
}

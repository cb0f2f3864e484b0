use serde::{Deserialize, Serialize};

/// One entry of `GET /api/activities`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: String,
    pub status: ActivityStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Backup,
    Clone,
    Delete,
    Error,
    #[serde(other)]
    Other,
}

impl ActivityKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ActivityKind::Backup => "⟳",
            ActivityKind::Clone => "⑂",
            ActivityKind::Delete => "✗",
            ActivityKind::Error => "!",
            ActivityKind::Other => "•",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Success,
    Error,
    Pending,
    InProgress,
    #[serde(other)]
    Unknown,
}

impl ActivityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "success",
            ActivityStatus::Error => "error",
            ActivityStatus::Pending => "pending",
            ActivityStatus::InProgress => "in progress",
            ActivityStatus::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activity_list() {
        let json = r#"[
            {"id": 1, "type": "backup", "description": "Backed up repo-a", "timestamp": "2024-03-01T10:00:00Z", "status": "success"},
            {"id": 2, "type": "mirror", "description": "Mirrored repo-b", "timestamp": "2024-03-01T11:00:00Z", "status": "in_progress"},
            {"id": 3, "type": "delete", "description": "Removed repo-c", "timestamp": "2024-03-01T12:00:00Z", "status": "queued"}
        ]"#;
        let activities: Vec<Activity> = serde_json::from_str(json).unwrap();
        assert_eq!(activities.len(), 3);
        assert_eq!(activities[0].kind, ActivityKind::Backup);
        assert_eq!(activities[1].kind, ActivityKind::Other);
        assert_eq!(activities[1].status, ActivityStatus::InProgress);
        assert_eq!(activities[2].status, ActivityStatus::Unknown);
        assert_eq!(activities[1].status.label(), "in progress");
    }
}

use serde::{Deserialize, Serialize};

/// Response body of `GET /api/security/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStatus {
    pub is_secure: bool,
    #[serde(default)]
    pub last_check: Option<String>,
    #[serde(default)]
    pub warnings: Vec<SecurityWarning>,
}

// Until the first check completes the shell assumes all is well
impl Default for SecurityStatus {
    fn default() -> Self {
        Self {
            is_secure: true,
            last_check: None,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityWarning {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_insecure_status() {
        let json = r#"{"isSecure": false, "lastCheck": "2024-03-01T10:00:00Z",
            "warnings": [{"id": 7, "title": "Weak password", "message": "Rotate your admin password"}]}"#;
        let status: SecurityStatus = serde_json::from_str(json).unwrap();
        assert!(!status.is_secure);
        assert_eq!(status.warnings.len(), 1);
        assert_eq!(status.warnings[0].title, "Weak password");
    }

    #[test]
    fn test_default_is_secure() {
        assert!(SecurityStatus::default().is_secure);
    }
}

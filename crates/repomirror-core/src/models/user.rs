use serde::{Deserialize, Serialize};

/// Response body of `GET /api/auth/me`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserProfile {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Short label for the user menu button
    pub fn initials(&self) -> String {
        self.username
            .split(|c: char| !c.is_alphanumeric())
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_and_permissions() {
        let json = r#"{"username": "jane.doe", "roles": ["admin"], "permissions": ["backup:run"]}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert!(user.has_role("admin"));
        assert!(!user.has_role("viewer"));
        assert!(user.has_permission("backup:run"));
        assert!(!user.has_permission("backup:delete"));
        assert_eq!(user.initials(), "JD");
    }

    #[test]
    fn test_missing_lists_grant_nothing() {
        let user: UserProfile = serde_json::from_str(r#"{"username": "bob"}"#).unwrap();
        assert!(!user.has_permission("anything"));
        assert_eq!(user.initials(), "B");
    }
}

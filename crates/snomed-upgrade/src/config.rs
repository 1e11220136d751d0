//! Upgrade configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`CodeSystemUpgrader`](crate::CodeSystemUpgrader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    /// Claim the code system branch for the duration of an upgrade so that a
    /// second upgrade of the same branch fails fast instead of racing.
    pub serialize_per_branch: bool,
    /// Audit message recorded with the rebase. `{parent}` and `{version}` are
    /// replaced with the parent path and the parent version label.
    pub audit_message_template: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            serialize_per_branch: true,
            audit_message_template: "Upgrading extension to {parent}@{version}.".to_string(),
        }
    }
}

impl UpgradeConfig {
    /// Renders the rebase audit message.
    pub fn audit_message(&self, parent_path: &str, version: &str) -> String {
        self.audit_message_template
            .replace("{parent}", parent_path)
            .replace("{version}", version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audit_message() {
        let config = UpgradeConfig::default();
        assert!(config.serialize_per_branch);
        assert_eq!(
            config.audit_message("MAIN", "2025-01-01"),
            "Upgrading extension to MAIN@2025-01-01."
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: UpgradeConfig =
            serde_json::from_str(r#"{ "serialize_per_branch": false }"#).unwrap();
        assert!(!config.serialize_per_branch);
        assert_eq!(
            config.audit_message_template,
            UpgradeConfig::default().audit_message_template
        );
    }
}

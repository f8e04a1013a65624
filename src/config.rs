//! Configuration management for taskledger.
//!
//! This module handles the `.taskledger/config.yaml` file which stores
//! workspace settings: where the database lives and how project deletion
//! treats tasks that still reference the project.

use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file path relative to the workspace root.
pub const CONFIG_FILE_PATH: &str = ".taskledger/config.yaml";

/// Color given to projects created without one.
pub const DEFAULT_PROJECT_COLOR: &str = "#3B82F6";

/// What happens to tasks when the project they reference is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Clear `projectId` on every referencing task, then delete.
    ClearReferences,
    /// Refuse the deletion while any task references the project.
    #[default]
    RefuseIfReferenced,
}

impl DeletePolicy {
    /// Get the string representation of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClearReferences => "clear-references",
            Self::RefuseIfReferenced => "refuse-if-referenced",
        }
    }
}

/// Workspace configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Explicit database location. `None` means the per-workspace default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Project deletion policy.
    #[serde(default)]
    pub delete_policy: DeletePolicy,

    /// Color for projects created without one.
    #[serde(default = "default_project_color")]
    pub default_project_color: String,

    /// Whether a fresh database is seeded with sample projects and tasks.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
}

fn default_project_color() -> String {
    DEFAULT_PROJECT_COLOR.to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            delete_policy: DeletePolicy::default(),
            default_project_color: default_project_color(),
            seed_defaults: true,
        }
    }
}

impl LedgerConfig {
    /// Load config from a base directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(base_dir: &Path) -> Result<Option<Self>> {
        let config_path = Self::config_path(base_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Load config from a base directory, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_or_default(base_dir: &Path) -> Result<Self> {
        Ok(Self::load_from(base_dir)?.unwrap_or_default())
    }

    /// Save config to a base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, base_dir: &Path) -> Result<()> {
        let config_path = Self::config_path(base_dir);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path for a base directory.
    pub fn config_path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE_PATH)
    }

    /// Resolve the database location for a workspace.
    ///
    /// Relative `database_path` values are taken relative to `base_dir`.
    #[must_use]
    pub fn resolve_database_path(&self, base_dir: &Path) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) if path.is_absolute() => Some(path.clone()),
            Some(path) => Some(base_dir.join(path)),
            None => paths::workspace_db_path(base_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = LedgerConfig::default();
        assert!(config.database_path.is_none());
        assert_eq!(config.delete_policy, DeletePolicy::RefuseIfReferenced);
        assert_eq!(config.default_project_color, "#3B82F6");
        assert!(config.seed_defaults);
    }

    #[test]
    fn test_config_load_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(LedgerConfig::load_from(dir.path()).unwrap().is_none());
        assert_eq!(LedgerConfig::load_or_default(dir.path()).unwrap(), LedgerConfig::default());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            database_path: Some(PathBuf::from("data/ledger.db")),
            delete_policy: DeletePolicy::ClearReferences,
            default_project_color: "#000000".to_string(),
            seed_defaults: false,
        };

        config.save_to(dir.path()).unwrap();

        let loaded = LedgerConfig::load_from(dir.path()).unwrap().unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_config_yaml_format() {
        let dir = TempDir::new().unwrap();
        let config =
            LedgerConfig { delete_policy: DeletePolicy::ClearReferences, ..Default::default() };
        config.save_to(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(CONFIG_FILE_PATH)).unwrap();
        assert!(content.contains("delete_policy: clear-references"));
        assert!(!content.contains("database_path"));
    }

    #[test]
    fn test_config_partial_yaml_uses_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".taskledger")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_PATH),
            "delete_policy: refuse-if-referenced\n",
        )
        .unwrap();

        let loaded = LedgerConfig::load_from(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.default_project_color, DEFAULT_PROJECT_COLOR);
        assert!(loaded.seed_defaults);
    }

    #[test]
    fn test_config_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".taskledger")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_PATH), "delete_policy: [oops").unwrap();
        assert!(LedgerConfig::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_resolve_database_path() {
        let base = Path::new("/work");
        let relative = LedgerConfig {
            database_path: Some(PathBuf::from("db/ledger.sqlite3")),
            ..Default::default()
        };
        assert_eq!(
            relative.resolve_database_path(base),
            Some(PathBuf::from("/work/db/ledger.sqlite3"))
        );

        let absolute =
            LedgerConfig { database_path: Some(PathBuf::from("/tmp/x.db")), ..Default::default() };
        assert_eq!(absolute.resolve_database_path(base), Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_delete_policy_as_str() {
        assert_eq!(DeletePolicy::ClearReferences.as_str(), "clear-references");
        assert_eq!(DeletePolicy::RefuseIfReferenced.as_str(), "refuse-if-referenced");
    }
}

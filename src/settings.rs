//! Application settings record.
//!
//! A single `app` record in the settings collection. Its `lastUpdate`
//! timestamp is refreshed by every planner write, inside the same batch.

use crate::error::Result;
use crate::store::{Collection, DocumentStore, DocumentStoreExt, WriteBatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the settings record.
pub const SETTINGS_KEY: &str = "app";

/// Schema version written into fresh settings.
pub const SETTINGS_VERSION: &str = "1.0.0";

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Record key, always [`SETTINGS_KEY`].
    pub key: String,
    /// Data version.
    pub version: String,
    /// Last time any planner data changed.
    pub last_update: DateTime<Utc>,
    /// UI theme name.
    pub theme: String,
    /// Whether the UI saves automatically.
    pub auto_save: bool,
    /// True until default data has been seeded.
    pub is_first_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key: SETTINGS_KEY.to_string(),
            version: SETTINGS_VERSION.to_string(),
            last_update: Utc::now(),
            theme: "light".to_string(),
            auto_save: true,
            is_first_run: true,
        }
    }
}

/// Fields that can be updated on the settings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SettingsPatch {
    /// New theme (if Some).
    pub theme: Option<String>,
    /// New auto-save flag (if Some).
    pub auto_save: Option<bool>,
    /// New first-run flag (if Some).
    pub is_first_run: Option<bool>,
}

/// Reads and writes the settings record.
#[derive(Clone, Copy)]
pub struct SettingsRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> SettingsRepository<'a> {
    /// Create a repository over a store.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Current settings, or defaults when none are stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the record is corrupt.
    pub fn get(&self) -> Result<Settings> {
        self.store.ensure_available()?;
        Ok(self.store.get_as(Collection::Settings, SETTINGS_KEY)?.unwrap_or_default())
    }

    /// Merge a patch over the settings and persist them.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the write fails.
    pub fn update(&self, patch: &SettingsPatch) -> Result<Settings> {
        let mut settings = self.get()?;
        if let Some(theme) = &patch.theme {
            settings.theme.clone_from(theme);
        }
        if let Some(auto_save) = patch.auto_save {
            settings.auto_save = auto_save;
        }
        if let Some(is_first_run) = patch.is_first_run {
            settings.is_first_run = is_first_run;
        }
        settings.last_update = Utc::now();
        self.store.put_as(Collection::Settings, &settings)?;
        tracing::info!(theme = %settings.theme, auto_save = settings.auto_save, "settings updated");
        Ok(settings)
    }

    /// Queue a `lastUpdate` refresh into a batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the current settings cannot be read.
    pub fn stamp(&self, batch: &mut WriteBatch, now: DateTime<Utc>) -> Result<()> {
        let mut settings = self.get()?;
        settings.last_update = now;
        batch.put_as(Collection::Settings, &settings)
    }
}

//! User settings, read from `config.toml` in the data directory

use std::time::Duration;

use mindmap_fs::{ConfigStore, NormalizedPath};
use mindmap_versions::MAX_VERSIONS;
use serde::{Deserialize, Serialize};

use crate::Result;

/// File name of the settings file inside the data directory.
pub const SETTINGS_FILE: &str = "config.toml";

/// All settings. Every field has a default, so an empty or missing file
/// is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sync: SyncSettings,
    pub versions: VersionSettings,
    pub device: DeviceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub poll_interval_secs: u64,
    pub autosave_interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            autosave_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionSettings {
    pub max_versions: usize,
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            max_versions: MAX_VERSIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Overrides the detected device descriptor in snapshots.
    pub name: Option<String>,
}

impl Settings {
    /// Load `<data_dir>/config.toml`, or defaults when it does not exist.
    pub fn load(data_dir: &NormalizedPath) -> Result<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        Ok(ConfigStore::new().load_or_default(&path)?)
    }

    pub fn save(&self, data_dir: &NormalizedPath) -> Result<()> {
        Ok(ConfigStore::new().save(&data_dir.join(SETTINGS_FILE), self)?)
    }

    /// Poll period, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sync.poll_interval_secs.max(1))
    }

    /// Autosave period, never shorter than one second.
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.sync.autosave_interval_secs.max(1))
    }
}

//! Snapshot records and their export format

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone, Utc};
use mindmap_tree::Tree;
use serde::{Deserialize, Serialize};

use crate::diff::ChangeSummary;

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveType {
    #[default]
    Manual,
    Auto,
    /// The local tree as it was just before a newer external file replaced it.
    ConflictLocal,
    /// The external tree that replaced the local one.
    ConflictRemote,
}

impl SaveType {
    pub const ALL: [SaveType; 4] = [
        SaveType::Manual,
        SaveType::Auto,
        SaveType::ConflictLocal,
        SaveType::ConflictRemote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
            Self::ConflictLocal => "conflict-local",
            Self::ConflictRemote => "conflict-remote",
        }
    }
}

impl fmt::Display for SaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown save type '{}'", s))
    }
}

/// An immutable copy of the whole tree at one save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub id: String,
    /// Milliseconds since the Unix epoch; unique and increasing within a store.
    pub timestamp: i64,
    pub data: Tree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub device_id: String,
    pub device_name: String,
    pub node_count: usize,
    pub change_summary: ChangeSummary,
    pub save_type: SaveType,
}

impl VersionSnapshot {
    /// Local wall-clock rendering of the timestamp.
    pub fn date(&self) -> String {
        match Local.timestamp_millis_opt(self.timestamp).single() {
            Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.timestamp.to_string(),
        }
    }

    /// Download name: `version-<ISO-8601 UTC>.json` with `:` and `.`
    /// replaced by `-`.
    pub fn export_file_name(&self) -> String {
        let iso = DateTime::<Utc>::from_timestamp_millis(self.timestamp)
            .unwrap_or_default()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        format!("version-{}.json", iso.replace([':', '.'], "-"))
    }

    pub fn to_export(&self) -> VersionExport {
        VersionExport {
            version: ExportMetadata {
                timestamp: self.timestamp,
                date: self.date(),
                device_name: self.device_name.clone(),
                file_name: self.file_name.clone(),
                save_type: self.save_type,
                node_count: self.node_count,
                change_summary: self.change_summary.clone(),
            },
            data: self.data.clone(),
        }
    }
}

/// Standalone export of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionExport {
    pub version: ExportMetadata,
    pub data: Tree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub timestamp: i64,
    pub date: String,
    pub device_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub save_type: SaveType,
    pub node_count: usize,
    pub change_summary: ChangeSummary,
}

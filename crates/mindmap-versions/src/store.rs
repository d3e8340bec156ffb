//! Snapshot store with a retention cap

use mindmap_fs::{NormalizedPath, io};
use mindmap_tree::{Tree, now_millis};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{MemoryBackend, SnapshotBackend};
use crate::device::DeviceIdentity;
use crate::diff::diff;
use crate::error::{Error, Result};
use crate::snapshot::{SaveType, VersionSnapshot};

/// Number of snapshots kept by default.
pub const MAX_VERSIONS: usize = 20;

/// Records snapshots, newest first, keeping at most `max_versions`.
pub struct VersionStore {
    backend: Box<dyn SnapshotBackend>,
    device: DeviceIdentity,
    max_versions: usize,
}

impl VersionStore {
    pub fn new(backend: impl SnapshotBackend + 'static, device: DeviceIdentity) -> Self {
        Self {
            backend: Box::new(backend),
            device,
            max_versions: MAX_VERSIONS,
        }
    }

    pub fn in_memory(device: DeviceIdentity) -> Self {
        Self::new(MemoryBackend::new(), device)
    }

    /// Change the retention cap. Zero is treated as one.
    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions.max(1);
        self
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// Snapshot `tree` now.
    pub fn save_version(
        &self,
        tree: &Tree,
        file_name: Option<&str>,
        save_type: SaveType,
    ) -> Result<VersionSnapshot> {
        self.save_version_at(tree, file_name, save_type, now_millis())
    }

    /// Snapshot `tree` at `now` (milliseconds since the epoch).
    ///
    /// The summary is computed against the latest stored snapshot. A
    /// timestamp not after the latest one is bumped to one millisecond past
    /// it. Retention runs after the insert; a failed prune is logged, not
    /// returned.
    pub fn save_version_at(
        &self,
        tree: &Tree,
        file_name: Option<&str>,
        save_type: SaveType,
        now: i64,
    ) -> Result<VersionSnapshot> {
        let latest = self.latest_version()?;
        let change_summary = diff(latest.as_ref().map(|s| &s.data), tree);
        let timestamp = match &latest {
            Some(previous) if previous.timestamp >= now => previous.timestamp + 1,
            _ => now,
        };

        let random = Uuid::new_v4().simple().to_string();
        let snapshot = VersionSnapshot {
            id: format!("version-{}-{}", timestamp, &random[..9]),
            timestamp,
            data: tree.clone(),
            file_name: file_name.map(str::to_string),
            device_id: self.device.id.clone(),
            device_name: self.device.name.clone(),
            node_count: tree.node_count(),
            change_summary,
            save_type,
        };
        self.backend.insert(&snapshot)?;

        info!(
            id = %snapshot.id,
            save_type = %save_type,
            changes = ?snapshot.change_summary.major_changes,
            "Saved version snapshot"
        );

        if let Err(e) = self.prune() {
            warn!(error = %e, "Failed to prune old versions");
        }
        Ok(snapshot)
    }

    /// Every snapshot, newest first.
    pub fn all_versions(&self) -> Result<Vec<VersionSnapshot>> {
        let mut snapshots = self.backend.list()?;
        snapshots.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(snapshots)
    }

    pub fn latest_version(&self) -> Result<Option<VersionSnapshot>> {
        Ok(self.all_versions()?.into_iter().next())
    }

    pub fn get_version(&self, id: &str) -> Result<Option<VersionSnapshot>> {
        self.backend.get(id)
    }

    /// Like [`get_version`](Self::get_version) but an unknown id is an error.
    pub fn require_version(&self, id: &str) -> Result<VersionSnapshot> {
        self.get_version(id)?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    pub fn delete_version(&self, id: &str) -> Result<bool> {
        let removed = self.backend.remove(id)?;
        if removed {
            info!(id = %id, "Deleted version");
        }
        Ok(removed)
    }

    pub fn clear_all_versions(&self) -> Result<()> {
        self.backend.clear()?;
        info!("Cleared all versions");
        Ok(())
    }

    /// The export document for `snapshot`, as indented JSON.
    pub fn export_version(&self, snapshot: &VersionSnapshot) -> Result<String> {
        serde_json::to_string_pretty(&snapshot.to_export()).map_err(|source| Error::Encode {
            id: snapshot.id.clone(),
            source,
        })
    }

    /// Write the export document into `dir` and return the file's path.
    pub fn export_to(&self, snapshot: &VersionSnapshot, dir: &NormalizedPath) -> Result<NormalizedPath> {
        let path = dir.join(&snapshot.export_file_name());
        io::write_text(&path, &self.export_version(snapshot)?)?;
        info!(id = %snapshot.id, path = %path, "Exported version");
        Ok(path)
    }

    fn prune(&self) -> Result<()> {
        let snapshots = self.all_versions()?;
        if snapshots.len() <= self.max_versions {
            return Ok(());
        }

        let stale = &snapshots[self.max_versions..];
        for snapshot in stale {
            self.backend.remove(&snapshot.id)?;
            debug!(id = %snapshot.id, "Pruned version");
        }
        info!(
            removed = stale.len(),
            kept = self.max_versions,
            "Pruned old versions"
        );
        Ok(())
    }
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore")
            .field("device", &self.device)
            .field("max_versions", &self.max_versions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_tree::{Node, NodePatch};
    use pretty_assertions::assert_eq;

    fn store() -> VersionStore {
        VersionStore::in_memory(DeviceIdentity::new("device-test", "Test - host"))
    }

    #[test]
    fn summary_is_against_previous_snapshot() {
        let store = store();
        let tree = Tree::default();
        let root = tree.root_id().clone();

        let first = store.save_version_at(&tree, None, SaveType::Manual, 1_000).unwrap();
        let tree = tree.add_child(&root, Node::new("child"));
        let second = store.save_version_at(&tree, Some("plan.json"), SaveType::Auto, 2_000).unwrap();

        assert_eq!(first.change_summary.major_changes, vec!["initial version"]);
        assert_eq!(second.change_summary.nodes_added, 1);
        assert_eq!(second.node_count, 2);
        assert_eq!(second.file_name.as_deref(), Some("plan.json"));
        assert_eq!(second.device_id, "device-test");
    }

    #[test]
    fn same_millisecond_saves_stay_ordered() {
        let store = store();
        let tree = Tree::default();

        let a = store.save_version_at(&tree, None, SaveType::ConflictLocal, 500).unwrap();
        let b = store.save_version_at(&tree, None, SaveType::ConflictRemote, 500).unwrap();

        assert_eq!(b.timestamp, a.timestamp + 1);
        let ids: Vec<String> = store.all_versions().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let store = store();
        let tree = Tree::default();
        let root = tree.root_id().clone();

        let saved = store.save_version(&tree, None, SaveType::Manual).unwrap();
        let _edited = tree.update(&root, &NodePatch::new().text("renamed"));

        let stored = store.get_version(&saved.id).unwrap().unwrap();
        assert_eq!(stored.data.root().text, "Operations");
    }

    #[test]
    fn require_version_reports_unknown_ids() {
        let store = store();
        assert!(matches!(
            store.require_version("version-0-missing"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn delete_and_clear() {
        let store = store();
        let tree = Tree::default();
        let a = store.save_version_at(&tree, None, SaveType::Manual, 1).unwrap();
        store.save_version_at(&tree, None, SaveType::Manual, 2).unwrap();

        assert!(store.delete_version(&a.id).unwrap());
        assert!(!store.delete_version(&a.id).unwrap());
        assert_eq!(store.all_versions().unwrap().len(), 1);

        store.clear_all_versions().unwrap();
        assert_eq!(store.latest_version().unwrap(), None);
    }
}

//! Durable snapshot collections

use std::collections::BTreeMap;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use mindmap_fs::{NormalizedPath, io};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::snapshot::VersionSnapshot;

/// Storage for snapshots keyed by id. Ordering and retention are the
/// caller's concern.
pub trait SnapshotBackend: Send + Sync {
    /// Store a new snapshot. An existing snapshot with the same id is replaced.
    fn insert(&self, snapshot: &VersionSnapshot) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<VersionSnapshot>>;

    /// Every stored snapshot, in no particular order.
    fn list(&self) -> Result<Vec<VersionSnapshot>>;

    /// Returns whether a snapshot was removed.
    fn remove(&self, id: &str) -> Result<bool>;

    fn clear(&self) -> Result<()>;
}

/// In-process backend, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    snapshots: Mutex<BTreeMap<String, VersionSnapshot>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshots(&self) -> MutexGuard<'_, BTreeMap<String, VersionSnapshot>> {
        self.snapshots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotBackend for MemoryBackend {
    fn insert(&self, snapshot: &VersionSnapshot) -> Result<()> {
        self.snapshots().insert(snapshot.id.clone(), snapshot.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<VersionSnapshot>> {
        Ok(self.snapshots().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<VersionSnapshot>> {
        Ok(self.snapshots().values().cloned().collect())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.snapshots().remove(id).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.snapshots().clear();
        Ok(())
    }
}

/// One pretty-printed JSON file per snapshot, `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    dir: NormalizedPath,
}

impl DirectoryBackend {
    pub fn new(dir: impl Into<NormalizedPath>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &NormalizedPath {
        &self.dir
    }

    fn file_for(&self, id: &str) -> Result<NormalizedPath> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::InvalidId { id: id.to_string() });
        }
        Ok(self.dir.join(&format!("{}.json", id)))
    }

    fn snapshot_files(&self) -> Result<Vec<NormalizedPath>> {
        let native = self.dir.to_native();
        if !native.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&native).map_err(|e| mindmap_fs::Error::io(&native, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| mindmap_fs::Error::io(&native, e))?;
            let path = NormalizedPath::new(entry.path());
            if path.extension() == Some("json") && path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl SnapshotBackend for DirectoryBackend {
    fn insert(&self, snapshot: &VersionSnapshot) -> Result<()> {
        let path = self.file_for(&snapshot.id)?;
        let content = serde_json::to_string_pretty(snapshot).map_err(|source| Error::Encode {
            id: snapshot.id.clone(),
            source,
        })?;
        io::write_text(&path, &content)?;
        debug!(id = %snapshot.id, path = %path, "Wrote snapshot");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<VersionSnapshot>> {
        let Ok(path) = self.file_for(id) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = io::read_text(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn list(&self) -> Result<Vec<VersionSnapshot>> {
        let mut snapshots = Vec::new();
        for path in self.snapshot_files()? {
            let parsed = io::read_text(&path)
                .map_err(Error::from)
                .and_then(|content| serde_json::from_str::<VersionSnapshot>(&content).map_err(Error::from));
            match parsed {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(path = %path, error = %e, "Skipping unreadable snapshot"),
            }
        }
        Ok(snapshots)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let Ok(path) = self.file_for(id) else {
            return Ok(false);
        };
        let native = path.to_native();
        match fs::remove_file(&native) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(mindmap_fs::Error::io(&native, e).into()),
        }
    }

    fn clear(&self) -> Result<()> {
        for path in self.snapshot_files()? {
            let native = path.to_native();
            fs::remove_file(&native).map_err(|e| mindmap_fs::Error::io(&native, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::snapshot::SaveType;
    use mindmap_tree::Tree;
    use tempfile::TempDir;

    fn snapshot(id: &str, timestamp: i64) -> VersionSnapshot {
        let tree = Tree::default();
        VersionSnapshot {
            id: id.to_string(),
            timestamp,
            node_count: 1,
            change_summary: diff(None, &tree),
            data: tree,
            file_name: None,
            device_id: "device-test".to_string(),
            device_name: "Test".to_string(),
            save_type: SaveType::Auto,
        }
    }

    #[test]
    fn directory_backend_persists_across_instances() {
        let temp = TempDir::new().unwrap();
        let snap = snapshot("version-1-abc", 1);

        DirectoryBackend::new(temp.path()).insert(&snap).unwrap();
        let reopened = DirectoryBackend::new(temp.path());

        assert_eq!(reopened.get("version-1-abc").unwrap(), Some(snap));
        assert_eq!(reopened.list().unwrap().len(), 1);
    }

    #[test]
    fn directory_backend_skips_corrupt_files() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path());
        backend.insert(&snapshot("version-1-abc", 1)).unwrap();
        fs::write(temp.path().join("broken.json"), "{ nope").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let listed = backend.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "version-1-abc");
    }

    #[test]
    fn directory_backend_rejects_path_like_ids() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path());

        assert!(matches!(
            backend.insert(&snapshot("../escape", 1)),
            Err(Error::InvalidId { .. })
        ));
        assert_eq!(backend.get("../escape").unwrap(), None);
        assert!(!backend.remove("../escape").unwrap());
    }

    #[test]
    fn remove_and_clear() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path());
        backend.insert(&snapshot("a", 1)).unwrap();
        backend.insert(&snapshot("b", 2)).unwrap();

        assert!(backend.remove("a").unwrap());
        assert!(!backend.remove("a").unwrap());
        backend.clear().unwrap();
        assert!(backend.list().unwrap().is_empty());
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path().join("not-yet"));
        assert!(backend.list().unwrap().is_empty());
    }

    #[test]
    fn memory_backend_replaces_same_id() {
        let backend = MemoryBackend::new();
        backend.insert(&snapshot("a", 1)).unwrap();
        backend.insert(&snapshot("a", 5)).unwrap();

        let listed = backend.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].timestamp, 5);
    }
}

//! Wiring shared by every command
//!
//! A [`Context`] knows where the document and the per-user data live and
//! builds the stores and the coordinator from them:
//!
//! ```text
//! <data-dir>/config.toml     settings
//! <data-dir>/state.json      local autosave, device id, remembered file
//! <data-dir>/versions/       one JSON file per snapshot
//! ```

use std::path::Path;
use std::sync::Arc;

use mindmap_fs::{JsonKvStore, KvStore, NormalizedPath, io};
use mindmap_sync::{Coordinator, KvHandleStore, LocalFile, Settings, SystemClock, load_local};
use mindmap_tree::{Document, NodeId, Tree};
use mindmap_versions::{DeviceIdentity, DirectoryBackend, VersionSnapshot, VersionStore};
use tracing::debug;

use crate::error::{CliError, Result};

const STATE_FILE: &str = "state.json";
const VERSIONS_DIR: &str = "versions";

pub struct Context {
    pub file: NormalizedPath,
    pub data_dir: NormalizedPath,
    pub settings: Settings,
    kv: Arc<dyn KvStore>,
}

impl Context {
    /// `data_dir` defaults to the platform data directory.
    pub fn new(file: &Path, data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => NormalizedPath::new(dir),
            None => default_data_dir()?,
        };
        let settings = Settings::load(&data_dir)?;
        let kv: Arc<dyn KvStore> = Arc::new(JsonKvStore::new(data_dir.join(STATE_FILE)));
        debug!(file = %file.display(), data_dir = %data_dir, "Context ready");

        Ok(Self {
            file: NormalizedPath::new(file),
            data_dir,
            settings,
            kv,
        })
    }

    pub fn device(&self) -> DeviceIdentity {
        let device = DeviceIdentity::load_or_create(self.kv.as_ref());
        match &self.settings.device.name {
            Some(name) => device.with_name(name.clone()),
            None => device,
        }
    }

    pub fn version_store(&self) -> VersionStore {
        let backend = DirectoryBackend::new(self.data_dir.join(VERSIONS_DIR));
        VersionStore::new(backend, self.device()).with_max_versions(self.settings.versions.max_versions)
    }

    /// An unbound coordinator seeded from the local autosave.
    pub fn coordinator(&self) -> Coordinator {
        let document = load_local(self.kv.as_ref()).unwrap_or_else(|| Document::new(Tree::default(), 0));
        Coordinator::new(
            document,
            self.version_store(),
            self.kv.clone(),
            Arc::new(KvHandleStore::new(self.kv.clone())),
            Arc::new(SystemClock),
        )
    }

    /// A coordinator bound to the document file.
    pub async fn open(&self) -> Result<Coordinator> {
        self.require_file()?;
        let mut coordinator = self.coordinator();
        coordinator.open(Arc::new(LocalFile::new(self.file.clone()))).await?;
        Ok(coordinator)
    }

    /// Read the document without binding to it.
    pub fn load_document(&self) -> Result<Document> {
        self.require_file()?;
        let content = io::read_text(&self.file)?;
        Ok(Document::parse(&content)?)
    }

    fn require_file(&self) -> Result<()> {
        if !self.file.is_file() {
            return Err(CliError::user(format!(
                "No mind map at {}. Run 'mindmap init' first.",
                self.file
            )));
        }
        Ok(())
    }
}

fn default_data_dir() -> Result<NormalizedPath> {
    dirs::data_dir()
        .map(|dir| NormalizedPath::new(dir.join("mindmap")))
        .ok_or_else(|| CliError::user("Could not determine a data directory; pass --data-dir"))
}

/// Find the node whose id is `query` or starts with it.
pub fn resolve_node(tree: &Tree, query: &str) -> Result<NodeId> {
    let exact = NodeId::from(query);
    if tree.contains(&exact) {
        return Ok(exact);
    }
    let candidates: Vec<&NodeId> = tree
        .flatten()
        .into_iter()
        .map(|node| &node.id)
        .filter(|id| id.as_str().starts_with(query))
        .collect();
    match candidates.as_slice() {
        [id] => Ok((*id).clone()),
        [] => Err(CliError::user(format!("No task matches '{}'", query))),
        _ => Err(CliError::user(format!(
            "'{}' matches {} tasks; use a longer prefix",
            query,
            candidates.len()
        ))),
    }
}

/// Find the version whose id is `query` or starts with it.
pub fn resolve_version(versions: &VersionStore, query: &str) -> Result<VersionSnapshot> {
    if let Some(snapshot) = versions.get_version(query)? {
        return Ok(snapshot);
    }
    let mut candidates: Vec<VersionSnapshot> = versions
        .all_versions()?
        .into_iter()
        .filter(|v| v.id.starts_with(query))
        .collect();
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(CliError::user(format!("No version matches '{}'", query))),
        n => Err(CliError::user(format!(
            "'{}' matches {} versions; use a longer prefix",
            query, n
        ))),
    }
}

//! Binding the live tree to one external file
//!
//! ```text
//!   Unbound ──open/reconnect/save_with──▶ Bound ──poll sees newer write──▶ Reconciling
//!      ▲                                    │  ▲                                │
//!      └───────────────unbind───────────────┘  └────────tree replaced───────────┘
//! ```
//!
//! Conflicts are settled by the logical `lastSaved` stamp inside the file:
//! a newer stamp wins outright after both trees are snapshotted. The stamp
//! is trusted as written, so a writer with a fast clock wins races it
//! should lose.

use std::fmt;
use std::sync::Arc;

use mindmap_fs::KvStore;
use mindmap_tree::{Document, Tree};
use mindmap_versions::{SaveType, VersionStore};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::handle::FileHandle;
use crate::notify::{Notification, Notifier};
use crate::picker::{FilePicker, PickOutcome};
use crate::store::HandleStore;

/// Key-value slot holding the quick local copy of the tree.
pub const LOCAL_AUTOSAVE_KEY: &str = "mindmap-todo-data";

/// Name proposed when the first save has to ask for a file.
const SUGGESTED_FILE_NAME: &str = "mindmap-todo.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No external file.
    Unbound,
    Bound,
    /// Replacing the local tree with a newer external one.
    Reconciling,
}

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Unbound,
    /// Modification time not newer than the last one observed.
    Unchanged,
    /// The file changed but its logical save time is not newer than ours;
    /// local state kept.
    Stale,
    /// The external tree replaced the local one.
    Reconciled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Cancelled,
}

struct Binding {
    handle: Arc<dyn FileHandle>,
    /// Last external modification time observed.
    last_modified: i64,
}

/// Owner of the live tree and its sync state.
///
/// Not shared: callers needing concurrent access go through
/// [`SyncService`](crate::SyncService), which serializes every operation.
pub struct Coordinator {
    tree: Tree,
    dirty: bool,
    /// Logical time of the last save or load of the bound file.
    last_saved: i64,
    phase: Phase,
    binding: Option<Binding>,
    versions: VersionStore,
    kv: Arc<dyn KvStore>,
    handles: Arc<dyn HandleStore>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
}

impl Coordinator {
    /// Start unbound from `document`, typically the local autosave.
    pub fn new(
        document: Document,
        versions: VersionStore,
        kv: Arc<dyn KvStore>,
        handles: Arc<dyn HandleStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tree: document.root,
            dirty: false,
            last_saved: document.last_saved,
            phase: Phase::Unbound,
            binding: None,
            versions,
            kv,
            handles,
            clock,
            notifier: Notifier::new(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_saved(&self) -> i64 {
        self.last_saved
    }

    pub fn file_name(&self) -> Option<String> {
        self.binding.as_ref().map(|b| b.handle.name())
    }

    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Apply a tree mutation. Returns whether the tree changed; only a
    /// change marks the tree dirty.
    pub fn edit<F>(&mut self, mutation: F) -> bool
    where
        F: FnOnce(Tree) -> Tree,
    {
        let edited = mutation(self.tree.clone());
        if edited == self.tree {
            return false;
        }
        self.tree = edited;
        self.mark_dirty();
        true
    }

    /// Swap in a whole new tree as a local edit.
    pub fn replace_tree(&mut self, tree: Tree) {
        self.tree = tree;
        self.mark_dirty();
    }

    /// Replace the live tree with a stored snapshot's tree.
    pub fn restore_version(&mut self, id: &str) -> Result<()> {
        let snapshot = self.versions.require_version(id)?;
        info!(id = %id, timestamp = snapshot.timestamp, "Restoring version");
        let date = snapshot.date();
        self.replace_tree(snapshot.data);
        self.notifier.info(format!("Restored version from {}", date));
        Ok(())
    }

    /// Load `handle` and bind to it, replacing the local tree.
    pub async fn open(&mut self, handle: Arc<dyn FileHandle>) -> Result<()> {
        let file = handle.read().await?;
        let document = parse(&handle.name(), &file.content)?;

        self.tree = document.root;
        self.last_saved = document.last_saved;
        self.dirty = false;
        self.bind(handle.clone(), file.modified_at);
        self.remember(handle.clone()).await;
        self.store_local();
        info!(file = %handle.name(), last_saved = self.last_saved, "Opened file");

        // Already bound; a failed follow-up poll is retried on the next tick
        if let Err(e) = self.poll().await {
            warn!(file = %handle.name(), error = %e, "Poll after open failed");
        }
        Ok(())
    }

    /// Rebind the file remembered from a previous session, keeping local
    /// state, then poll so a newer file goes through conflict handling.
    /// Returns false when nothing was remembered.
    pub async fn reconnect(&mut self) -> Result<bool> {
        let Some(handle) = self.handles.load().await? else {
            debug!("No remembered file to reconnect to");
            return Ok(false);
        };
        info!(file = %handle.name(), "Reconnecting to file");
        self.bind(handle, 0);
        self.poll().await?;
        Ok(true)
    }

    /// Forget the bound file.
    pub async fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            info!(file = %binding.handle.name(), "Unbound file");
        }
        self.phase = Phase::Unbound;
        if let Err(e) = self.handles.clear().await {
            warn!(error = %e, "Failed to forget file handle");
        }
    }

    /// Manual save to the bound file. [`Error::NotBound`] without one; the
    /// caller is expected to fall back to an export.
    pub async fn save(&mut self) -> Result<()> {
        let handle = self.bound_handle()?;
        self.write_file(SaveType::Manual).await?;
        self.remember(handle.clone()).await;
        self.notifier.info(format!("Saved to {}", handle.name()));
        Ok(())
    }

    /// Manual save, asking `picker` for a destination when unbound.
    pub async fn save_with(&mut self, picker: &dyn FilePicker) -> Result<SaveOutcome> {
        if self.binding.is_none() {
            match picker.pick_save(SUGGESTED_FILE_NAME).await? {
                PickOutcome::Cancelled => {
                    debug!("Save cancelled in picker");
                    return Ok(SaveOutcome::Cancelled);
                }
                PickOutcome::Picked(handle) => {
                    // Our own write follows; its mtime is handled as stale
                    self.bind(handle, 0);
                }
            }
        }
        self.save().await?;
        Ok(SaveOutcome::Saved)
    }

    /// Save when bound and dirty. Returns whether a save happened.
    pub async fn auto_save(&mut self) -> Result<bool> {
        if self.binding.is_none() || !self.dirty {
            debug!(dirty = self.dirty, bound = self.binding.is_some(), "Autosave skipped");
            return Ok(false);
        }
        self.write_file(SaveType::Auto).await?;
        Ok(true)
    }

    /// Check the bound file for external changes.
    ///
    /// A read or parse failure leaves the observed modification time
    /// untouched, so the next poll tries again. Only the modification time
    /// seen before reading is recorded: a write landing during the read
    /// shows up as newer on the next poll.
    pub async fn poll(&mut self) -> Result<PollOutcome> {
        let Some(binding) = &self.binding else {
            return Ok(PollOutcome::Unbound);
        };
        let handle = binding.handle.clone();
        let last_modified = binding.last_modified;

        let modified = handle.modified_at().await?;
        if modified <= last_modified {
            return Ok(PollOutcome::Unchanged);
        }

        let file = handle.read().await?;
        let document = match parse(&handle.name(), &file.content) {
            Ok(document) => document,
            Err(e) => {
                warn!(file = %handle.name(), error = %e, "Ignoring unparseable external change");
                self.notifier
                    .warning(format!("{} could not be read; will retry", handle.name()));
                return Err(e);
            }
        };

        if document.last_saved <= self.last_saved {
            debug!(
                file = %handle.name(),
                external = document.last_saved,
                local = self.last_saved,
                "External change is not newer; keeping local tree"
            );
            self.observe(modified);
            return Ok(PollOutcome::Stale);
        }

        self.reconcile(&handle, document, modified);
        Ok(PollOutcome::Reconciled)
    }

    fn reconcile(&mut self, handle: &Arc<dyn FileHandle>, document: Document, observed: i64) {
        self.phase = Phase::Reconciling;
        let name = handle.name();
        info!(
            file = %name,
            external = document.last_saved,
            local = self.last_saved,
            dirty = self.dirty,
            "Newer external version found; replacing local tree"
        );

        self.snapshot(&self.tree, &name, SaveType::ConflictLocal);
        self.snapshot(&document.root, &name, SaveType::ConflictRemote);

        self.tree = document.root;
        self.last_saved = document.last_saved;
        self.dirty = false;
        self.observe(observed);
        self.phase = Phase::Bound;
        self.store_local();

        self.notifier.info(format!(
            "{} was updated elsewhere; loaded the newer version (both versions kept in history)",
            name
        ));
    }

    async fn write_file(&mut self, save_type: SaveType) -> Result<()> {
        let handle = self.bound_handle()?;
        let now = self.clock.now_millis();
        let content = Document::new(self.tree.clone(), now).to_json_pretty()?;

        if let Err(e) = handle.write(&content).await {
            warn!(file = %handle.name(), save_type = %save_type, error = %e, "Save failed");
            self.notifier
                .error(format!("Could not save {}: {}", handle.name(), e));
            return Err(e);
        }

        self.last_saved = now;
        self.dirty = false;
        info!(file = %handle.name(), save_type = %save_type, last_saved = now, "Saved file");

        self.snapshot(&self.tree, &handle.name(), save_type);
        self.store_local();
        Ok(())
    }

    /// Best-effort snapshot; failures never block the caller.
    fn snapshot(&self, tree: &Tree, file_name: &str, save_type: SaveType) {
        let now = self.clock.now_millis();
        if let Err(e) = self
            .versions
            .save_version_at(tree, Some(file_name), save_type, now)
        {
            warn!(save_type = %save_type, error = %e, "Failed to record version snapshot");
        }
    }

    fn bind(&mut self, handle: Arc<dyn FileHandle>, last_modified: i64) {
        self.binding = Some(Binding {
            handle,
            last_modified,
        });
        self.phase = Phase::Bound;
    }

    fn observe(&mut self, modified: i64) {
        if let Some(binding) = &mut self.binding {
            binding.last_modified = binding.last_modified.max(modified);
        }
    }

    fn bound_handle(&self) -> Result<Arc<dyn FileHandle>> {
        self.binding
            .as_ref()
            .map(|b| b.handle.clone())
            .ok_or(Error::NotBound)
    }

    async fn remember(&self, handle: Arc<dyn FileHandle>) {
        if let Err(e) = self.handles.save(handle).await {
            warn!(error = %e, "Failed to remember file handle");
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.store_local();
    }

    /// Quick local copy, stamped with the last file save so a restart
    /// compares against the right time.
    fn store_local(&self) {
        let document = Document::new(self.tree.clone(), self.last_saved);
        let stored = document
            .to_json_pretty()
            .map_err(Error::from)
            .and_then(|json| Ok(self.kv.set(LOCAL_AUTOSAVE_KEY, &json)?));
        if let Err(e) = stored {
            warn!(error = %e, "Failed to write local autosave");
        }
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("phase", &self.phase)
            .field("dirty", &self.dirty)
            .field("last_saved", &self.last_saved)
            .field("file", &self.file_name())
            .field("nodes", &self.tree.node_count())
            .finish_non_exhaustive()
    }
}

/// The local autosave from a previous run, if one is stored and readable.
pub fn load_local(kv: &dyn KvStore) -> Option<Document> {
    let stored = match kv.get(LOCAL_AUTOSAVE_KEY) {
        Ok(stored) => stored?,
        Err(e) => {
            warn!(error = %e, "Failed to read local autosave");
            return None;
        }
    };
    match Document::parse(&stored) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable local autosave");
            None
        }
    }
}

fn parse(name: &str, content: &str) -> Result<Document> {
    Document::parse(content).map_err(|source| Error::Parse {
        name: name.to_string(),
        source,
    })
}

//! External file handles
//!
//! The coordinator never looks inside a handle; it only asks for the
//! modification time, reads content and writes content.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mindmap_fs::{NormalizedPath, io};

use crate::error::{Error, Result};

/// Content of a file together with the modification time it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub content: String,
    /// File system modification time in epoch milliseconds.
    pub modified_at: i64,
}

/// One external file resource.
#[async_trait]
pub trait FileHandle: Send + Sync + fmt::Debug {
    /// Display name, usually the file name.
    fn name(&self) -> String;

    /// Stable address used to reopen the same file in a later session.
    fn locator(&self) -> String;

    /// Modification time in epoch milliseconds, as tracked by the storage
    /// (not the logical save time inside the content).
    async fn modified_at(&self) -> Result<i64>;

    async fn read(&self) -> Result<FileContent>;

    /// Replace the whole content.
    async fn write(&self, content: &str) -> Result<()>;
}

/// A file on the local file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: NormalizedPath,
}

impl LocalFile {
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> String {
        self.path.file_name().unwrap_or(self.path.as_str()).to_string()
    }

    fn locator(&self) -> String {
        self.path.as_str().to_string()
    }

    async fn modified_at(&self) -> Result<i64> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || io::modified_millis(&path))
            .await
            .map_err(|e| Error::handle(self.name(), e))?
            .map_err(|e| Error::handle(self.name(), e))
    }

    /// Stats before reading, so the reported time is never newer than the
    /// content returned.
    async fn read(&self) -> Result<FileContent> {
        let modified_at = self.modified_at().await?;
        let content = tokio::fs::read_to_string(self.path.to_native())
            .await
            .map_err(|e| Error::handle(self.name(), e))?;
        Ok(FileContent {
            content,
            modified_at,
        })
    }

    async fn write(&self, content: &str) -> Result<()> {
        let path = self.path.clone();
        let content = content.to_string();
        tokio::task::spawn_blocking(move || io::write_text(&path, &content))
            .await
            .map_err(|e| Error::handle(self.name(), e))??;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryFileState {
    content: Option<String>,
    modified_at: i64,
}

/// An in-memory file. Clones share the same content, so two coordinators
/// holding clones see each other's writes. Every write advances the
/// modification time by one.
#[derive(Clone)]
pub struct MemoryFile {
    name: String,
    state: Arc<Mutex<MemoryFileState>>,
}

impl MemoryFile {
    /// A file that does not exist yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    pub fn with_content(name: impl Into<String>, content: impl Into<String>, modified_at: i64) -> Self {
        let file = Self::new(name);
        file.put(content, modified_at);
        file
    }

    /// Replace content and modification time as another writer would.
    pub fn put(&self, content: impl Into<String>, modified_at: i64) {
        let mut state = self.state();
        state.content = Some(content.into());
        state.modified_at = modified_at;
    }

    /// Change only the modification time, as a touch would.
    pub fn touch(&self, modified_at: i64) {
        self.state().modified_at = modified_at;
    }

    pub fn content(&self) -> Option<String> {
        self.state().content.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryFileState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for MemoryFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFile")
            .field("name", &self.name)
            .field("modified_at", &self.state().modified_at)
            .finish()
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn locator(&self) -> String {
        format!("memory:{}", self.name)
    }

    async fn modified_at(&self) -> Result<i64> {
        let state = self.state();
        if state.content.is_none() {
            return Err(Error::handle(&self.name, "file does not exist"));
        }
        Ok(state.modified_at)
    }

    async fn read(&self) -> Result<FileContent> {
        let state = self.state();
        match &state.content {
            Some(content) => Ok(FileContent {
                content: content.clone(),
                modified_at: state.modified_at,
            }),
            None => Err(Error::handle(&self.name, "file does not exist")),
        }
    }

    async fn write(&self, content: &str) -> Result<()> {
        let mut state = self.state();
        state.content = Some(content.to_string());
        state.modified_at += 1;
        Ok(())
    }
}

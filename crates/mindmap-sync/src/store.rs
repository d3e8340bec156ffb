//! Remembering which file to reconnect to across sessions

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mindmap_fs::KvStore;
use tracing::debug;

use crate::error::Result;
use crate::handle::{FileHandle, LocalFile};

/// Key under which [`KvHandleStore`] keeps the file locator.
pub const CURRENT_FILE_KEY: &str = "current-file";

#[async_trait]
pub trait HandleStore: Send + Sync {
    async fn save(&self, handle: Arc<dyn FileHandle>) -> Result<()>;
    async fn load(&self) -> Result<Option<Arc<dyn FileHandle>>>;
    async fn clear(&self) -> Result<()>;
}

/// Keeps the locator of a [`LocalFile`] in a key-value store and reopens
/// it by path.
pub struct KvHandleStore {
    kv: Arc<dyn KvStore>,
}

impl KvHandleStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl HandleStore for KvHandleStore {
    async fn save(&self, handle: Arc<dyn FileHandle>) -> Result<()> {
        self.kv.set(CURRENT_FILE_KEY, &handle.locator())?;
        debug!(file = %handle.name(), "Remembered file handle");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Arc<dyn FileHandle>>> {
        let Some(locator) = self.kv.get(CURRENT_FILE_KEY)? else {
            return Ok(None);
        };
        if locator.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(LocalFile::new(locator.as_str()))))
    }

    async fn clear(&self) -> Result<()> {
        self.kv.remove(CURRENT_FILE_KEY)?;
        Ok(())
    }
}

/// Holds the handle itself; for in-process use and tests.
#[derive(Default)]
pub struct MemoryHandleStore {
    handle: Mutex<Option<Arc<dyn FileHandle>>>,
}

impl MemoryHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<dyn FileHandle>>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HandleStore for MemoryHandleStore {
    async fn save(&self, handle: Arc<dyn FileHandle>) -> Result<()> {
        *self.slot() = Some(handle);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Arc<dyn FileHandle>>> {
        Ok(self.slot().clone())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

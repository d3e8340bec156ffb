//! Choosing a file to open or save to

use std::sync::Arc;

use async_trait::async_trait;
use mindmap_fs::NormalizedPath;

use crate::error::Result;
use crate::handle::{FileHandle, LocalFile};

/// Result of asking the user for a file.
#[derive(Debug, Clone)]
pub enum PickOutcome {
    Picked(Arc<dyn FileHandle>),
    /// The user backed out. Not an error and not worth a notification.
    Cancelled,
}

#[async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick_open(&self) -> Result<PickOutcome>;

    /// Ask for a destination, proposing `suggested_name`.
    async fn pick_save(&self, suggested_name: &str) -> Result<PickOutcome>;
}

/// Non-interactive picker answering with a preset path, or cancelling
/// when there is none.
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    path: Option<NormalizedPath>,
}

impl PathPicker {
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn cancelling() -> Self {
        Self::default()
    }

    fn outcome(&self) -> PickOutcome {
        match &self.path {
            Some(path) => PickOutcome::Picked(Arc::new(LocalFile::new(path.clone()))),
            None => PickOutcome::Cancelled,
        }
    }
}

#[async_trait]
impl FilePicker for PathPicker {
    async fn pick_open(&self) -> Result<PickOutcome> {
        Ok(self.outcome())
    }

    async fn pick_save(&self, _suggested_name: &str) -> Result<PickOutcome> {
        Ok(self.outcome())
    }
}

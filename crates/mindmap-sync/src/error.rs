//! Error types for mindmap-sync

/// Result type for mindmap-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mindmap-sync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No external file is bound; callers fall back to an export.
    #[error("No file is bound")]
    NotBound,

    #[error("File '{name}' failed: {message}")]
    Handle { name: String, message: String },

    #[error("File '{name}' is not a valid mind map document: {source}")]
    Parse {
        name: String,
        #[source]
        source: mindmap_tree::Error,
    },

    #[error("Sync service has stopped")]
    Closed,

    #[error(transparent)]
    Versions(#[from] mindmap_versions::Error),

    #[error(transparent)]
    Fs(#[from] mindmap_fs::Error),

    #[error(transparent)]
    Tree(#[from] mindmap_tree::Error),
}

impl Error {
    pub fn handle(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Handle {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

//! Error types for mindmap-versions

/// Result type for mindmap-versions operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mindmap-versions operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Version not found: {id}")]
    NotFound { id: String },

    #[error("Invalid version id '{id}'")]
    InvalidId { id: String },

    #[error("Failed to encode version {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Fs(#[from] mindmap_fs::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

//! Error types for mindmap-tree

/// Result type for mindmap-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when building a tree from external content.
///
/// Mutations never fail; only decoding can.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The same id appears twice in the decoded content
    #[error("Duplicate node id in tree: {id}")]
    DuplicateId { id: String },

    /// The content is not a valid document
    #[error("Invalid tree document: {0}")]
    Parse(#[from] serde_json::Error),
}

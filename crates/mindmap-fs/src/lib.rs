//! Filesystem abstraction for the mind map task tree
//!
//! Provides normalized paths, atomic writes, a format-agnostic config
//! store and the key-value store used for quick local autosave and
//! settings.

pub mod config;
pub mod error;
pub mod io;
pub mod kv;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use kv::{JsonKvStore, KvStore, MemoryKvStore};
pub use path::NormalizedPath;

//! Versioning for the mind map task tree
//!
//! Every save records a [`VersionSnapshot`]: a full copy of the tree with
//! who saved it, why, and a [`ChangeSummary`] against the previous
//! snapshot. A [`VersionStore`] keeps the most recent snapshots on a
//! pluggable [`SnapshotBackend`].

pub mod backend;
pub mod device;
pub mod diff;
pub mod error;
pub mod snapshot;
pub mod store;

pub use backend::{DirectoryBackend, MemoryBackend, SnapshotBackend};
pub use device::{DEVICE_ID_KEY, DeviceIdentity};
pub use diff::{ChangeSummary, changed_fields, diff};
pub use error::{Error, Result};
pub use snapshot::{ExportMetadata, SaveType, VersionExport, VersionSnapshot};
pub use store::{MAX_VERSIONS, VersionStore};

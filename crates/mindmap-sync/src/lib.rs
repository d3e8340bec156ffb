//! Sync coordination for the mind map task tree
//!
//! A [`Coordinator`] binds the live tree to one external file and keeps
//! the two converged by polling: a newer external write replaces the
//! local tree after both sides are snapshotted, an older one is ignored.
//! [`SyncService`] runs the coordinator behind a command queue with poll
//! and autosave tickers.
//!
//! The external world is reached only through the collaborator traits
//! [`FileHandle`], [`HandleStore`], [`FilePicker`] and [`Clock`].

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handle;
pub mod notify;
pub mod picker;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DeviceSettings, Settings, SyncSettings, VersionSettings};
pub use coordinator::{Coordinator, LOCAL_AUTOSAVE_KEY, Phase, PollOutcome, SaveOutcome, load_local};
pub use error::{Error, Result};
pub use handle::{FileContent, FileHandle, LocalFile, MemoryFile};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use picker::{FilePicker, PathPicker, PickOutcome};
pub use service::{SyncHandle, SyncService, SyncState};
pub use store::{CURRENT_FILE_KEY, HandleStore, KvHandleStore, MemoryHandleStore};

//! Command implementations for mindmap-cli

pub mod edit;
pub mod init;
pub mod show;
pub mod versions;
pub mod watch;

pub use edit::{run_add, run_delete, run_edit, run_move, run_prune, run_reparent, run_sibling};
pub use init::run_init;
pub use show::{run_search, run_show, run_status};
pub use versions::{
    run_versions_clear, run_versions_delete, run_versions_export, run_versions_list,
    run_versions_restore, run_versions_show,
};
pub use watch::run_watch;

mod render;

//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mindmap_query::{BaseFilter, PriorityFilter};
use mindmap_tree::{Direction, TaskStatus};

/// Mind map to-do list - a task tree kept in one JSON file
#[derive(Parser, Debug)]
#[command(name = "mindmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Mind map document to work on
    #[arg(short, long, global = true, default_value = "mindmap.json", env = "MINDMAP_FILE")]
    pub file: PathBuf,

    /// Directory for settings, local autosave and version history
    #[arg(long, global = true, env = "MINDMAP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Create a new mind map file
    Init {
        /// Title of the root task
        #[arg(default_value = "Operations")]
        title: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the task tree
    ///
    /// Examples:
    ///   mindmap show                          # Whole tree
    ///   mindmap show --filter overdue         # Overdue tasks and their parents
    ///   mindmap show -p important -p urgent   # Either priority
    Show {
        /// all, today, overdue, planned, or a status
        #[arg(long, default_value = "all", value_parser = parse_base_filter)]
        filter: BaseFilter,

        /// important, urgent or both; may repeat
        #[arg(short, long = "priority", value_parser = parse_priority)]
        priorities: Vec<PriorityFilter>,

        /// Evaluate date filters as of this day (YYYY-MM-DD)
        #[arg(long)]
        today: Option<chrono::NaiveDate>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Summarize the file and task counts
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Add a child task
    Add {
        /// Parent task id (any unique prefix)
        parent: String,
        text: String,
    },

    /// Add a task right after another one
    Sibling {
        /// Reference task id (any unique prefix)
        reference: String,
        text: String,
    },

    /// Change fields of a task
    Edit {
        id: String,

        #[arg(long)]
        text: Option<String>,

        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,

        #[arg(long)]
        important: Option<bool>,

        #[arg(long)]
        urgent: Option<bool>,

        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<chrono::NaiveDate>,

        #[arg(long)]
        clear_due: bool,

        #[arg(long, conflicts_with = "clear_note")]
        note: Option<String>,

        #[arg(long)]
        clear_note: bool,

        /// Show or hide the task's children
        #[arg(long)]
        expanded: Option<bool>,
    },

    /// Delete a task and everything under it
    Delete { id: String },

    /// Move a task one place among its siblings
    Move { id: String, direction: MoveDirection },

    /// Move a task under a new parent
    Reparent {
        id: String,
        new_parent: String,

        /// Position among the new siblings (appends when omitted)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Remove a task if it is a blank leaf
    Prune { id: String },

    /// Find tasks by text
    Search { query: String },

    /// Inspect and manage saved versions
    Versions {
        #[command(subcommand)]
        action: VersionsAction,
    },

    /// Keep the file in sync until interrupted
    Watch,
}

/// Version history actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum VersionsAction {
    /// List saved versions, newest first
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the tree stored in one version
    Show { id: String },

    /// Write one version to a standalone JSON file
    Export {
        id: String,

        /// Directory to write into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Replace the current tree with a version and save
    Restore { id: String },

    /// Delete one version
    Delete { id: String },

    /// Delete every version
    Clear,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(direction: MoveDirection) -> Self {
        match direction {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

fn parse_base_filter(value: &str) -> Result<BaseFilter, String> {
    value.parse().map_err(|e: mindmap_query::ParseFilterError| e.to_string())
}

fn parse_priority(value: &str) -> Result<PriorityFilter, String> {
    value.parse().map_err(|e: mindmap_query::ParseFilterError| e.to_string())
}

fn parse_status(value: &str) -> Result<TaskStatus, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_show_with_filters() {
        let cli = Cli::parse_from([
            "mindmap", "show", "--filter", "overdue", "-p", "important", "-p", "urgent",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Show {
                filter: BaseFilter::Overdue,
                priorities: vec![PriorityFilter::Important, PriorityFilter::Urgent],
                today: None,
                json: false,
            })
        );
    }

    #[test]
    fn parse_status_filter() {
        let cli = Cli::parse_from(["mindmap", "show", "--filter", "in-progress"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Show {
                filter: BaseFilter::Status(TaskStatus::InProgress),
                ..
            })
        ));
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let result = Cli::try_parse_from(["mindmap", "show", "--filter", "someday"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_global_file_after_subcommand() {
        let cli = Cli::parse_from(["mindmap", "search", "cv", "--file", "plan.json"]);
        assert_eq!(cli.file, PathBuf::from("plan.json"));
    }

    #[test]
    fn clear_due_conflicts_with_due() {
        let result = Cli::try_parse_from([
            "mindmap", "edit", "abc", "--due", "2024-06-01", "--clear-due",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_versions_export() {
        let cli = Cli::parse_from(["mindmap", "versions", "export", "version-1", "--out", "dump"]);
        assert_eq!(
            cli.command,
            Some(Commands::Versions {
                action: VersionsAction::Export {
                    id: "version-1".into(),
                    out: PathBuf::from("dump"),
                },
            })
        );
    }
}

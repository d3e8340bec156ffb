//! Mind map to-do list CLI
//!
//! Every command works on one document file (`--file`, default
//! `mindmap.json`) plus a per-user data directory holding settings, the
//! local autosave and the version history.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands, VersionsAction};
use commands::edit::EditArgs;
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        // No command provided - show help hint
        println!("{} Mind map to-do list", "mindmap".green().bold());
        println!();
        println!("Run {} for available commands.", "mindmap --help".cyan());
        return Ok(());
    };

    let context = Context::new(&cli.file, cli.data_dir.as_deref())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute_command(&context, command))
}

fn init_tracing(verbose: bool) {
    // Logs go to stderr so JSON output stays parseable
    let installed = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    };
    if !installed {
        eprintln!("{}: tracing subscriber already installed", "warning".yellow());
    }
    tracing::debug!(verbose, "Logging initialized");
}

async fn execute_command(context: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Init { title, force } => commands::run_init(context, &title, force).await,
        Commands::Show {
            filter,
            priorities,
            today,
            json,
        } => commands::run_show(context, filter, &priorities, today, json),
        Commands::Status { json } => commands::run_status(context, json),
        Commands::Add { parent, text } => commands::run_add(context, &parent, &text).await,
        Commands::Sibling { reference, text } => {
            commands::run_sibling(context, &reference, &text).await
        }
        Commands::Edit {
            id,
            text,
            status,
            important,
            urgent,
            due,
            clear_due,
            note,
            clear_note,
            expanded,
        } => {
            let args = EditArgs {
                text,
                status,
                important,
                urgent,
                due,
                clear_due,
                note,
                clear_note,
                expanded,
            };
            commands::run_edit(context, &id, &args).await
        }
        Commands::Delete { id } => commands::run_delete(context, &id).await,
        Commands::Move { id, direction } => commands::run_move(context, &id, direction.into()).await,
        Commands::Reparent {
            id,
            new_parent,
            index,
        } => commands::run_reparent(context, &id, &new_parent, index).await,
        Commands::Prune { id } => commands::run_prune(context, &id).await,
        Commands::Search { query } => commands::run_search(context, &query),
        Commands::Versions { action } => execute_versions(context, action).await,
        Commands::Watch => commands::run_watch(context).await,
    }
}

async fn execute_versions(context: &Context, action: VersionsAction) -> Result<()> {
    match action {
        VersionsAction::List { json } => commands::run_versions_list(context, json),
        VersionsAction::Show { id } => commands::run_versions_show(context, &id),
        VersionsAction::Export { id, out } => commands::run_versions_export(context, &id, &out),
        VersionsAction::Restore { id } => commands::run_versions_restore(context, &id).await,
        VersionsAction::Delete { id } => commands::run_versions_delete(context, &id),
        VersionsAction::Clear => commands::run_versions_clear(context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[tokio::test]
    async fn add_then_delete_through_commands() {
        let temp = TempDir::new().unwrap();
        let context = Context::new(&temp.path().join("plan.json"), Some(&temp.path().join("data"))).unwrap();
        commands::run_init(&context, "Operations", false).await.unwrap();
        let root = context.load_document().unwrap().root.root_id().clone();

        commands::run_add(&context, root.as_str(), "Hiring").await.unwrap();
        let tree = context.load_document().unwrap().root;
        assert_eq!(tree.node_count(), 2);
        let hiring = tree.children(&root)[0].clone();

        let error = commands::run_delete(&context, root.as_str()).await.unwrap_err();
        assert!(error.to_string().contains("root"));

        commands::run_delete(&context, hiring.as_str()).await.unwrap();
        assert_eq!(context.load_document().unwrap().root.node_count(), 1);
        // init, add, delete
        assert_eq!(context.version_store().all_versions().unwrap().len(), 3);
    }
}

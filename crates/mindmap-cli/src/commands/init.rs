//! Init command implementation

use colored::Colorize;
use mindmap_sync::{PathPicker, SaveOutcome};
use mindmap_tree::{Node, Tree};

use crate::context::Context;
use crate::error::{CliError, Result};

/// Create the document file with a single root task.
///
/// The root starts important and urgent, like a fresh mind map.
pub async fn run_init(context: &Context, title: &str, force: bool) -> Result<()> {
    if context.file.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists. Use --force to overwrite it.",
            context.file
        )));
    }
    if title.trim().is_empty() {
        return Err(CliError::user("The root task needs a title"));
    }

    let mut root = Node::new(title);
    root.is_important = true;
    root.is_urgent = true;

    let mut coordinator = context.coordinator();
    coordinator.replace_tree(Tree::new(root));
    match coordinator.save_with(&PathPicker::new(context.file.clone())).await? {
        SaveOutcome::Saved => {
            println!(
                "{} Created {} with root task '{}'",
                "OK".green().bold(),
                context.file.as_str().cyan(),
                title
            );
        }
        SaveOutcome::Cancelled => println!("{}", "Cancelled".yellow()),
    }
    Ok(())
}

//! Commands that change the tree
//!
//! Each one opens the document through the coordinator, applies a single
//! mutation and saves, which records a `manual` version. Moves the tree
//! engine would silently ignore are rejected here with a message.

use colored::Colorize;
use mindmap_query::breadcrumb;
use mindmap_sync::Coordinator;
use mindmap_tree::{Direction, Node, NodeId, NodePatch, Tree};

use crate::context::{Context, resolve_node};
use crate::error::{CliError, Result};

/// Field changes requested by `mindmap edit`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EditArgs {
    pub text: Option<String>,
    pub status: Option<mindmap_tree::TaskStatus>,
    pub important: Option<bool>,
    pub urgent: Option<bool>,
    pub due: Option<chrono::NaiveDate>,
    pub clear_due: bool,
    pub note: Option<String>,
    pub clear_note: bool,
    pub expanded: Option<bool>,
}

impl EditArgs {
    fn to_patch(&self) -> NodePatch {
        let mut patch = NodePatch::new();
        if let Some(text) = &self.text {
            patch = patch.text(text.clone());
        }
        if let Some(status) = self.status {
            patch = patch.status(status);
        }
        if let Some(flag) = self.important {
            patch = patch.important(flag);
        }
        if let Some(flag) = self.urgent {
            patch = patch.urgent(flag);
        }
        if let Some(date) = self.due {
            patch = patch.due(date);
        } else if self.clear_due {
            patch = patch.clear_due();
        }
        if let Some(note) = &self.note {
            patch = patch.note(note.clone());
        } else if self.clear_note {
            patch = patch.clear_note();
        }
        if let Some(flag) = self.expanded {
            patch = patch.expanded(flag);
        }
        patch
    }
}

/// Open the document, apply `mutation` and save when the tree changed.
/// Returns the coordinator when a save happened.
async fn apply<F>(context: &Context, mutation: F) -> Result<Option<Coordinator>>
where
    F: FnOnce(&Tree) -> Result<Tree>,
{
    let mut coordinator = context.open().await?;
    let edited = mutation(coordinator.tree())?;
    if !coordinator.edit(|_| edited) {
        println!("{}", "Nothing changed".dimmed());
        return Ok(None);
    }
    coordinator.save().await?;
    Ok(Some(coordinator))
}

fn location(tree: &Tree, id: &NodeId) -> String {
    breadcrumb(tree, id).unwrap_or_else(|| id.to_string())
}

pub async fn run_add(context: &Context, parent: &str, text: &str) -> Result<()> {
    let node = Node::new(text);
    let id = node.id.clone();
    let saved = apply(context, |tree| {
        let parent = resolve_node(tree, parent)?;
        Ok(tree.clone().add_child(&parent, node))
    })
    .await?;

    if let Some(coordinator) = saved {
        println!(
            "{} Added {} at {}",
            "OK".green().bold(),
            id.as_str().cyan(),
            location(coordinator.tree(), &id)
        );
    }
    Ok(())
}

pub async fn run_sibling(context: &Context, reference: &str, text: &str) -> Result<()> {
    let node = Node::new(text);
    let id = node.id.clone();
    let saved = apply(context, |tree| {
        let reference = resolve_node(tree, reference)?;
        if tree.is_root(&reference) {
            return Err(CliError::user("The root task cannot have siblings"));
        }
        Ok(tree.clone().add_sibling(&reference, node))
    })
    .await?;

    if let Some(coordinator) = saved {
        println!(
            "{} Added {} at {}",
            "OK".green().bold(),
            id.as_str().cyan(),
            location(coordinator.tree(), &id)
        );
    }
    Ok(())
}

pub async fn run_edit(context: &Context, id: &str, args: &EditArgs) -> Result<()> {
    let patch = args.to_patch();
    if patch.is_empty() {
        return Err(CliError::user("Nothing to change. Pass at least one field to edit."));
    }

    let mut target = None;
    let saved = apply(context, |tree| {
        let id = resolve_node(tree, id)?;
        let edited = tree.clone().update(&id, &patch);
        target = Some(id);
        Ok(edited)
    })
    .await?;

    if let (Some(coordinator), Some(id)) = (saved, target) {
        println!(
            "{} Updated {}",
            "OK".green().bold(),
            location(coordinator.tree(), &id)
        );
    }
    Ok(())
}

pub async fn run_delete(context: &Context, id: &str) -> Result<()> {
    let mut removed = 0;
    let saved = apply(context, |tree| {
        let id = resolve_node(tree, id)?;
        if tree.is_root(&id) {
            return Err(CliError::user("The root task cannot be deleted"));
        }
        removed = tree.subtree_ids(&id).len();
        Ok(tree.clone().delete(&id))
    })
    .await?;

    if saved.is_some() {
        println!("{} Deleted {} task(s)", "OK".green().bold(), removed);
    }
    Ok(())
}

pub async fn run_move(context: &Context, id: &str, direction: Direction) -> Result<()> {
    let mut target = None;
    let saved = apply(context, |tree| {
        let id = resolve_node(tree, id)?;
        let edited = tree.clone().move_within_siblings(&id, direction);
        target = Some(id);
        Ok(edited)
    })
    .await?;

    if let (Some(coordinator), Some(id)) = (saved, target) {
        let position = coordinator.tree().sibling_index(&id).unwrap_or(0) + 1;
        println!(
            "{} Moved {} to position {}",
            "OK".green().bold(),
            location(coordinator.tree(), &id),
            position
        );
    }
    Ok(())
}

pub async fn run_reparent(
    context: &Context,
    id: &str,
    new_parent: &str,
    index: Option<usize>,
) -> Result<()> {
    let mut target = None;
    let saved = apply(context, |tree| {
        let id = resolve_node(tree, id)?;
        let parent = resolve_node(tree, new_parent)?;
        if tree.is_root(&id) {
            return Err(CliError::user("The root task cannot be moved"));
        }
        if id == parent || tree.is_descendant(&id, &parent) {
            return Err(CliError::user("A task cannot be moved under itself or its own subtasks"));
        }
        let edited = tree.clone().reparent(&id, &parent, index);
        target = Some(id);
        Ok(edited)
    })
    .await?;

    if let (Some(coordinator), Some(id)) = (saved, target) {
        println!(
            "{} Moved to {}",
            "OK".green().bold(),
            location(coordinator.tree(), &id)
        );
    }
    Ok(())
}

pub async fn run_prune(context: &Context, id: &str) -> Result<()> {
    let saved = apply(context, |tree| {
        let id = resolve_node(tree, id)?;
        Ok(tree.clone().prune_if_empty(&id))
    })
    .await?;

    if saved.is_some() {
        println!("{} Removed empty task", "OK".green().bold());
    }
    Ok(())
}

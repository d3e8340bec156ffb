//! Terminal rendering of task trees

use std::collections::HashSet;

use colored::{ColoredString, Colorize};
use mindmap_tree::{Node, NodeId, TaskStatus, Tree};

pub fn status_label(status: TaskStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        TaskStatus::Idea => label.magenta(),
        TaskStatus::Todo => label.yellow(),
        TaskStatus::InProgress => label.cyan(),
        TaskStatus::Tracking => label.blue(),
        TaskStatus::Done => label.green(),
    }
}

fn node_line(node: &Node) -> String {
    let mut line = format!("[{}] {}", status_label(node.status), display_text(node));
    if node.is_important {
        line.push_str(&format!(" {}", "important".red().bold()));
    }
    if node.is_urgent {
        line.push_str(&format!(" {}", "urgent".yellow().bold()));
    }
    if let Some(due) = node.due_date {
        line.push_str(&format!(" {}", format!("due {}", due).cyan()));
    }
    line
}

fn display_text(node: &Node) -> String {
    if node.is_blank() {
        mindmap_query::UNTITLED.italic().to_string()
    } else {
        node.text.clone()
    }
}

/// Which nodes to print and which of them actually matched.
pub struct Selection<'a> {
    pub visible: Option<&'a HashSet<NodeId>>,
    pub matched: Option<&'a dyn Fn(&Node) -> bool>,
}

impl Selection<'_> {
    pub fn everything() -> Self {
        Self {
            visible: None,
            matched: None,
        }
    }

    fn is_filtered(&self) -> bool {
        self.visible.is_some()
    }
}

/// Print `tree` as an indented outline in pre-order.
///
/// Unfiltered, children of collapsed nodes are folded away. Filtered,
/// every visible node is shown and ancestors kept only for context are
/// dimmed.
pub fn print_outline(tree: &Tree, selection: &Selection<'_>) {
    let mut stack: Vec<(&NodeId, usize)> = vec![(tree.root_id(), 0)];

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = tree.get(id) else { continue };
        if let Some(visible) = selection.visible
            && !visible.contains(id)
        {
            continue;
        }

        let indent = "  ".repeat(depth);
        let matched = selection.matched.is_none_or(|matched| matched(node));
        let children = tree.children(id);
        let folded = !selection.is_filtered() && !node.is_expanded && !children.is_empty();

        let mut line = node_line(node);
        if folded {
            line.push_str(&format!(" {}", format!("(+{})", tree.subtree_ids(id).len() - 1).dimmed()));
        }
        if matched {
            println!("{}{}  {}", indent, line, id.as_str().dimmed());
        } else {
            println!("{}{}  {}", indent, line.as_str().dimmed(), id.as_str().dimmed());
        }

        if !folded {
            for child in children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }
}

//! Structural change summaries between two trees
//!
//! Descriptive only: nothing here merges trees.

use std::collections::HashMap;

use mindmap_tree::{Node, NodeId, Tree};
use serde::{Deserialize, Serialize};

/// Counts of added, deleted and modified nodes between two trees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub nodes_added: usize,
    pub nodes_deleted: usize,
    pub nodes_modified: usize,
    pub total_nodes: usize,
    pub major_changes: Vec<String>,
}

impl ChangeSummary {
    pub fn is_unchanged(&self) -> bool {
        self.nodes_added == 0 && self.nodes_deleted == 0 && self.nodes_modified == 0
    }
}

/// Names of the content fields that differ between two versions of a node.
///
/// Structure and presentation (`children`, `isExpanded`) are not content.
pub fn changed_fields(old: &Node, new: &Node) -> Vec<&'static str> {
    old.changed_fields(new)
        .into_iter()
        .map(|field| field.as_str())
        .collect()
}

/// Summarize how `new` differs from `old`. With no previous tree every node
/// counts as added.
pub fn diff(old: Option<&Tree>, new: &Tree) -> ChangeSummary {
    let new_nodes = new.flatten();
    let total_nodes = new_nodes.len();

    let Some(old) = old else {
        return ChangeSummary {
            nodes_added: total_nodes,
            nodes_deleted: 0,
            nodes_modified: 0,
            total_nodes,
            major_changes: vec!["initial version".to_string()],
        };
    };

    let old_by_id: HashMap<&NodeId, &Node> = old.flatten().into_iter().map(|n| (&n.id, n)).collect();

    let mut nodes_added = 0;
    let mut nodes_modified = 0;
    for node in &new_nodes {
        match old_by_id.get(&node.id) {
            None => nodes_added += 1,
            Some(previous) if !previous.changed_fields(node).is_empty() => nodes_modified += 1,
            Some(_) => {}
        }
    }
    let nodes_deleted = old_by_id.keys().filter(|id| !new.contains(**id)).count();

    let mut major_changes = Vec::new();
    if nodes_added > 0 {
        major_changes.push(format!("added {} nodes", nodes_added));
    }
    if nodes_deleted > 0 {
        major_changes.push(format!("deleted {} nodes", nodes_deleted));
    }
    if nodes_modified > 0 {
        major_changes.push(format!("modified {} nodes", nodes_modified));
    }
    if major_changes.is_empty() {
        major_changes.push("no changes".to_string());
    }

    ChangeSummary {
        nodes_added,
        nodes_deleted,
        nodes_modified,
        total_nodes,
        major_changes,
    }
}

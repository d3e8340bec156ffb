//! Labelled tree fixtures.
//!
//! Tests address nodes by a short label instead of the generated id:
//!
//! ```rust
//! use mindmap_test_utils::TreeBuilder;
//!
//! let (tree, ids) = TreeBuilder::new("R").child("R", "A").child("A", "A1").build();
//! assert_eq!(tree.parent_id(&ids["A1"]), Some(&ids["A"]));
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use mindmap_tree::{Node, NodeId, NodePatch, TaskStatus, Tree};

/// Parse a `YYYY-MM-DD` literal.
pub fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .unwrap_or_else(|e| panic!("bad fixture date {text:?}: {e}"))
}

/// Builds a tree whose node texts double as lookup labels.
pub struct TreeBuilder {
    tree: Tree,
    ids: HashMap<String, NodeId>,
}

impl TreeBuilder {
    /// Start with a root labelled `root`.
    pub fn new(root: &str) -> Self {
        let node = Node::new(root);
        let mut ids = HashMap::new();
        ids.insert(root.to_string(), node.id.clone());
        Self {
            tree: Tree::new(node),
            ids,
        }
    }

    /// Append a child labelled `label` under the node labelled `parent`.
    pub fn child(mut self, parent: &str, label: &str) -> Self {
        let parent_id = self.id(parent);
        let node = Node::new(label);
        self.ids.insert(label.to_string(), node.id.clone());
        self.tree = self.tree.add_child(&parent_id, node);
        self
    }

    /// Apply a patch to the node labelled `label`.
    pub fn patch(mut self, label: &str, patch: NodePatch) -> Self {
        let id = self.id(label);
        self.tree = self.tree.update(&id, &patch);
        self
    }

    pub fn status(self, label: &str, status: TaskStatus) -> Self {
        self.patch(label, NodePatch::new().status(status))
    }

    pub fn due(self, label: &str, day: &str) -> Self {
        self.patch(label, NodePatch::new().due(date(day)))
    }

    pub fn build(self) -> (Tree, HashMap<String, NodeId>) {
        (self.tree, self.ids)
    }

    fn id(&self, label: &str) -> NodeId {
        self.ids
            .get(label)
            .cloned()
            .unwrap_or_else(|| panic!("no fixture node labelled {label:?}"))
    }
}

/// A small plan with priorities, statuses and due dates around
/// 2024-06-15:
///
/// ```text
/// Operations
/// ├── Hiring          (important, in-progress, due 2024-06-15)
/// │   ├── Screen CVs  (todo, due 2024-06-10)
/// │   └── Offer       (done, due 2024-06-01)
/// ├── Budget          (urgent, due 2024-07-01)
/// │   └── Q3 review   (tracking)
/// └── Offsite         (idea)
/// ```
pub fn sample_tree() -> (Tree, HashMap<String, NodeId>) {
    TreeBuilder::new("Operations")
        .child("Operations", "Hiring")
        .child("Hiring", "Screen CVs")
        .child("Hiring", "Offer")
        .child("Operations", "Budget")
        .child("Budget", "Q3 review")
        .child("Operations", "Offsite")
        .patch(
            "Hiring",
            NodePatch::new()
                .important(true)
                .status(TaskStatus::InProgress)
                .due(date("2024-06-15")),
        )
        .status("Screen CVs", TaskStatus::Todo)
        .due("Screen CVs", "2024-06-10")
        .status("Offer", TaskStatus::Done)
        .due("Offer", "2024-06-01")
        .patch("Budget", NodePatch::new().urgent(true).due(date("2024-07-01")))
        .status("Q3 review", TaskStatus::Tracking)
        .build()
}

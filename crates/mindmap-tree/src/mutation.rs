//! Structural mutations
//!
//! Every operation consumes the tree and returns the next value. An
//! unknown id, or a request that would break an invariant, returns the
//! input unchanged.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::node::{Node, NodeId, NodePatch, now_millis};
use crate::tree::{Slot, Tree};

/// Direction for reordering a node among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

impl Tree {
    /// Replace the given fields of `id`, recording history for tracked
    /// fields that changed.
    pub fn update(self, id: &NodeId, patch: &NodePatch) -> Self {
        self.update_at(id, patch, now_millis())
    }

    /// [`Tree::update`] with an explicit write time.
    pub fn update_at(mut self, id: &NodeId, patch: &NodePatch, now: i64) -> Self {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.node.apply(patch, now);
            }
            None => debug!(id = %id, "update ignored: node not found"),
        }
        self
    }

    /// Append `node` as the last child of `parent_id` and expand the parent.
    pub fn add_child(mut self, parent_id: &NodeId, node: Node) -> Self {
        if self.contains(&node.id) {
            debug!(id = %node.id, "add_child ignored: id already present");
            return self;
        }
        let Some(parent) = self.slots.get_mut(parent_id) else {
            debug!(parent = %parent_id, "add_child ignored: parent not found");
            return self;
        };

        parent.node.is_expanded = true;
        parent.children.push(node.id.clone());
        self.insert_slot(node, parent_id.clone());
        self
    }

    /// Insert `node` immediately after `reference_id` among its siblings.
    /// The root has no sibling slot.
    pub fn add_sibling(mut self, reference_id: &NodeId, node: Node) -> Self {
        if self.contains(&node.id) {
            debug!(id = %node.id, "add_sibling ignored: id already present");
            return self;
        }
        let Some(parent_id) = self.parent_id(reference_id).cloned() else {
            debug!(reference = %reference_id, "add_sibling ignored: no parent");
            return self;
        };
        let Some(index) = self.sibling_index(reference_id) else {
            return self;
        };

        if let Some(parent) = self.slots.get_mut(&parent_id) {
            parent.children.insert(index + 1, node.id.clone());
        }
        self.insert_slot(node, parent_id);
        self
    }

    /// Remove `id` and its entire subtree. The root cannot be deleted.
    pub fn delete(mut self, id: &NodeId) -> Self {
        let Some(parent_id) = self.parent_id(id).cloned() else {
            debug!(id = %id, "delete ignored: root or unknown node");
            return self;
        };

        let doomed = self.subtree_ids(id);
        if let Some(parent) = self.slots.get_mut(&parent_id) {
            parent.children.retain(|child| child != id);
        }
        for gone in &doomed {
            self.slots.remove(gone);
        }
        debug!(id = %id, removed = doomed.len(), "deleted subtree");
        self
    }

    /// Swap `id` with its previous (`Up`) or next (`Down`) sibling.
    pub fn move_within_siblings(mut self, id: &NodeId, direction: Direction) -> Self {
        let Some(parent_id) = self.parent_id(id).cloned() else {
            return self;
        };
        let Some(parent) = self.slots.get_mut(&parent_id) else {
            return self;
        };
        let Some(index) = parent.children.iter().position(|child| child == id) else {
            return self;
        };

        match direction {
            Direction::Up if index > 0 => parent.children.swap(index - 1, index),
            Direction::Down if index + 1 < parent.children.len() => {
                parent.children.swap(index, index + 1)
            }
            _ => debug!(id = %id, %direction, "move ignored: already at edge"),
        }
        self
    }

    /// Move `id` under `new_parent_id` at `insert_index`, appending when the
    /// index is omitted or past the end. The new parent is expanded.
    ///
    /// Refused when `id` is the root, equals the new parent, or the new
    /// parent lies inside the subtree being moved.
    pub fn reparent(mut self, id: &NodeId, new_parent_id: &NodeId, insert_index: Option<usize>) -> Self {
        if id == new_parent_id || self.is_root(id) {
            debug!(id = %id, "reparent ignored: root or self target");
            return self;
        }
        if !self.contains(id) || !self.contains(new_parent_id) {
            debug!(id = %id, parent = %new_parent_id, "reparent ignored: node not found");
            return self;
        }
        if self.is_descendant(id, new_parent_id) {
            debug!(id = %id, parent = %new_parent_id, "reparent ignored: would create a cycle");
            return self;
        }
        let Some(old_parent_id) = self.parent_id(id).cloned() else {
            return self;
        };

        if let Some(old_parent) = self.slots.get_mut(&old_parent_id) {
            old_parent.children.retain(|child| child != id);
        }
        if let Some(new_parent) = self.slots.get_mut(new_parent_id) {
            match insert_index {
                Some(index) if index <= new_parent.children.len() => {
                    new_parent.children.insert(index, id.clone())
                }
                _ => new_parent.children.push(id.clone()),
            }
            new_parent.node.is_expanded = true;
        }
        if let Some(moved) = self.slots.get_mut(id) {
            moved.parent = Some(new_parent_id.clone());
        }
        self
    }

    /// Remove `id` when it is a non-root leaf with blank text.
    ///
    /// Used to discard placeholder nodes the user created but never
    /// filled in.
    pub fn prune_if_empty(self, id: &NodeId) -> Self {
        let prunable = !self.is_root(id)
            && self.children(id).is_empty()
            && self.get(id).is_some_and(Node::is_blank);
        if prunable { self.delete(id) } else { self }
    }

    fn insert_slot(&mut self, node: Node, parent: NodeId) {
        self.slots.insert(
            node.id.clone(),
            Slot {
                node,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TaskStatus;
    use pretty_assertions::assert_eq;

    fn child_texts(tree: &Tree, id: &NodeId) -> Vec<String> {
        tree.child_nodes(id).map(|n| n.text.clone()).collect()
    }

    fn with_children(texts: &[&str]) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new(Node::new("root"));
        let root = tree.root_id().clone();
        let mut ids = Vec::new();
        for text in texts {
            let node = Node::new(*text);
            ids.push(node.id.clone());
            tree = tree.add_child(&root, node);
        }
        (tree, ids)
    }

    #[test]
    fn add_child_appends_and_expands_parent() {
        let (tree, ids) = with_children(&["a"]);
        let collapsed = tree.update(&ids[0], &NodePatch::new().expanded(false));
        assert!(!collapsed.get(&ids[0]).unwrap().is_expanded);

        let child = Node::new("a.1");
        let child_id = child.id.clone();
        let tree = collapsed.add_child(&ids[0], child.clone());

        assert_eq!(tree.get(&child_id), Some(&child));
        assert!(tree.get(&ids[0]).unwrap().is_expanded);
        assert_eq!(tree.parent_id(&child_id), Some(&ids[0]));
    }

    #[test]
    fn add_child_rejects_duplicate_id() {
        let (tree, ids) = with_children(&["a", "b"]);
        let mut clash = Node::new("clash");
        clash.id = ids[0].clone();

        let after = tree.clone().add_child(&ids[1], clash);
        assert_eq!(after, tree);
    }

    #[test]
    fn add_sibling_inserts_after_reference() {
        let (tree, ids) = with_children(&["a", "c"]);
        let root = tree.root_id().clone();

        let tree = tree.add_sibling(&ids[0], Node::new("b"));
        assert_eq!(child_texts(&tree, &root), vec!["a", "b", "c"]);

        let tree = tree.add_sibling(&ids[1], Node::new("d"));
        assert_eq!(child_texts(&tree, &root), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn add_sibling_to_root_is_noop() {
        let (tree, _) = with_children(&["a"]);
        let root = tree.root_id().clone();
        let after = tree.clone().add_sibling(&root, Node::new("x"));
        assert_eq!(after, tree);
    }

    #[test]
    fn delete_removes_whole_subtree() {
        let (tree, ids) = with_children(&["a", "b"]);
        let grandchild = Node::new("a.1");
        let grandchild_id = grandchild.id.clone();
        let tree = tree.add_child(&ids[0], grandchild);

        let tree = tree.delete(&ids[0]);
        assert!(!tree.contains(&ids[0]));
        assert!(!tree.contains(&grandchild_id));
        assert_eq!(tree.node_count(), 2);
        assert_eq!(child_texts(&tree, &tree.root_id().clone()), vec!["b"]);
    }

    #[test]
    fn delete_root_is_noop() {
        let (tree, _) = with_children(&["a"]);
        let root = tree.root_id().clone();
        assert_eq!(tree.clone().delete(&root), tree);
    }

    #[test]
    fn move_within_siblings_swaps_neighbours() {
        let (tree, ids) = with_children(&["a", "b", "c"]);
        let root = tree.root_id().clone();

        let tree = tree.move_within_siblings(&ids[1], Direction::Up);
        assert_eq!(child_texts(&tree, &root), vec!["b", "a", "c"]);

        let tree = tree.move_within_siblings(&ids[0], Direction::Down);
        assert_eq!(child_texts(&tree, &root), vec!["b", "c", "a"]);
    }

    #[test]
    fn move_at_edges_is_noop() {
        let (tree, ids) = with_children(&["a", "b"]);
        let root = tree.root_id().clone();
        assert_eq!(tree.clone().move_within_siblings(&ids[0], Direction::Up), tree);
        assert_eq!(tree.clone().move_within_siblings(&ids[1], Direction::Down), tree);
        assert_eq!(tree.clone().move_within_siblings(&root, Direction::Up), tree);
    }

    #[test]
    fn reparent_inserts_at_clamped_index() {
        let (tree, ids) = with_children(&["a", "b", "c"]);
        let x = Node::new("x");
        let y = Node::new("y");
        let tree = tree.add_child(&ids[2], x).add_child(&ids[2], y);

        let tree = tree.reparent(&ids[0], &ids[2], Some(1));
        assert_eq!(child_texts(&tree, &ids[2]), vec!["x", "a", "y"]);
        assert_eq!(tree.parent_id(&ids[0]), Some(&ids[2]));

        let tree = tree.reparent(&ids[1], &ids[2], Some(99));
        assert_eq!(child_texts(&tree, &ids[2]), vec!["x", "a", "y", "b"]);
        assert_eq!(tree.children(tree.root_id()), std::slice::from_ref(&ids[2]));
    }

    #[test]
    fn reparent_expands_new_parent() {
        let (tree, ids) = with_children(&["a", "b"]);
        let tree = tree.update(&ids[1], &NodePatch::new().expanded(false));
        let tree = tree.reparent(&ids[0], &ids[1], None);
        assert!(tree.get(&ids[1]).unwrap().is_expanded);
    }

    #[test]
    fn reparent_guards_against_cycles() {
        let (tree, ids) = with_children(&["a"]);
        let child = Node::new("a.1");
        let child_id = child.id.clone();
        let tree = tree.add_child(&ids[0], child);
        let root = tree.root_id().clone();

        assert_eq!(tree.clone().reparent(&ids[0], &child_id, None), tree);
        assert_eq!(tree.clone().reparent(&ids[0], &ids[0], None), tree);
        assert_eq!(tree.clone().reparent(&root, &ids[0], None), tree);
        assert_eq!(tree.clone().reparent(&ids[0], &NodeId::from("nope"), None), tree);
    }

    #[test]
    fn update_only_touches_addressed_node() {
        let (tree, ids) = with_children(&["a", "b"]);
        let before_b = tree.get(&ids[1]).cloned();

        let tree = tree.update_at(&ids[0], &NodePatch::new().status(TaskStatus::Done), 7);
        assert_eq!(tree.get(&ids[0]).unwrap().status, TaskStatus::Done);
        assert_eq!(tree.get(&ids[0]).unwrap().updated_at, 7);
        assert_eq!(tree.get(&ids[1]).cloned(), before_b);
    }

    #[test]
    fn prune_if_empty_only_removes_blank_leaves() {
        let (tree, ids) = with_children(&["  ", "named", ""]);
        let tree = tree.add_child(&ids[2], Node::new("kid"));

        let tree = tree
            .prune_if_empty(&ids[0])
            .prune_if_empty(&ids[1])
            .prune_if_empty(&ids[2]);

        assert!(!tree.contains(&ids[0]));
        assert!(tree.contains(&ids[1]));
        assert!(tree.contains(&ids[2]), "blank node with children is kept");

        let blank_root = Tree::new(Node::new(""));
        let root = blank_root.root_id().clone();
        assert_eq!(blank_root.clone().prune_if_empty(&root), blank_root);
    }
}

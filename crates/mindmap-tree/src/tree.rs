//! Arena-backed task tree and read-only traversal

use std::collections::HashMap;

use crate::node::{Node, NodeId, TaskStatus};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    pub(crate) node: Node,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// A rooted, ordered tree of nodes.
///
/// Nodes live in an arena keyed by id; each slot records its parent and
/// the ordered ids of its children, so parent lookups and ancestor walks
/// never rescan the tree. Invariants held by every constructor and
/// mutation:
///
/// - exactly one node (the root) has no parent
/// - ids are unique
/// - no node is its own descendant
/// - sibling order only changes through explicit reordering
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub(crate) root: NodeId,
    pub(crate) slots: HashMap<NodeId, Slot>,
}

impl Tree {
    /// Create a tree containing only `root`.
    pub fn new(root: Node) -> Self {
        let root_id = root.id.clone();
        let mut slots = HashMap::new();
        slots.insert(
            root_id.clone(),
            Slot {
                node: root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            root: root_id,
            slots,
        }
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> &Node {
        // The root slot is inserted at construction and never removed
        &self.slots[&self.root].node
    }

    /// Look up a node by id.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.slots.get(id).map(|slot| &slot.node)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.slots.contains_key(id)
    }

    /// Number of nodes, root included. Always at least one.
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_root(&self, id: &NodeId) -> bool {
        self.root == *id
    }

    /// The direct parent of `id`; `None` for the root or an unknown id.
    pub fn parent(&self, id: &NodeId) -> Option<&Node> {
        self.parent_id(id).and_then(|parent| self.get(parent))
    }

    pub fn parent_id(&self, id: &NodeId) -> Option<&NodeId> {
        self.slots.get(id).and_then(|slot| slot.parent.as_ref())
    }

    /// Ordered child ids of `id`; empty for leaves and unknown ids.
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.slots
            .get(id)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_nodes(&self, id: &NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.children(id).iter().filter_map(|child| self.get(child))
    }

    /// Position of `id` among its siblings.
    pub fn sibling_index(&self, id: &NodeId) -> Option<usize> {
        let parent = self.parent_id(id)?;
        self.children(parent).iter().position(|child| child == id)
    }

    /// Pre-order ids starting at `start` (inclusive).
    pub fn subtree_ids(&self, start: &NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if !self.contains(start) {
            return order;
        }

        let mut stack = vec![start.clone()];
        while let Some(id) = stack.pop() {
            // Push children reversed so the first child is visited first
            stack.extend(self.children(&id).iter().rev().cloned());
            order.push(id);
        }
        order
    }

    /// Pre-order list of every node, root first.
    pub fn flatten(&self) -> Vec<&Node> {
        self.subtree_ids(&self.root)
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Walk from the parent of `id` up to the root.
    pub fn ancestors(&self, id: &NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent_id(id),
        }
    }

    /// Chain of nodes from the root down to `id`, both inclusive.
    /// Empty when `id` is unknown.
    pub fn path(&self, id: &NodeId) -> Vec<&Node> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let mut path: Vec<&Node> = self.ancestors(id).collect();
        path.reverse();
        path.push(node);
        path
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).count())
    }

    /// True when `candidate` equals `ancestor` or lies below it.
    pub fn is_descendant(&self, ancestor: &NodeId, candidate: &NodeId) -> bool {
        if !self.contains(candidate) {
            return false;
        }
        candidate == ancestor || self.ancestors(candidate).any(|node| node.id == *ancestor)
    }

    /// Count of nodes in each status.
    pub fn status_counts(&self) -> HashMap<TaskStatus, usize> {
        let mut counts = HashMap::new();
        for slot in self.slots.values() {
            *counts.entry(slot.node.status).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for Tree {
    /// A fresh tree with a single, prioritized root.
    fn default() -> Self {
        let mut root = Node::new("Operations");
        root.is_important = true;
        root.is_urgent = true;
        Self::new(root)
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<&'a NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        let slot = self.tree.slots.get(id)?;
        self.next = slot.parent.as_ref();
        Some(&slot.node)
    }
}

//! Nested wire representation of a tree
//!
//! Persisted content nests children inside their parent. Conversion to
//! and from the arena is iterative so deep trees do not grow the stack.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use crate::tree::{Slot, Tree};

/// A node with its children inlined, as stored in files and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

impl Tree {
    /// Build the nested representation.
    pub fn to_record(&self) -> NodeRecord {
        let mut built: HashMap<NodeId, NodeRecord> = HashMap::with_capacity(self.node_count());

        // Reverse pre-order visits every child before its parent
        for id in self.subtree_ids(self.root_id()).into_iter().rev() {
            let slot = &self.slots[&id];
            let children = slot
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(
                id,
                NodeRecord {
                    node: slot.node.clone(),
                    children,
                },
            );
        }

        built.remove(self.root_id()).unwrap_or_else(|| NodeRecord {
            node: self.root().clone(),
            children: Vec::new(),
        })
    }

    /// Build an arena tree from nested content, rejecting duplicate ids.
    pub fn from_record(record: NodeRecord) -> Result<Self> {
        let root_id = record.node.id.clone();
        let mut slots: HashMap<NodeId, Slot> = HashMap::new();
        let mut stack: Vec<(NodeRecord, Option<NodeId>)> = vec![(record, None)];

        while let Some((record, parent)) = stack.pop() {
            let NodeRecord { mut node, children } = record;
            if slots.contains_key(&node.id) {
                return Err(Error::DuplicateId {
                    id: node.id.to_string(),
                });
            }
            if node.updated_at == 0 {
                node.updated_at = node.created_at;
            }

            let id = node.id.clone();
            let child_ids = children.iter().map(|child| child.node.id.clone()).collect();
            for child in children.into_iter().rev() {
                stack.push((child, Some(id.clone())));
            }
            slots.insert(
                id,
                Slot {
                    node,
                    parent,
                    children: child_ids,
                },
            );
        }

        Ok(Self {
            root: root_id,
            slots,
        })
    }
}

impl TryFrom<NodeRecord> for Tree {
    type Error = Error;

    fn try_from(record: NodeRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

impl From<&Tree> for NodeRecord {
    fn from(tree: &Tree) -> Self {
        tree.to_record()
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = NodeRecord::deserialize(deserializer)?;
        Tree::from_record(record).map_err(serde::de::Error::custom)
    }
}

//! Task tree model for the mind map to-do list
//!
//! A [`Tree`] is an arena of [`Node`]s addressed by [`NodeId`], with
//! explicit parent links and ordered child lists. Every mutation consumes
//! the tree and returns the new value:
//!
//! ```
//! use mindmap_tree::{Node, Tree};
//!
//! let tree = Tree::new(Node::new("Operations"));
//! let task = Node::new("Write report");
//! let task_id = task.id.clone();
//! let root_id = tree.root_id().clone();
//!
//! let tree = tree.add_child(&root_id, task);
//! assert_eq!(tree.parent(&task_id).map(|p| &p.id), Some(&root_id));
//! ```
//!
//! Mutations addressed at unknown ids, or that would break a structural
//! invariant (cycles, reparenting the root, duplicate ids), return the
//! input unchanged.

pub mod document;
pub mod error;
pub mod mutation;
pub mod node;
mod record;
pub mod tree;

pub use document::Document;
pub use error::{Error, Result};
pub use mutation::Direction;
pub use node::{HistoryEntry, Node, NodeId, NodePatch, TaskStatus, TrackedField, now_millis};
pub use record::NodeRecord;
pub use tree::{Ancestors, Tree};

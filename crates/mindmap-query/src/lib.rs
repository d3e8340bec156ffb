//! Query engine for the task tree
//!
//! Filtering is a pure predicate over single nodes ([`matches`]) plus an
//! ancestor closure ([`visible_ids`]) that keeps every match reachable
//! from the root. Everything is recomputed from scratch per call.

pub mod filter;
pub mod search;

pub use filter::{BaseFilter, FilterState, ParseFilterError, PriorityFilter, matches, today, visible_ids};
pub use search::{UNTITLED, breadcrumb, search};

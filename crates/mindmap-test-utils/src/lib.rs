//! Shared test utilities for the mindmap workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TreeBuilder`] for labelled trees and a small sample plan

pub mod tree;

pub use tree::{TreeBuilder, date, sample_tree};

//! rstree: convert flat parent/child records into forests and back
//!
//! The core operations live in [`domain`] and have no I/O:
//!
//! - [`array_to_tree`] / [`TreeBuilder`] nest flat records under their parents
//! - [`tree_to_array`] flattens a forest in pre-order
//! - [`get_tree_node_by_attr`] finds the first node whose field equals a value
//!
//! The remaining layers wrap them into the `rstree` command line tool.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use domain::{
    array_to_tree, get_tree_node_by_attr, get_tree_node_by_attr_mut, tree_to_array,
    tree_to_array_with, DomainError, Field, Node, Record, TreeBuilder,
};

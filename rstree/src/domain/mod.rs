//! Domain layer: node model and tree algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod error;
pub mod flatten;
pub mod node;
pub mod search;

pub use builder::{array_to_tree, ProcessItem, TreeBuilder};
pub use error::{DomainError, DomainResult};
pub use flatten::{tree_to_array, tree_to_array_with};
pub use node::{
    field_matches, json_kind, records_from_value, strict_eq, Field, Node, Record, CHECKED_KEY,
    DEFAULT_CHILDREN_KEY, DEFAULT_CURRENT_KEY, DEFAULT_PARENT_KEY,
};
pub use search::{get_tree_node_by_attr, get_tree_node_by_attr_mut};

//! Forest flattening: pre-order walk that emits one record per node.

use tracing::{debug, instrument};

use crate::domain::node::{Node, DEFAULT_CHILDREN_KEY};

/// Flatten a forest into a pre-order list of records.
///
/// Each emitted record is a copy of its node with `children_key` present but
/// set to `null`. Only the roots are read through `children_key`; their
/// descendants are followed through the default `children` field.
pub fn tree_to_array(tree: &[Node], children_key: &str) -> Vec<Node> {
    tree_to_array_with(tree, children_key, false)
}

/// Like [`tree_to_array`], but with `forward` set the caller's `children_key`
/// is used at every depth.
#[instrument(level = "debug", skip(tree), fields(roots = tree.len()))]
pub fn tree_to_array_with(tree: &[Node], children_key: &str, forward: bool) -> Vec<Node> {
    let nested_key = if forward {
        children_key
    } else {
        DEFAULT_CHILDREN_KEY
    };

    let mut result = Vec::new();
    // Push in reverse so the leftmost sibling is emitted first
    let mut stack: Vec<(&Node, &str)> = tree.iter().rev().map(|n| (n, children_key)).collect();

    while let Some((node, key)) = stack.pop() {
        result.push(node.with_cleared(key));
        if let Some(children) = node.children(key) {
            for child in children.iter().rev() {
                stack.push((child, nested_key));
            }
        }
    }

    debug!("tree_to_array: {} record(s)", result.len());
    result
}

//! Text rendering of forests via termtree.

use serde_json::Value;
use termtree::Tree;
use tracing::instrument;

use crate::domain::Node;

pub trait TreeNodeConvert {
    fn to_tree_string(&self, label_key: &str, children_key: &str) -> Tree<String>;
}

impl TreeNodeConvert for Node {
    fn to_tree_string(&self, label_key: &str, children_key: &str) -> Tree<String> {
        let leaves: Vec<_> = self
            .children(children_key)
            .unwrap_or_default()
            .iter()
            .map(|c| c.to_tree_string(label_key, children_key))
            .collect();

        Tree::new(label(self, label_key)).with_leaves(leaves)
    }
}

/// Render every root of a forest as its own tree.
#[instrument(level = "debug", skip(forest), fields(roots = forest.len()))]
pub fn forest_to_tree_strings(
    forest: &[Node],
    label_key: &str,
    children_key: &str,
) -> Vec<Tree<String>> {
    forest
        .iter()
        .map(|root| root.to_tree_string(label_key, children_key))
        .collect()
}

fn label(node: &Node, label_key: &str) -> String {
    match node.value(label_key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => format!("<no {}>", label_key),
    }
}

//! Depth-first search for the first node carrying a given field value.

use serde_json::Value;
use tracing::{instrument, trace};

use crate::domain::node::{field_matches, Node};

/// Return the first node, in depth-first pre-order, whose `key` field
/// strictly equals `value`.
///
/// `None` as the target matches the first node lacking `key`. Subtrees are
/// followed through `children_key` at every depth.
#[instrument(level = "debug", skip(data), fields(roots = data.len()))]
pub fn get_tree_node_by_attr<'t>(
    data: &'t [Node],
    key: &str,
    value: Option<&Value>,
    children_key: &str,
) -> Option<&'t Node> {
    let mut stack: Vec<&Node> = data.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if field_matches(node.get(key), value) {
            return Some(node);
        }
        if let Some(children) = node.children(children_key) {
            trace!("descending into {} child(ren)", children.len());
            stack.extend(children.iter().rev());
        }
    }
    None
}

/// Mutable variant of [`get_tree_node_by_attr`] with the same visiting order.
pub fn get_tree_node_by_attr_mut<'t>(
    data: &'t mut [Node],
    key: &str,
    value: Option<&Value>,
    children_key: &str,
) -> Option<&'t mut Node> {
    let mut stack: Vec<&mut Node> = data.iter_mut().rev().collect();

    while let Some(node) = stack.pop() {
        if field_matches(node.get(key), value) {
            return Some(node);
        }
        if let Some(children) = node.children_mut(children_key) {
            stack.extend(children.iter_mut().rev());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::array_to_tree;
    use crate::domain::node::records_from_value;
    use serde_json::json;

    fn forest() -> Vec<Node> {
        let data = records_from_value(json!([
            {"id": 1, "parentId": 0, "name": "root"},
            {"id": 2, "parentId": 1, "name": "a"},
            {"id": 3, "parentId": 1, "name": "b"},
            {"id": 4, "parentId": 2, "name": "b"}
        ]))
        .unwrap();
        array_to_tree(&data, Some(&json!(0)))
    }

    #[test]
    fn given_existing_id_when_searching_then_finds_nested_node() {
        let forest = forest();
        let found = get_tree_node_by_attr(&forest, "id", Some(&json!(4)), "children").unwrap();
        assert_eq!(found.value("name"), Some(&json!("b")));
    }

    #[test]
    fn given_missing_id_when_searching_then_not_found() {
        let forest = forest();
        assert!(get_tree_node_by_attr(&forest, "id", Some(&json!(99)), "children").is_none());
    }

    #[test]
    fn given_empty_data_when_searching_then_not_found() {
        assert!(get_tree_node_by_attr(&[], "id", Some(&json!(1)), "children").is_none());
    }

    #[test]
    fn given_duplicate_values_when_searching_then_pre_order_first_wins() {
        // node 4 sits in the subtree of 2, which precedes sibling 3
        let forest = forest();
        let found = get_tree_node_by_attr(&forest, "name", Some(&json!("b")), "children").unwrap();
        assert_eq!(found.value("id"), Some(&json!(4)));
    }

    #[test]
    fn given_miss_in_first_subtree_when_searching_then_later_siblings_are_checked() {
        let tree = records_from_value(json!([
            {"id": 1, "children": [{"id": 2}]},
            {"id": 3, "children": [{"id": 4}]}
        ]))
        .unwrap();
        let found = get_tree_node_by_attr(&tree, "id", Some(&json!(4)), "children");
        assert!(found.is_some());
    }

    #[test]
    fn given_string_target_when_searching_numeric_ids_then_not_found() {
        let forest = forest();
        assert!(get_tree_node_by_attr(&forest, "id", Some(&json!("4")), "children").is_none());
    }

    #[test]
    fn given_mutable_search_when_found_then_node_can_be_edited() {
        let mut forest = forest();
        let node = get_tree_node_by_attr_mut(&mut forest, "id", Some(&json!(3)), "children").unwrap();
        node.insert("name", "renamed");

        let found = get_tree_node_by_attr(&forest, "id", Some(&json!(3)), "children").unwrap();
        assert_eq!(found.value("name"), Some(&json!("renamed")));
    }
}

//! Node model: open, ordered records with typed child sequences
//!
//! A [`Node`] holds arbitrary application fields by name. Child sequences are
//! stored as [`Field::Children`] so the algorithms can walk them without
//! re-parsing JSON, while every other field stays a plain [`serde_json::Value`].

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{DomainError, DomainResult};

/// Default name of the field holding a node's parent identifier.
pub const DEFAULT_PARENT_KEY: &str = "parentId";
/// Default name of the field holding a node's children.
pub const DEFAULT_CHILDREN_KEY: &str = "children";
/// Default name of the field holding a node's own identifier.
pub const DEFAULT_CURRENT_KEY: &str = "id";
/// Flag reset to `false` on every node that receives children.
pub const CHECKED_KEY: &str = "checked";

/// Fields returned by an enrichment callback, merged onto a node.
pub type Record = Map<String, Value>;

/// A single field of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    /// Nested child nodes
    Children(Vec<Node>),
    /// Any other application value
    Value(Value),
}

impl Field {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            Field::Children(_) => None,
        }
    }

    pub fn as_children(&self) -> Option<&[Node]> {
        match self {
            Field::Children(children) => Some(children),
            Field::Value(_) => None,
        }
    }

    /// Strict equality against a target value. A child sequence never equals a value.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match self {
            Field::Value(value) => strict_eq(value, other),
            Field::Children(_) => false,
        }
    }
}

impl From<Value> for Field {
    /// Non-empty arrays made only of objects become child sequences.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                Field::Children(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Object(map) => Some(Node::from(map)),
                            _ => None,
                        })
                        .collect(),
                )
            }
            other => Field::Value(other),
        }
    }
}

impl From<Vec<Node>> for Field {
    fn from(children: Vec<Node>) -> Self {
        Field::Children(children)
    }
}

impl From<Field> for Value {
    fn from(field: Field) -> Self {
        match field {
            Field::Value(value) => value,
            Field::Children(children) => {
                Value::Array(children.into_iter().map(Value::from).collect())
            }
        }
    }
}

/// Strict value equality without type coercion.
///
/// Numbers compare by numeric value, so `1` equals `1.0` and NaN equals nothing.
/// Values of different JSON types are never equal.
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
        }
        _ => left == right,
    }
}

/// Compare an optional field against an optional target.
///
/// `None` on either side means "undefined": two undefined sides are equal,
/// an undefined side never equals a present one.
pub fn field_matches(field: Option<&Field>, target: Option<&Value>) -> bool {
    match (field, target) {
        (None, None) => true,
        (Some(field), Some(target)) => field.strict_eq(target),
        _ => false,
    }
}

/// Name of a value's JSON type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Open record with insertion-ordered fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Node {
    fields: IndexMap<String, Field>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    /// Plain value of a field; `None` when absent or holding children.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).and_then(Field::as_value)
    }

    /// Child sequence stored under `key`, if that field holds one.
    pub fn children(&self, key: &str) -> Option<&[Node]> {
        self.fields.get(key).and_then(Field::as_children)
    }

    pub fn children_mut(&mut self, key: &str) -> Option<&mut Vec<Node>> {
        match self.fields.get_mut(key) {
            Some(Field::Children(children)) => Some(children),
            _ => None,
        }
    }

    /// True if `key` holds at least one child.
    pub fn has_children(&self, key: &str) -> bool {
        self.children(key).is_some_and(|children| !children.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Set a plain value. An existing field keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Field> {
        self.fields.insert(key.into(), Field::Value(value.into()))
    }

    pub fn set_children(&mut self, key: impl Into<String>, children: Vec<Node>) -> Option<Field> {
        self.fields.insert(key.into(), Field::Children(children))
    }

    /// Keep `key` present but set it to `null`.
    pub fn clear_field(&mut self, key: &str) {
        self.fields.insert(key.to_string(), Field::Value(Value::Null));
    }

    pub fn remove(&mut self, key: &str) -> Option<Field> {
        self.fields.shift_remove(key)
    }

    /// Shallow merge; fields from `record` win on collision.
    pub fn merge(&mut self, record: Record) {
        for (key, value) in record {
            self.fields.insert(key, Field::from(value));
        }
    }

    /// Copy of this node with `key` cleared to `null`, without cloning the
    /// children stored under it.
    pub fn with_cleared(&self, key: &str) -> Node {
        let mut fields: IndexMap<String, Field> = self
            .fields
            .iter()
            .map(|(name, field)| {
                let field = if name == key {
                    Field::Value(Value::Null)
                } else {
                    field.clone()
                };
                (name.clone(), field)
            })
            .collect();
        fields
            .entry(key.to_string())
            .or_insert(Field::Value(Value::Null));
        Node { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Node {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl FromIterator<(String, Value)> for Node {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Node {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key, Field::from(value)))
                .collect(),
        }
    }
}

impl TryFrom<Value> for Node {
    type Error = DomainError;

    fn try_from(value: Value) -> DomainResult<Self> {
        match value {
            Value::Object(map) => Ok(Node::from(map)),
            other => Err(DomainError::ExpectedObject {
                found: json_kind(&other),
            }),
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Object(
            node.fields
                .into_iter()
                .map(|(key, field)| (key, Value::from(field)))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        IndexMap::<String, Value>::deserialize(deserializer).map(|map| map.into_iter().collect())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

/// Convert a parsed JSON document into flat records.
///
/// `null` counts as an empty list. Anything else that is not an array of
/// objects is rejected.
pub fn records_from_value(value: Value) -> DomainResult<Vec<Node>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(Node::from(map)),
                other => Err(DomainError::NotAnObject {
                    index,
                    found: json_kind(&other),
                }),
            })
            .collect(),
        other => Err(DomainError::NotAnArray {
            found: json_kind(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Node {
        Node::try_from(value).unwrap()
    }

    #[test]
    fn given_array_of_objects_when_converting_then_becomes_children() {
        let n = node(json!({"id": 1, "children": [{"id": 2}, {"id": 3}]}));
        let children = n.children("children").unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].value("id"), Some(&json!(3)));
        assert!(n.has_children("children"));
    }

    #[test]
    fn given_mixed_or_empty_arrays_when_converting_then_stay_values() {
        let n = node(json!({"tags": ["a", {"b": 1}], "children": []}));
        assert!(n.children("tags").is_none());
        assert_eq!(n.value("children"), Some(&json!([])));
        assert!(!n.has_children("children"));
    }

    #[test]
    fn given_numbers_when_comparing_strictly_then_no_type_coercion() {
        assert!(strict_eq(&json!(1), &json!(1.0)));
        assert!(!strict_eq(&json!(1), &json!("1")));
        assert!(!strict_eq(&json!(0), &json!(false)));
        assert!(!strict_eq(&json!(null), &json!(0)));
        assert!(strict_eq(&json!("a"), &json!("a")));
    }

    #[test]
    fn given_undefined_sides_when_matching_then_only_both_absent_match() {
        let n = node(json!({"id": 1, "parentId": null}));
        assert!(field_matches(n.get("missing"), None));
        assert!(!field_matches(n.get("parentId"), None));
        assert!(field_matches(n.get("parentId"), Some(&Value::Null)));
        assert!(!field_matches(n.get("missing"), Some(&Value::Null)));
    }

    #[test]
    fn given_children_field_when_comparing_then_never_equal() {
        let n = node(json!({"children": [{"id": 2}]}));
        assert!(!field_matches(n.get("children"), Some(&json!([{"id": 2}]))));
    }

    #[test]
    fn given_node_when_cleared_then_key_present_with_null_and_order_kept() {
        let n = node(json!({"id": 1, "children": [{"id": 2}], "name": "a"}));
        let cleared = n.with_cleared("children");
        let keys: Vec<&String> = cleared.keys().collect();
        assert_eq!(keys, ["id", "children", "name"]);
        assert_eq!(cleared.value("children"), Some(&Value::Null));

        let leaf = node(json!({"id": 3}));
        let cleared = leaf.with_cleared("children");
        assert_eq!(cleared.len(), 2);
        assert!(cleared.contains_key("children"));
    }

    #[test]
    fn given_record_when_merging_then_record_wins() {
        let mut n = node(json!({"id": 1, "isLeaf": true}));
        let mut extra = Record::new();
        extra.insert("isLeaf".into(), json!(false));
        extra.insert("depth".into(), json!(0));
        n.merge(extra);
        assert_eq!(n.value("isLeaf"), Some(&json!(false)));
        assert_eq!(n.value("depth"), Some(&json!(0)));
        assert_eq!(n.keys().next().map(String::as_str), Some("id"));
    }

    #[test]
    fn given_nested_json_when_serializing_then_matches_source() {
        let source = json!({"id": 1, "name": "root", "children": [{"id": 2, "parentId": 1}]});
        let n: Node = serde_json::from_value(source.clone()).unwrap();
        assert_eq!(serde_json::to_value(&n).unwrap(), source);
        assert_eq!(Value::from(n), source);
    }

    #[test]
    fn given_non_array_document_when_loading_records_then_fails_fast() {
        assert!(records_from_value(Value::Null).unwrap().is_empty());
        assert!(matches!(
            records_from_value(json!({"id": 1})),
            Err(DomainError::NotAnArray { found: "object" })
        ));
        assert!(matches!(
            records_from_value(json!([{"id": 1}, 2])),
            Err(DomainError::NotAnObject {
                index: 1,
                found: "number"
            })
        ));
    }

    #[test]
    fn given_node_when_displayed_then_compact_json() {
        let n = node(json!({"id": 1, "name": "x"}));
        assert_eq!(n.to_string(), r#"{"id":1,"name":"x"}"#);
    }
}

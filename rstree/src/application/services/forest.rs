//! Forest service
//!
//! Loads flat or nested JSON records and runs the tree operations with key
//! names resolved from request overrides and settings.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::application::{
    ApplicationError, ApplicationResult, IoResultExt, JsonResultExt,
};
use crate::config::Settings;
use crate::domain::{
    get_tree_node_by_attr, records_from_value, tree_to_array_with, Node, Record, TreeBuilder,
};
use crate::infrastructure::traits::FileSystem;
use crate::tree_traits::forest_to_tree_strings;

/// Parameters of a build; `None` falls back to settings.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// JSON literal of the root sentinel
    pub root: Option<String>,
    pub parent_key: Option<String>,
    pub children_key: Option<String>,
    pub current_key: Option<String>,
    /// Field set to whether a node received no children
    pub leaf_flag: Option<String>,
    /// Forward children key and enrichment to every depth
    pub forward: bool,
    pub max_depth: Option<usize>,
}

/// Parameters of a flatten.
#[derive(Debug, Clone, Default)]
pub struct FlattenRequest {
    pub children_key: Option<String>,
    pub forward: bool,
}

/// Parameters of a search.
#[derive(Debug, Clone, Default)]
pub struct FindRequest {
    /// Field to compare, default: the configured current key
    pub key: Option<String>,
    /// JSON literal of the target value
    pub value: String,
    pub children_key: Option<String>,
}

/// Interpret a command-line literal as JSON, falling back to a plain string.
///
/// `0` is a number, `"0"` (with quotes) and `abc` are strings, `null` is null.
pub fn parse_literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Service for converting between flat records and forests.
pub struct ForestService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl ForestService {
    /// Create a new forest service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Read a JSON array of records from a file.
    pub fn load_records(&self, path: &Path) -> ApplicationResult<Vec<Node>> {
        debug!("load_records: path={}", path.display());
        if !self.fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("file not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read records", path)?;
        self.parse_records(&content, &path.display().to_string())
    }

    /// Parse a JSON array of records; `origin` names the input in errors.
    pub fn parse_records(&self, content: &str, origin: &str) -> ApplicationResult<Vec<Node>> {
        let value = parse_unbounded(content).with_json_context(origin)?;
        let records = records_from_value(value)?;
        debug!("parse_records: {} record(s) from {}", records.len(), origin);
        Ok(records)
    }

    /// Build a forest from flat records.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&self, records: &[Node], request: &BuildRequest) -> ApplicationResult<Vec<Node>> {
        let keys = &self.settings.keys;
        let build = &self.settings.build;

        let root = request
            .root
            .as_deref()
            .or(build.root.as_deref())
            .map(parse_literal)
            .ok_or(ApplicationError::MissingRoot)?;

        let mut builder = TreeBuilder::new()
            .parent_key(resolve(&request.parent_key, &keys.parent_key))
            .children_key(resolve(&request.children_key, &keys.children_key))
            .current_key(resolve(&request.current_key, &keys.current_key))
            .forward_to_descendants(request.forward || build.forward_to_descendants);

        if let Some(limit) = request.max_depth.or(build.max_depth) {
            builder = builder.max_depth(limit);
        }
        if let Some(flag) = request.leaf_flag.clone().or_else(|| build.leaf_flag.clone()) {
            builder = builder.process_item(move |_, children| {
                let mut record = Record::new();
                record.insert(flag.clone(), json!(children.is_empty()));
                record
            });
        }
        debug!("build: root={} builder={:?}", root, builder);

        Ok(builder.build(records, Some(&root))?)
    }

    /// Flatten a forest into pre-order records.
    pub fn flatten(&self, forest: &[Node], request: &FlattenRequest) -> Vec<Node> {
        let children_key = resolve(&request.children_key, &self.settings.keys.children_key);
        tree_to_array_with(forest, &children_key, request.forward)
    }

    /// Find the first node whose field equals the requested value.
    pub fn find<'t>(&self, forest: &'t [Node], request: &FindRequest) -> Option<&'t Node> {
        let keys = &self.settings.keys;
        let key = resolve(&request.key, &keys.current_key);
        let children_key = resolve(&request.children_key, &keys.children_key);
        let value = parse_literal(&request.value);
        debug!("find: {}={} via {}", key, value, children_key);
        get_tree_node_by_attr(forest, &key, Some(&value), &children_key)
    }

    /// Render a forest as text trees, labelled by `label_key` (default: current key).
    pub fn render(
        &self,
        forest: &[Node],
        label_key: Option<&str>,
        children_key: Option<&str>,
    ) -> String {
        let keys = &self.settings.keys;
        let label_key = label_key.unwrap_or(&keys.current_key);
        let children_key = children_key.unwrap_or(&keys.children_key);
        forest_to_tree_strings(forest, label_key, children_key)
            .iter()
            .map(|tree| tree.to_string())
            .collect()
    }

    /// Serialize output, pretty or compact per settings.
    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> ApplicationResult<String> {
        if self.settings.output.pretty {
            serde_json::to_string_pretty(value).with_json_context("output")
        } else {
            serde_json::to_string(value).with_json_context("output")
        }
    }
}

/// Parse JSON of any nesting depth, growing the stack on demand.
///
/// Built forests nest two JSON levels per tree level.
fn parse_unbounded(content: &str) -> serde_json::Result<Value> {
    let mut json = serde_json::Deserializer::from_str(content);
    json.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

fn resolve(requested: &Option<String>, configured: &str) -> String {
    requested.clone().unwrap_or_else(|| configured.to_string())
}

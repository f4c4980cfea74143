//! Tree builder: turns flat parent/child records into a forest.

use std::fmt;

use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{
    field_matches, Field, Node, Record, CHECKED_KEY, DEFAULT_CHILDREN_KEY, DEFAULT_CURRENT_KEY,
    DEFAULT_PARENT_KEY,
};

/// Enrichment callback: receives a node and the children found for it,
/// returns fields to merge onto the node.
pub type ProcessItem<'a> = dyn Fn(&Node, &[Node]) -> Record + Send + Sync + 'a;

/// Decorated copies of source records, keyed by their index in the input.
type WriteBack = Vec<(usize, Node)>;

/// Settings that apply to one level of the descent.
#[derive(Clone, Copy)]
struct Scope<'s> {
    children_key: &'s str,
    enrich: bool,
}

/// Constructs forests from flat records linked by parent-key fields.
///
/// By default the children-key name and the enrichment callback apply only to
/// the roots of a build; deeper levels use the default `children` key and are
/// not enriched. [`TreeBuilder::forward_to_descendants`] applies both at every
/// depth.
pub struct TreeBuilder<'a> {
    parent_key: String,
    children_key: String,
    current_key: String,
    process_item: Option<Box<ProcessItem<'a>>>,
    forward_to_descendants: bool,
    max_depth: Option<usize>,
}

impl Default for TreeBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TreeBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("parent_key", &self.parent_key)
            .field("children_key", &self.children_key)
            .field("current_key", &self.current_key)
            .field("process_item", &self.process_item.is_some())
            .field("forward_to_descendants", &self.forward_to_descendants)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<'a> TreeBuilder<'a> {
    pub fn new() -> Self {
        Self {
            parent_key: DEFAULT_PARENT_KEY.to_string(),
            children_key: DEFAULT_CHILDREN_KEY.to_string(),
            current_key: DEFAULT_CURRENT_KEY.to_string(),
            process_item: None,
            forward_to_descendants: false,
            max_depth: None,
        }
    }

    pub fn parent_key(mut self, key: impl Into<String>) -> Self {
        self.parent_key = key.into();
        self
    }

    pub fn children_key(mut self, key: impl Into<String>) -> Self {
        self.children_key = key.into();
        self
    }

    pub fn current_key(mut self, key: impl Into<String>) -> Self {
        self.current_key = key.into();
        self
    }

    /// Install an enrichment callback. Its result is shallow-merged onto each
    /// enriched node after children are attached.
    pub fn process_item<F>(mut self, process: F) -> Self
    where
        F: Fn(&Node, &[Node]) -> Record + Send + Sync + 'a,
    {
        self.process_item = Some(Box::new(process));
        self
    }

    /// Apply the children key and enrichment at every depth instead of only
    /// at the roots. Off by default.
    pub fn forward_to_descendants(mut self, forward: bool) -> Self {
        self.forward_to_descendants = forward;
        self
    }

    /// Fail with [`DomainError::DepthExceeded`] instead of recursing past `limit` levels.
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }

    /// Build a forest from `data`.
    ///
    /// Roots are the records whose parent-key field strictly equals `parent`;
    /// `None` selects records that lack the parent-key field. The input is not
    /// modified and the returned nodes are independent copies.
    #[instrument(level = "debug", skip(self, data), fields(records = data.len()))]
    pub fn build(&self, data: &[Node], parent: Option<&Value>) -> DomainResult<Vec<Node>> {
        let forest = self.assemble(data, parent, self.root_scope(), 0, None)?;
        debug!("build: {} root(s)", forest.len());
        Ok(forest)
    }

    /// Build a forest and write the decorated nodes back into `data`.
    ///
    /// Every record that ends up in the forest receives its children, the
    /// `checked` flag and enrichment fields, like the returned copies do.
    /// Nothing is written when the build fails.
    #[instrument(level = "debug", skip(self, data), fields(records = data.len()))]
    pub fn build_in_place(
        &self,
        data: &mut [Node],
        parent: Option<&Value>,
    ) -> DomainResult<Vec<Node>> {
        let mut write_back = WriteBack::new();
        let forest = self.assemble(data, parent, self.root_scope(), 0, Some(&mut write_back))?;
        debug!("build_in_place: updating {} record(s)", write_back.len());
        for (index, node) in write_back {
            data[index] = node;
        }
        Ok(forest)
    }

    fn root_scope(&self) -> Scope<'_> {
        Scope {
            children_key: &self.children_key,
            enrich: true,
        }
    }

    fn descendant_scope(&self) -> Scope<'_> {
        if self.forward_to_descendants {
            self.root_scope()
        } else {
            Scope {
                children_key: DEFAULT_CHILDREN_KEY,
                enrich: false,
            }
        }
    }

    fn assemble(
        &self,
        data: &[Node],
        parent: Option<&Value>,
        scope: Scope<'_>,
        depth: usize,
        mut write_back: Option<&mut WriteBack>,
    ) -> DomainResult<Vec<Node>> {
        let mut result = Vec::new();
        if data.is_empty() {
            return Ok(result);
        }
        if let Some(limit) = self.max_depth {
            if depth > limit {
                return Err(DomainError::DepthExceeded { limit });
            }
        }

        for (index, item) in data.iter().enumerate() {
            if !field_matches(item.get(&self.parent_key), parent) {
                continue;
            }
            trace!("assemble: depth={} index={}", depth, index);

            let mut node = item.clone();
            let children = match item.get(&self.current_key) {
                // a child sequence equals no parent-key value
                Some(Field::Children(_)) => Vec::new(),
                own_key => self.assemble(
                    data,
                    own_key.and_then(Field::as_value),
                    self.descendant_scope(),
                    depth + 1,
                    write_back.as_deref_mut(),
                )?,
            };

            let attached = !children.is_empty();
            if attached {
                node.set_children(scope.children_key, children);
                node.insert(CHECKED_KEY, false);
            }

            if scope.enrich {
                if let Some(process) = &self.process_item {
                    let found = if attached {
                        node.children(scope.children_key).unwrap_or_default()
                    } else {
                        &[]
                    };
                    let extra = process(&node, found);
                    node.merge(extra);
                }
            }

            if let Some(sink) = write_back.as_deref_mut() {
                sink.push((index, node.clone()));
            }
            result.push(node);
        }

        Ok(result)
    }
}

/// Build a forest with default keys and no enrichment.
pub fn array_to_tree(data: &[Node], parent: Option<&Value>) -> Vec<Node> {
    // no depth limit is set, so the build cannot fail
    TreeBuilder::new().build(data, parent).unwrap_or_default()
}

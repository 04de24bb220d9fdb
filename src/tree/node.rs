//! Materialized nodes and lazy child resolution.

use crate::session::{Session, SessionInner};
use crate::tree::attributes::{AttributeTree, Value};
use crate::types::{NodeId, NodeOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Weak;
use tracing::{debug, warn};

/// Child descriptor embedded in a parent's document. Never fetched on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub id: NodeId,
    pub name: String,
    pub has_children: bool,
}

/// View of one remote node as of the fetch that produced it.
///
/// Every lookup builds a fresh `Node`; nothing is cached or shared between
/// lookups. The node keeps a weak handle on the session that fetched it so
/// children can be resolved on demand; the node's data outlives the session.
pub struct Node {
    id: NodeId,
    name: Option<String>,
    path: Option<String>,
    attributes: AttributeTree,
    children: Vec<ChildRef>,
    session: Weak<SessionInner>,
}

impl Node {
    /// Build a node from a server document.
    ///
    /// Returns `None` when the document is not an object or carries no
    /// decodable `id`. `lookup_path` replaces the document's own `path`
    /// field for path-based lookups.
    pub(crate) fn from_document(
        session: &Session,
        document: &serde_json::Value,
        lookup_path: Option<&str>,
    ) -> Option<Self> {
        let object = document.as_object()?;
        let id = match object
            .get("id")
            .map(|id| serde_json::from_value::<NodeId>(id.clone()))
        {
            Some(Ok(id)) => id,
            Some(Err(e)) => {
                warn!("Node document has an invalid id: {}", e);
                return None;
            }
            None => {
                warn!("Node document has no id");
                return None;
            }
        };

        let path = match lookup_path {
            Some(path) => Some(path.to_string()),
            None => object
                .get("path")
                .and_then(|p| p.as_str())
                .map(str::to_string),
        };

        Some(Self {
            id,
            name: object
                .get("name")
                .and_then(|n| n.as_str())
                .map(str::to_string),
            path,
            attributes: object
                .get("attributes")
                .map(AttributeTree::from_json)
                .unwrap_or_default(),
            children: parse_children(id, object.get("children")),
            session: session.downgrade(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Explicit wire encoding of this node: its identifier.
    pub fn id_json(&self) -> serde_json::Value {
        self.id.to_json()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Lookup path; only set for nodes fetched by path (or when the `path`
    /// projection was requested).
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn attributes(&self) -> &AttributeTree {
        &self.attributes
    }

    /// Shorthand for `attributes().get(dotted)`.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        self.attributes.get(dotted)
    }

    pub fn child_refs(&self) -> &[ChildRef] {
        &self.children
    }

    pub fn children_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Resolve the first child named `name` with a fresh lookup by id.
    ///
    /// Costs one round trip per call. Returns `None` when no child has that
    /// name, when the lookup fails, or when the session is gone.
    pub fn child(&self, name: &str) -> Option<Node> {
        let child = self.children.iter().find(|c| c.name == name)?;
        let Some(session) = Session::upgrade(&self.session) else {
            warn!(
                "Cannot resolve child '{}' of {}: session dropped",
                name, self.id
            );
            return None;
        };
        debug!(parent = %self.id, child = %child.id, "resolving child");
        session.lookup_by_id(child.id, NodeOptions::default())
    }

    /// Lazily resolve every child in child-list order, one round trip each.
    pub fn iter_children(&self) -> ChildIter<'_> {
        ChildIter {
            node: self,
            index: 0,
        }
    }

    /// Full document form, for display.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.to_json(),
            "name": self.name,
            "path": self.path,
            "attributes": self.attributes.to_json(),
            "children": self.children,
        })
    }
}

/// Malformed child data is treated as "no children".
fn parse_children(id: NodeId, children: Option<&serde_json::Value>) -> Vec<ChildRef> {
    let Some(children) = children else {
        return Vec::new();
    };
    if children.is_null() {
        return Vec::new();
    }
    match serde_json::from_value::<Vec<ChildRef>>(children.clone()) {
        Ok(children) => children,
        Err(e) => {
            debug!("Ignoring malformed child list of {}: {}", id, e);
            Vec::new()
        }
    }
}

/// Structural equality; the session association is not compared.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.path == other.path
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .finish()
    }
}

/// Iterator over a node's children resolved through [`Node::child`].
///
/// Yields exactly one item per child reference; an item is `None` when that
/// child's lookup failed.
pub struct ChildIter<'a> {
    node: &'a Node,
    index: usize,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = Option<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let child = self.node.children.get(self.index)?;
        self.index += 1;
        Some(self.node.child(&child.name))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.node.children.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChildIter<'_> {}

impl<'a> IntoIterator for &'a Node {
    type Item = Option<Node>;
    type IntoIter = ChildIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_children()
    }
}

//! Local materialization of remote evidence-tree nodes.

pub mod attributes;
pub mod node;

pub use attributes::{AttributeTree, Value};
pub use node::{ChildIter, ChildRef, Node};

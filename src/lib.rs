//! TAPIR client: access layer for a remote forensic evidence graph server.
//!
//! Remote nodes are materialized lazily into [`Node`] values, plugin jobs are
//! scheduled and polled through the [`Session`], and query predicates are
//! forwarded to the server verbatim.

pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod session;
pub mod task;
pub mod tooling;
pub mod transport;
pub mod tree;
pub mod types;

pub use error::ApiError;
pub use query::{Literal, LiteralKind, Predicate};
pub use session::Session;
pub use task::TaskHandle;
pub use tree::{AttributeTree, ChildRef, Node, Value};
pub use types::{NodeId, NodeOptions};

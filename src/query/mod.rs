//! Server-side queries: predicates and timeline.
//!
//! Predicate strings are forwarded exactly as given; the server parses and
//! evaluates them. Result order is whatever the server returns and does not
//! reflect tree order.

pub mod predicate;

pub use predicate::{AttributePath, Literal, LiteralKind, Predicate};

use crate::error::ApiError;
use crate::session::Session;
use crate::transport::Request;
use crate::types::NodeOptions;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::debug;

/// Subtree searched when no root is given.
pub const DEFAULT_QUERY_ROOT: &str = "/root";

impl Session {
    /// Evaluate `predicate` on the server under `root` (default `/root`).
    ///
    /// The predicate is not escaped, re-encoded or validated locally.
    pub fn query(
        &self,
        predicate: &str,
        root: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        let root = root.unwrap_or(DEFAULT_QUERY_ROOT);
        debug!(root, "query");
        let response = self.send_checked(
            Request::post("/query").json(json!({ "query": predicate, "root": root })),
        )?;
        response.json()
    }

    /// Render a typed predicate and run it.
    pub fn query_predicate(
        &self,
        predicate: &Predicate,
        root: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        self.query(&predicate.to_string(), root)
    }

    /// Nodes with timestamps between `after` and `before`, sent as RFC 3339.
    pub fn timeline(
        &self,
        after: &DateTime<Utc>,
        before: &DateTime<Utc>,
        options: NodeOptions,
    ) -> Result<serde_json::Value, ApiError> {
        let body = json!({
            "after": after.to_rfc3339_opts(SecondsFormat::Secs, true),
            "before": before.to_rfc3339_opts(SecondsFormat::Secs, true),
            "option": options,
        });
        self.send_checked(Request::post("/timeline").json(body))?
            .json()
    }
}

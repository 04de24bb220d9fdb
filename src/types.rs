//! Core identifier and request-shaping types shared by every remote operation.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// NodeId: compound server-issued identifier of one node version.
///
/// `slot` is the storage index, `stamp` the generation counter that changes
/// when a slot is reused. Equality compares both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    #[serde(rename = "index1")]
    pub slot: u64,
    pub stamp: u64,
}

impl NodeId {
    pub fn new(slot: u64, stamp: u64) -> Self {
        Self { slot, stamp }
    }

    /// Wire form: `{"index1": slot, "stamp": stamp}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "index1": self.slot, "stamp": self.stamp })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slot, self.stamp)
    }
}

/// Parses the `slot:stamp` form produced by `Display`.
impl FromStr for NodeId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (slot, stamp) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ApiError::InvalidNodeId(format!("expected slot:stamp, got '{}'", s)))?;
        let slot = slot
            .parse::<u64>()
            .map_err(|e| ApiError::InvalidNodeId(format!("bad slot '{}': {}", slot, e)))?;
        let stamp = stamp
            .parse::<u64>()
            .map_err(|e| ApiError::InvalidNodeId(format!("bad stamp '{}': {}", stamp, e)))?;
        Ok(Self { slot, stamp })
    }
}

/// Projections the server should include in a node document.
///
/// This shapes the request; it is not a local filter. A projection that is
/// switched off is simply absent from the resulting node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOptions {
    pub name: bool,
    pub path: bool,
    pub attributes: bool,
    pub children: bool,
}

impl NodeOptions {
    /// Attributes only, the default for batched lookups.
    pub fn attributes_only() -> Self {
        Self {
            name: false,
            path: false,
            attributes: true,
            children: false,
        }
    }

    /// Nothing but the id, the default for timeline queries.
    pub fn none() -> Self {
        Self {
            name: false,
            path: false,
            attributes: false,
            children: false,
        }
    }

    /// Everything the server can send.
    pub fn all() -> Self {
        Self {
            name: true,
            path: true,
            attributes: true,
            children: true,
        }
    }
}

/// Name, attributes and children without the path: the option set used for
/// single lookups and lazy child resolution.
impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            name: true,
            path: false,
            attributes: true,
            children: true,
        }
    }
}

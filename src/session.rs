//! Session: the single owner of the transport and entry point for every
//! remote operation.
//!
//! Two error channels coexist on purpose. Lookups, scheduling, attribute
//! mutation, snapshots and introspection return `Option`/`bool` and never
//! fail loudly; transfers, queries and timeline return `Result` carrying the
//! server's response text. Task operations live in [`crate::task`], query
//! operations in [`crate::query`].

use crate::config::{ClientConfig, ConfigLoader};
use crate::error::ApiError;
use crate::transport::{
    encoded_path, HttpTransport, Request, Response, Transport, BULK_CHUNK_SIZE,
    RANGE_CHUNK_SIZE,
};
use crate::tree::Node;
use crate::types::{NodeId, NodeOptions};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

pub(crate) struct SessionInner {
    transport: Arc<dyn Transport>,
}

/// Connection to one server. Cloning is cheap and shares the transport.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Open an HTTP session from configuration.
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let endpoint = config.endpoint()?;
        let base_url = endpoint.base_url();
        info!(base_url = %base_url, "opening session");
        let transport = HttpTransport::new(base_url, &config.key, endpoint.tls)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Open an HTTP session from the global config file and `TAPIR_*` environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::connect(&ConfigLoader::load()?)
    }

    /// Use any transport, e.g. a [`crate::transport::MockTransport`].
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(SessionInner { transport }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<SessionInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<SessionInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Raised channel: transport failures and non-success statuses are errors.
    pub(crate) fn send_checked(&self, request: Request) -> Result<Response, ApiError> {
        self.inner.transport.send(request)?.error_for_status()
    }

    /// Optional channel: any failure becomes `None`.
    pub(crate) fn send_optional(&self, request: Request) -> Option<Response> {
        let path = request.path.clone();
        match self.inner.transport.send(request) {
            Ok(response) if response.is_success() => Some(response),
            Ok(response) => {
                debug!(path = %path, status = response.status, "request rejected by server");
                None
            }
            Err(e) => {
                warn!(path = %path, "request failed: {}", e);
                None
            }
        }
    }

    /// Optional channel with a JSON body.
    pub(crate) fn fetch_optional<T: DeserializeOwned>(&self, request: Request) -> Option<T> {
        let path = request.path.clone();
        match self.send_optional(request)?.json::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path, "undecodable response: {}", e);
                None
            }
        }
    }

    // -- node graph -------------------------------------------------------

    /// Fetch the node at `path` (e.g. `/root/test-data`).
    ///
    /// The returned node remembers `path`. Missing paths, transport errors
    /// and malformed documents all yield `None`.
    pub fn lookup_by_path(&self, path: &str) -> Option<Node> {
        let document: serde_json::Value =
            self.fetch_optional(Request::get("/node").query("path", path))?;
        Node::from_document(self, &document, Some(path))
    }

    /// Fetch one node by id with the given projections.
    pub fn lookup_by_id(&self, id: NodeId, options: NodeOptions) -> Option<Node> {
        let document: serde_json::Value = self.fetch_optional(
            Request::post("/node").json(json!({ "node_id": id, "option": options })),
        )?;
        Node::from_document(self, &document, None)
    }

    /// Fetch several nodes in one round trip, in input order.
    ///
    /// The server does not report partial results, so any missing,
    /// malformed or mismatched element fails the whole batch.
    pub fn lookup_many_by_id(&self, ids: &[NodeId], options: NodeOptions) -> Option<Vec<Node>> {
        let documents: Vec<serde_json::Value> = self.fetch_optional(
            Request::post("/nodes").json(json!({ "nodes_id": ids, "option": options })),
        )?;
        if documents.len() != ids.len() {
            warn!(
                "Batch lookup returned {} documents for {} ids",
                documents.len(),
                ids.len()
            );
            return None;
        }
        let mut nodes = Vec::with_capacity(ids.len());
        for (id, document) in ids.iter().zip(&documents) {
            let node = Node::from_document(self, document, None)?;
            if node.id() != *id {
                warn!("Batch lookup answered {} where {} was asked", node.id(), id);
                return None;
            }
            nodes.push(node);
        }
        Some(nodes)
    }

    /// Absolute path of a node.
    pub fn path(&self, id: NodeId) -> Option<String> {
        let text = self
            .send_optional(Request::post("/path").json(id.to_json()))?
            .text()
            .ok()?;
        // Accept both a JSON string and a bare path.
        Some(serde_json::from_str::<String>(&text).unwrap_or(text))
    }

    /// Attach an attribute to a node. `true` when the server accepted it.
    pub fn add_attribute(
        &self,
        id: NodeId,
        name: &str,
        value: serde_json::Value,
        description: Option<&str>,
    ) -> bool {
        let mut body = json!({ "node_id": id, "name": name, "value": value });
        if let Some(description) = description {
            body["description"] = json!(description);
        }
        self.send_optional(Request::post("/attribute").json(body))
            .is_some()
    }

    /// Remove a node. The server's answer is not reported.
    pub fn delete(&self, id: NodeId) {
        if self
            .send_optional(Request::post("/delete").json(id.to_json()))
            .is_none()
        {
            warn!("Delete of {} was not acknowledged", id);
        }
    }

    /// Drop the server's whole tree. The server's answer is not reported.
    pub fn clear(&self) {
        if self.send_optional(Request::get("/clear")).is_none() {
            warn!("Clear was not acknowledged");
        }
    }

    // -- transfers --------------------------------------------------------

    /// Upload a local file, streaming it from disk.
    ///
    /// `Ok(None)` when the local file cannot be opened (nothing is sent);
    /// otherwise the server's answer (uploaded size or id).
    pub fn upload(&self, file_path: &Path) -> Result<Option<serde_json::Value>, ApiError> {
        let file = match File::open(file_path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot open {} for upload: {}", file_path.display(), e);
                return Ok(None);
            }
        };
        let len = file.metadata().ok().map(|m| m.len());
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(name = %name, len = ?len, "uploading");

        let response = self.send_checked(
            Request::post("/upload")
                .query("name", name)
                .stream(file, len),
        )?;
        Ok(Some(response.json()?))
    }

    /// Stream a node's content into `file_path`. Returns the byte count.
    pub fn download(&self, id: NodeId, file_path: &Path) -> Result<u64, ApiError> {
        let response = self.send_checked(Request::post("/download").json(id.to_json()))?;
        let mut file = File::create(file_path)?;
        response.copy_chunked(&mut file, BULK_CHUNK_SIZE)
    }

    /// Read a node's whole content into memory.
    pub fn read_all(&self, id: NodeId) -> Result<Vec<u8>, ApiError> {
        let response = self.send_checked(Request::post("/download").json(id.to_json()))?;
        let mut data = Vec::new();
        response.copy_chunked(&mut data, BULK_CHUNK_SIZE)?;
        Ok(data)
    }

    /// Read `size` bytes of a node's content starting at `offset`.
    pub fn read(&self, id: NodeId, size: u64, offset: u64) -> Result<Vec<u8>, ApiError> {
        let response = self.send_checked(
            Request::post("/read").json(json!({ "node_id": id, "offset": offset, "size": size })),
        )?;
        let mut data = Vec::new();
        response.copy_chunked(&mut data, RANGE_CHUNK_SIZE)?;
        Ok(data)
    }

    // -- server introspection and snapshots -------------------------------

    pub fn plugins(&self) -> Option<serde_json::Value> {
        self.fetch_optional(Request::get("/plugins"))
    }

    pub fn plugin(&self, name: &str) -> Option<serde_json::Value> {
        let path = match encoded_path(&["plugin", name]) {
            Ok(path) => path,
            Err(e) => {
                warn!("Cannot build path for plugin {:?}: {}", name, e);
                return None;
            }
        };
        self.fetch_optional(Request::get(path))
    }

    pub fn node_count(&self) -> Option<u64> {
        self.fetch_optional(Request::get("/node_count"))
    }

    pub fn attribute_count(&self) -> Option<u64> {
        self.fetch_optional(Request::get("/attribute_count"))
    }

    /// Ask the server which plugins apply to which nodes.
    ///
    /// With a plugin → datatype map the server uses `/scan_config`.
    pub fn scan(&self, plugins_datatypes: Option<&serde_json::Value>) -> Option<serde_json::Value> {
        let request = match plugins_datatypes {
            Some(map) => Request::post("/scan_config").json(map.clone()),
            None => Request::post("/scan"),
        };
        self.fetch_optional(request)
    }

    /// Save the server state to a snapshot file on the server side.
    pub fn save(&self, file_name: &str) -> bool {
        self.send_optional(Request::post("/save").json(json!({ "file_name": file_name })))
            .is_some()
    }

    /// Load a snapshot file on the server side.
    pub fn load(&self, file_name: &str) -> bool {
        self.send_optional(Request::post("/load").json(json!({ "file_name": file_name })))
            .is_some()
    }
}

//! In-memory transport for tests and embedders.
//!
//! Routes are matched on method and exact path; the most recently
//! registered route wins. Every request is recorded with its body fully
//! drained so tests can inspect exactly what went over the wire.

use super::{Method, Request, RequestBody, Response, Transport};
use crate::error::ApiError;
use parking_lot::{Mutex, RwLock};
use std::io::Read;

type Handler = Box<dyn Fn(&RecordedRequest) -> Response + Send + Sync>;

/// A request as seen by the mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Body decoded as JSON, if it is JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock server keyed by method and path.
#[derive(Default)]
pub struct MockTransport {
    routes: RwLock<Vec<(Method, String, Handler)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method path`.
    pub fn on<F>(&self, method: Method, path: &str, handler: F) -> &Self
    where
        F: Fn(&RecordedRequest) -> Response + Send + Sync + 'static,
    {
        self.routes
            .write()
            .push((method, path.to_string(), Box::new(handler)));
        self
    }

    /// Register a fixed JSON response.
    pub fn respond_json(
        &self,
        method: Method,
        path: &str,
        status: u16,
        value: serde_json::Value,
    ) -> &Self {
        self.on(method, path, move |_| Response::from_json(status, &value))
    }

    /// Register a fixed raw response.
    pub fn respond_bytes(&self, method: Method, path: &str, status: u16, body: Vec<u8>) -> &Self {
        self.on(method, path, move |_| Response::from_bytes(status, body.clone()))
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Requests received for one path.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: Request) -> Result<Response, ApiError> {
        let body = match request.body {
            RequestBody::Empty => Vec::new(),
            RequestBody::Json(value) => serde_json::to_vec(&value)?,
            RequestBody::Stream { mut reader, .. } => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                buf
            }
        };
        let recorded = RecordedRequest {
            method: request.method,
            path: request.path,
            query: request.query,
            body,
        };
        self.requests.lock().push(recorded.clone());

        let routes = self.routes.read();
        let response = routes
            .iter()
            .rev()
            .find(|(method, path, _)| *method == recorded.method && *path == recorded.path)
            .map(|(_, _, handler)| handler(&recorded))
            .unwrap_or_else(|| {
                Response::from_bytes(
                    404,
                    format!("no route for {} {}", recorded.method.as_str(), recorded.path),
                )
            });
        Ok(response)
    }
}

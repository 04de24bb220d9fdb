//! Transport seam between the session and the server.
//!
//! A transport delivers one request keyed by API path and hands back the
//! status and a streaming body. `HttpTransport` talks to a real server;
//! `MockTransport` serves routes from memory.

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::{MockTransport, RecordedRequest};

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use std::io::{Cursor, Read, Write};

/// Chunk size for bulk transfers (download, read_all).
pub const BULK_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Chunk size for explicit ranged reads.
pub const RANGE_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Request payload.
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Raw bytes streamed from a reader; `len` is sent as content length when known.
    Stream {
        reader: Box<dyn Read + Send>,
        len: Option<u64>,
    },
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "Empty"),
            RequestBody::Json(value) => write!(f, "Json({})", value),
            RequestBody::Stream { len, .. } => write!(f, "Stream {{ len: {:?} }}", len),
        }
    }
}

/// One API request. `path` is relative to the `/api` base.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn stream(mut self, reader: impl Read + Send + 'static, len: Option<u64>) -> Self {
        self.body = RequestBody::Stream {
            reader: Box::new(reader),
            len,
        };
        self
    }
}

/// Server response with a body that has not been read yet.
pub struct Response {
    pub status: u16,
    body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Response {
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    pub fn from_bytes(status: u16, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(status, Cursor::new(bytes.into()))
    }

    pub fn from_json(status: u16, value: &serde_json::Value) -> Self {
        Self::from_bytes(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn bytes(mut self) -> Result<Vec<u8>, ApiError> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn text(self) -> Result<String, ApiError> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let bytes = self.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Turn a non-success response into `ApiError::Status` carrying the body.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status;
        let body = self.text()?;
        Err(ApiError::Status { status, body })
    }

    /// Stream the body into `sink` through a fixed buffer of `chunk_size` bytes.
    pub fn copy_chunked<W: Write>(mut self, sink: &mut W, chunk_size: usize) -> Result<u64, ApiError> {
        let mut buf = vec![0u8; chunk_size];
        let mut total = 0u64;
        loop {
            let n = match self.body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            sink.write_all(&buf[..n])?;
            total += n as u64;
        }
        sink.flush()?;
        Ok(total)
    }
}

/// Join `segments` into an API path, percent-encoding each one so that
/// `/`, `?` and `#` inside a segment cannot change the request target.
pub fn encoded_path(segments: &[&str]) -> Result<String, ApiError> {
    let mut url = reqwest::Url::parse("http://localhost/")
        .map_err(|e| ApiError::Transport(format!("Failed to build path: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Transport("URL cannot carry path segments".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Request/response delivery keyed by API path.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> Result<Response, ApiError>;
}

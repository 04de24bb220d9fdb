//! HTTP transport over a blocking reqwest client.

use super::{Method, Request, RequestBody, Response, Transport};
use crate::error::ApiError;
use reqwest::blocking::{Body, Client};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for `base_url` (e.g. `http://127.0.0.1:3583/api`).
    ///
    /// `accept_invalid_certs` is set for TLS sessions, whose servers
    /// typically run with self-signed certificates. No request timeout is
    /// applied: `run` and `join` last as long as the server's jobs do.
    pub fn new(
        base_url: impl Into<String>,
        api_key: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self, ApiError> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| ApiError::ConfigError(format!("Invalid API key header value: {}", e)))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(None)
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = request.method.as_str(), url = %url, "sending request");

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let builder = if request.query.is_empty() {
            builder
        } else {
            builder.query(&request.query)
        };
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Stream {
                reader,
                len: Some(len),
            } => builder.body(Body::sized(reader, len)),
            RequestBody::Stream { reader, len: None } => builder.body(Body::new(reader)),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        debug!(status, url = %url, "received response");
        Ok(Response::new(status, response))
    }
}

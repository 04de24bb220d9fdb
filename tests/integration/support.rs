//! Shared fixtures: an in-memory evidence tree and a small real HTTP server.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;
use tapir_client::config::ClientConfig;
use tapir_client::transport::{Method, MockTransport, Response};
use tapir_client::Session;

pub const FIXTURE_KEY: &str = "fixture-key";

pub fn mock_session() -> (Arc<MockTransport>, Session) {
    let mock = Arc::new(MockTransport::new());
    let session = Session::with_transport(mock.clone());
    (mock, session)
}

pub fn id(slot: u64) -> Value {
    json!({ "index1": slot, "stamp": 0 })
}

/// Fixture tree:
///
/// ```text
/// /root
///   test-data
///     image1.jpg
///     image2_unicode_é.jpg
///     report.pdf
/// ```
pub fn fixture_documents() -> HashMap<u64, Value> {
    let mut docs = HashMap::new();
    docs.insert(
        1,
        json!({
            "id": id(1), "name": "root", "attributes": {},
            "children": [{ "id": id(2), "name": "test-data", "has_children": true }]
        }),
    );
    docs.insert(
        2,
        json!({
            "id": id(2), "name": "test-data", "attributes": {},
            "children": [
                { "id": id(3), "name": "image1.jpg", "has_children": false },
                { "id": id(4), "name": "image2_unicode_é.jpg", "has_children": false },
                { "id": id(5), "name": "report.pdf", "has_children": false }
            ]
        }),
    );
    for (slot, name, size) in [
        (3, "image1.jpg", 1024),
        (4, "image2_unicode_é.jpg", 2048),
        (5, "report.pdf", 4096),
    ] {
        docs.insert(
            slot,
            json!({
                "id": id(slot), "name": name,
                "attributes": { "data": { "size": size, "datatype": "image" } },
                "children": []
            }),
        );
    }
    docs
}

pub fn fixture_names() -> Vec<String> {
    fixture_documents()
        .values()
        .filter_map(|doc| doc["name"].as_str().map(str::to_string))
        .collect()
}

/// Serve the fixture tree on `mock` for path, id and batch lookups.
pub fn serve_fixture_tree(mock: &MockTransport) {
    let by_slot = Arc::new(fixture_documents());
    let paths: HashMap<&'static str, u64> = [
        ("/root", 1),
        ("/root/test-data", 2),
        ("/root/test-data/image1.jpg", 3),
    ]
    .into_iter()
    .collect();

    let docs = by_slot.clone();
    mock.on(Method::Get, "/node", move |req| {
        match req.query_value("path").and_then(|p| paths.get(p)) {
            Some(slot) => Response::from_json(200, &docs[slot]),
            None => Response::from_bytes(404, "no such path"),
        }
    });

    let docs = by_slot.clone();
    mock.on(Method::Post, "/node", move |req| {
        let slot = req
            .json()
            .and_then(|body| body["node_id"]["index1"].as_u64());
        match slot.and_then(|s| docs.get(&s)) {
            Some(doc) => Response::from_json(200, doc),
            None => Response::from_bytes(404, "no such node"),
        }
    });

    let docs = by_slot;
    mock.on(Method::Post, "/nodes", move |req| {
        let answer: Option<Vec<Value>> = req.json().and_then(|body| {
            body["nodes_id"]
                .as_array()?
                .iter()
                .map(|id| id["index1"].as_u64().and_then(|s| docs.get(&s)).cloned())
                .collect()
        });
        match answer {
            Some(list) => Response::from_json(200, &json!(list)),
            None => Response::from_bytes(404, "missing node in batch"),
        }
    });
}

/// What the HTTP fixture server has seen.
#[derive(Default)]
pub struct ServerLog {
    pub api_keys: Vec<Option<String>>,
    pub urls: Vec<String>,
}

/// Minimal TAPIR-like server on a random local port. Stores one uploaded
/// blob and serves it back through `/download` and `/read`.
pub struct FixtureServer {
    server: Arc<tiny_http::Server>,
    worker: Option<JoinHandle<()>>,
    pub address: String,
    pub log: Arc<Mutex<ServerLog>>,
}

impl FixtureServer {
    pub fn start() -> Self {
        let server = Arc::new(tiny_http::Server::http("127.0.0.1:0").unwrap());
        let address = server.server_addr().to_ip().unwrap().to_string();
        let log = Arc::new(Mutex::new(ServerLog::default()));
        let blob = Arc::new(Mutex::new(Vec::<u8>::new()));

        let worker = {
            let server = server.clone();
            let log = log.clone();
            std::thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let key = request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("x-api-key"))
                        .map(|h| h.value.as_str().to_string());
                    let url = request.url().to_string();
                    {
                        let mut log = log.lock();
                        log.api_keys.push(key);
                        log.urls.push(url.clone());
                    }

                    let mut body = Vec::new();
                    let _ = request.as_reader().read_to_end(&mut body);
                    let route = url.split('?').next().unwrap_or("").to_string();

                    let (status, payload) = match route.as_str() {
                        "/api/upload" => {
                            let size = body.len();
                            *blob.lock() = body;
                            (200, serde_json::to_vec(&json!(size)).unwrap())
                        }
                        "/api/download" => (200, blob.lock().clone()),
                        "/api/read" => {
                            let range: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                            let data = blob.lock();
                            let offset = range["offset"].as_u64().unwrap_or(0) as usize;
                            let size = range["size"].as_u64().unwrap_or(0) as usize;
                            let start = offset.min(data.len());
                            let end = (offset + size).min(data.len());
                            (200, data[start..end].to_vec())
                        }
                        "/api/node_count" => (200, b"3".to_vec()),
                        _ => (404, b"unknown route".to_vec()),
                    };
                    let response = tiny_http::Response::from_data(payload).with_status_code(status);
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            server,
            worker: Some(worker),
            address,
            log,
        }
    }

    pub fn session(&self) -> Session {
        let config = ClientConfig {
            address: self.address.clone(),
            key: FIXTURE_KEY.to_string(),
            ..ClientConfig::default()
        };
        Session::connect(&config).unwrap()
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

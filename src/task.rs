//! Plugin task scheduling and polling.
//!
//! `schedule` submits and returns at once. `run` and `join` block the
//! calling thread for as long as the server takes; there is no timeout,
//! retry or cancellation. Callers that need a bounded wait poll with
//! [`Session::task`] and [`Session::task_count`] instead.

use crate::session::Session;
use crate::transport::Request;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use tracing::{debug, info};

/// Server-issued reference to a submitted plugin job. Inert data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(serde_json::Value);

impl TaskHandle {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Value sent as the `task_id` query parameter: strings and numbers
    /// verbatim, anything else as JSON text.
    pub fn task_id(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.task_id())
    }
}

fn task_body(plugin: &str, arguments: &serde_json::Value, relaunch: bool) -> serde_json::Value {
    // Arguments travel as a JSON-encoded string, not a nested object.
    json!({ "name": plugin, "arguments": arguments.to_string(), "relaunch": relaunch })
}

impl Session {
    /// Submit a plugin run without waiting for it.
    ///
    /// `relaunch` asks the server to run again even if an identical run
    /// exists. `None` on any failure.
    pub fn schedule(
        &self,
        plugin: &str,
        arguments: &serde_json::Value,
        relaunch: bool,
    ) -> Option<TaskHandle> {
        debug!(plugin, relaunch, "scheduling task");
        self.fetch_optional(Request::post("/schedule").json(task_body(plugin, arguments, relaunch)))
    }

    /// Submit a plugin run and block until that task completes, returning
    /// its result payload.
    ///
    /// Serializes what is otherwise a concurrent queue: meant for debugging
    /// and tests, not production.
    pub fn run(
        &self,
        plugin: &str,
        arguments: &serde_json::Value,
        relaunch: bool,
    ) -> Option<serde_json::Value> {
        info!(plugin, relaunch, "running task (blocking)");
        self.fetch_optional(Request::post("/run").json(task_body(plugin, arguments, relaunch)))
    }

    /// Block until the server's entire task queue is empty.
    ///
    /// This is a global barrier, not scoped to this session's submissions:
    /// it also waits on unrelated work from other clients. Not for
    /// production use.
    pub fn join(&self) -> bool {
        info!("waiting for the server task queue to drain");
        self.send_optional(Request::post("/join")).is_some()
    }

    /// Number of tasks known to the server; 0 when it cannot be fetched.
    pub fn task_count(&self) -> u64 {
        self.fetch_optional(Request::post("/task_count"))
            .unwrap_or(0)
    }

    /// Status of one task, without blocking.
    pub fn task(&self, handle: &TaskHandle) -> Option<serde_json::Value> {
        self.fetch_optional(Request::post("/task").query("task_id", handle.task_id()))
    }
}

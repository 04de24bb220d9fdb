//! CLI Tooling
//!
//! Command-line interface over a [`Session`]. Every command returns the text
//! to print, so the binary stays a thin shell around [`CliContext::execute`].

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::Session;
use crate::task::TaskHandle;
use crate::tree::Node;
use crate::types::{NodeId, NodeOptions};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// TAPIR client - browse, query and analyse a remote evidence tree
#[derive(Parser)]
#[command(name = "tapir")]
#[command(about = "Client for the TAPIR forensic evidence graph server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server address as host:port (default: TAPIR_ADDRESS or 127.0.0.1:3583)
    #[arg(long)]
    pub address: Option<String>,

    /// API key (default: TAPIR_KEY)
    #[arg(long)]
    pub key: Option<String>,

    /// Connect over https
    #[arg(long)]
    pub tls: bool,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a node by path or by id
    Node {
        /// Node path (e.g. /root/test-data)
        #[arg(conflicts_with = "id")]
        path: Option<String>,
        /// Node id as slot:stamp
        #[arg(long)]
        id: Option<String>,
        /// Also ask for the node path (id lookups only)
        #[arg(long)]
        with_path: bool,
    },
    /// List the children of a node
    Ls {
        /// Node path
        #[arg(default_value = "/root")]
        path: String,
    },
    /// Walk from a node through named children, one lookup per step
    Walk {
        /// Starting node path
        path: String,
        /// Child names to follow in order
        names: Vec<String>,
    },
    /// Run a predicate query
    Query {
        /// Predicate, e.g. "name == w'*.jpg'"
        predicate: String,
        /// Subtree to search
        #[arg(long)]
        root: Option<String>,
    },
    /// Schedule a plugin without waiting
    Schedule {
        /// Plugin name
        plugin: String,
        /// Plugin arguments as JSON
        #[arg(long, default_value = "{}")]
        args: String,
        /// Run again even if an identical run exists
        #[arg(long)]
        relaunch: bool,
    },
    /// Run a plugin and wait for its result (debug use)
    Run {
        /// Plugin name
        plugin: String,
        /// Plugin arguments as JSON
        #[arg(long, default_value = "{}")]
        args: String,
        /// Run again even if an identical run exists
        #[arg(long)]
        relaunch: bool,
    },
    /// Wait until the server task queue is empty (debug use)
    Join,
    /// Show the number of server tasks
    Tasks,
    /// Show the status of one task
    Task {
        /// Task id as returned by schedule
        task_id: String,
    },
    /// Upload a local file
    Upload {
        file: PathBuf,
    },
    /// Download a node's content to a file
    Download {
        /// Node id as slot:stamp
        id: String,
        /// Output file
        output: PathBuf,
    },
    /// Hex dump a range of a node's content
    Read {
        /// Node id as slot:stamp
        id: String,
        /// Number of bytes
        #[arg(long, default_value = "256")]
        size: u64,
        /// Start offset
        #[arg(long, default_value = "0")]
        offset: u64,
    },
    /// List server plugins
    Plugins,
    /// Show one plugin
    Plugin {
        name: String,
    },
    /// Save server state to a snapshot file
    Save {
        file_name: String,
    },
    /// Load a snapshot file
    Load {
        file_name: String,
    },
    /// Ask which plugins apply to which nodes
    Scan {
        /// Plugin to datatype map as JSON
        #[arg(long)]
        datatypes: Option<String>,
    },
    /// Show node and attribute counts
    Stats,
    /// List nodes with timestamps in a range
    Timeline {
        /// RFC 3339 lower bound
        after: String,
        /// RFC 3339 upper bound
        before: String,
    },
    /// Add an attribute to a node
    Attribute {
        /// Node id as slot:stamp
        id: String,
        /// Attribute name
        name: String,
        /// Attribute value as JSON (bare text is sent as a string)
        value: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show the path of a node
    Path {
        /// Node id as slot:stamp
        id: String,
    },
    /// Delete a node
    Delete {
        /// Node id as slot:stamp
        id: String,
    },
    /// Clear the whole server tree
    Clear,
}

/// CLI context bound to one session
pub struct CliContext {
    session: Session,
}

impl CliContext {
    /// Create a context with an HTTP session
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_session(Session::connect(config)?))
    }

    pub fn with_session(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        info!(command = command_name(command), "executing");
        match command {
            Commands::Node {
                path,
                id,
                with_path,
            } => {
                let node = match (path, id) {
                    (_, Some(id)) => {
                        let options = NodeOptions {
                            path: *with_path,
                            ..NodeOptions::default()
                        };
                        self.session.lookup_by_id(id.parse()?, options)
                    }
                    (Some(path), None) => self.session.lookup_by_path(path),
                    (None, None) => self.session.lookup_by_path("/root"),
                };
                let node = node.ok_or_else(|| ApiError::NotFound("node".to_string()))?;
                to_pretty(&node.to_json())
            }
            Commands::Ls { path } => {
                let node = self.require_path(path)?;
                Ok(format_children_table(&node))
            }
            Commands::Walk { path, names } => {
                let mut node = self.require_path(path)?;
                for name in names {
                    node = node
                        .child(name)
                        .ok_or_else(|| ApiError::NotFound(format!("child '{}'", name)))?;
                }
                to_pretty(&node.to_json())
            }
            Commands::Query { predicate, root } => {
                let results = self.session.query(predicate, root.as_deref())?;
                to_pretty(&json!(results))
            }
            Commands::Schedule {
                plugin,
                args,
                relaunch,
            } => {
                let args = parse_json_arg(args)?;
                let handle = self
                    .session
                    .schedule(plugin, &args, *relaunch)
                    .ok_or_else(|| ApiError::NotFound(format!("task for plugin '{}'", plugin)))?;
                Ok(format!("Scheduled {} as task {}", plugin, handle))
            }
            Commands::Run {
                plugin,
                args,
                relaunch,
            } => {
                let args = parse_json_arg(args)?;
                let result = self
                    .session
                    .run(plugin, &args, *relaunch)
                    .ok_or_else(|| ApiError::NotFound(format!("result of plugin '{}'", plugin)))?;
                to_pretty(&result)
            }
            Commands::Join => {
                if self.session.join() {
                    Ok("Task queue drained".to_string())
                } else {
                    Err(ApiError::NotFound("join acknowledgement".to_string()))
                }
            }
            Commands::Tasks => Ok(self.session.task_count().to_string()),
            Commands::Task { task_id } => {
                let handle = TaskHandle::new(
                    serde_json::from_str(task_id).unwrap_or_else(|_| json!(task_id)),
                );
                let status = self
                    .session
                    .task(&handle)
                    .ok_or_else(|| ApiError::NotFound(format!("task {}", handle)))?;
                to_pretty(&status)
            }
            Commands::Upload { file } => match self.session.upload(file)? {
                Some(answer) => Ok(format!("Uploaded {}: {}", file.display(), answer)),
                None => Err(ApiError::NotFound(format!("local file {}", file.display()))),
            },
            Commands::Download { id, output } => {
                let written = self.session.download(id.parse()?, output)?;
                Ok(format!("Wrote {} bytes to {}", written, output.display()))
            }
            Commands::Read { id, size, offset } => {
                let data = self.session.read(id.parse()?, *size, *offset)?;
                Ok(format_hex_dump(&data, *offset))
            }
            Commands::Plugins => {
                let plugins = self
                    .session
                    .plugins()
                    .ok_or_else(|| ApiError::NotFound("plugin list".to_string()))?;
                to_pretty(&plugins)
            }
            Commands::Plugin { name } => {
                let plugin = self
                    .session
                    .plugin(name)
                    .ok_or_else(|| ApiError::NotFound(format!("plugin '{}'", name)))?;
                to_pretty(&plugin)
            }
            Commands::Save { file_name } => {
                if self.session.save(file_name) {
                    Ok(format!("Saved to {}", file_name))
                } else {
                    Err(ApiError::NotFound(format!("save acknowledgement for {}", file_name)))
                }
            }
            Commands::Load { file_name } => {
                if self.session.load(file_name) {
                    Ok(format!("Loaded {}", file_name))
                } else {
                    Err(ApiError::NotFound(format!("snapshot {}", file_name)))
                }
            }
            Commands::Scan { datatypes } => {
                let datatypes = datatypes.as_deref().map(parse_json_arg).transpose()?;
                let scan = self
                    .session
                    .scan(datatypes.as_ref())
                    .ok_or_else(|| ApiError::NotFound("scan result".to_string()))?;
                to_pretty(&scan)
            }
            Commands::Stats => {
                let nodes = self.session.node_count();
                let attributes = self.session.attribute_count();
                Ok(format!(
                    "nodes: {}\nattributes: {}",
                    count_or_unknown(nodes),
                    count_or_unknown(attributes)
                ))
            }
            Commands::Timeline { after, before } => {
                let after = parse_rfc3339(after)?;
                let before = parse_rfc3339(before)?;
                let timeline = self
                    .session
                    .timeline(&after, &before, NodeOptions::none())?;
                to_pretty(&timeline)
            }
            Commands::Attribute {
                id,
                name,
                value,
                description,
            } => {
                let value = serde_json::from_str(value).unwrap_or_else(|_| json!(value));
                if self
                    .session
                    .add_attribute(id.parse()?, name, value, description.as_deref())
                {
                    Ok(format!("Added attribute {} to {}", name, id))
                } else {
                    Err(ApiError::NotFound(format!("node {} accepting attribute", id)))
                }
            }
            Commands::Path { id } => self
                .session
                .path(id.parse()?)
                .ok_or_else(|| ApiError::NotFound(format!("path of {}", id))),
            Commands::Delete { id } => {
                let id: NodeId = id.parse()?;
                self.session.delete(id);
                Ok(format!("Delete of {} sent", id))
            }
            Commands::Clear => {
                self.session.clear();
                Ok("Clear sent".to_string())
            }
        }
    }

    fn require_path(&self, path: &str) -> Result<Node, ApiError> {
        self.session
            .lookup_by_path(path)
            .ok_or_else(|| ApiError::NotFound(format!("node {}", path)))
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Node { .. } => "node",
        Commands::Ls { .. } => "ls",
        Commands::Walk { .. } => "walk",
        Commands::Query { .. } => "query",
        Commands::Schedule { .. } => "schedule",
        Commands::Run { .. } => "run",
        Commands::Join => "join",
        Commands::Tasks => "tasks",
        Commands::Task { .. } => "task",
        Commands::Upload { .. } => "upload",
        Commands::Download { .. } => "download",
        Commands::Read { .. } => "read",
        Commands::Plugins => "plugins",
        Commands::Plugin { .. } => "plugin",
        Commands::Save { .. } => "save",
        Commands::Load { .. } => "load",
        Commands::Scan { .. } => "scan",
        Commands::Stats => "stats",
        Commands::Timeline { .. } => "timeline",
        Commands::Attribute { .. } => "attribute",
        Commands::Path { .. } => "path",
        Commands::Delete { .. } => "delete",
        Commands::Clear => "clear",
    }
}

fn to_pretty(value: &serde_json::Value) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn parse_json_arg(text: &str) -> Result<serde_json::Value, ApiError> {
    serde_json::from_str(text)
        .map_err(|e| ApiError::ConfigError(format!("Invalid JSON argument '{}': {}", text, e)))
}

fn parse_rfc3339(text: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::ConfigError(format!("Invalid RFC 3339 timestamp '{}': {}", text, e)))
}

fn count_or_unknown(count: Option<u64>) -> String {
    count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_children_table(node: &Node) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Id", "Has children"]);
    for child in node.child_refs() {
        table.add_row(vec![
            child.name.clone(),
            child.id.to_string(),
            if child.has_children { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.to_string()
}

/// 16 bytes per line: offset, hex, printable ASCII.
fn format_hex_dump(data: &[u8], base_offset: u64) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let offset = base_offset + (i * 16) as u64;
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<32}  {}\n", offset, hex::encode(chunk), ascii));
    }
    out
}

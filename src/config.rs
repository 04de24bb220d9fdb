//! Client configuration
//!
//! Layered with the `config` crate. Precedence, lowest to highest:
//! built-in defaults, the global config file (or an explicit file),
//! `TAPIR_*` environment variables, then values passed explicitly by the caller.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:3583";
pub const DEFAULT_API_KEY: &str = "key";

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_key() -> String {
    DEFAULT_API_KEY.to_string()
}

/// Session settings: server address, API key and TLS mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address as `host:port`
    #[serde(default = "default_address")]
    pub address: String,

    /// Value of the `x-api-key` header
    #[serde(default = "default_key")]
    pub key: String,

    /// Use https (certificate verification is disabled)
    #[serde(default)]
    pub tls: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            key: default_key(),
            tls: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Apply explicit caller values on top of the loaded configuration.
    pub fn with_overrides(mut self, address: Option<String>, key: Option<String>, tls: bool) -> Self {
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(key) = key {
            self.key = key;
        }
        self.tls = self.tls || tls;
        self
    }

    /// Resolve the configured address into a server endpoint.
    pub fn endpoint(&self) -> Result<Endpoint, ApiError> {
        Endpoint::parse(&self.address, self.tls)
    }
}

/// Parsed server location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl Endpoint {
    /// Parse `host:port`. The port is taken after the last colon so
    /// bracketed IPv6 hosts work.
    pub fn parse(address: &str, tls: bool) -> Result<Self, ApiError> {
        let address = address.trim();
        let (host, port) = address.rsplit_once(':').ok_or_else(|| {
            ApiError::ConfigError(format!(
                "Invalid server address '{}' (expected host:port)",
                address
            ))
        })?;
        if host.is_empty() {
            return Err(ApiError::ConfigError(format!(
                "Invalid server address '{}' (empty host)",
                address
            )));
        }
        let port = port.parse::<u16>().map_err(|e| {
            ApiError::ConfigError(format!("Invalid port in address '{}': {}", address, e))
        })?;
        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }

    /// `{scheme}://{host}:{port}/api`
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}/api", scheme, self.host, self.port)
    }
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Global config file: `<platform config dir>/tapir/config.toml`.
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "tapir", "tapir")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the global file (if any) and environment.
    pub fn load() -> Result<ClientConfig, ApiError> {
        let mut builder = Self::builder_with_defaults()?;
        if let Some(path) = Self::global_config_path() {
            builder = builder.add_source(File::from(path).required(false));
        }
        Self::finish(builder)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<ClientConfig, ApiError> {
        let builder = Self::builder_with_defaults()?.add_source(File::from(path.to_path_buf()));
        Self::finish(builder)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ApiError> {
        Ok(Config::builder()
            .set_default("address", DEFAULT_ADDRESS)?
            .set_default("key", DEFAULT_API_KEY)?
            .set_default("tls", false)?)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<ClientConfig, ApiError> {
        // TAPIR_ADDRESS, TAPIR_KEY, TAPIR_TLS, TAPIR_LOGGING__LEVEL, ...
        let config = builder
            .add_source(
                Environment::with_prefix("TAPIR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

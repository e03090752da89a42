//! Gateway settings loading.
//!
//! [`GatewaySettings`] is assembled once at process start from layered
//! sources, later layers overriding earlier ones:
//!
//! 1. built-in defaults ([`GatewaySettings::default`])
//! 2. an optional settings file (TOML, YAML or JSON, detected from the
//!    extension), named by `ARRGATE_CONFIG`
//! 3. `ARRGATE_*` environment variables (`ARRGATE_PORT`, `ARRGATE_ISOLATED`,
//!    `ARRGATE_BRIDGE_HOST`, `ARRGATE_REQUEST_TIMEOUT_MS`, …)
//! 4. the legacy `PORT` and `DOCKER_ENV` variables, applied only when their
//!    `ARRGATE_` counterpart is unset. `DOCKER_ENV` enables isolation only
//!    when it is exactly `true`.
//!
//! The environment is passed in as a map so loading never reads process
//! state behind the caller's back.

use crate::gateway::{AddressResolver, DEFAULT_BRIDGE_HOST, KernelError, NetworkMode};
use config::{Config as Cfg, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable naming the optional settings file.
pub const CONFIG_PATH_VAR: &str = "ARRGATE_CONFIG";

const ENV_PREFIX: &str = "ARRGATE";

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] KernelError),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Log output format for the gateway binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Process-wide gateway settings. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Bind address.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Run in isolated network mode (inside a container).
    pub isolated: bool,
    /// Hostname that reaches the host machine from the container.
    pub bridge_host: String,
    /// Fixed per-call timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3050,
            isolated: false,
            bridge_host: DEFAULT_BRIDGE_HOST.to_string(),
            request_timeout_ms: 10_000,
            log_format: LogFormat::Pretty,
        }
    }
}

impl GatewaySettings {
    /// Load settings from the current process environment.
    pub fn from_process_env() -> ConfigResult<Self> {
        Self::load(&std::env::vars().collect())
    }

    /// Load settings from `env`, reading the file named by `ARRGATE_CONFIG`
    /// when present.
    pub fn load(env: &HashMap<String, String>) -> ConfigResult<Self> {
        let file = match env.get(CONFIG_PATH_VAR) {
            Some(path) => {
                let format = detect_format(path)?;
                debug!(path = %path, "loading gateway settings file");
                Some((std::fs::read_to_string(path)?, format))
            }
            None => None,
        };
        Self::from_sources(file.as_ref().map(|(c, f)| (c.as_str(), *f)), env)
    }

    /// Build settings from an optional file body and an environment map.
    pub fn from_sources(
        file: Option<(&str, FileFormat)>,
        env: &HashMap<String, String>,
    ) -> ConfigResult<Self> {
        let mut builder = Cfg::builder();

        if let Some((content, format)) = file {
            builder = builder.add_source(File::from_str(content, format));
        }

        let prefixed: HashMap<String, String> = env
            .iter()
            .filter(|(k, _)| k.starts_with(&format!("{ENV_PREFIX}_")) && k.as_str() != CONFIG_PATH_VAR)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(prefixed.into_iter().collect())),
        );

        if !env.contains_key("ARRGATE_PORT") {
            builder = builder
                .set_override_option("port", env.get("PORT").cloned())
                .map_err(|e| ConfigError::Parse(e.to_string()))?;
        }
        if !env.contains_key("ARRGATE_ISOLATED") {
            builder = builder
                .set_override_option("isolated", env.get("DOCKER_ENV").map(|v| v == "true"))
                .map_err(|e| ConfigError::Parse(e.to_string()))?;
        }

        let settings: GatewaySettings = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check the structural invariants of the settings.
    pub fn validate(&self) -> Result<(), KernelError> {
        if self.request_timeout_ms == 0 {
            return Err(KernelError::InvalidTimeout);
        }
        if self.bridge_host.trim().is_empty() {
            return Err(KernelError::EmptyBridgeHost);
        }
        Ok(())
    }

    pub fn network_mode(&self) -> NetworkMode {
        NetworkMode::from_isolated_flag(self.isolated)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `host:port` string to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolver configured for this process's network position.
    pub fn address_resolver(&self) -> AddressResolver {
        AddressResolver::new(self.network_mode()).with_bridge_host(self.bridge_host.clone())
    }
}

/// Detect configuration format from file extension
///
/// # Supported Extensions
///
/// - YAML: `.yaml`, `.yml`
/// - TOML: `.toml`
/// - JSON: `.json`
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

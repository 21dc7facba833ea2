// crates/frameflow-config/src/config.rs
// ============================================================================
// Module: Frameflow Configuration
// Description: Configuration loading and validation for frame servers.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: frameflow-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed; nothing is silently
//! defaulted once a value is present but malformed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use frameflow_core::ClientProtocolId;
use frameflow_core::FileLogSink;
use frameflow_core::FrameLogSink;
use frameflow_core::FramesBuilder;
use frameflow_core::NoopLogSink;
use frameflow_core::StderrLogSink;
use serde::Deserialize;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "frameflow.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "FRAMEFLOW_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for `server.max_body_bytes`.
pub const MAX_BODY_BYTES_LIMIT: usize = 1024 * 1024;
/// Maximum number of advertised client protocols.
pub const MAX_ACCEPTS: usize = 32;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Frame server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameflowConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Pipeline defaults.
    #[serde(default)]
    pub frames: FramesConfig,
    /// Structured log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FrameflowConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The explicit path wins, then [`CONFIG_ENV_VAR`], then
    /// `frameflow.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.frames.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Applies pipeline settings to a frame builder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a setting cannot be converted or the log
    /// file cannot be opened.
    pub fn apply(&self, builder: FramesBuilder) -> Result<FramesBuilder, ConfigError> {
        let mut builder = builder
            .base_path(self.frames.base_path.clone())
            .log_sink(self.logging.build_sink()?);
        if let Some(state) = self.frames.initial_state_json()? {
            builder = builder.initial_state(state);
        }
        if let Some(origin) = self.server.public_origin_url()? {
            builder = builder.public_origin(origin);
        }
        for protocol in self.frames.accepted_protocols()? {
            builder = builder.accept(protocol);
        }
        Ok(builder)
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Absolute origin used when requests carry only a path.
    #[serde(default)]
    pub public_origin: Option<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_origin: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates listener configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        self.public_origin_url()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must not exceed {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }

    /// Returns the parsed public origin.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the origin is not an absolute http(s) URL
    /// or carries a path, query or fragment.
    pub fn public_origin_url(&self) -> Result<Option<Url>, ConfigError> {
        let Some(origin) = &self.public_origin else {
            return Ok(None);
        };
        let url = Url::parse(origin.trim()).map_err(|_| {
            ConfigError::Invalid("server.public_origin must be an absolute url".to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(ConfigError::Invalid(
                "server.public_origin must use http or https".to_string(),
            ));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "server.public_origin must not carry a path; use frames.base_path".to_string(),
            ));
        }
        Ok(Some(url))
    }
}

// ============================================================================
// SECTION: Frames
// ============================================================================

/// Pipeline defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct FramesConfig {
    /// Base path against which relative targets resolve.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// State used when a request carries none.
    #[serde(default)]
    pub initial_state: Option<toml::Value>,
    /// Client protocols advertised on every frame, as `id@version`.
    #[serde(default)]
    pub accepts: Vec<String>,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            initial_state: None,
            accepts: Vec::new(),
        }
    }
}

impl FramesConfig {
    /// Validates pipeline defaults.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_path.starts_with('/') {
            return Err(ConfigError::Invalid("frames.base_path must start with '/'".to_string()));
        }
        if self.base_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("frames.base_path exceeds max length".to_string()));
        }
        if self.accepts.len() > MAX_ACCEPTS {
            return Err(ConfigError::Invalid(format!(
                "frames.accepts must not exceed {MAX_ACCEPTS} entries"
            )));
        }
        self.initial_state_json()?;
        self.accepted_protocols()?;
        Ok(())
    }

    /// Returns the initial state converted to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the value has no JSON equivalent.
    pub fn initial_state_json(&self) -> Result<Option<Value>, ConfigError> {
        self.initial_state.as_ref().map(toml_to_json).transpose()
    }

    /// Returns the advertised protocols in declaration order, deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an entry is not `id@version`.
    pub fn accepted_protocols(&self) -> Result<Vec<ClientProtocolId>, ConfigError> {
        let mut protocols: Vec<ClientProtocolId> = Vec::with_capacity(self.accepts.len());
        for entry in &self.accepts {
            let protocol: ClientProtocolId = entry
                .trim()
                .parse()
                .map_err(|err| ConfigError::Invalid(format!("frames.accepts: {err}")))?;
            if !protocols.contains(&protocol) {
                protocols.push(protocol);
            }
        }
        Ok(protocols)
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// Discard events.
    None,
}

/// Structured log configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path, required for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates log configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("logging.path", path)?;
        }
        if self.sink == LogSinkKind::File && self.path.is_none() {
            return Err(ConfigError::Invalid("logging.sink=file requires logging.path".to_string()));
        }
        Ok(())
    }

    /// Builds the configured log sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the log file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn FrameLogSink>, ConfigError> {
        match self.sink {
            LogSinkKind::Stderr => Ok(Arc::new(StderrLogSink)),
            LogSinkKind::None => Ok(Arc::new(NoopLogSink)),
            LogSinkKind::File => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("logging.sink=file requires logging.path".to_string())
                })?;
                let sink = FileLogSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string from config against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Converts a TOML value to JSON. Datetimes become their RFC 3339 text.
fn toml_to_json(value: &toml::Value) -> Result<Value, ConfigError> {
    Ok(match value {
        toml::Value::String(text) => Value::String(text.clone()),
        toml::Value::Integer(number) => Value::Number(Number::from(*number)),
        toml::Value::Float(number) => Value::Number(Number::from_f64(*number).ok_or_else(|| {
            ConfigError::Invalid("frames.initial_state must not contain nan or inf".to_string())
        })?),
        toml::Value::Boolean(flag) => Value::Bool(*flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => {
            Value::Array(items.iter().map(toml_to_json).collect::<Result<_, _>>()?)
        }
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(key, item)| Ok((key.clone(), toml_to_json(item)?)))
                .collect::<Result<_, ConfigError>>()?,
        ),
    })
}

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Default base path.
fn default_base_path() -> String {
    "/".to_string()
}

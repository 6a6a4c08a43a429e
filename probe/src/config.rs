//! Configuration loading
//!
//! Every setting resolves with the same priority:
//! 1. CLI flag or environment variable (clap merges both)
//! 2. Config file (`.mcp-probe.toml` up the directory tree, then the global one)
//! 3. Built-in default

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::DEFAULT_SUPPRESS_PATTERNS;

/// Project-local config file name
pub const CONFIG_FILENAME: &str = ".mcp-probe.toml";

const GLOBAL_DIR: &str = "mcp-probe";
const GLOBAL_FILENAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{0}' (set it in .mcp-probe.toml, the environment, or run with --setup)")]
    Missing(&'static str),

    #[error("invalid URL for '{field}': {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no user config directory on this platform")]
    NoConfigDir,
}

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at `<config_dir>/mcp-probe/config.toml`
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }
    }

    global_config_path().filter(|p| p.exists())
}

/// Location of the per-user config file (may not exist yet)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLOBAL_DIR).join(GLOBAL_FILENAME))
}

// ============================================================================
// Resolved runtime types
// ============================================================================

/// Where the remote server lives and how to authenticate against it.
///
/// Immutable after load. `health_url` being `None` disables the wake phase.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub server_url: String,
    pub auth_token: String,
    pub health_url: Option<String>,
}

impl ServerEndpoint {
    pub fn new(server_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            auth_token: auth_token.into(),
            health_url: None,
        }
    }

    pub fn with_health_url(mut self, health_url: impl Into<String>) -> Self {
        self.health_url = Some(health_url.into());
        self
    }
}

// Keep the token out of logs
impl std::fmt::Debug for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerEndpoint")
            .field("server_url", &self.server_url)
            .field("auth_token", &"<redacted>")
            .field("health_url", &self.health_url)
            .finish()
    }
}

/// Timing and retry budget for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionAttemptPolicy {
    pub health_attempts: u32,
    pub health_interval_secs: u64,
    pub post_health_grace_secs: u64,
    pub connect_attempts: u32,
    pub connect_retry_delay_secs: u64,
    pub connect_init_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
    pub tool_timeout_secs: u64,
}

impl Default for ConnectionAttemptPolicy {
    fn default() -> Self {
        Self {
            health_attempts: 6,
            health_interval_secs: 5,
            post_health_grace_secs: 20,
            connect_attempts: 3,
            connect_retry_delay_secs: 5,
            connect_init_timeout_secs: 30,
            catalog_timeout_secs: 15,
            tool_timeout_secs: 300,
        }
    }
}

impl ConnectionAttemptPolicy {
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn post_health_grace(&self) -> Duration {
        Duration::from_secs(self.post_health_grace_secs)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_delay_secs)
    }

    pub fn connect_init_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_init_timeout_secs)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Diagnostic output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Start with transport noise visible
    pub verbose: bool,
    /// Regular expressions for known-benign transport diagnostics
    pub suppress_patterns: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            suppress_patterns: DEFAULT_SUPPRESS_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Fully resolved configuration for a run
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub endpoint: ServerEndpoint,
    pub policy: ConnectionAttemptPolicy,
    pub logging: LoggingConfig,
    /// File the settings were read from, if any
    pub source: Option<PathBuf>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub health_url: Option<String>,
    pub verbose: bool,
}

// ============================================================================
// Config file (.mcp-probe.toml)
// ============================================================================

/// Top-level config file layout
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProbeFileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub connection: ConnectionAttemptPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[server]` section
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,
}

impl ProbeFileConfig {
    /// Load config, walking up from the cwd and then checking the global file.
    ///
    /// Returns `(config, path)`; the path is `None` when defaults are used.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(config_path) = find_config_file() {
            tracing::debug!("Loading config from: {}", config_path.display());
            let config = Self::load_from_path(&config_path)?;
            return Ok((config, Some(config_path)));
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILENAME);
        Ok((Self::default(), None))
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config to `path`, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge with CLI/env overrides and validate
    pub fn resolve(
        self,
        overrides: ConfigOverrides,
        source: Option<PathBuf>,
    ) -> Result<ProbeConfig, ConfigError> {
        let server_url = pick(overrides.server_url, self.server.url)
            .ok_or(ConfigError::Missing("server url"))?;
        let auth_token =
            pick(overrides.token, self.server.token).ok_or(ConfigError::Missing("token"))?;
        let health_url = pick(overrides.health_url, self.server.health_url);

        validate_url("server url", &server_url)?;
        if let Some(ref health) = health_url {
            validate_url("health url", health)?;
        }

        let mut logging = self.logging;
        logging.verbose |= overrides.verbose;

        Ok(ProbeConfig {
            endpoint: ServerEndpoint {
                server_url,
                auth_token,
                health_url,
            },
            policy: self.connection,
            logging,
            source,
        })
    }
}

/// First non-blank value, with `${VAR}` expansion applied to file values
fn pick(cli: Option<String>, file: Option<String>) -> Option<String> {
    let cli = cli.filter(|v| !v.trim().is_empty());
    let file = file
        .map(|v| expand(&v))
        .filter(|v| !v.trim().is_empty());
    cli.or(file).map(|v| v.trim().to_string())
}

fn expand(value: &str) -> String {
    shellexpand::env(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

pub fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidUrl { field, source })
}

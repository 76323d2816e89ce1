//! TOML configuration file for the command-line client.
//!
//! The file is optional.  Its default location is:
//! - Windows:  `%APPDATA%\obsws\config.toml`
//! - Linux:    `~/.config/obsws/config.toml`
//! - macOS:    `~/Library/Application Support/obsws/config.toml`
//!
//! ```toml
//! log_level = "info"
//!
//! [connection]
//! host = "127.0.0.1"
//! port = 4455
//! password = "hunter2"
//! subscriptions = ["General", "Scenes", "Outputs"]
//!
//! [timeouts]
//! request_secs = 30
//! batch_secs = 15
//! reconnect_secs = 15
//! ```
//!
//! Every field has a default, so a partial file (or none at all) is fine.
//! Command-line flags and `OBSWS_*` environment variables are applied on top
//! with [`FileConfig::apply`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use obsws_client::ClientConfig;
use obsws_core::EventSubscription;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An unknown name in `subscriptions`.
    #[error("invalid event subscription: {0}")]
    Subscription(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub timeouts: TimeoutSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Subscription category names, OR-ed together ("All", "Scenes", ...).
    #[serde(default = "default_subscriptions")]
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutSection {
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
    #[serde(default = "default_batch_secs")]
    pub batch_secs: u64,
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u64,
}

/// Values given on the command line or in the environment.  `None` keeps
/// whatever the file (or the default) says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub subscriptions: Option<Vec<String>>,
    pub log_level: Option<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    4455
}
fn default_subscriptions() -> Vec<String> {
    vec!["All".to_string()]
}
fn default_request_secs() -> u64 {
    30
}
fn default_batch_secs() -> u64 {
    15
}
fn default_reconnect_secs() -> u64 {
    15
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            connection: ConnectionSection::default(),
            timeouts: TimeoutSection::default(),
        }
    }
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            subscriptions: default_subscriptions(),
        }
    }
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            request_secs: default_request_secs(),
            batch_secs: default_batch_secs(),
            reconnect_secs: default_reconnect_secs(),
        }
    }
}

impl FileConfig {
    /// Applies command-line overrides on top of the file values.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.connection.host = host;
        }
        if let Some(port) = overrides.port {
            self.connection.port = port;
        }
        if let Some(password) = overrides.password {
            self.connection.password = Some(password);
        }
        if let Some(subscriptions) = overrides.subscriptions {
            self.connection.subscriptions = subscriptions;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
    }

    /// Builds the client settings these values describe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Subscription`] for an unknown category name.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mask = EventSubscription::from_names(self.connection.subscriptions.iter().map(String::as_str))
            .map_err(ConfigError::Subscription)?;

        let mut config = ClientConfig::for_host(&self.connection.host, self.connection.port)
            .with_event_subscriptions(mask);
        if let Some(password) = &self.connection.password {
            config = config.with_password(password.clone());
        }
        config.request_timeout = Duration::from_secs(self.timeouts.request_secs);
        config.batch_timeout = Duration::from_secs(self.timeouts.batch_secs);
        config.reconnect_interval = Duration::from_secs(self.timeouts.reconnect_secs);
        Ok(config)
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves the default config file path for this platform.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Parses config text.
pub fn parse_config(text: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Loads `path`, returning the defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(FileConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("obsws"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("obsws"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("obsws")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

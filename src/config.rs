//! Server configuration loaded from a TOML file.

use crate::frame::Framing;
use crate::hub::{DEFAULT_SNAPSHOT_LINES, StreamSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_PORT: u16 = 8008;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub auth: AuthConfig,
    pub log: LogConfig,
    pub stream: StreamConfig,
    pub log_files: Vec<LogFileEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth: AuthConfig::default(),
            log: LogConfig::default(),
            stream: StreamConfig::default(),
            log_files: Vec::new(),
        }
    }
}

/// HTTP Basic credentials guarding every route when enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Tail lines sent to a viewer when it joins.
    pub snapshot_lines: usize,
    /// Follow-loop fallback polling interval.
    pub poll_interval_ms: u64,
    /// Frames buffered per WebSocket before sends wait.
    pub viewer_buffer: usize,
    /// Default `limit` of `/api/loadmore`.
    pub page_limit: i64,
    pub framing: Framing,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            snapshot_lines: DEFAULT_SNAPSHOT_LINES,
            poll_interval_ms: 250,
            viewer_buffer: 1024,
            page_limit: 100,
            framing: Framing::default(),
        }
    }
}

impl StreamConfig {
    pub fn settings(&self) -> StreamSettings {
        StreamSettings {
            snapshot_lines: self.snapshot_lines,
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            framing: self.framing.clone(),
        }
    }
}

/// A log file offered on the index page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogFileEntry {
    pub path: String,
    pub name: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chart::{ChartOptions, DEFAULT_WINDOW};
use crate::listener::{ReconnectPolicy, GAME_HISTORY_PATH};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listener: ListenerConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scoreboard feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// Base WebSocket URL of the scoreboard server
    #[serde(default = "default_ws_url")]
    pub url: String,

    #[serde(default = "default_ws_path")]
    pub path: String,

    #[serde(default = "default_reconnect")]
    pub reconnect: bool,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_reconnect_base_delay")]
    pub reconnect_base_delay_ms: u64,

    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay_ms: u64,
}

fn default_ws_url() -> String {
    "ws://localhost:8888".to_string()
}

fn default_ws_path() -> String {
    GAME_HISTORY_PATH.to_string()
}

fn default_reconnect() -> bool {
    true
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay() -> u64 {
    1000 // 1 second
}

fn default_reconnect_max_delay() -> u64 {
    30_000 // 30 seconds
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            path: default_ws_path(),
            reconnect: default_reconnect(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay(),
            reconnect_max_delay_ms: default_reconnect_max_delay(),
        }
    }
}

impl ListenerConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.reconnect,
            max_attempts: self.max_reconnect_attempts,
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
        }
    }
}

/// Chart presentation and retention
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_x_axis_title")]
    pub x_axis_title: String,

    #[serde(default = "default_y_axis_title")]
    pub y_axis_title: String,

    /// Points kept per series
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_title() -> String {
    ChartOptions::default().title
}

fn default_x_axis_title() -> String {
    ChartOptions::default().x_axis_title
}

fn default_y_axis_title() -> String {
    ChartOptions::default().y_axis_title
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            x_axis_title: default_x_axis_title(),
            y_axis_title: default_y_axis_title(),
            window: default_window(),
        }
    }
}

impl ChartConfig {
    pub fn options(&self) -> ChartOptions {
        ChartOptions {
            title: self.title.clone(),
            x_axis_title: self.x_axis_title.clone(),
            y_axis_title: self.y_axis_title.clone(),
        }
    }
}

/// Status API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_api_enabled() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Server settings for [`crate::api::serve`]
    pub fn server(&self) -> crate::api::ApiConfig {
        crate::api::ApiConfig::new(self.host.clone(), self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> (Self, LoadReport) {
        let mut config = Config::default();
        let ignored = config.apply_env_overrides();
        (
            config,
            LoadReport {
                ignored,
                ..Default::default()
            },
        )
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<(Self, LoadReport), ConfigError> {
        let mut config = Self::load(path)?;
        let ignored = config.apply_env_overrides();
        Ok((
            config,
            LoadReport {
                source: Some(path.to_path_buf()),
                rejected: Vec::new(),
                ignored,
            },
        ))
    }

    /// Load from default locations or environment
    pub fn load_default() -> (Self, LoadReport) {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("flagboard").join("config.toml")),
            Some(PathBuf::from("/etc/flagboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first candidate that exists and parses
    fn load_first(paths: &[PathBuf]) -> (Self, LoadReport) {
        let mut rejected = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok((config, mut report)) => {
                    report.rejected = rejected;
                    return (config, report);
                }
                Err(e) => rejected.push(e),
            }
        }

        let (config, mut report) = Self::from_env();
        report.rejected = rejected;
        (config, report)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Returns a note for each override that was ignored
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut ignored = Vec::new();

        if let Some(url) = var("FLAGBOARD_WS_URL") {
            self.listener.url = url;
        }

        if let Some(host) = var("FLAGBOARD_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("FLAGBOARD_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => ignored.push(format!("Ignoring invalid FLAGBOARD_API_PORT {:?}", port)),
            }
        }

        if let Some(level) = var("FLAGBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("FLAGBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }

        ignored
    }
}

/// What happened while loading the config
///
/// Config is loaded before logging is set up, so the outcome is collected
/// here and logged once the subscriber is installed.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// File the config came from; `None` means built-in defaults
    pub source: Option<PathBuf>,
    /// Candidate files that exist but failed to load
    pub rejected: Vec<ConfigError>,
    /// Environment overrides that were ignored
    pub ignored: Vec<String>,
}

impl LoadReport {
    pub fn log(&self) {
        for error in &self.rejected {
            tracing::warn!("{}", error);
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
        for note in &self.ignored {
            tracing::warn!("{}", note);
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Flagboard Configuration
#
# Environment variables override these settings:
# - FLAGBOARD_WS_URL
# - FLAGBOARD_API_HOST
# - FLAGBOARD_API_PORT
# - FLAGBOARD_LOG_LEVEL
# - FLAGBOARD_LOG_FORMAT

[listener]
# Base WebSocket URL of the scoreboard server
url = "ws://localhost:8888"

# Game history socket path, appended to the URL
path = "/scoreboard/wsocket/game_history"

# Reconnect with exponential backoff when the feed drops
reconnect = true
max_reconnect_attempts = 5
reconnect_base_delay_ms = 1000
reconnect_max_delay_ms = 30000

[chart]
title = "Captured Flags"
x_axis_title = "Time"
y_axis_title = "Flags Captured"

# Points kept per team before the oldest is dropped
window = 30

[api]
# Serve the read-only status API
enabled = true
host = "127.0.0.1"
port = 8090

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

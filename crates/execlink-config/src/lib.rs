//! Configuration for the execlink CLI.
//!
//! A TOML file in the platform config dir, layered with `EXECLINK_*`
//! environment variables, translated into `execlink_core::OrchestratorConfig`.
//! Nested keys use a double underscore in the environment, e.g.
//! `EXECLINK_CONNECTION__BASE_PORT=9080`.

mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use execlink_core::OrchestratorConfig;

pub use session::{FileSessionStore, KeyringSessionStore, open_session_store};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub session: SessionSettings,
}

/// Where to look for the backend and how patiently.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_host")]
    pub host: String,

    /// First candidate port.
    #[serde(default = "default_base_port")]
    pub base_port: u16,

    /// Consecutive ports probed starting at `base_port`.
    #[serde(default = "default_candidate_count")]
    pub candidate_count: u16,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            base_port: default_base_port(),
            candidate_count: default_candidate_count(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_base_port() -> u16 {
    8080
}
fn default_candidate_count() -> u16 {
    5
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_probe_timeout_ms() -> u64 {
    2000
}
fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Console lines kept in memory for replay.
    #[serde(default = "default_log_history")]
    pub log_history: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            log_history: default_log_history(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_log_history() -> usize {
    1000
}

/// Where the credential lives between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionBackend {
    /// `session.toml` in the platform data dir.
    #[default]
    File,
    /// The OS credential store.
    Keyring,
    /// Never persisted.
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Override for the file backend's location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "execlink", "execlink")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the file session backend.
pub fn session_path() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".local/share").join("session.toml"),
        |dirs| dirs.data_dir().join("session.toml"),
    )
}

fn fallback_dir(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("execlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing is fine) layered under `EXECLINK_*` env vars.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("EXECLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build an `OrchestratorConfig`, rejecting settings discovery can't use.
pub fn to_orchestrator_config(cfg: &Config) -> Result<OrchestratorConfig, ConfigError> {
    let conn = &cfg.connection;

    if conn.host.trim().is_empty() {
        return Err(invalid("connection.host", "must not be empty"));
    }
    if conn.candidate_count == 0 {
        return Err(invalid("connection.candidate_count", "must be at least 1"));
    }
    if conn.probe_timeout_ms == 0 {
        return Err(invalid("connection.probe_timeout_ms", "must be non-zero"));
    }
    if conn.request_timeout_secs == 0 {
        return Err(invalid("connection.request_timeout_secs", "must be non-zero"));
    }

    Ok(OrchestratorConfig {
        host: conn.host.trim().to_owned(),
        base_port: conn.base_port,
        candidate_count: conn.candidate_count,
        max_retries: conn.max_retries,
        retry_delay: Duration::from_millis(conn.retry_delay_ms),
        probe_timeout: Duration::from_millis(conn.probe_timeout_ms),
        request_timeout: Duration::from_secs(conn.request_timeout_secs),
        log_history: cfg.defaults.log_history,
    })
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

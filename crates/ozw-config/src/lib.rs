//! Shared configuration for the `ozw` tools.
//!
//! TOML file plus `OZW_` environment overrides, layered with figment and
//! translated to `ozw_core::OzwOptions`. The CLI adds flag overrides on top.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ozw_core::{CoreError, DEFAULT_TOPIC_PREFIX, ItemId, OzwOptions};

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

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Prefix the daemon publishes under, with trailing `/`.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Only track this instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u64>,

    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            instance_id: None,
            defaults: Defaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.into()
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    /// Build manager options. The bus is fresh and no outbound channel is
    /// attached; callers wire those up themselves.
    pub fn to_options(&self) -> Result<OzwOptions, ConfigError> {
        let options = OzwOptions {
            topic_prefix: self.topic_prefix.clone(),
            instance_id: self.instance_id.map(ItemId::from),
            ..OzwOptions::default()
        };
        options.validate().map_err(|err| match err {
            CoreError::Config { message } => ConfigError::Validation {
                field: "topic_prefix".into(),
                reason: message,
            },
            other => ConfigError::Validation {
                field: "options".into(),
                reason: other.to_string(),
            },
        })?;
        Ok(options)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "openzwave", "ozw").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ozw");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from an explicit file. A missing file contributes nothing.
///
/// Environment keys use `__` to descend into tables, so
/// `OZW_TOPIC_PREFIX` and `OZW_DEFAULTS__OUTPUT` both work.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OZW_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

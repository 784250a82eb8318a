//! CLI configuration -- thin wrapper around `ozw_config` shared types.
//!
//! Adds the `GlobalOpts` overrides (--config, --prefix, --instance,
//! --output, --color) on top of the file + environment layers.

use clap::ValueEnum;
use ozw_core::OzwOptions;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use ozw_config::{Config, config_path, load_config_from, save_config_to};

/// Config with flags applied, plus the parsed output defaults.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    pub output: OutputFormat,
    pub color: ColorMode,
}

impl Settings {
    pub fn options(&self) -> Result<OzwOptions, CliError> {
        Ok(self.config.to_options()?)
    }
}

/// Path of the config file in effect: `--config` or the platform default.
pub fn active_config_path(global: &GlobalOpts) -> std::path::PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load config and apply flag overrides. `-o`/`--color` win over the
/// `[defaults]` table, which is what an unflagged run falls back to.
pub fn resolve(global: &GlobalOpts) -> Result<Settings, CliError> {
    let mut cfg = load_config_from(&active_config_path(global))?;
    if let Some(ref prefix) = global.prefix {
        cfg.topic_prefix.clone_from(prefix);
    }
    if let Some(instance) = global.instance {
        cfg.instance_id = Some(instance);
    }
    if let Some(name) = global.output.and_then(value_name) {
        cfg.defaults.output = name;
    }
    if let Some(name) = global.color.and_then(value_name) {
        cfg.defaults.color = name;
    }

    let output = parse_default("defaults.output", &cfg.defaults.output)?;
    let color = parse_default("defaults.color", &cfg.defaults.color)?;
    Ok(Settings {
        config: cfg,
        output,
        color,
    })
}

fn value_name<T: ValueEnum>(value: T) -> Option<String> {
    value.to_possible_value().map(|v| v.get_name().to_owned())
}

fn parse_default<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_case_insensitively() {
        let format: OutputFormat = parse_default("defaults.output", "JSON-compact").unwrap();
        assert!(matches!(format, OutputFormat::JsonCompact));
        let color: ColorMode = parse_default("defaults.color", "never").unwrap();
        assert!(matches!(color, ColorMode::Never));
    }

    #[test]
    fn unknown_default_is_a_usage_error() {
        let err = parse_default::<OutputFormat>("defaults.output", "xml").unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "defaults.output"));
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn flag_names_match_config_spelling() {
        assert_eq!(value_name(OutputFormat::JsonCompact).as_deref(), Some("json-compact"));
        assert_eq!(value_name(ColorMode::Auto).as_deref(), Some("auto"));
    }
}

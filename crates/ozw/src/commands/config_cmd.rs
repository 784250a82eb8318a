//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "topic_prefix = \"{}\"", cfg.topic_prefix);
    if let Some(instance) = cfg.instance_id {
        let _ = writeln!(out, "instance_id = {instance}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = write!(out, "color = \"{}\"", cfg.defaults.color);
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::active_config_path(global);
    match args.command {
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            // Flag overrides are written through so `--prefix` seeds the file.
            let cfg = Config {
                topic_prefix: global
                    .prefix
                    .clone()
                    .unwrap_or_else(|| Config::default().topic_prefix),
                instance_id: global.instance,
                ..Config::default()
            };
            cfg.to_options()?;
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let settings = config::resolve(global)?;
            let cfg = &settings.config;
            let out = match settings.output {
                OutputFormat::Plain => cfg.topic_prefix.clone(),
                format => output::structured(format, cfg).unwrap_or_else(|| format_config(cfg)),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}

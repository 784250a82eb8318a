//! Clap derive structures for the `ozw` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ozw -- replay and inspect OpenZWave MQTT traffic
#[derive(Debug, Parser)]
#[command(
    name = "ozw",
    version,
    about = "Replay and inspect OpenZWave MQTT dumps",
    long_about = "Rebuilds the OpenZWave entity tree from a broker dump.\n\n\
        Each dump line is `<topic>,<payload>`, split at the first comma; an\n\
        empty payload deletes the entity at that topic.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "OZW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Topic prefix the daemon publishes under (overrides config)
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Only track this OpenZWave instance (overrides config)
    #[arg(long, global = true)]
    pub instance: Option<u64>,

    /// Output format [default: config `defaults.output`, else table]
    #[arg(long, short = 'o', env = "OZW_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: config `defaults.color`, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a dump and list every entity in the resulting tree
    Replay(DumpArgs),

    /// Replay a dump and report stuck messages and unrecognised fields
    Verify(DumpArgs),

    /// Replay a dump, printing lifecycle events as they fire
    #[command(alias = "ev")]
    Events(DumpArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Dump file of `topic,payload` lines
    pub file: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

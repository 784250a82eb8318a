//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use ozw_config::ConfigError;
use ozw_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const DATA: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Dump input ───────────────────────────────────────────────────

    #[error("{path}:{line}: {reason}")]
    #[diagnostic(
        code(ozw::dump_line),
        help("Each line must be `<topic>,<payload>`; the payload is JSON or empty.")
    )]
    DumpLine {
        path: String,
        line: usize,
        reason: String,
    },

    // ── Verification ─────────────────────────────────────────────────

    #[error("{count} problem(s) found in the replayed tree")]
    #[diagnostic(
        code(ozw::verify_failed),
        help("Pending entries never received their own record; check the dump is complete.")
    )]
    VerifyFailed { count: usize },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ozw::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(ozw::config_exists),
        help("Use --force to overwrite.\nPath: {path}")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(ozw::config))]
    Config(#[from] ConfigError),

    // ── Core ─────────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(ozw::core))]
    Core(CoreError),

    #[error("ingest task failed: {0}")]
    #[diagnostic(code(ozw::ingest))]
    Ingest(#[from] tokio::task::JoinError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. }
            | Self::ConfigExists { .. }
            | Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            Self::DumpLine { .. } => exit_code::DATA,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "topic prefix".into(),
                reason: message,
            },
            other => CliError::Core(other),
        }
    }
}

// ── Core error types ──
//
// Only structural problems escape the tree: a topic outside the
// configured prefix, a payload that is not a JSON object, a wiring bug
// in an entity schema, or a missing ancestor. Routing anomalies
// (unknown segments, deletes of unknown ids) are logged and absorbed.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Inbound message errors ───────────────────────────────────────
    #[error("Topic '{topic}' does not start with prefix '{prefix}'")]
    TopicPrefix { topic: String, prefix: String },

    #[error("Cannot decode payload on topic '{topic}': {message}")]
    Deserialization { topic: String, message: String },

    // ── Structural errors ────────────────────────────────────────────
    #[error("{kind} at '{topic}' has no {ancestor} ancestor")]
    AncestorNotFound {
        kind: &'static str,
        ancestor: &'static str,
        topic: String,
    },

    #[error("Invalid schema for {schema}: {reason}")]
    Schema {
        schema: &'static str,
        reason: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Outbound errors ──────────────────────────────────────────────
    #[error("Cannot send message to '{topic}': {reason}")]
    SendFailed { topic: String, reason: String },
}

impl CoreError {
    pub(crate) fn schema(schema: &'static str, reason: impl Into<String>) -> Self {
        Self::Schema {
            schema,
            reason: reason.into(),
        }
    }
}

//! `replay`: rebuild the tree from a dump and list its entities.

use serde::Serialize;
use tabled::Tabled;

use ozw_core::{EntityRef, OzwManager};

use crate::cli::{DumpArgs, GlobalOpts};
use crate::config::{self, Settings};
use crate::error::CliError;
use crate::output;

// ── Summary record ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct EntitySummary {
    pub kind: &'static str,
    pub topic: String,
    pub id: Option<String>,
    pub initialized: bool,
    pub pending: usize,
}

impl From<EntityRef<'_>> for EntitySummary {
    fn from(e: EntityRef<'_>) -> Self {
        Self {
            kind: e.kind(),
            topic: e.topic(),
            id: e.id().map(ToString::to_string),
            initialized: e.is_initialized(),
            pending: e.pending_count(),
        }
    }
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Ready")]
    ready: &'static str,
    #[tabled(rename = "Pending")]
    pending: String,
}

impl From<&EntitySummary> for EntityRow {
    fn from(s: &EntitySummary) -> Self {
        Self {
            kind: s.kind,
            id: s.id.clone().unwrap_or_default(),
            topic: s.topic.clone(),
            ready: if s.initialized { "yes" } else { "no" },
            pending: if s.pending == 0 {
                String::new()
            } else {
                s.pending.to_string()
            },
        }
    }
}

/// Replay `args.file` into a fresh manager built from config and flags.
pub fn load_manager(args: &DumpArgs, settings: &Settings) -> Result<OzwManager, CliError> {
    let mut manager = OzwManager::new(settings.options()?)?;
    let dump = super::read_dump(&args.file)?;
    super::replay_into(&mut manager, &args.file, &dump)?;
    Ok(manager)
}

/// Every entity below the root, depth first.
pub fn summarize(manager: &OzwManager) -> Vec<EntitySummary> {
    manager
        .tree()
        .walk()
        .into_iter()
        .skip(1)
        .map(EntitySummary::from)
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &DumpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve(global)?;
    let manager = load_manager(args, &settings)?;
    let entities = summarize(&manager);
    tracing::info!(entities = entities.len(), "replay complete");

    let out = output::render_list(
        settings.output,
        &entities,
        |s| EntityRow::from(s),
        |s| s.topic.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

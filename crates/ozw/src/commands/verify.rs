//! `verify`: replay a dump and flag anything the tree could not place.
//!
//! Two kinds of problem are reported: entities still buffering messages
//! (their own record never arrived) and record keys that no typed getter
//! reads.

use serde::Serialize;
use tabled::Tabled;

use ozw_core::OzwManager;
use ozw_core::model::unknown_fields;

use crate::cli::{DumpArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum Problem {
    Pending {
        kind: &'static str,
        topic: String,
        count: usize,
    },
    UnknownFields {
        kind: &'static str,
        topic: String,
        fields: Vec<String>,
    },
}

#[derive(Tabled)]
struct ProblemRow {
    #[tabled(rename = "Problem")]
    problem: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&Problem> for ProblemRow {
    fn from(p: &Problem) -> Self {
        match p {
            Problem::Pending { kind, topic, count } => Self {
                problem: "pending",
                kind: *kind,
                topic: topic.clone(),
                detail: format!("{count} buffered message(s)"),
            },
            Problem::UnknownFields { kind, topic, fields } => Self {
                problem: "unknown fields",
                kind: *kind,
                topic: topic.clone(),
                detail: fields.join(", "),
            },
        }
    }
}

pub fn collect_problems(manager: &OzwManager) -> Vec<Problem> {
    let mut problems: Vec<Problem> = manager
        .pending_report()
        .into_iter()
        .map(|p| Problem::Pending {
            kind: p.kind,
            topic: p.topic,
            count: p.count,
        })
        .collect();

    for entity in manager.tree().walk() {
        let fields = unknown_fields(&entity);
        if !fields.is_empty() {
            problems.push(Problem::UnknownFields {
                kind: entity.kind(),
                topic: entity.topic(),
                fields: fields.into_iter().map(str::to_owned).collect(),
            });
        }
    }
    problems
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &DumpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve(global)?;
    let manager = super::replay::load_manager(args, &settings)?;
    let problems = collect_problems(&manager);

    if problems.is_empty() {
        if !global.quiet {
            eprintln!("No problems found");
        }
        return Ok(());
    }

    let out = output::render_list(
        settings.output,
        &problems,
        |p| ProblemRow::from(p),
        |p| match p {
            Problem::Pending { topic, .. } | Problem::UnknownFields { topic, .. } => topic.clone(),
        },
    );
    output::print_output(&out, global.quiet);
    Err(CliError::VerifyFailed {
        count: problems.len(),
    })
}

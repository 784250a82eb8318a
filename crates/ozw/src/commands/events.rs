//! `events`: stream lifecycle events while a dump replays.
//!
//! The dump is pushed through the core's ingest task, the same path a live
//! MQTT subscriber would use, so undecodable payloads are logged and
//! skipped instead of aborting.

use serde_json::json;
use tokio_util::sync::CancellationToken;

use ozw_core::event::ALL_EVENTS;
use ozw_core::{EventPayload, InboundMessage, OzwManager, ingest};

use crate::cli::{DumpArgs, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Queue depth between the file reader and the ingest task.
const QUEUE_CAPACITY: usize = 256;

/// Output for one event. JSON formats print one compact object per line
/// so the stream stays line-delimited; YAML prints one document each.
fn format_event(event: &str, payload: &EventPayload<'_>, format: OutputFormat, color: bool) -> String {
    let body = || match (payload.entity(), payload.record()) {
        (Some(entity), _) => json!({
            "event": event,
            "kind": entity.kind(),
            "topic": entity.topic(),
        }),
        (None, Some(record)) => json!({ "event": event, "record": record }),
        (None, None) => json!({ "event": event }),
    };
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            output::structured(OutputFormat::JsonCompact, &body()).unwrap_or_default()
        }
        OutputFormat::Yaml => {
            let doc = output::structured(OutputFormat::Yaml, &body()).unwrap_or_default();
            format!("---\n{}", doc.trim_end())
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let name = output::paint(event, output::event_style(event), color);
            match (payload.entity(), payload.record()) {
                (Some(entity), _) => format!("{name}\t{}", entity.topic()),
                (None, Some(record)) => format!("{name}\t{record}"),
                (None, None) => name,
            }
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &DumpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve(global)?;
    let manager = OzwManager::new(settings.options()?)?;
    let dump = super::read_dump(&args.file)?;

    let format = settings.output;
    let color = output::should_color(settings.color);
    let quiet = global.quiet;
    let subscriptions: Vec<_> = ALL_EVENTS
        .iter()
        .map(|&event| {
            manager.listen(event, move |payload| {
                output::print_output(&format_event(event, payload, format, color), quiet);
            })
        })
        .collect();

    let handle = ingest::spawn(manager, QUEUE_CAPACITY, CancellationToken::new());
    let tx = handle.sender();
    for msg in dump {
        if tx.send(InboundMessage::new(msg.topic, msg.payload)).await.is_err() {
            break;
        }
    }
    drop(tx);

    let manager = handle.join().await?;
    for sub in subscriptions {
        sub.unsubscribe();
    }
    tracing::info!(entities = manager.tree().len(), "event replay complete");
    Ok(())
}

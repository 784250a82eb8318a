// ── Async ingest task ──
//
// Funnels messages from any number of producers (MQTT client callbacks,
// file replays, tests) into one task that owns the manager, so the tree
// itself needs no locking and sees messages strictly one at a time.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::manager::OzwManager;

/// One raw MQTT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Handle to a running ingest task.
#[derive(Debug)]
pub struct IngestHandle {
    tx: mpsc::Sender<InboundMessage>,
    cancel: CancellationToken,
    task: JoinHandle<OzwManager>,
}

impl IngestHandle {
    /// A producer handle. The task keeps running while any sender is alive.
    pub fn sender(&self) -> mpsc::Sender<InboundMessage> {
        self.tx.clone()
    }

    /// Stop immediately; queued messages are discarded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task to finish and take the manager back. Returns once
    /// every other sender is dropped and the queue is drained, or after
    /// `shutdown`.
    pub async fn join(self) -> Result<OzwManager, tokio::task::JoinError> {
        drop(self.tx);
        self.task.await
    }
}

/// Move `manager` into a background task fed by a bounded queue of
/// `capacity` messages.
///
/// Messages that fail to decode or fall outside the topic prefix are
/// logged and skipped; they never stop the task.
pub fn spawn(manager: OzwManager, capacity: usize, cancel: CancellationToken) -> IngestHandle {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(ingest_task(manager, rx, cancel.clone()));
    IngestHandle { tx, cancel, task }
}

async fn ingest_task(
    mut manager: OzwManager,
    mut rx: mpsc::Receiver<InboundMessage>,
    cancel: CancellationToken,
) -> OzwManager {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            message = rx.recv() => {
                let Some(message) = message else { break };
                if let Err(e) = manager.receive_message(&message.topic, &message.payload) {
                    warn!(error = %e, topic = %message.topic, "skipping inbound message");
                }
            }
        }
    }
    debug!("ingest loop exiting");
    manager
}

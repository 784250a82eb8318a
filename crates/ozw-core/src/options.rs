// ── Manager options ──
//
// Built by the CLI (or any embedding application) and passed to
// `OzwManager` -- core never reads config files.

use crate::command::OutboundSender;
use crate::error::CoreError;
use crate::event::{EventBus, EventPayload, Subscription};
use crate::model::ItemId;

pub const DEFAULT_TOPIC_PREFIX: &str = "OpenZWave/";

/// Settings shared by every entity of one manager.
#[derive(Debug, Clone)]
pub struct OzwOptions {
    /// Topic prefix the daemon publishes under. Must end in `/`.
    pub topic_prefix: String,
    /// Only track this instance; messages for other instances are dropped.
    pub instance_id: Option<ItemId>,
    /// Listener registry for lifecycle events.
    pub bus: EventBus,
    /// Where outbound commands go. Without one, sending fails.
    pub outbound: Option<OutboundSender>,
}

impl Default for OzwOptions {
    fn default() -> Self {
        Self {
            topic_prefix: DEFAULT_TOPIC_PREFIX.into(),
            instance_id: None,
            bus: EventBus::new(),
            outbound: None,
        }
    }
}

impl OzwOptions {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            topic_prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.topic_prefix.ends_with('/') {
            return Err(CoreError::Config {
                message: format!("topic prefix '{}' must end with '/'", self.topic_prefix),
            });
        }
        if self.topic_prefix.len() == 1 {
            return Err(CoreError::Config {
                message: "topic prefix must not be just '/'".into(),
            });
        }
        Ok(())
    }

    /// Shorthand for `self.bus.listen`.
    pub fn listen<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&EventPayload<'_>) + Send + Sync + 'static,
    {
        self.bus.listen(event, listener)
    }
}

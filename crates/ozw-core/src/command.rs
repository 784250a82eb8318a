// ── Outbound commands ──
//
// Controller commands are published on
// `<prefix><instance>/command/<name>/`. The crate never talks to a
// broker itself; messages go out through an unbounded channel that the
// embedding application drains into its MQTT client.

use serde::Serialize;
use serde_json::{Map, json};
use tokio::sync::mpsc;

use crate::model::Payload;

/// A message the embedding application should publish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Payload,
}

impl OutboundMessage {
    /// Payload in MQTT wire form; `Empty` is the empty string.
    pub fn raw_payload(&self) -> String {
        self.payload.to_raw()
    }
}

pub type OutboundSender = mpsc::UnboundedSender<OutboundMessage>;

/// Controller-level operations of an OpenZWave instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceCommand {
    // ── Network membership ───────────────────────────────────────────
    /// Enter inclusion mode.
    AddNode { secure: bool },
    /// Enter exclusion mode.
    RemoveNode,
    RemoveFailedNode { node: u64 },
    ReplaceFailedNode { node: u64 },

    // ── Maintenance ──────────────────────────────────────────────────
    /// Re-interview a device.
    RefreshNodeInfo { node: u64 },
    /// Recalculate neighbours and routes of a node.
    HealNetworkNode { node: u64 },
    /// Abort an in-progress controller command.
    CancelControllerCommand,
}

impl InstanceCommand {
    /// Command name as used in the topic.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "addnode",
            Self::RemoveNode => "removenode",
            Self::RemoveFailedNode { .. } => "removefailednode",
            Self::ReplaceFailedNode { .. } => "replacefailednode",
            Self::RefreshNodeInfo { .. } => "refreshnodeinfo",
            Self::HealNetworkNode { .. } => "healnetworknode",
            Self::CancelControllerCommand => "cancelcontrollercommand",
        }
    }

    pub fn payload(&self) -> Payload {
        let value = match self {
            Self::AddNode { secure } => json!({ "secure": secure }),
            Self::RemoveFailedNode { node }
            | Self::ReplaceFailedNode { node }
            | Self::RefreshNodeInfo { node }
            | Self::HealNetworkNode { node } => json!({ "node": node }),
            Self::RemoveNode | Self::CancelControllerCommand => return Payload::Empty,
        };
        match value {
            serde_json::Value::Object(map) => Payload::Record(map),
            _ => Payload::Record(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_commands_carry_node_id() {
        let cmd = InstanceCommand::HealNetworkNode { node: 7 };
        assert_eq!(cmd.name(), "healnetworknode");
        assert_eq!(cmd.payload().to_raw(), r#"{"node":7}"#);
    }

    #[test]
    fn bare_commands_have_empty_payload() {
        assert!(InstanceCommand::RemoveNode.payload().is_empty());
        assert_eq!(InstanceCommand::CancelControllerCommand.name(), "cancelcontrollercommand");
    }

    #[test]
    fn add_node_sends_secure_flag() {
        let cmd = InstanceCommand::AddNode { secure: true };
        assert_eq!(cmd.payload().to_raw(), r#"{"secure":true}"#);
    }
}

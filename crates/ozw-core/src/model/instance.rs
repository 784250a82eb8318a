// ── OpenZWave instance domain types ──
//
// One instance per daemon (and so per Z-Wave controller) sharing the
// broker. Instances own the node tree plus the controller's status and
// statistics records.

use chrono::{DateTime, Utc};

use super::node::{NODE, Node};
use super::statistics::{INSTANCE_STATISTICS, InstanceStatistics};
use crate::command::{InstanceCommand, OutboundMessage};
use crate::error::CoreError;
use crate::event::{
    EVENT_INSTANCE_ADDED, EVENT_INSTANCE_CHANGED, EVENT_INSTANCE_EVENT, EVENT_INSTANCE_REMOVED,
    EVENT_INSTANCE_STATUS_CHANGED,
};
use crate::model::{ItemId, Payload};
use crate::store::{Events, Schema, Slot};

pub static INSTANCE_STATUS: Schema = Schema::leaf(
    "InstanceStatus",
    Events::changed_only(EVENT_INSTANCE_STATUS_CHANGED),
);

pub static INSTANCE: Schema = Schema {
    name: "Instance",
    events: Events::item(EVENT_INSTANCE_ADDED, EVENT_INSTANCE_CHANGED, EVENT_INSTANCE_REMOVED),
    direct_collection: None,
    slots: &[
        Slot::collection("node", &NODE),
        Slot::singleton("status", &INSTANCE_STATUS),
        Slot::singleton("statistics", &INSTANCE_STATISTICS),
        // Echo of our own outbound commands.
        Slot::discard("command"),
        Slot::events("event", EVENT_INSTANCE_EVENT),
    ],
};

// ── Instance ─────────────────────────────────────────────────────────

entity_view!(
    /// An OpenZWave daemon instance.
    Instance => INSTANCE
);

impl<'a> Instance<'a> {
    record_fields! {}

    pub fn get_node(&self, id: impl Into<ItemId>) -> Option<Node<'a>> {
        super::child(self.0, "node", id)
    }

    pub fn nodes(self) -> impl Iterator<Item = Node<'a>> + 'a {
        super::children(self.0, "node")
    }

    pub fn status(&self) -> Option<InstanceStatus<'a>> {
        super::singleton(self.0, "status")
    }

    pub fn statistics(&self) -> Option<InstanceStatistics<'a>> {
        super::singleton(self.0, "statistics")
    }

    /// Publish a raw controller command.
    pub fn send_command(&self, command: &str, payload: Payload) -> Result<(), CoreError> {
        let topic = format!("{}/command/{command}/", self.0.topic());
        self.0.tree().publish(OutboundMessage { topic, payload })
    }

    pub fn send(&self, command: InstanceCommand) -> Result<(), CoreError> {
        self.send_command(command.name(), command.payload())
    }
}

impl std::fmt::Display for Instance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.id() {
            Some(id) => write!(f, "<Instance {id}>"),
            None => write!(f, "<Instance>"),
        }
    }
}

// ── InstanceStatus ───────────────────────────────────────────────────

entity_view!(
    /// Controller state as reported by the daemon.
    InstanceStatus => INSTANCE_STATUS
);

impl<'a> InstanceStatus<'a> {
    record_fields! {
        /// Daemon state, e.g. `driverAllNodesQueried`.
        status: &'a str => "Status";
        home_id: u64 => "homeID";
        manufacturer_specific_db_ready: bool => "ManufacturerSpecificDBReady";
        time_stamp: DateTime<Utc> => "TimeStamp";
        openzwave_version: &'a str => "OpenZWave_Version";
        ozw_daemon_version: &'a str => "OZWDeamon_Version";
        qt_openzwave_version: &'a str => "QTOpenZWave_Version";
        qt_version: &'a str => "QT_Version";
        controller_node_id: u64 => "getControllerNodeId";
        suc_node_id: u64 => "getSUCNodeId";
        is_primary_controller: bool => "isPrimaryController";
        is_bridge_controller: bool => "isBridgeController";
        has_extended_tx_statistics: bool => "hasExtendedTXStatistics";
        controller_library_version: &'a str => "getControllerLibraryVersion";
        controller_library_type: &'a str => "getControllerLibraryType";
        controller_path: &'a str => "getControllerPath";
    }
}

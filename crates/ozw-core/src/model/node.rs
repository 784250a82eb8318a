// ── Node domain types ──

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use super::association::{NODE_ASSOCIATION, NodeAssociation};
use super::node_instance::{NODE_INSTANCE, NodeInstance};
use super::statistics::{NODE_STATISTICS, NodeStatistics};
use super::value::Value;
use crate::event::{EVENT_NODE_ADDED, EVENT_NODE_CHANGED, EVENT_NODE_REMOVED};
use crate::model::ItemId;
use crate::store::{Events, Schema, Slot};

pub static NODE: Schema = Schema {
    name: "Node",
    events: Events::item(EVENT_NODE_ADDED, EVENT_NODE_CHANGED, EVENT_NODE_REMOVED),
    direct_collection: None,
    slots: &[
        Slot::collection("instance", &NODE_INSTANCE),
        Slot::collection("association", &NODE_ASSOCIATION),
        Slot::singleton("statistics", &NODE_STATISTICS),
    ],
};

entity_view!(
    /// A Z-Wave device known to a controller.
    Node => NODE
);

impl<'a> Node<'a> {
    record_fields! {
        node_id: u64 => "NodeID";
        node_query_stage: &'a str => "NodeQueryStage";
        is_listening: bool => "isListening";
        is_flirs: bool => "isFlirs";
        is_beaming: bool => "isBeaming";
        is_routing: bool => "isRouting";
        is_securityv1: bool => "isSecurityv1";
        is_zwave_plus: bool => "isZWavePlus";
        is_nif_received: bool => "isNIFRecieved";
        is_awake: bool => "isAwake";
        is_failed: bool => "isFailed";
        meta_data: &'a Json => "MetaData";
        event: &'a str => "Event";
        time_stamp: DateTime<Utc> => "TimeStamp";
        node_manufacturer_name: &'a str => "NodeManufacturerName";
        node_product_name: &'a str => "NodeProductName";
        node_basic_string: &'a str => "NodeBasicString";
        node_basic: u64 => "NodeBasic";
        node_generic_string: &'a str => "NodeGenericString";
        node_generic: u64 => "NodeGeneric";
        node_specific_string: &'a str => "NodeSpecificString";
        node_specific: u64 => "NodeSpecific";
        node_manufacturer_id: &'a str => "NodeManufacturerID";
        node_product_type: &'a str => "NodeProductType";
        node_product_id: &'a str => "NodeProductID";
        node_baud_rate: u64 => "NodeBaudRate";
        node_version: u64 => "NodeVersion";
        node_groups: u64 => "NodeGroups";
        node_name: &'a str => "NodeName";
        node_location: &'a str => "NodeLocation";
        node_device_type_string: &'a str => "NodeDeviceTypeString";
        node_device_type: u64 => "NodeDeviceType";
        node_role: u64 => "NodeRole";
        node_role_string: &'a str => "NodeRoleString";
        node_plus_type: u64 => "NodePlusType";
        node_plus_type_string: &'a str => "NodePlusTypeString";
        neighbors: Vec<u64> => "Neighbors";
    }

    pub fn get_instance(&self, id: impl Into<ItemId>) -> Option<NodeInstance<'a>> {
        super::child(self.0, "instance", id)
    }

    pub fn instances(self) -> impl Iterator<Item = NodeInstance<'a>> + 'a {
        super::children(self.0, "instance")
    }

    pub fn get_association(&self, id: impl Into<ItemId>) -> Option<NodeAssociation<'a>> {
        super::child(self.0, "association", id)
    }

    pub fn associations(self) -> impl Iterator<Item = NodeAssociation<'a>> + 'a {
        super::children(self.0, "association")
    }

    pub fn statistics(&self) -> Option<NodeStatistics<'a>> {
        super::singleton(self.0, "statistics")
    }

    /// Every value below this node, across all instances and command
    /// classes.
    pub fn values(self) -> impl Iterator<Item = Value<'a>> + 'a {
        self.instances()
            .flat_map(NodeInstance::commandclasses)
            .flat_map(super::CommandClass::values)
    }
}

impl std::fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.id() {
            Some(id) => write!(f, "<Node {id}>"),
            None => write!(f, "<Node>"),
        }
    }
}

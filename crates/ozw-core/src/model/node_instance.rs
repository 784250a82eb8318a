// ── Node instance domain types ──

use chrono::{DateTime, Utc};

use super::command_class::{COMMAND_CLASS, CommandClass};
use crate::event::{EVENT_NODE_INSTANCE_ADDED, EVENT_NODE_INSTANCE_CHANGED, EVENT_NODE_INSTANCE_REMOVED};
use crate::model::ItemId;
use crate::store::{Events, Schema, Slot};

pub static NODE_INSTANCE: Schema = Schema {
    name: "NodeInstance",
    events: Events::item(
        EVENT_NODE_INSTANCE_ADDED,
        EVENT_NODE_INSTANCE_CHANGED,
        EVENT_NODE_INSTANCE_REMOVED,
    ),
    direct_collection: None,
    slots: &[Slot::collection("commandclass", &COMMAND_CLASS)],
};

entity_view!(
    /// A multi-channel endpoint of a node. Single-channel devices have
    /// exactly one, with id 1.
    NodeInstance => NODE_INSTANCE
);

node_child!(NodeInstance);

impl<'a> NodeInstance<'a> {
    record_fields! {
        instance: u64 => "Instance";
        time_stamp: DateTime<Utc> => "TimeStamp";
    }

    pub fn get_commandclass(&self, id: impl Into<ItemId>) -> Option<CommandClass<'a>> {
        super::child(self.0, "commandclass", id)
    }

    pub fn commandclasses(self) -> impl Iterator<Item = CommandClass<'a>> + 'a {
        super::children(self.0, "commandclass")
    }
}

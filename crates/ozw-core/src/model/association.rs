// ── Node association domain types ──

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use crate::event::{
    EVENT_NODE_ASSOCIATION_ADDED, EVENT_NODE_ASSOCIATION_CHANGED, EVENT_NODE_ASSOCIATION_REMOVED,
};
use crate::store::{Events, Schema};

pub static NODE_ASSOCIATION: Schema = Schema::leaf(
    "NodeAssociation",
    Events::item(
        EVENT_NODE_ASSOCIATION_ADDED,
        EVENT_NODE_ASSOCIATION_CHANGED,
        EVENT_NODE_ASSOCIATION_REMOVED,
    ),
);

entity_view!(
    /// An association group of a node.
    NodeAssociation => NODE_ASSOCIATION
);

node_child!(NodeAssociation);

impl<'a> NodeAssociation<'a> {
    record_fields! {
        name: &'a str => "Name";
        help: &'a str => "Help";
        max_associations: u64 => "MaxAssociations";
        members: &'a Json => "Members";
        time_stamp: DateTime<Utc> => "TimeStamp";
    }
}

// ── Value domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use strum::{Display, EnumString};

use super::instance::{INSTANCE, Instance};
use crate::error::CoreError;
use crate::event::{EVENT_VALUE_ADDED, EVENT_VALUE_CHANGED, EVENT_VALUE_REMOVED};
use crate::model::Payload;
use crate::store::{Events, Schema};

pub static VALUE: Schema = Schema::leaf(
    "Value",
    Events::item(EVENT_VALUE_ADDED, EVENT_VALUE_CHANGED, EVENT_VALUE_REMOVED),
);

/// Storage type the daemon reports for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValueType {
    Bool,
    List,
    String,
    Decimal,
    Byte,
    Short,
    Int,
    Button,
    BitSet,
    Schedule,
    Raw,
    Unknown,
}

/// Which UI tier a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValueGenre {
    Basic,
    User,
    Config,
    System,
    Unknown,
}

entity_view!(
    /// One readable or settable value of a command class.
    Value => VALUE
);

node_child!(Value);

impl<'a> Value<'a> {
    record_fields! {
        ["Type", "Genre"]
        label: &'a str => "Label";
        value: &'a Json => "Value";
        units: &'a str => "Units";
        min: i64 => "Min";
        max: i64 => "Max";
        instance: u64 => "Instance";
        command_class: &'a str => "CommandClass";
        index: u64 => "Index";
        help: &'a str => "Help";
        value_id_key: u64 => "ValueIDKey";
        read_only: bool => "ReadOnly";
        write_only: bool => "WriteOnly";
        value_set: bool => "ValueSet";
        value_polled: bool => "ValuePolled";
        change_verified: bool => "ChangeVerified";
        event: &'a str => "Event";
        time_stamp: DateTime<Utc> => "TimeStamp";
    }

    /// `None` when the record has no `Type`; unrecognised names map to
    /// [`ValueType::Unknown`].
    pub fn value_type(&self) -> Option<ValueType> {
        let raw = self.0.field("Type")?.as_str()?;
        Some(raw.parse().unwrap_or(ValueType::Unknown))
    }

    pub fn genre(&self) -> Option<ValueGenre> {
        let raw = self.0.field("Genre")?.as_str()?;
        Some(raw.parse().unwrap_or(ValueGenre::Unknown))
    }

    /// Ask the daemon to set this value.
    pub fn send_value(&self, value: impl Into<Json>) -> Result<(), CoreError> {
        let instance = self
            .0
            .ancestor(&INSTANCE)
            .and_then(|entity| Instance::try_from(entity).ok())
            .ok_or_else(|| CoreError::AncestorNotFound {
                kind: self.0.kind(),
                ancestor: INSTANCE.name,
                topic: self.0.topic(),
            })?;
        let key = self.value_id_key().ok_or_else(|| CoreError::SendFailed {
            topic: self.0.topic(),
            reason: "value has no ValueIDKey".into(),
        })?;

        let mut payload = Map::new();
        payload.insert("ValueIDKey".into(), key.into());
        payload.insert("Value".into(), value.into());
        instance.send_command("setvalue", Payload::Record(payload))
    }
}

// ── Command class domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

use super::value::{VALUE, Value};
use crate::event::{EVENT_COMMAND_CLASS_ADDED, EVENT_COMMAND_CLASS_CHANGED, EVENT_COMMAND_CLASS_REMOVED};
use crate::model::ItemId;
use crate::store::{Events, Schema, Slot};

pub static COMMAND_CLASS: Schema = Schema {
    name: "CommandClass",
    events: Events::item(
        EVENT_COMMAND_CLASS_ADDED,
        EVENT_COMMAND_CLASS_CHANGED,
        EVENT_COMMAND_CLASS_REMOVED,
    ),
    direct_collection: None,
    slots: &[Slot::collection("value", &VALUE)],
};

/// Well-known Z-Wave command class ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
#[non_exhaustive]
pub enum CommandClassId {
    NoOperation = 0,
    Basic = 32,
    ControllerReplication = 33,
    ApplicationStatus = 34,
    Zip = 35,
    SwitchBinary = 37,
    SwitchMultilevel = 38,
    SwitchAll = 39,
    SwitchToggleBinary = 40,
    SwitchToggleMultilevel = 41,
    SceneActivation = 43,
    SceneActuatorConf = 44,
    SceneControllerConf = 45,
    SensorBinary = 48,
    SensorMultilevel = 49,
    Meter = 50,
    SwitchColor = 51,
    MeterPulse = 53,
    ThermostatMode = 64,
    ThermostatOperatingState = 66,
    ThermostatSetpoint = 67,
    ThermostatFanMode = 68,
    ThermostatFanState = 69,
    ClimateControlSchedule = 70,
    ThermostatSetback = 71,
    DoorLockLogging = 76,
    ScheduleEntryLock = 78,
    BasicWindowCovering = 80,
    CentralScene = 91,
    AssociationGrpInfo = 89,
    DeviceResetLocally = 90,
    ZwaveplusInfo = 94,
    MultiChannel = 96,
    DoorLock = 98,
    UserCode = 99,
    BarrierOperator = 102,
    WindowCovering = 106,
    Supervision = 108,
    Configuration = 112,
    Notification = 113,
    ManufacturerSpecific = 114,
    Powerlevel = 115,
    Protection = 117,
    Lock = 118,
    NodeNaming = 119,
    SoundSwitch = 121,
    FirmwareUpdateMd = 122,
    Battery = 128,
    Clock = 129,
    Hail = 130,
    WakeUp = 132,
    Association = 133,
    Version = 134,
    Indicator = 135,
    Proprietary = 136,
    Language = 137,
    TimeParameters = 139,
    MultiChannelAssociation = 142,
    MultiCmd = 143,
    Security = 152,
    SensorAlarm = 156,
    SilenceAlarm = 157,
    Security2 = 159,
    Mark = 239,
    Unknown = 0xFFFF,
}

entity_view!(
    /// A command class exposed by a node instance.
    CommandClass => COMMAND_CLASS
);

node_child!(CommandClass);

impl<'a> CommandClass<'a> {
    record_fields! {
        instance: u64 => "Instance";
        command_class_code: u64 => "CommandClassId";
        /// Human readable label of the command class.
        command_class: &'a str => "CommandClass";
        time_stamp: DateTime<Utc> => "TimeStamp";
    }

    /// Typed command class id. Ids outside the known set are logged and
    /// reported as [`CommandClassId::Unknown`].
    pub fn command_class_id(&self) -> Option<CommandClassId> {
        let code = self.command_class_code()?;
        let known = u16::try_from(code).ok().and_then(CommandClassId::from_repr);
        Some(known.unwrap_or_else(|| {
            tracing::warn!(code, topic = %self.0.topic(), "unknown command class");
            CommandClassId::Unknown
        }))
    }

    pub fn get_value(&self, id: impl Into<ItemId>) -> Option<Value<'a>> {
        super::child(self.0, "value", id)
    }

    pub fn values(self) -> impl Iterator<Item = Value<'a>> + 'a {
        super::children(self.0, "value")
    }
}

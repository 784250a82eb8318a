// ── Message payloads ──
//
// The daemon publishes JSON objects; an empty MQTT payload means the
// retained message was cleared, i.e. the entity is gone.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A decoded message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// The empty payload: "no data", or a delete when it hits a
    /// collection item's own topic.
    Empty,
    Record(Map<String, Value>),
}

impl Payload {
    /// Decode a raw MQTT payload. The empty string is the delete marker;
    /// anything else must be a JSON object.
    pub fn from_raw(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Ok(Self::Empty);
        }
        match serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())? {
            Value::Object(map) => Ok(Self::Record(map)),
            other => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        }
    }

    /// Build a payload from an already-decoded JSON value.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self::Record(map.clone())),
            other => Err(format!("expected a JSON object, got {}", json_kind(other))),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_record(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Record(map) => Some(map),
            Self::Empty => None,
        }
    }

    /// Look up a single key of the record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_record()?.get(key)
    }

    /// The payload as a JSON value; `Empty` becomes `{}`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Record(map) => Value::Object(map.clone()),
            Self::Empty => Value::Object(Map::new()),
        }
    }

    /// Serialise for publishing: `Empty` is the empty string.
    pub fn to_raw(&self) -> String {
        match self {
            Self::Record(map) => Value::Object(map.clone()).to_string(),
            Self::Empty => String::new(),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Record(map)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(map) => write!(f, "{}", Value::Object(map.clone())),
            Self::Empty => write!(f, "<empty>"),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

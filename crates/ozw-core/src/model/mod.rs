// ── Z-Wave domain model ──
//
// Static schemas for every entity type the daemon publishes, plus typed
// views that read the raw JSON records. Views are thin `Copy` wrappers
// around `EntityRef`, so they cost nothing beyond the borrow.

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use crate::store::{CollectionRef, EntityRef, Schema};

macro_rules! entity_view {
    ($(#[$meta:meta])* $name:ident => $schema:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a>(crate::store::EntityRef<'a>);

        impl<'a> $name<'a> {
            pub fn entity(&self) -> crate::store::EntityRef<'a> {
                self.0
            }
        }

        impl<'a> std::ops::Deref for $name<'a> {
            type Target = crate::store::EntityRef<'a>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl<'a> TryFrom<crate::store::EntityRef<'a>> for $name<'a> {
            type Error = crate::store::EntityRef<'a>;

            fn try_from(entity: crate::store::EntityRef<'a>) -> Result<Self, Self::Error> {
                if entity.is(&$schema) {
                    Ok(Self(entity))
                } else {
                    Err(entity)
                }
            }
        }
    };
}

/// Typed getters over record keys. Also emits `FIELDS`, the list of keys
/// that have a getter; keys read by hand-written getters go in the
/// leading bracket.
macro_rules! record_fields {
    ($([$($extra:literal),* $(,)?])? $($(#[$meta:meta])* $method:ident: $ty:ty => $key:literal;)*) => {
        /// Record keys with a typed getter.
        pub const FIELDS: &'static [&'static str] = &[$($key,)* $($($extra,)*)?];

        $(
            $(#[$meta])*
            pub fn $method(&self) -> Option<$ty> {
                self.0
                    .field($key)
                    .and_then(crate::model::FromField::from_field)
            }
        )*
    };
}

/// `node()` and `Display` for types that live below a node.
macro_rules! node_child {
    ($name:ident) => {
        impl<'a> $name<'a> {
            /// The node this entity belongs to.
            pub fn node(&self) -> Result<crate::model::Node<'a>, crate::error::CoreError> {
                self.0
                    .ancestor(&crate::model::NODE)
                    .and_then(|entity| crate::model::Node::try_from(entity).ok())
                    .ok_or_else(|| crate::error::CoreError::AncestorNotFound {
                        kind: self.0.kind(),
                        ancestor: crate::model::NODE.name,
                        topic: self.0.topic(),
                    })
            }
        }

        impl std::fmt::Display for $name<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "<{}", self.0.kind())?;
                if let Some(id) = self.0.id() {
                    write!(f, " {id}")?;
                }
                match self.node().ok().and_then(|node| node.id()) {
                    Some(node) => write!(f, " (node: {node})>"),
                    None => write!(f, " (node: <missing>)>"),
                }
            }
        }
    };
}

mod association;
mod command_class;
mod instance;
mod item_id;
mod node;
mod node_instance;
mod payload;
mod statistics;
mod value;

pub use association::{NODE_ASSOCIATION, NodeAssociation};
pub use command_class::{COMMAND_CLASS, CommandClass, CommandClassId};
pub use instance::{INSTANCE, INSTANCE_STATUS, Instance, InstanceStatus};
pub use item_id::{ItemId, is_identifier};
pub use node::{NODE, Node};
pub use node_instance::{NODE_INSTANCE, NodeInstance};
pub use payload::Payload;
pub use statistics::{INSTANCE_STATISTICS, InstanceStatistics, NODE_STATISTICS, NodeStatistics};
pub use value::{VALUE, Value, ValueGenre, ValueType};

// ── Field conversion ─────────────────────────────────────────────────

/// Conversion from one JSON record value to a typed getter result.
/// Returns `None` when the value has the wrong JSON type.
pub trait FromField<'a>: Sized {
    fn from_field(value: &'a Json) -> Option<Self>;
}

impl<'a> FromField<'a> for &'a Json {
    fn from_field(value: &'a Json) -> Option<Self> {
        Some(value)
    }
}

impl<'a> FromField<'a> for &'a str {
    fn from_field(value: &'a Json) -> Option<Self> {
        value.as_str()
    }
}

impl FromField<'_> for bool {
    fn from_field(value: &Json) -> Option<Self> {
        value.as_bool()
    }
}

impl FromField<'_> for u64 {
    fn from_field(value: &Json) -> Option<Self> {
        value.as_u64()
    }
}

impl FromField<'_> for i64 {
    fn from_field(value: &Json) -> Option<Self> {
        value.as_i64()
    }
}

impl FromField<'_> for f64 {
    fn from_field(value: &Json) -> Option<Self> {
        value.as_f64()
    }
}

impl FromField<'_> for Vec<u64> {
    fn from_field(value: &Json) -> Option<Self> {
        value.as_array()?.iter().map(Json::as_u64).collect()
    }
}

/// The daemon stamps records with Unix seconds.
impl FromField<'_> for DateTime<Utc> {
    fn from_field(value: &Json) -> Option<Self> {
        DateTime::from_timestamp(value.as_i64()?, 0)
    }
}

/// Record keys that have a typed getter on `schema`'s view, or `None` for
/// schemas without a view (the manager root).
pub fn known_fields(schema: &Schema) -> Option<&'static [&'static str]> {
    let table: [(&Schema, &'static [&'static str]); 9] = [
        (&INSTANCE, Instance::FIELDS),
        (&INSTANCE_STATUS, InstanceStatus::FIELDS),
        (&INSTANCE_STATISTICS, InstanceStatistics::FIELDS),
        (&NODE, Node::FIELDS),
        (&NODE_STATISTICS, NodeStatistics::FIELDS),
        (&NODE_INSTANCE, NodeInstance::FIELDS),
        (&NODE_ASSOCIATION, NodeAssociation::FIELDS),
        (&COMMAND_CLASS, CommandClass::FIELDS),
        (&VALUE, Value::FIELDS),
    ];
    table
        .into_iter()
        .find(|(candidate, _)| candidate.is(schema))
        .map(|(_, fields)| fields)
}

/// Typed child of collection slot `slot`.
pub(crate) fn child<'a, T>(entity: EntityRef<'a>, slot: &str, id: impl Into<ItemId>) -> Option<T>
where
    T: TryFrom<EntityRef<'a>>,
{
    entity
        .collection(slot)?
        .get(id)
        .and_then(|child| T::try_from(child).ok())
}

/// Typed items of collection slot `slot`, in insertion order.
pub(crate) fn children<'a, T>(entity: EntityRef<'a>, slot: &str) -> impl Iterator<Item = T> + 'a
where
    T: TryFrom<EntityRef<'a>> + 'a,
{
    entity
        .collection(slot)
        .into_iter()
        .flat_map(CollectionRef::iter)
        .filter_map(|child| T::try_from(child).ok())
}

/// Typed singleton in slot `slot`, once it has received data.
pub(crate) fn singleton<'a, T>(entity: EntityRef<'a>, slot: &str) -> Option<T>
where
    T: TryFrom<EntityRef<'a>>,
{
    entity
        .singleton(slot)
        .filter(EntityRef::is_initialized)
        .and_then(|child| T::try_from(child).ok())
}

/// Record keys of `entity` that no typed getter reads.
pub fn unknown_fields<'a>(entity: &EntityRef<'a>) -> Vec<&'a str> {
    let Some(known) = known_fields(entity.schema()) else {
        return Vec::new();
    };
    entity
        .payload()
        .and_then(crate::model::Payload::as_record)
        .map(|record| {
            record
                .keys()
                .map(String::as_str)
                .filter(|key| !known.contains(key))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_fields_reject_wrong_types() {
        assert_eq!(u64::from_field(&json!(3)), Some(3));
        assert_eq!(u64::from_field(&json!("3")), None);
        assert_eq!(<&str>::from_field(&json!("x")), Some("x"));
    }

    #[test]
    fn timestamps_are_unix_seconds() {
        let ts = DateTime::<Utc>::from_field(&json!(1_580_000_000)).unwrap();
        assert_eq!(ts.to_rfc3339(), "2020-01-26T00:53:20+00:00");
    }

    #[test]
    fn int_lists_need_every_element() {
        assert_eq!(Vec::<u64>::from_field(&json!([1, 2])), Some(vec![1, 2]));
        assert_eq!(Vec::<u64>::from_field(&json!([1, "x"])), None);
    }

    static DETACHED_ROOT: Schema = Schema {
        name: "Root",
        events: crate::store::Events::NONE,
        direct_collection: None,
        slots: &[crate::store::Slot::collection("value", &VALUE)],
    };

    #[test]
    fn value_without_a_node_reports_missing_ancestor() {
        let bus = crate::event::EventBus::new();
        let mut tree = crate::store::EntityTree::new(&DETACHED_ROOT, "t", bus).unwrap();
        tree.process_message(crate::store::TopicPath::new(), Payload::Empty);
        tree.process_message(
            crate::store::split_topic("value/3"),
            Payload::from_value(&json!({"Label": "Level"})).unwrap(),
        );

        let entity = tree.root().collection("value").unwrap().get(3).unwrap();
        assert!(entity.ancestor(&NODE).is_none());
        let value = Value::try_from(entity).unwrap();
        assert!(matches!(
            value.node(),
            Err(crate::error::CoreError::AncestorNotFound { kind: "Value", ancestor: "Node", .. })
        ));
        assert_eq!(value.to_string(), "<Value 3 (node: <missing>)>");
    }

    #[test]
    fn every_view_has_a_field_table() {
        for schema in [&INSTANCE, &NODE, &VALUE, &COMMAND_CLASS, &NODE_INSTANCE] {
            assert!(known_fields(schema).is_some(), "{}", schema.name);
        }
    }
}

//! In-memory object model of an OpenZWave MQTT daemon.
//!
//! The daemon publishes one retained JSON record per entity under a topic
//! hierarchy (`OpenZWave/<instance>/node/<node>/instance/<n>/commandclass/<cc>/value/<v>`).
//! This crate turns that stream back into a typed tree:
//!
//! - **[`OzwManager`]**: Root of the tree. [`receive_message()`](OzwManager::receive_message)
//!   strips the topic prefix, decodes the payload and routes it. Entities are
//!   created lazily on first mention and removed (with their whole subtree)
//!   when an empty payload arrives on their own topic.
//!
//! - **[`store`]**: Schema-driven routing engine. Messages that arrive for a
//!   descendant before its ancestor's own record are buffered on the ancestor
//!   and replayed, in order, once it initializes.
//!
//! - **[`EventBus`]**: Synchronous named events (`node_added`,
//!   `value_changed`, ...) delivered with a borrowed view of the entity.
//!
//! - **Domain model** ([`model`]): typed views (`Instance`, `Node`,
//!   `CommandClass`, `Value`, ...) over the raw records.
//!
//! - **[`ingest`]**: Tokio task that owns a manager and consumes a message
//!   queue, for applications with concurrent MQTT callbacks.

pub mod command;
pub mod error;
pub mod event;
pub mod ingest;
pub mod manager;
pub mod model;
pub mod options;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{InstanceCommand, OutboundMessage, OutboundSender};
pub use error::CoreError;
pub use event::{EventBus, EventPayload, Listener, Subscription};
pub use ingest::{InboundMessage, IngestHandle};
pub use manager::{MANAGER, OzwManager};
pub use options::{DEFAULT_TOPIC_PREFIX, OzwOptions};
pub use store::{CollectionRef, EntityKey, EntityRef, EntityTree, PendingReport};

pub use model::{
    CommandClass, CommandClassId, Instance, InstanceStatistics, InstanceStatus, ItemId, Node,
    NodeAssociation, NodeInstance, NodeStatistics, Payload, Value, ValueGenre, ValueType,
};

// ── Entity store ──
//
// Arena-backed entity tree, id-keyed collections and the static type
// descriptors that drive routing.

mod collection;
pub mod schema;
mod tree;

pub use collection::CollectionRef;
pub use schema::{Events, Schema, Slot, SlotKind};
pub use tree::{EntityKey, EntityRef, EntityTree, PendingReport, TopicPath, split_topic};

// ── Entity tree and topic router ──
//
// Entities live in an arena keyed by `EntityKey`; each one records its
// parent key, so the upward walks (topic reconstruction, ancestor lookup)
// never need shared ownership. Routing is strictly sequential: one
// message is fully processed, including replays and event dispatch,
// before the next one starts.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::{debug, trace, warn};

use super::collection::{Collection, CollectionRef};
use super::schema::{Schema, SlotKind};
use crate::command::{OutboundMessage, OutboundSender};
use crate::error::CoreError;
use crate::event::{EventBus, EventPayload};
use crate::model::{ItemId, Payload, is_identifier};

/// Topic segments still to be consumed, front first.
pub type TopicPath = VecDeque<String>;

/// Split a topic suffix into a routable path. A trailing empty segment
/// (topic ending in `/`) is dropped.
pub fn split_topic(topic: &str) -> TopicPath {
    let mut path: TopicPath = topic.split('/').map(str::to_owned).collect();
    if path.back().is_some_and(String::is_empty) {
        path.pop_back();
    }
    path
}

// ── Arena types ──────────────────────────────────────────────────────

/// Arena handle of one entity. Keys are never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(u64);

/// A message held back until its target entity is initialized.
#[derive(Debug, Clone)]
pub(crate) struct PendingMessage {
    pub(crate) path: TopicPath,
    pub(crate) payload: Payload,
}

/// Per-slot child state of an entity, parallel to `Schema::slots`.
#[derive(Debug)]
pub(crate) enum SlotState {
    Collection(Collection),
    Singleton(EntityKey),
    Discard,
    Events(&'static str),
}

#[derive(Debug)]
pub(crate) struct EntityNode {
    pub(crate) schema: &'static Schema,
    pub(crate) id: Option<ItemId>,
    /// Owner and the index of the owning slot.
    pub(crate) parent: Option<(EntityKey, usize)>,
    pub(crate) topic_part: String,
    /// `None` until the first terminal message.
    pub(crate) payload: Option<Payload>,
    /// `Some` only while messages are buffered.
    pub(crate) pending: Option<Vec<PendingMessage>>,
    pub(crate) slots: Vec<SlotState>,
}

// ── EntityTree ───────────────────────────────────────────────────────

/// Owner of every entity reachable from one root.
pub struct EntityTree {
    pub(crate) nodes: HashMap<EntityKey, EntityNode>,
    root: EntityKey,
    next_key: u64,
    root_topic: String,
    pub(crate) bus: EventBus,
    outbound: Option<OutboundSender>,
}

impl EntityTree {
    /// Build a tree with an uninitialized root of type `schema`.
    ///
    /// `root_topic` is what the root's `topic` reports; descendants append
    /// their own parts to it.
    pub fn new(
        schema: &'static Schema,
        root_topic: impl Into<String>,
        bus: EventBus,
    ) -> Result<Self, CoreError> {
        schema.validate()?;
        let mut tree = Self {
            nodes: HashMap::new(),
            root: EntityKey(0),
            next_key: 0,
            root_topic: root_topic.into(),
            bus,
            outbound: None,
        };
        tree.root = tree.create_entity(schema, None, None, String::new());
        Ok(tree)
    }

    pub fn root(&self) -> EntityRef<'_> {
        EntityRef::new(self, self.root)
    }

    pub fn root_key(&self) -> EntityKey {
        self.root
    }

    pub fn entity(&self, key: EntityKey) -> Option<EntityRef<'_>> {
        self.nodes.contains_key(&key).then(|| EntityRef::new(self, key))
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Channel that `publish` sends on.
    pub fn set_outbound(&mut self, sender: Option<OutboundSender>) {
        self.outbound = sender;
    }

    /// Hand a message to the embedding application for publishing.
    pub fn publish(&self, message: OutboundMessage) -> Result<(), CoreError> {
        let Some(sender) = &self.outbound else {
            return Err(CoreError::SendFailed {
                topic: message.topic,
                reason: "no outbound channel configured".into(),
            });
        };
        debug!(topic = %message.topic, payload = %message.payload, "publishing");
        sender.send(message).map_err(|err| CoreError::SendFailed {
            topic: err.0.topic,
            reason: "outbound channel closed".into(),
        })
    }

    /// Number of live entities, shells and singletons included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every entity in depth-first order: slots in declaration order,
    /// collection items in insertion order. Shells are included.
    pub fn walk(&self) -> Vec<EntityRef<'_>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(&key) else {
                continue;
            };
            out.push(EntityRef::new(self, key));
            let mut children = Vec::new();
            for slot in &node.slots {
                match slot {
                    SlotState::Singleton(child) => children.push(*child),
                    SlotState::Collection(coll) => children.extend(coll.keys()),
                    SlotState::Discard | SlotState::Events(_) => {}
                }
            }
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Entities still holding buffered messages, with their queue lengths.
    pub fn pending_report(&self) -> Vec<PendingReport> {
        self.walk()
            .into_iter()
            .filter_map(|entity| {
                let count = entity.pending_count();
                (count > 0).then(|| PendingReport {
                    kind: entity.kind(),
                    topic: entity.topic(),
                    count,
                })
            })
            .collect()
    }

    /// Route a message addressed relative to the root.
    pub fn process_message(&mut self, path: TopicPath, payload: Payload) {
        self.route(self.root, path, payload);
    }

    // ── Construction ─────────────────────────────────────────────────

    pub(crate) fn create_entity(
        &mut self,
        schema: &'static Schema,
        parent: Option<(EntityKey, usize)>,
        id: Option<ItemId>,
        topic_part: String,
    ) -> EntityKey {
        let key = EntityKey(self.next_key);
        self.next_key += 1;

        let mut slots = Vec::with_capacity(schema.slots.len());
        for (idx, slot) in schema.slots.iter().enumerate() {
            let state = match slot.kind {
                SlotKind::Collection(item) => {
                    let named = schema.direct_collection != Some(slot.name);
                    SlotState::Collection(Collection::new(item, named.then_some(slot.name)))
                }
                SlotKind::Singleton(child) => SlotState::Singleton(self.create_entity(
                    child,
                    Some((key, idx)),
                    None,
                    slot.name.to_owned(),
                )),
                SlotKind::Discard => SlotState::Discard,
                SlotKind::Events { event } => SlotState::Events(event),
            };
            slots.push(state);
        }

        self.nodes.insert(
            key,
            EntityNode {
                schema,
                id,
                parent,
                topic_part,
                payload: None,
                pending: None,
                slots,
            },
        );
        key
    }

    // ── Routing ──────────────────────────────────────────────────────

    /// Process one message at entity `key`.
    pub(crate) fn route(&mut self, key: EntityKey, mut path: TopicPath, payload: Payload) {
        let Some(node) = self.nodes.get_mut(&key) else {
            debug!(?key, "target entity vanished, dropping message");
            return;
        };

        if path.is_empty() {
            if node.payload.is_some() {
                node.payload = Some(payload);
                let changed = node.schema.events.changed;
                if let Some(event) = changed {
                    self.notify_entity(event, key);
                }
                return;
            }

            node.payload = Some(payload);
            let pending = node.pending.take();
            self.announce(key);
            if let Some(pending) = pending {
                debug!(?key, count = pending.len(), "replaying pending messages");
                for message in pending {
                    self.route(key, message.path, message.payload);
                }
            }
            return;
        }

        if node.payload.is_none() {
            trace!(schema = node.schema.name, path = %join(&path), "buffering message");
            node.pending
                .get_or_insert_with(Vec::new)
                .push(PendingMessage { path, payload });
            return;
        }

        let schema = node.schema;
        let slot_idx = match path.front() {
            Some(segment) => match schema.slot_index(segment) {
                Some(idx) => {
                    path.pop_front();
                    Some(idx)
                }
                None if is_identifier(segment) => {
                    schema.direct_collection.and_then(|name| schema.slot_index(name))
                }
                None => None,
            },
            None => None,
        };

        let Some(slot_idx) = slot_idx else {
            self.warn_unroutable(key, &path, &payload);
            return;
        };

        let target = match &node.slots[slot_idx] {
            SlotState::Collection(_) => None,
            SlotState::Singleton(child) => Some(*child),
            SlotState::Discard => {
                trace!(schema = schema.name, slot = schema.slots[slot_idx].name, "discarding message");
                return;
            }
            SlotState::Events(event) => {
                let event = *event;
                self.forward_event(key, event, path, &payload);
                return;
            }
        };

        match target {
            Some(child) => self.route(child, path, payload),
            None => self.collection_message(key, slot_idx, path, payload),
        }
    }

    fn forward_event(&self, key: EntityKey, event: &'static str, mut path: TopicPath, payload: &Payload) {
        let Some(name) = path.pop_front() else {
            self.warn_unroutable(key, &path, payload);
            return;
        };
        let data = serde_json::json!({
            "event": name,
            "data": payload.to_value(),
        });
        self.bus.notify(event, &EventPayload::Record(&data));
    }

    /// First payload of an entity: collection items are announced.
    fn announce(&self, key: EntityKey) {
        let Some(node) = self.nodes.get(&key) else {
            return;
        };
        if node.id.is_none() {
            return;
        }
        if let Some(event) = node.schema.events.added {
            debug!(schema = node.schema.name, topic = %EntityRef::new(self, key).topic(), "entity added");
            self.notify_entity(event, key);
        }
    }

    pub(crate) fn notify_entity(&self, event: &str, key: EntityKey) {
        self.bus
            .notify(event, &EventPayload::Entity(EntityRef::new(self, key)));
    }

    pub(crate) fn warn_unroutable(&self, key: EntityKey, path: &TopicPath, payload: &Payload) {
        let entity = EntityRef::new(self, key);
        let topic = if path.is_empty() {
            entity.topic()
        } else {
            format!("{}/{}", entity.topic(), join(path))
        };
        warn!(schema = entity.kind(), %topic, %payload, "cannot process message");
    }
}

impl fmt::Debug for EntityTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTree")
            .field("root_topic", &self.root_topic)
            .field("entities", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

fn join(path: &TopicPath) -> String {
    path.iter().map(String::as_str).collect::<Vec<_>>().join("/")
}

/// One line of `EntityTree::pending_report`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PendingReport {
    pub kind: &'static str,
    pub topic: String,
    pub count: usize,
}

// ── EntityRef ────────────────────────────────────────────────────────

/// Read-only handle to a live entity.
///
/// Borrowing the tree keeps the entity alive for the handle's lifetime,
/// which is how listeners can inspect an entity during its `removed`
/// event.
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    tree: &'a EntityTree,
    key: EntityKey,
    node: &'a EntityNode,
}

impl<'a> EntityRef<'a> {
    /// Callers guarantee `key` is live.
    pub(crate) fn new(tree: &'a EntityTree, key: EntityKey) -> Self {
        Self {
            tree,
            key,
            node: &tree.nodes[&key],
        }
    }

    pub fn key(&self) -> EntityKey {
        self.key
    }

    pub fn tree(&self) -> &'a EntityTree {
        self.tree
    }

    pub fn schema(&self) -> &'static Schema {
        self.node.schema
    }

    /// Type name, e.g. `"Node"`.
    pub fn kind(&self) -> &'static str {
        self.node.schema.name
    }

    pub fn is(&self, schema: &Schema) -> bool {
        self.node.schema.is(schema)
    }

    /// Id within the owning collection; `None` for the root and singletons.
    pub fn id(&self) -> Option<&'a ItemId> {
        self.node.id.as_ref()
    }

    /// The entity's own payload, `None` while uninitialized.
    pub fn payload(&self) -> Option<&'a Payload> {
        self.node.payload.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.node.payload.is_some()
    }

    /// A single key of the entity's record.
    pub fn field(&self, key: &str) -> Option<&'a serde_json::Value> {
        self.payload()?.get(key)
    }

    pub fn pending_count(&self) -> usize {
        self.node.pending.as_ref().map_or(0, Vec::len)
    }

    pub fn parent(&self) -> Option<EntityRef<'a>> {
        self.node
            .parent
            .map(|(parent, _)| EntityRef::new(self.tree, parent))
    }

    /// Nearest proper ancestor of type `schema`.
    pub fn ancestor(&self, schema: &Schema) -> Option<EntityRef<'a>> {
        let mut current = self.parent();
        while let Some(entity) = current {
            if entity.is(schema) {
                return Some(entity);
            }
            current = entity.parent();
        }
        None
    }

    /// Full topic that addresses this entity.
    pub fn topic(&self) -> String {
        let mut parts = Vec::new();
        let mut current = Some(*self);
        while let Some(entity) = current {
            match entity.parent() {
                Some(parent) => {
                    parts.push(entity.node.topic_part.as_str());
                    current = Some(parent);
                }
                None => {
                    parts.push(self.tree.root_topic.as_str());
                    current = None;
                }
            }
        }
        parts.reverse();
        parts.join("/")
    }

    /// Child collection held in slot `name`.
    pub fn collection(&self, name: &str) -> Option<CollectionRef<'a>> {
        let idx = self.node.schema.slot_index(name)?;
        match self.node.slots.get(idx)? {
            SlotState::Collection(coll) => Some(CollectionRef::new(self.tree, coll)),
            _ => None,
        }
    }

    /// Singleton child held in slot `name`.
    pub fn singleton(&self, name: &str) -> Option<EntityRef<'a>> {
        let idx = self.node.schema.slot_index(name)?;
        match self.node.slots.get(idx)? {
            SlotState::Singleton(key) => Some(EntityRef::new(self.tree, *key)),
            _ => None,
        }
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("kind", &self.kind())
            .field("id", &self.node.id)
            .field("topic", &self.topic())
            .field("payload", &self.node.payload)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::schema::{Events, Slot};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    static LEAF: Schema = Schema::leaf("Leaf", Events::item("leaf_added", "leaf_changed", "leaf_removed"));
    static STATS: Schema = Schema::leaf("Stats", Events::changed_only("stats_changed"));
    static ROOT: Schema = Schema {
        name: "Root",
        events: Events::NONE,
        direct_collection: Some("leaf"),
        slots: &[
            Slot::collection("leaf", &LEAF),
            Slot::collection("other", &LEAF),
            Slot::singleton("stats", &STATS),
            Slot::discard("command"),
            Slot::events("event", "root_event"),
        ],
    };

    fn record(value: serde_json::Value) -> Payload {
        Payload::from_value(&value).unwrap()
    }

    fn tree() -> EntityTree {
        let mut tree = EntityTree::new(&ROOT, "base", EventBus::new()).unwrap();
        tree.process_message(TopicPath::new(), Payload::Empty);
        tree
    }

    fn log_events(bus: &EventBus, names: &[&'static str]) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for &name in names {
            let log = Arc::clone(&log);
            let _ = bus.listen(name, move |payload| {
                let tag = match payload.entity() {
                    Some(entity) => format!("{name}:{}", entity.topic()),
                    None => format!("{name}:{}", payload.record().unwrap()),
                };
                log.lock().unwrap().push(tag);
            });
        }
        log
    }

    #[test]
    fn split_topic_drops_trailing_empty_segment() {
        assert_eq!(split_topic("1/node/2/"), TopicPath::from(vec!["1".into(), "node".into(), "2".into()]));
        assert_eq!(split_topic(""), TopicPath::new());
    }

    #[test]
    fn singletons_exist_from_construction() {
        let tree = tree();
        let stats = tree.root().singleton("stats").unwrap();
        assert!(!stats.is_initialized());
        assert_eq!(stats.topic(), "base/stats");
        assert!(stats.id().is_none());
    }

    #[test]
    fn singleton_changes_after_first_payload() {
        let mut tree = tree();
        let log = log_events(tree.bus(), &["stats_changed"]);
        tree.process_message(split_topic("stats"), record(json!({"a": 1})));
        assert!(log.lock().unwrap().is_empty());
        tree.process_message(split_topic("stats"), record(json!({"a": 2})));
        assert_eq!(*log.lock().unwrap(), vec!["stats_changed:base/stats"]);
        assert_eq!(tree.root().singleton("stats").unwrap().field("a"), Some(&json!(2)));
    }

    #[test]
    fn topic_parts_follow_addressing() {
        let mut tree = tree();
        tree.process_message(split_topic("7"), record(json!({})));
        tree.process_message(split_topic("other/8"), record(json!({})));
        let root = tree.root();
        assert_eq!(root.topic(), "base");
        assert_eq!(root.collection("leaf").unwrap().get(7).unwrap().topic(), "base/7");
        assert_eq!(root.collection("other").unwrap().get(8).unwrap().topic(), "base/other/8");
    }

    #[test]
    fn discard_slot_swallows_messages() {
        let mut tree = tree();
        let before = tree.len();
        tree.process_message(split_topic("command/addnode"), record(json!({"secure": true})));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn events_slot_forwards_record() {
        let mut tree = tree();
        let log = log_events(tree.bus(), &["root_event"]);
        tree.process_message(split_topic("event/ping"), record(json!({"x": 1})));
        assert_eq!(
            *log.lock().unwrap(),
            vec![r#"root_event:{"event":"ping","data":{"x":1}}"#]
        );
    }

    #[test]
    fn unroutable_segment_is_dropped() {
        let mut tree = tree();
        let before = tree.len();
        tree.process_message(split_topic("bogus/1"), record(json!({})));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn uninitialized_root_buffers() {
        let mut tree = EntityTree::new(&ROOT, "base", EventBus::new()).unwrap();
        tree.process_message(split_topic("1"), record(json!({})));
        assert_eq!(tree.pending_report(), vec![PendingReport {
            kind: "Root",
            topic: "base".into(),
            count: 1,
        }]);
        tree.process_message(TopicPath::new(), Payload::Empty);
        assert!(tree.pending_report().is_empty());
        assert!(tree.root().collection("leaf").unwrap().get(1).is_some());
    }

    #[test]
    fn walk_is_depth_first_in_slot_order() {
        let mut tree = tree();
        tree.process_message(split_topic("other/2"), record(json!({})));
        tree.process_message(split_topic("1"), record(json!({})));
        let topics: Vec<String> = tree.walk().iter().map(EntityRef::topic).collect();
        assert_eq!(topics, vec!["base", "base/1", "base/other/2", "base/stats"]);
    }
}

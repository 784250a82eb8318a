// ── Id-keyed entity collection ──
//
// A collection maps item ids to arena keys for one item type. It owns
// lazy creation of items and the cascading removal that fires
// deepest-first `removed` events.

use indexmap::IndexMap;
use tracing::debug;

use super::schema::Schema;
use super::tree::{EntityKey, EntityRef, EntityTree, SlotState, TopicPath};
use crate::model::{ItemId, Payload};

/// Children of one collection slot.
#[derive(Debug)]
pub(crate) struct Collection {
    item: &'static Schema,
    /// Slot name for topic reconstruction; `None` for a direct collection,
    /// whose items are addressed by bare id.
    name: Option<&'static str>,
    items: IndexMap<ItemId, EntityKey>,
}

impl Collection {
    pub(crate) fn new(item: &'static Schema, name: Option<&'static str>) -> Self {
        Self {
            item,
            name,
            items: IndexMap::new(),
        }
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.items.values().copied()
    }
}

impl EntityTree {
    /// Deliver a message to collection slot `slot` of `owner`. The first
    /// path segment selects (or creates) the item.
    pub(crate) fn collection_message(
        &mut self,
        owner: EntityKey,
        slot: usize,
        mut path: TopicPath,
        payload: Payload,
    ) {
        let Some(segment) = path.pop_front() else {
            self.warn_unroutable(owner, &path, &payload);
            return;
        };
        let id = ItemId::from(segment.as_str());

        let Some(SlotState::Collection(coll)) = self
            .nodes
            .get(&owner)
            .and_then(|node| node.slots.get(slot))
        else {
            return;
        };
        let (item_schema, name) = (coll.item, coll.name);

        let child = match coll.items.get(&id).copied() {
            Some(child) => child,
            None if payload.is_empty() => {
                debug!(schema = item_schema.name, %id, "ignoring delete of unknown item");
                return;
            }
            None => {
                let topic_part = match name {
                    Some(name) => format!("{name}/{segment}"),
                    None => segment,
                };
                let child = self.create_entity(item_schema, Some((owner, slot)), Some(id.clone()), topic_part);
                if let Some(SlotState::Collection(coll)) = self
                    .nodes
                    .get_mut(&owner)
                    .and_then(|node| node.slots.get_mut(slot))
                {
                    coll.items.insert(id, child);
                }
                child
            }
        };

        if path.is_empty() && payload.is_empty() {
            self.remove_and_notify(child);
            return;
        }

        self.route(child, path, payload);
    }

    /// Remove an item and everything below it.
    ///
    /// Items of the entity's own collections go first (recursively), then
    /// the entity's `removed` event fires while it is still in the tree.
    /// Items that were never initialized were never announced and leave
    /// silently.
    pub(crate) fn remove_and_notify(&mut self, key: EntityKey) {
        let Some(node) = self.nodes.get(&key) else {
            return;
        };
        let children: Vec<EntityKey> = node
            .slots
            .iter()
            .filter_map(|slot| match slot {
                SlotState::Collection(coll) => Some(coll.keys()),
                _ => None,
            })
            .flatten()
            .collect();

        for child in children {
            self.remove_and_notify(child);
        }

        let Some(node) = self.nodes.get(&key) else {
            return;
        };
        if node.payload.is_some() {
            if let Some(event) = node.schema.events.removed {
                debug!(schema = node.schema.name, topic = %EntityRef::new(self, key).topic(), "entity removed");
                self.notify_entity(event, key);
            }
        }

        self.detach(key);
    }

    /// Unlink `key` from its owning collection and free its subtree.
    fn detach(&mut self, key: EntityKey) {
        let Some(node) = self.nodes.get(&key) else {
            return;
        };
        if let (Some((owner, slot)), Some(id)) = (node.parent, node.id.clone()) {
            if let Some(SlotState::Collection(coll)) = self
                .nodes
                .get_mut(&owner)
                .and_then(|node| node.slots.get_mut(slot))
            {
                coll.items.shift_remove(&id);
            }
        }
        self.free(key);
    }

    fn free(&mut self, key: EntityKey) {
        let Some(node) = self.nodes.remove(&key) else {
            return;
        };
        for slot in node.slots {
            match slot {
                SlotState::Singleton(child) => self.free(child),
                SlotState::Collection(coll) => {
                    for child in coll.items.into_values() {
                        self.free(child);
                    }
                }
                SlotState::Discard | SlotState::Events(_) => {}
            }
        }
    }
}

// ── CollectionRef ────────────────────────────────────────────────────

/// Read-only view of a collection.
///
/// Only announced (initialized) items are visible; shells created to
/// buffer messages for their descendants are skipped.
#[derive(Clone, Copy)]
pub struct CollectionRef<'a> {
    tree: &'a EntityTree,
    coll: &'a Collection,
}

impl<'a> CollectionRef<'a> {
    pub(crate) fn new(tree: &'a EntityTree, coll: &'a Collection) -> Self {
        Self { tree, coll }
    }

    /// Item type held by this collection.
    pub fn item_schema(&self) -> &'static Schema {
        self.coll.item
    }

    pub fn get(&self, id: impl Into<ItemId>) -> Option<EntityRef<'a>> {
        let key = *self.coll.items.get(&id.into())?;
        let entity = EntityRef::new(self.tree, key);
        entity.is_initialized().then_some(entity)
    }

    pub fn iter(self) -> impl Iterator<Item = EntityRef<'a>> + 'a {
        let tree = self.tree;
        self.coll
            .items
            .values()
            .map(move |key| EntityRef::new(tree, *key))
            .filter(EntityRef::is_initialized)
    }

    pub fn ids(self) -> impl Iterator<Item = &'a ItemId> + 'a {
        self.iter().filter_map(|entity| entity.id())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl std::fmt::Debug for CollectionRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::store::schema::{Events, Slot};
    use crate::store::tree::split_topic;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    static GRANDCHILD: Schema = Schema::leaf("Grandchild", Events::item("gc_added", "gc_changed", "gc_removed"));
    static CHILD: Schema = Schema {
        name: "Child",
        events: Events::item("child_added", "child_changed", "child_removed"),
        direct_collection: Some("gc"),
        slots: &[Slot::collection("gc", &GRANDCHILD)],
    };
    static ROOT: Schema = Schema {
        name: "Root",
        events: Events::NONE,
        direct_collection: Some("child"),
        slots: &[Slot::collection("child", &CHILD)],
    };

    fn tree() -> (EntityTree, Arc<Mutex<Vec<String>>>) {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in [
            "child_added",
            "child_changed",
            "child_removed",
            "gc_added",
            "gc_removed",
        ] {
            let log = Arc::clone(&log);
            let _ = bus.listen(name, move |payload| {
                let entity = payload.entity().unwrap();
                log.lock().unwrap().push(format!("{name}:{}", entity.topic()));
            });
        }
        let mut tree = EntityTree::new(&ROOT, "r", bus).unwrap();
        tree.process_message(TopicPath::new(), Payload::Empty);
        (tree, log)
    }

    fn record() -> Payload {
        Payload::from_value(&json!({"v": 1})).unwrap()
    }

    #[test]
    fn delete_of_unknown_id_is_a_noop() {
        let (mut tree, log) = tree();
        tree.process_message(split_topic("5"), Payload::Empty);
        tree.process_message(split_topic("5/gc/1"), Payload::Empty);
        assert!(tree.root().collection("child").unwrap().is_empty());
        assert_eq!(tree.len(), 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn cascade_removes_deepest_first() {
        let (mut tree, log) = tree();
        tree.process_message(split_topic("1"), record());
        tree.process_message(split_topic("1/2"), record());
        tree.process_message(split_topic("1/gc/3"), record());
        log.lock().unwrap().clear();

        tree.process_message(split_topic("1"), Payload::Empty);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["gc_removed:r/1/2", "gc_removed:r/1/3", "child_removed:r/1"]
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn removed_listener_sees_entity_in_tree() {
        let (mut tree, _log) = tree();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let _s = tree.bus().listen("child_removed", move |payload| {
            let entity = payload.entity().unwrap();
            let still_listed = entity.parent().unwrap().collection("child").unwrap().get(1).is_some();
            *sink.lock().unwrap() = Some((entity.field("v").cloned(), still_listed));
        });
        tree.process_message(split_topic("1"), record());
        tree.process_message(split_topic("1"), Payload::Empty);
        assert_eq!(*seen.lock().unwrap(), Some((Some(json!(1)), true)));
        assert!(tree.root().collection("child").unwrap().get(1).is_none());
    }

    #[test]
    fn removing_a_shell_fires_nothing() {
        let (mut tree, log) = tree();
        tree.process_message(split_topic("1/2"), record());
        assert_eq!(tree.len(), 2);
        tree.process_message(split_topic("1"), Payload::Empty);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn shells_are_hidden() {
        let (mut tree, _log) = tree();
        tree.process_message(split_topic("1/2"), record());
        let children = tree.root().collection("child").unwrap();
        assert!(children.get(1).is_none());
        assert_eq!(children.len(), 0);
        assert_eq!(tree.walk().len(), 2);
    }

    #[test]
    fn empty_path_at_collection_is_dropped() {
        let (mut tree, log) = tree();
        tree.process_message(split_topic("child"), record());
        assert_eq!(tree.len(), 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn readded_item_is_announced_again() {
        let (mut tree, log) = tree();
        tree.process_message(split_topic("1"), record());
        tree.process_message(split_topic("1"), Payload::Empty);
        tree.process_message(split_topic("1"), record());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["child_added:r/1", "child_removed:r/1", "child_added:r/1"]
        );
    }

    #[test]
    fn iteration_keeps_insertion_order() {
        let (mut tree, _log) = tree();
        for id in ["3", "1", "2"] {
            tree.process_message(split_topic(id), record());
        }
        let ids: Vec<String> = tree
            .root()
            .collection("child")
            .unwrap()
            .ids()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }
}

// ── OZW manager ──
//
// Root of the entity tree. Strips the configured topic prefix from
// inbound MQTT messages, applies the instance filter, decodes the payload
// and hands the remaining path to the router.

use serde_json::Value as Json;
use tracing::debug;

use crate::error::CoreError;
use crate::event::{EventPayload, Subscription};
use crate::model::{INSTANCE, Instance, ItemId, Payload};
use crate::options::OzwOptions;
use crate::store::{EntityRef, EntityTree, Events, PendingReport, Schema, Slot, TopicPath, split_topic};

/// Root type: a bare numeric segment addresses an instance.
pub static MANAGER: Schema = Schema {
    name: "Manager",
    events: Events::NONE,
    direct_collection: Some("instance"),
    slots: &[Slot::collection("instance", &INSTANCE)],
};

/// Holds every OpenZWave instance seen on the broker.
#[derive(Debug)]
pub struct OzwManager {
    options: OzwOptions,
    tree: EntityTree,
}

impl OzwManager {
    pub fn new(options: OzwOptions) -> Result<Self, CoreError> {
        options.validate()?;
        let root_topic = options
            .topic_prefix
            .strip_suffix('/')
            .unwrap_or(&options.topic_prefix)
            .to_owned();

        let mut tree = EntityTree::new(&MANAGER, root_topic, options.bus.clone())?;
        tree.set_outbound(options.outbound.clone());
        // The root has no message of its own; initialise it so instances
        // are created directly instead of being buffered.
        tree.process_message(TopicPath::new(), Payload::Empty);

        Ok(Self { options, tree })
    }

    pub fn options(&self) -> &OzwOptions {
        &self.options
    }

    /// Feed one raw MQTT message. An empty `raw` payload is the delete
    /// marker; anything else must be a JSON object.
    pub fn receive_message(&mut self, topic: &str, raw: &str) -> Result<(), CoreError> {
        let Some(path) = self.route_path(topic)? else {
            return Ok(());
        };
        let payload = Payload::from_raw(raw).map_err(|message| CoreError::Deserialization {
            topic: topic.to_owned(),
            message,
        })?;
        self.tree.process_message(path, payload);
        Ok(())
    }

    /// Feed an already-decoded JSON payload.
    pub fn receive_json(&mut self, topic: &str, value: &Json) -> Result<(), CoreError> {
        let Some(path) = self.route_path(topic)? else {
            return Ok(());
        };
        let payload = Payload::from_value(value).map_err(|message| CoreError::Deserialization {
            topic: topic.to_owned(),
            message,
        })?;
        self.tree.process_message(path, payload);
        Ok(())
    }

    /// Prefix check and instance filter. `None` means "filtered out".
    fn route_path(&self, topic: &str) -> Result<Option<TopicPath>, CoreError> {
        let prefix = &self.options.topic_prefix;
        let Some(rest) = topic.strip_prefix(prefix.as_str()) else {
            return Err(CoreError::TopicPrefix {
                topic: topic.to_owned(),
                prefix: prefix.clone(),
            });
        };
        let path = split_topic(rest);

        if let (Some(wanted), Some(first)) = (&self.options.instance_id, path.front()) {
            if ItemId::from(first.as_str()) != *wanted {
                debug!(topic, instance = %wanted, "message for another instance, dropping");
                return Ok(None);
            }
        }
        Ok(Some(path))
    }

    pub fn get_instance(&self, id: impl Into<ItemId>) -> Option<Instance<'_>> {
        self.tree
            .root()
            .collection("instance")?
            .get(id)
            .and_then(|entity| Instance::try_from(entity).ok())
    }

    pub fn instances(&self) -> impl Iterator<Item = Instance<'_>> + '_ {
        self.tree
            .root()
            .collection("instance")
            .into_iter()
            .flat_map(crate::store::CollectionRef::iter)
            .filter_map(|entity| Instance::try_from(entity).ok())
    }

    pub fn listen<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&EventPayload<'_>) + Send + Sync + 'static,
    {
        self.options.bus.listen(event, listener)
    }

    pub fn root(&self) -> EntityRef<'_> {
        self.tree.root()
    }

    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    /// Entities still waiting for their own message.
    pub fn pending_report(&self) -> Vec<PendingReport> {
        self.tree.pending_report()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn topic_outside_prefix_is_rejected() {
        let mut mgr = OzwManager::new(OzwOptions::default()).unwrap();
        let err = mgr.receive_message("other/1", "{}").unwrap_err();
        assert!(matches!(err, CoreError::TopicPrefix { .. }), "{err}");
    }

    #[test]
    fn non_object_payload_is_a_deserialization_error() {
        let mut mgr = OzwManager::new(OzwOptions::default()).unwrap();
        let err = mgr.receive_message("OpenZWave/1", "[]").unwrap_err();
        assert!(matches!(err, CoreError::Deserialization { .. }), "{err}");
        assert!(mgr.get_instance(1).is_none());
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let mut mgr = OzwManager::new(OzwOptions::default()).unwrap();
        mgr.receive_message("OpenZWave/1/", "{}").unwrap();
        assert_eq!(mgr.get_instance("1").unwrap().topic(), "OpenZWave/1");
    }

    #[test]
    fn instance_filter_drops_other_instances() {
        let options = OzwOptions {
            instance_id: Some(ItemId::from(2)),
            ..OzwOptions::default()
        };
        let mut mgr = OzwManager::new(options).unwrap();
        mgr.receive_json("OpenZWave/1", &json!({})).unwrap();
        mgr.receive_message("OpenZWave/1/node/2", "not json").unwrap();
        mgr.receive_json("OpenZWave/2", &json!({})).unwrap();
        let ids: Vec<String> = mgr.instances().map(|i| i.id().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn invalid_prefix_fails_construction() {
        assert!(OzwManager::new(OzwOptions::with_prefix("nope")).is_err());
    }
}

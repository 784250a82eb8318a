// ── Entity type descriptors ──
//
// Each entity type is a `static Schema`: its lifecycle event names, the
// child slots it owns and which collection (if any) absorbs bare numeric
// segments. Schemas reference each other by address, so the whole type
// hierarchy is resolved at compile time.

use crate::error::CoreError;

/// Lifecycle event names of one entity type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Events {
    pub added: Option<&'static str>,
    pub changed: Option<&'static str>,
    pub removed: Option<&'static str>,
}

impl Events {
    pub const NONE: Self = Self {
        added: None,
        changed: None,
        removed: None,
    };

    /// Events of a type that lives in a collection.
    pub const fn item(added: &'static str, changed: &'static str, removed: &'static str) -> Self {
        Self {
            added: Some(added),
            changed: Some(changed),
            removed: Some(removed),
        }
    }

    /// Events of a singleton child, which is only ever changed.
    pub const fn changed_only(changed: &'static str) -> Self {
        Self {
            added: None,
            changed: Some(changed),
            removed: None,
        }
    }
}

/// What a named child slot holds.
#[derive(Debug, Clone, Copy)]
pub enum SlotKind {
    /// Id-keyed children of one type.
    Collection(&'static Schema),
    /// Exactly one child, built together with its owner.
    Singleton(&'static Schema),
    /// Accept and drop everything below this slot.
    Discard,
    /// Forward each message as `event` with data
    /// `{"event": <next segment>, "data": <payload>}`.
    Events { event: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub name: &'static str,
    pub kind: SlotKind,
}

impl Slot {
    pub const fn collection(name: &'static str, item: &'static Schema) -> Self {
        Self {
            name,
            kind: SlotKind::Collection(item),
        }
    }

    pub const fn singleton(name: &'static str, child: &'static Schema) -> Self {
        Self {
            name,
            kind: SlotKind::Singleton(child),
        }
    }

    pub const fn discard(name: &'static str) -> Self {
        Self {
            name,
            kind: SlotKind::Discard,
        }
    }

    pub const fn events(name: &'static str, event: &'static str) -> Self {
        Self {
            name,
            kind: SlotKind::Events { event },
        }
    }
}

/// Static description of an entity type.
#[derive(Debug)]
pub struct Schema {
    /// Type name used in diagnostics and display.
    pub name: &'static str,
    pub events: Events,
    /// Slot that receives numeric segments which match no slot name.
    pub direct_collection: Option<&'static str>,
    pub slots: &'static [Slot],
}

impl Schema {
    /// A schema with no children.
    pub const fn leaf(name: &'static str, events: Events) -> Self {
        Self {
            name,
            events,
            direct_collection: None,
            slots: &[],
        }
    }

    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    pub fn slot(&self, name: &str) -> Option<&'static Slot> {
        let slots: &'static [Slot] = self.slots;
        slots.iter().find(|slot| slot.name == name)
    }

    /// Identity comparison; two schemas are the same type only if they are
    /// the same static.
    pub fn is(&self, other: &Schema) -> bool {
        std::ptr::eq(self, other)
    }

    /// Check the schema and everything reachable from it for wiring bugs.
    pub fn validate(&'static self) -> Result<(), CoreError> {
        let mut seen: Vec<&'static Schema> = Vec::new();
        self.validate_inner(&mut seen)
    }

    /// Singletons are built eagerly with their owner, so a singleton chain
    /// that leads back to an enclosing type would never terminate.
    fn check_singleton_chain(&'static self, chain: &mut Vec<&'static Schema>) -> Result<(), CoreError> {
        if chain.iter().any(|s| s.is(self)) {
            return Err(CoreError::schema(self.name, "singleton slots form a cycle"));
        }
        chain.push(self);
        for slot in self.slots {
            if let SlotKind::Singleton(child) = slot.kind {
                child.check_singleton_chain(chain)?;
            }
        }
        chain.pop();
        Ok(())
    }

    fn validate_inner(&'static self, seen: &mut Vec<&'static Schema>) -> Result<(), CoreError> {
        if seen.iter().any(|s| s.is(self)) {
            return Ok(());
        }
        seen.push(self);
        self.check_singleton_chain(&mut Vec::new())?;

        for (idx, slot) in self.slots.iter().enumerate() {
            if self.slots[..idx].iter().any(|s| s.name == slot.name) {
                return Err(CoreError::schema(
                    self.name,
                    format!("duplicate slot '{}'", slot.name),
                ));
            }
        }

        if let Some(direct) = self.direct_collection {
            match self.slot(direct) {
                Some(Slot {
                    kind: SlotKind::Collection(_),
                    ..
                }) => {}
                Some(_) => {
                    return Err(CoreError::schema(
                        self.name,
                        format!("direct collection '{direct}' is not a collection slot"),
                    ));
                }
                None => {
                    return Err(CoreError::schema(
                        self.name,
                        format!("direct collection '{direct}' has no slot"),
                    ));
                }
            }
        }

        for slot in self.slots {
            match slot.kind {
                SlotKind::Collection(item) => {
                    if item.events.added.is_none() || item.events.removed.is_none() {
                        return Err(CoreError::schema(
                            item.name,
                            format!(
                                "held by collection '{}' of {} but has no added/removed events",
                                slot.name, self.name
                            ),
                        ));
                    }
                    item.validate_inner(seen)?;
                }
                SlotKind::Singleton(child) => child.validate_inner(seen)?,
                SlotKind::Discard | SlotKind::Events { .. } => {}
            }
        }
        Ok(())
    }
}

//! Index structures shared by the builder and the model.
//!
//! Entities live in one arena keyed by [`EntityId`]; attributions and events
//! are auxiliary indexes into it and never own entity data.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeKind};
use crate::entity::{Entity, EntityId, IdentifierAllocator};
use crate::error::ModelError;

/// What to do when an entity receives a second attribute of the same kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Overwrite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityStore {
    pub fn create(&mut self, ids: &mut IdentifierAllocator, entity: Entity) -> EntityId {
        let id = ids.next_id();
        tracing::trace!(entity = %id, context = %entity, "created entity");
        self.entities.insert(id, entity);
        id
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// `kind -> (entity -> attribute)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AttributionCollection {
    attributions: BTreeMap<AttributeKind, BTreeMap<EntityId, Attribute>>,
}

impl AttributionCollection {
    /// Store `attribute` for `entity` under `kind`, returning any value it replaced.
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateAttribution`] when `entity` already has an
    /// attribute of `kind` and `policy` is [`DuplicatePolicy::Reject`].
    pub fn record(
        &mut self,
        entity: EntityId,
        kind: &str,
        attribute: Attribute,
        policy: DuplicatePolicy,
    ) -> Result<Option<Attribute>, ModelError> {
        if policy == DuplicatePolicy::Reject && self.get(entity, kind).is_some() {
            return Err(ModelError::DuplicateAttribution { kind: kind.to_string(), entity });
        }
        let replaced =
            self.attributions.entry(kind.to_string()).or_default().insert(entity, attribute);
        if replaced.is_some() {
            tracing::warn!(entity = %entity, kind, "overwrote existing attribution");
        }
        Ok(replaced)
    }

    #[must_use]
    pub fn get(&self, entity: EntityId, kind: &str) -> Option<&Attribute> {
        self.attributions.get(kind).and_then(|attribution| attribution.get(&entity))
    }

    /// First `(kind, attribute)` for `entity`, in kind order.
    #[must_use]
    pub fn first(&self, entity: EntityId) -> Option<(&str, &Attribute)> {
        self.attributions.iter().find_map(|(kind, attribution)| {
            attribution.get(&entity).map(|attribute| (kind.as_str(), attribute))
        })
    }

    /// Every `(kind, attribute)` for `entity`, in kind order.
    pub fn all(&self, entity: EntityId) -> impl Iterator<Item = (&str, &Attribute)> + '_ {
        self.attributions.iter().filter_map(move |(kind, attribution)| {
            attribution.get(&entity).map(|attribute| (kind.as_str(), attribute))
        })
    }

    #[must_use]
    pub fn has_any(&self, entity: EntityId) -> bool {
        self.attributions.values().any(|attribution| attribution.contains_key(&entity))
    }

    #[must_use]
    pub fn attribution(&self, kind: &str) -> Option<&BTreeMap<EntityId, Attribute>> {
        self.attributions.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributions.keys().map(String::as_str)
    }

    /// Entities holding an attribute of any of `kinds`. Unknown kinds contribute nothing.
    #[must_use]
    pub fn entities_with<'a>(
        &self,
        kinds: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<EntityId> {
        kinds
            .into_iter()
            .filter_map(|kind| self.attributions.get(kind))
            .flat_map(BTreeMap::keys)
            .copied()
            .collect()
    }

    /// Total number of stored attributes across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributions.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `event id -> member entity ids`, members kept in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct EventStore {
    events: BTreeMap<EntityId, Vec<EntityId>>,
}

impl EventStore {
    /// # Errors
    /// Returns [`ModelError::DuplicateEvent`] when `primary` already names an event.
    pub fn record(&mut self, primary: EntityId, members: Vec<EntityId>) -> Result<(), ModelError> {
        if self.events.contains_key(&primary) {
            return Err(ModelError::DuplicateEvent(primary));
        }
        self.events.insert(primary, members);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, primary: EntityId) -> Option<&[EntityId]> {
        self.events.get(&primary).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, primary: EntityId) -> bool {
        self.events.contains_key(&primary)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &[EntityId])> + '_ {
        self.events.iter().map(|(primary, members)| (*primary, members.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Pitch;

    #[test]
    fn entity_store_allocates_through_shared_allocator() {
        let mut ids = IdentifierAllocator::new();
        let mut store = EntityStore::default();
        let first = store.create(&mut ids, Entity::default());
        let skipped = ids.next_id();
        let second = store.create(&mut ids, Entity::default());

        assert_eq!((first, skipped, second), (EntityId(0), EntityId(1), EntityId(2)));
        assert!(store.contains(second));
        assert!(!store.contains(skipped));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_attribution_is_rejected_by_default_policy() {
        let mut attributions = AttributionCollection::default();
        let entity = EntityId(0);
        let first =
            attributions.record(entity, "pitch", Pitch::new(60.0).into(), DuplicatePolicy::Reject);
        assert!(matches!(first, Ok(None)));

        let second =
            attributions.record(entity, "pitch", Pitch::new(61.0).into(), DuplicatePolicy::Reject);
        assert_eq!(
            second,
            Err(ModelError::DuplicateAttribution { kind: "pitch".to_string(), entity })
        );
        assert_eq!(attributions.get(entity, "pitch"), Some(&Attribute::Pitch(Pitch::new(60.0))));
    }

    #[test]
    fn overwrite_policy_returns_replaced_value() {
        let mut attributions = AttributionCollection::default();
        let entity = EntityId(4);
        let policy = DuplicatePolicy::Overwrite;
        let _ = attributions.record(entity, "pitch", Pitch::new(60.0).into(), policy);
        let replaced = attributions.record(entity, "pitch", Pitch::new(62.0).into(), policy);

        assert_eq!(replaced, Ok(Some(Attribute::Pitch(Pitch::new(60.0)))));
        assert_eq!(attributions.get(entity, "pitch"), Some(&Attribute::Pitch(Pitch::new(62.0))));
        assert_eq!(attributions.len(), 1);
    }

    #[test]
    fn entities_with_unions_requested_kinds() {
        let mut attributions = AttributionCollection::default();
        for (index, kind) in ["pitch", "dynamic", "pitch", "articulation"].into_iter().enumerate() {
            let entity = EntityId(u64::try_from(index).unwrap_or(u64::MAX));
            let recorded =
                attributions.record(entity, kind, Attribute::Integer(1), DuplicatePolicy::Reject);
            if let Err(err) = recorded {
                panic!("fixture attribution should record: {err}");
            }
        }

        let selected = attributions.entities_with(["pitch", "dynamic", "missing"]);
        assert_eq!(
            selected.into_iter().collect::<Vec<_>>(),
            vec![EntityId(0), EntityId(1), EntityId(2)]
        );
        assert_eq!(
            attributions.kinds().collect::<Vec<_>>(),
            vec!["articulation", "dynamic", "pitch"]
        );
    }

    #[test]
    fn multi_kind_entity_lists_every_attribute() {
        let mut attributions = AttributionCollection::default();
        let entity = EntityId(0);
        let fixture =
            [("pitch", Attribute::Integer(60)), ("dynamic", Attribute::Text("mf".into()))];
        for (kind, attribute) in fixture {
            let recorded = attributions.record(entity, kind, attribute, DuplicatePolicy::Reject);
            if let Err(err) = recorded {
                panic!("fixture attribution should record: {err}");
            }
        }

        assert_eq!(attributions.first(entity).map(|(kind, _)| kind), Some("dynamic"));
        assert_eq!(attributions.all(entity).count(), 2);
        assert!(attributions.has_any(entity));
        assert!(!attributions.has_any(EntityId(1)));
    }

    #[test]
    fn event_primary_cannot_be_recorded_twice() {
        let mut events = EventStore::default();
        assert!(events.record(EntityId(0), vec![EntityId(1), EntityId(2)]).is_ok());
        assert_eq!(
            events.record(EntityId(0), vec![]),
            Err(ModelError::DuplicateEvent(EntityId(0)))
        );
        assert_eq!(events.get(EntityId(0)), Some([EntityId(1), EntityId(2)].as_slice()));
    }
}

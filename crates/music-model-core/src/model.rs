use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeKind};
use crate::entity::{Entity, EntityId};
use crate::error::ModelError;
use crate::interval::Interval;
use crate::meter::MeterStructure;
use crate::performance::Scope;
use crate::store::{AttributionCollection, EntityStore, EventStore};

/// Filter for [`Model::entities`].
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct EntityQuery {
    pub interval: Interval,
    #[serde(default)]
    pub scope: Scope,
    /// `None` admits every kind.
    #[serde(default)]
    pub kinds: Option<Vec<AttributeKind>>,
}

impl EntityQuery {
    #[must_use]
    pub fn new(interval: Interval) -> Self {
        Self { interval, scope: Scope::any(), kinds: None }
    }

    #[must_use]
    pub fn performed_by(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn including<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AttributeKind>,
    {
        self.kinds = Some(kinds.into_iter().map(Into::into).collect());
        self
    }
}

/// Read-only database of the musical content of one work.
///
/// Produced by [`crate::Builder::build`]. Nothing mutates a model, so it can be
/// shared across threads and queried concurrently.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Model {
    entities: EntityStore,
    attributions: AttributionCollection,
    events: EventStore,
    meter_structure: Option<MeterStructure>,
}

impl Model {
    pub(crate) fn from_parts(
        entities: EntityStore,
        attributions: AttributionCollection,
        events: EventStore,
        meter_structure: Option<MeterStructure>,
    ) -> Self {
        Self { entities, attributions, events, meter_structure }
    }

    /// Check that the stores agree with each other.
    ///
    /// Models from [`crate::Builder`] always pass; this is for snapshots
    /// deserialized from elsewhere. Per-value checks (interval bounds, meter
    /// subdivisions, rhythm leaves, tempo order) already run during
    /// deserialization.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownEntity`] when an attribution or event refers
    /// to an entity without a context, and [`ModelError::MissingAttribution`]
    /// when an event member has no attribute.
    pub fn validate(&self) -> Result<(), ModelError> {
        for kind in self.attributions.kinds() {
            let Some(attribution) = self.attributions.attribution(kind) else {
                continue;
            };
            if let Some(orphan) = attribution.keys().find(|id| !self.entities.contains(**id)) {
                return Err(ModelError::UnknownEntity(*orphan));
            }
        }

        for (primary, members) in self.events.iter() {
            if !self.entities.contains(primary) {
                return Err(ModelError::UnknownEntity(primary));
            }
            for member in members {
                if !self.entities.contains(*member) {
                    return Err(ModelError::UnknownEntity(*member));
                }
                if !self.attributions.has_any(*member) {
                    return Err(ModelError::MissingAttribution(*member));
                }
            }
        }

        Ok(())
    }

    /// Entities lying within `query.interval` (flush edges included), performed
    /// within `query.scope`, and holding an attribute of one of `query.kinds`.
    #[must_use]
    pub fn entities(&self, query: &EntityQuery) -> BTreeSet<EntityId> {
        let kinded = match &query.kinds {
            Some(kinds) => self.attributions.entities_with(kinds.iter().map(String::as_str)),
            None => self.attributions.entities_with(self.attributions.kinds()),
        };

        self.entities
            .iter()
            .filter(|(id, entity)| {
                kinded.contains(id) && entity.is_contained_by(&query.interval, &query.scope)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Every attributed entity within `interval`, for any performer and kind.
    #[must_use]
    pub fn entities_in(&self, interval: &Interval) -> BTreeSet<EntityId> {
        self.entities(&EntityQuery::new(*interval))
    }

    /// The attribute of `entity` under the first kind holding one.
    ///
    /// Meant for single-attribute entities; use [`Model::attribute_of_kind`]
    /// when an entity carries several kinds.
    #[must_use]
    pub fn attribute(&self, entity: EntityId) -> Option<&Attribute> {
        self.attributions.first(entity).map(|(_, attribute)| attribute)
    }

    #[must_use]
    pub fn attribute_of_kind(&self, entity: EntityId, kind: &str) -> Option<&Attribute> {
        self.attributions.get(entity, kind)
    }

    #[must_use]
    pub fn attributes(&self, entity: EntityId) -> Vec<(&str, &Attribute)> {
        self.attributions.all(entity).collect()
    }

    #[must_use]
    pub fn context(&self, entity: EntityId) -> Option<&Entity> {
        self.entities.get(entity)
    }

    /// Attribute and context together, or `None` if either is missing.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<(&Attribute, &Entity)> {
        let attribute = self.attribute(entity)?;
        let context = self.context(entity)?;
        Some((attribute, context))
    }

    #[must_use]
    pub fn event(&self, primary: EntityId) -> Option<&[EntityId]> {
        self.events.get(primary)
    }

    /// `(kind, attribute)` of each member of the event, in member order.
    #[must_use]
    pub fn event_attributes(&self, primary: EntityId) -> Option<Vec<(&str, &Attribute)>> {
        let members = self.events.get(primary)?;
        Some(members.iter().filter_map(|member| self.attributions.first(*member)).collect())
    }

    pub fn events(&self) -> impl Iterator<Item = (EntityId, &[EntityId])> + '_ {
        self.events.iter()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributions.kinds()
    }

    #[must_use]
    pub fn attribution(&self, kind: &str) -> Option<&BTreeMap<EntityId, Attribute>> {
        self.attributions.attribution(kind)
    }

    #[must_use]
    pub fn meter_structure(&self) -> Option<&MeterStructure> {
        self.meter_structure.as_ref()
    }

    /// `ids` ordered by interval start, then by identifier. Unknown ids are dropped.
    #[must_use]
    pub fn in_time_order(&self, ids: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
        let mut located = ids
            .into_iter()
            .filter_map(|id| {
                self.entities.get(id).map(|entity| (entity.interval.lower_bound(), id))
            })
            .collect::<Vec<_>>();
        located.sort();
        located.into_iter().map(|(_, id)| id).collect()
    }

    /// Number of entities, attributed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.meter_structure {
            Some(structure) => writeln!(f, "{structure}")?,
            None => writeln!(f, "meters: none")?,
        }
        for kind in self.attributions.kinds() {
            writeln!(f, "{kind}:")?;
            let Some(attribution) = self.attributions.attribution(kind) else {
                continue;
            };
            for (id, attribute) in attribution {
                match self.entities.get(*id) {
                    Some(entity) => writeln!(f, "  {id}: {attribute} {entity}")?,
                    None => writeln!(f, "  {id}: {attribute}")?,
                }
            }
        }
        Ok(())
    }
}

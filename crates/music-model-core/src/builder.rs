use std::cell::Cell;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeKind, UNSPECIFIED_KIND};
use crate::duration::MetricalDuration;
use crate::entity::{Entity, EntityId, IdentifierAllocator};
use crate::error::ModelError;
use crate::interval::Interval;
use crate::meter::{Meter, MeterStructure, Tempo, TempoStratumBuilder};
use crate::model::Model;
use crate::performance::Path;
use crate::rhythm::Rhythm;
use crate::store::{AttributionCollection, DuplicatePolicy, EntityStore, EventStore};

/// Kind label under which [`Builder::add_rhythm`] stores the rhythm itself.
pub const RHYTHM_KIND: &str = "rhythm";

/// Attributes sounding together on one event slot, as `(kind, value)` pairs.
pub type AttributeGroup = Vec<(AttributeKind, Attribute)>;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct BuilderOptions {
    /// Kind used by [`Builder::add_attribute`].
    pub default_kind: AttributeKind,
    pub duplicate_attributions: DuplicatePolicy,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            default_kind: UNSPECIFIED_KIND.to_string(),
            duplicate_attributions: DuplicatePolicy::Reject,
        }
    }
}

/// The only mutation surface of a [`Model`].
///
/// Identifiers are allocated from 0 in call order. Every `add*` call either
/// applies completely or fails without touching the builder. The builder is
/// meant for one producer and is deliberately not `Sync`; [`Builder::build`]
/// consumes it, so nothing can mutate a model once it exists.
///
/// ```
/// use music_model_core::{Builder, Entity, Interval, MetricalDuration, Path, Pitch};
///
/// # fn main() -> Result<(), music_model_core::ModelError> {
/// let interval = Interval::new(MetricalDuration::new(1, 4), MetricalDuration::new(2, 4))?;
/// let mut builder = Builder::new();
/// let path = Path::new("Pat", "Violin", 0);
/// let entity = builder.add(Pitch::new(60.0), "pitch", Entity::new(interval, path))?;
/// let model = builder.build();
///
/// assert!(model.entities_in(&interval).contains(&entity));
/// assert!(model.attribute(entity).is_some());
/// # Ok(())
/// # }
/// ```
///
/// A builder cannot be shared between threads:
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<music_model_core::Builder>();
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    options: BuilderOptions,
    ids: IdentifierAllocator,
    entities: EntityStore,
    attributions: AttributionCollection,
    events: EventStore,
    tempi: TempoStratumBuilder,
    meters: Vec<Meter>,
    _single_writer: PhantomData<Cell<()>>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: BuilderOptions) -> Self {
        Self { options, ..Self::default() }
    }

    #[must_use]
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Number of entities created so far.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Add `attribute` under `kind`, performed within `entity`'s interval and path.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] when `kind` is blank.
    pub fn add(
        &mut self,
        attribute: impl Into<Attribute>,
        kind: &str,
        entity: Entity,
    ) -> Result<EntityId, ModelError> {
        validate_kind(kind)?;
        let id = self.entities.create(&mut self.ids, entity);
        let policy = self.options.duplicate_attributions;
        self.attributions.record(id, kind, attribute.into(), policy)?;
        Ok(id)
    }

    /// Add `attribute` under the default kind with no interval or performer.
    ///
    /// Such entities only show up in queries whose window encloses the zero interval.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] when the configured default kind is blank.
    pub fn add_attribute(
        &mut self,
        attribute: impl Into<Attribute>,
    ) -> Result<EntityId, ModelError> {
        let kind = self.options.default_kind.clone();
        self.add(attribute, &kind, Entity::default())
    }

    /// Record a further attribute kind on an existing entity.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownEntity`] when `entity` was never created,
    /// [`ModelError::Validation`] for a blank `kind`, and
    /// [`ModelError::DuplicateAttribution`] when `entity` already has `kind`
    /// under [`DuplicatePolicy::Reject`].
    pub fn attach(
        &mut self,
        entity: EntityId,
        kind: &str,
        attribute: impl Into<Attribute>,
    ) -> Result<&mut Self, ModelError> {
        validate_kind(kind)?;
        if !self.entities.contains(entity) {
            return Err(ModelError::UnknownEntity(entity));
        }
        let policy = self.options.duplicate_attributions;
        self.attributions.record(entity, kind, attribute.into(), policy)?;
        Ok(self)
    }

    /// Group existing attributed entities under the event `primary`.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownEntity`] when `primary` or a member was never
    /// created, [`ModelError::MissingAttribution`] when a member has no attribute,
    /// and [`ModelError::DuplicateEvent`] when `primary` already names an event.
    pub fn add_event(
        &mut self,
        primary: EntityId,
        members: Vec<EntityId>,
    ) -> Result<&mut Self, ModelError> {
        if !self.entities.contains(primary) {
            return Err(ModelError::UnknownEntity(primary));
        }
        for member in &members {
            if !self.entities.contains(*member) {
                return Err(ModelError::UnknownEntity(*member));
            }
            if !self.attributions.has_any(*member) {
                return Err(ModelError::MissingAttribution(*member));
            }
        }
        tracing::debug!(event = %primary, members = members.len(), "recorded event");
        self.events.record(primary, members)?;
        Ok(self)
    }

    /// Lay `rhythm` out from `offset` and attach one attribute group per event slot.
    ///
    /// Creates, in order: one entity for the whole rhythm (kind `"rhythm"`), then
    /// for each slot its own entity followed by one entity per attribute of the
    /// slot's group. Each slot becomes an event whose members are those attribute
    /// entities.
    ///
    /// # Errors
    /// Returns [`ModelError::EventSlotMismatch`] when `groups.len()` differs from
    /// the number of event slots, and [`ModelError::Validation`] for a blank kind
    /// or an overflowing position. Nothing is recorded on error.
    pub fn add_rhythm(
        &mut self,
        rhythm: &Rhythm,
        offset: MetricalDuration,
        groups: Vec<AttributeGroup>,
        path: &Path,
    ) -> Result<&mut Self, ModelError> {
        let slots = rhythm.event_intervals(offset)?;
        if slots.len() != groups.len() {
            return Err(ModelError::EventSlotMismatch {
                event_slots: slots.len(),
                attribute_groups: groups.len(),
            });
        }
        for (kind, _) in groups.iter().flatten() {
            validate_kind(kind)?;
        }
        let span = Interval::starting_at(offset, rhythm.duration())?;

        let policy = self.options.duplicate_attributions;
        let rhythm_entity = self.entities.create(&mut self.ids, Entity::new(span, path.clone()));
        self.attributions.record(rhythm_entity, RHYTHM_KIND, rhythm.clone().into(), policy)?;

        for (interval, group) in slots.into_iter().zip(groups) {
            let slot = self.entities.create(&mut self.ids, Entity::new(interval, path.clone()));
            let mut members = Vec::with_capacity(group.len());
            for (kind, attribute) in group {
                let member =
                    self.entities.create(&mut self.ids, Entity::new(interval, path.clone()));
                self.attributions.record(member, &kind, attribute, policy)?;
                members.push(member);
            }
            self.events.record(slot, members)?;
        }

        tracing::debug!(
            rhythm = %rhythm_entity,
            offset = %offset,
            path = %path,
            event_slots = rhythm.event_count(),
            "added rhythm"
        );
        Ok(self)
    }

    pub fn add_meter(&mut self, meter: Meter) -> &mut Self {
        self.meters.push(meter);
        self
    }

    pub fn add_tempo(
        &mut self,
        tempo: Tempo,
        offset: MetricalDuration,
        interpolating: bool,
    ) -> &mut Self {
        self.tempi.add(tempo, offset, interpolating);
        self
    }

    /// Freeze everything added so far into a [`Model`].
    #[must_use]
    pub fn build(self) -> Model {
        let meter_structure = if self.meters.is_empty() && self.tempi.is_empty() {
            None
        } else {
            Some(MeterStructure::new(self.meters, self.tempi.build()))
        };
        tracing::debug!(
            entities = self.entities.len(),
            attributes = self.attributions.len(),
            events = self.events.len(),
            "built model"
        );
        Model::from_parts(self.entities, self.attributions, self.events, meter_structure)
    }
}

fn validate_kind(kind: &str) -> Result<(), ModelError> {
    if kind.trim().is_empty() {
        return Err(ModelError::Validation("attribute kind MUST be non-empty".to_string()));
    }
    Ok(())
}

mod attribute;
mod builder;
mod duration;
mod entity;
mod error;
mod interval;
mod meter;
mod model;
mod performance;
mod rhythm;
mod store;

pub use attribute::{Articulation, Attribute, AttributeKind, Dynamic, Pitch, UNSPECIFIED_KIND};
pub use builder::{AttributeGroup, Builder, BuilderOptions, RHYTHM_KIND};
pub use duration::MetricalDuration;
pub use entity::{Entity, EntityId, IdentifierAllocator};
pub use error::ModelError;
pub use interval::{Interval, IntervalRelation};
pub use meter::{Meter, MeterStructure, Tempo, TempoChange, TempoStratum, TempoStratumBuilder};
pub use model::{EntityQuery, Model};
pub use performance::{
    Instrument, InstrumentId, Path, PerformanceContext, Performer, PerformerId, Scope, Voice,
    VoiceId,
};
pub use rhythm::{LeafKind, Rhythm, RhythmLeaf};
pub use store::{AttributionCollection, DuplicatePolicy, EntityStore, EventStore};

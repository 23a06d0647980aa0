use crate::entity::EntityId;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("entity {entity} already carries an attribute of kind `{kind}`")]
    DuplicateAttribution { kind: String, entity: EntityId },
    #[error(
        "rhythm has {event_slots} event slots but {attribute_groups} attribute groups were supplied"
    )]
    EventSlotMismatch { event_slots: usize, attribute_groups: usize },
    #[error("entity {0} has not been created")]
    UnknownEntity(EntityId),
    #[error("entity {0} has no attribution")]
    MissingAttribution(EntityId),
    #[error("event {0} is already recorded")]
    DuplicateEvent(EntityId),
}

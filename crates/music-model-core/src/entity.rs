use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::performance::{Path, Scope};

/// Opaque identifier of one attribute occurrence. Never reused within a model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing identifiers starting at 0.
#[derive(Debug, Clone, Default)]
pub struct IdentifierAllocator {
    next: u64,
}

impl IdentifierAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Identifier the next call to [`IdentifierAllocator::next_id`] returns.
    #[must_use]
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }

    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// When and by whom an attribute occurs.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, Default)]
pub struct Entity {
    pub interval: Interval,
    pub path: Path,
}

impl Entity {
    #[must_use]
    pub fn new(interval: Interval, path: Path) -> Self {
        Self { interval, path }
    }

    /// `true` when this entity lies within `interval` (flush edges included)
    /// and its path is matched by `scope`.
    #[must_use]
    pub fn is_contained_by(&self, interval: &Interval, scope: &Scope) -> bool {
        scope.contains_path(&self.path) && interval.encloses(&self.interval)
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.interval, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::MetricalDuration;

    #[test]
    fn allocator_issues_consecutive_ids_from_zero() {
        let mut ids = IdentifierAllocator::new();
        assert_eq!(ids.peek(), EntityId(0));
        assert_eq!(ids.next_id(), EntityId(0));
        assert_eq!(ids.next_id(), EntityId(1));
        assert_eq!(ids.next_id(), EntityId(2));
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn default_entity_sits_at_zero() {
        let entity = Entity::default();
        assert_eq!(entity.interval, Interval::ZERO);
        assert!(entity.is_contained_by(&Interval::ZERO, &Scope::any()));

        let window = match Interval::new(MetricalDuration::new(1, 8), MetricalDuration::new(1, 4)) {
            Ok(interval) => interval,
            Err(err) => panic!("fixture interval should be valid: {err}"),
        };
        assert!(!entity.is_contained_by(&window, &Scope::any()));
    }
}

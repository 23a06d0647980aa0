use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::duration::MetricalDuration;
use crate::error::ModelError;
use crate::interval::Interval;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    /// A new attack.
    Event,
    /// Continues the preceding event.
    Tie,
    Rest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct RhythmLeaf {
    pub duration: MetricalDuration,
    pub kind: LeafKind,
}

impl RhythmLeaf {
    #[must_use]
    pub const fn event(duration: MetricalDuration) -> Self {
        Self { duration, kind: LeafKind::Event }
    }

    #[must_use]
    pub const fn tie(duration: MetricalDuration) -> Self {
        Self { duration, kind: LeafKind::Tie }
    }

    #[must_use]
    pub const fn rest(duration: MetricalDuration) -> Self {
        Self { duration, kind: LeafKind::Rest }
    }
}

/// Sequence of leaves; each event leaf (with any ties after it) is one event slot.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(try_from = "RawRhythm", into = "RawRhythm")]
pub struct Rhythm {
    leaves: Vec<RhythmLeaf>,
    duration: MetricalDuration,
}

#[derive(Serialize, Deserialize)]
struct RawRhythm {
    leaves: Vec<RhythmLeaf>,
}

impl Rhythm {
    /// # Errors
    /// Returns [`ModelError::Validation`] when a leaf has zero duration, a tie
    /// does not follow an event or another tie, or the total length overflows.
    pub fn new(leaves: impl IntoIterator<Item = RhythmLeaf>) -> Result<Self, ModelError> {
        let leaves = leaves.into_iter().collect::<Vec<_>>();
        let mut sounding = false;
        let mut duration = MetricalDuration::ZERO;
        for (index, leaf) in leaves.iter().enumerate() {
            if leaf.duration.is_zero() {
                return Err(ModelError::Validation(format!(
                    "rhythm leaf {index} MUST have a non-zero duration"
                )));
            }
            match leaf.kind {
                LeafKind::Event => sounding = true,
                LeafKind::Rest => sounding = false,
                LeafKind::Tie if !sounding => {
                    return Err(ModelError::Validation(format!(
                        "rhythm leaf {index} is a tie without a preceding event"
                    )));
                }
                LeafKind::Tie => {}
            }
            duration = duration.checked_add(leaf.duration).ok_or_else(|| {
                ModelError::Validation(format!("rhythm length overflows at leaf {index}"))
            })?;
        }
        Ok(Self { leaves, duration })
    }

    /// One event leaf per multiplier of `unit`: `events(3/16, [1, 2])` is `3/16 6/16`.
    ///
    /// Zero multipliers are skipped.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] when `unit` is zero or a scaled leaf or
    /// the total length overflows.
    pub fn events(unit: MetricalDuration, multipliers: &[u64]) -> Result<Self, ModelError> {
        let leaves = multipliers
            .iter()
            .filter(|multiplier| **multiplier > 0)
            .map(|multiplier| {
                unit.checked_mul(*multiplier).map(RhythmLeaf::event).ok_or_else(|| {
                    ModelError::Validation(format!("rhythm leaf {unit} x {multiplier} overflows"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(leaves)
    }

    #[must_use]
    pub fn leaves(&self) -> &[RhythmLeaf] {
        &self.leaves
    }

    /// Total length of all leaves.
    #[must_use]
    pub fn duration(&self) -> MetricalDuration {
        self.duration
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.leaves.iter().filter(|leaf| leaf.kind == LeafKind::Event).count()
    }

    /// Interval of each event slot when the rhythm starts at `offset`.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] when a position overflows.
    pub fn event_intervals(&self, offset: MetricalDuration) -> Result<Vec<Interval>, ModelError> {
        let mut intervals: Vec<Interval> = Vec::with_capacity(self.event_count());
        let mut position = offset;
        for leaf in &self.leaves {
            let end = position.checked_add(leaf.duration).ok_or_else(|| {
                ModelError::Validation(format!("rhythm position {position} overflows"))
            })?;
            match leaf.kind {
                LeafKind::Event => intervals.push(Interval::new(position, end)?),
                LeafKind::Tie => {
                    if let Some(last) = intervals.last_mut() {
                        *last = Interval::new(last.lower_bound(), end)?;
                    }
                }
                LeafKind::Rest => {}
            }
            position = end;
        }
        Ok(intervals)
    }
}

impl TryFrom<RawRhythm> for Rhythm {
    type Error = ModelError;

    fn try_from(raw: RawRhythm) -> Result<Self, Self::Error> {
        Self::new(raw.leaves)
    }
}

impl From<Rhythm> for RawRhythm {
    fn from(value: Rhythm) -> Self {
        Self { leaves: value.leaves }
    }
}

impl Display for Rhythm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .leaves
            .iter()
            .map(|leaf| match leaf.kind {
                LeafKind::Event => leaf.duration.to_string(),
                LeafKind::Tie => format!("~{}", leaf.duration),
                LeafKind::Rest => format!("r{}", leaf.duration),
            })
            .collect::<Vec<_>>();
        write!(f, "[{}]", rendered.join(" "))
    }
}

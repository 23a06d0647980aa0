//! Meter and tempo overlay held alongside a model.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::duration::MetricalDuration;
use crate::error::ModelError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(try_from = "RawMeter", into = "RawMeter")]
pub struct Meter {
    beats: u64,
    subdivision: u64,
}

#[derive(Serialize, Deserialize)]
struct RawMeter {
    beats: u64,
    subdivision: u64,
}

impl Meter {
    /// # Panics
    /// Panics when `subdivision` is zero.
    #[must_use]
    pub const fn new(beats: u64, subdivision: u64) -> Self {
        assert!(subdivision != 0, "subdivision MUST be non-zero");
        Self { beats, subdivision }
    }

    /// # Errors
    /// Returns [`ModelError::Validation`] when `subdivision` is zero.
    pub fn try_new(beats: u64, subdivision: u64) -> Result<Self, ModelError> {
        if subdivision == 0 {
            return Err(ModelError::Validation("meter subdivision MUST be non-zero".to_string()));
        }
        Ok(Self { beats, subdivision })
    }

    #[must_use]
    pub const fn beats(self) -> u64 {
        self.beats
    }

    #[must_use]
    pub const fn subdivision(self) -> u64 {
        self.subdivision
    }

    #[must_use]
    pub const fn duration(self) -> MetricalDuration {
        MetricalDuration::new(self.beats, self.subdivision)
    }
}

impl TryFrom<RawMeter> for Meter {
    type Error = ModelError;

    fn try_from(raw: RawMeter) -> Result<Self, Self::Error> {
        Self::try_new(raw.beats, raw.subdivision)
    }
}

impl From<Meter> for RawMeter {
    fn from(value: Meter) -> Self {
        Self { beats: value.beats, subdivision: value.subdivision }
    }
}

impl Display for Meter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.beats, self.subdivision)
    }
}

/// Beats per minute, where a beat is `1 / subdivision` of a whole note.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tempo {
    pub beats_per_minute: f64,
    pub subdivision: u64,
}

impl Tempo {
    /// Tempo counted in quarter notes.
    #[must_use]
    pub fn new(beats_per_minute: f64) -> Self {
        Self { beats_per_minute, subdivision: 4 }
    }

    #[must_use]
    pub fn with_subdivision(beats_per_minute: f64, subdivision: u64) -> Self {
        Self { beats_per_minute, subdivision }
    }

    /// The same tempo counted in quarter notes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn quarter_notes_per_minute(self) -> f64 {
        self.beats_per_minute * 4.0 / self.subdivision.max(1) as f64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TempoChange {
    pub offset: MetricalDuration,
    pub tempo: Tempo,
    /// Ramp linearly toward the next change instead of holding.
    pub interpolating: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TempoStratumBuilder {
    changes: Vec<TempoChange>,
}

impl TempoStratumBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        tempo: Tempo,
        offset: MetricalDuration,
        interpolating: bool,
    ) -> &mut Self {
        self.changes.push(TempoChange { offset, tempo, interpolating });
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes ordered by offset; a later change at the same offset replaces an earlier one.
    #[must_use]
    pub fn build(&self) -> TempoStratum {
        let mut changes: Vec<TempoChange> = Vec::with_capacity(self.changes.len());
        let mut ordered = self.changes.clone();
        ordered.sort_by(|lhs, rhs| lhs.offset.cmp(&rhs.offset));
        for change in ordered {
            match changes.last_mut() {
                Some(last) if last.offset == change.offset => *last = change,
                _ => changes.push(change),
            }
        }
        TempoStratum { changes }
    }
}

/// Tempo changes in strictly increasing offset order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawTempoStratum", into = "RawTempoStratum")]
pub struct TempoStratum {
    changes: Vec<TempoChange>,
}

#[derive(Serialize, Deserialize)]
struct RawTempoStratum {
    changes: Vec<TempoChange>,
}

impl TryFrom<RawTempoStratum> for TempoStratum {
    type Error = ModelError;

    fn try_from(raw: RawTempoStratum) -> Result<Self, Self::Error> {
        for pair in raw.changes.windows(2) {
            if pair[0].offset >= pair[1].offset {
                return Err(ModelError::Validation(format!(
                    "tempo change at {} MUST come after the change at {}",
                    pair[1].offset, pair[0].offset
                )));
            }
        }
        Ok(Self { changes: raw.changes })
    }
}

impl From<TempoStratum> for RawTempoStratum {
    fn from(value: TempoStratum) -> Self {
        Self { changes: value.changes }
    }
}

impl TempoStratum {
    #[must_use]
    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// Quarter notes per minute at `offset`, or `None` before the first change.
    #[must_use]
    pub fn tempo_at(&self, offset: MetricalDuration) -> Option<f64> {
        let index = self.changes.iter().rposition(|change| change.offset <= offset)?;
        let current = self.changes[index];
        let start = current.tempo.quarter_notes_per_minute();
        let Some(next) = self.changes.get(index + 1) else {
            return Some(start);
        };
        if !current.interpolating {
            return Some(start);
        }

        let span = next.offset.as_f64() - current.offset.as_f64();
        let progress = (offset.as_f64() - current.offset.as_f64()) / span;
        let end = next.tempo.quarter_notes_per_minute();
        Some(start + (end - start) * progress)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeterStructure {
    pub meters: Vec<Meter>,
    pub tempi: TempoStratum,
}

impl MeterStructure {
    #[must_use]
    pub fn new(meters: Vec<Meter>, tempi: TempoStratum) -> Self {
        Self { meters, tempi }
    }

    /// Total length of all bars, or `None` when it overflows.
    #[must_use]
    pub fn duration(&self) -> Option<MetricalDuration> {
        self.meters
            .iter()
            .try_fold(MetricalDuration::ZERO, |total, meter| total.checked_add(meter.duration()))
    }

    /// Start offset of each meter, or `None` when a position overflows.
    #[must_use]
    pub fn meter_offsets(&self) -> Option<Vec<MetricalDuration>> {
        let mut offsets = Vec::with_capacity(self.meters.len());
        let mut position = MetricalDuration::ZERO;
        for meter in &self.meters {
            offsets.push(position);
            position = position.checked_add(meter.duration())?;
        }
        Some(offsets)
    }

    /// Meter in effect at `offset`, or `None` past the last bar.
    ///
    /// Bars beyond a position that overflows are never reached.
    #[must_use]
    pub fn meter_at(&self, offset: MetricalDuration) -> Option<Meter> {
        let mut position = MetricalDuration::ZERO;
        for meter in &self.meters {
            let end = position.checked_add(meter.duration())?;
            if offset < end {
                return Some(*meter);
            }
            position = end;
        }
        None
    }
}

impl Display for MeterStructure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let meters = self.meters.iter().map(ToString::to_string).collect::<Vec<_>>();
        write!(f, "meters: [{}]", meters.join(" "))?;
        for change in &self.tempi.changes {
            write!(
                f,
                "\ntempo {} = {}{}",
                change.offset,
                change.tempo.beats_per_minute,
                if change.interpolating { " ->" } else { "" }
            )?;
        }
        Ok(())
    }
}

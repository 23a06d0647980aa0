use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A position or length in metrical time: `beats / subdivision` of a whole note.
///
/// Values keep the subdivision they were written with (`3/16` stays `3/16`),
/// but compare and hash by rational value, so `2/8 == 1/4`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "(u64, u64)", into = "(u64, u64)")]
pub struct MetricalDuration {
    beats: u64,
    subdivision: u64,
}

impl MetricalDuration {
    pub const ZERO: Self = Self { beats: 0, subdivision: 1 };

    /// # Panics
    /// Panics when `subdivision` is zero.
    #[must_use]
    pub const fn new(beats: u64, subdivision: u64) -> Self {
        assert!(subdivision != 0, "subdivision MUST be non-zero");
        Self { beats, subdivision }
    }

    /// Fallible counterpart of [`MetricalDuration::new`].
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] when `subdivision` is zero.
    pub fn try_new(beats: u64, subdivision: u64) -> Result<Self, ModelError> {
        if subdivision == 0 {
            return Err(ModelError::Validation("subdivision MUST be non-zero".to_string()));
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
    pub const fn is_zero(self) -> bool {
        self.beats == 0
    }

    /// Lowest-terms form of the same value.
    #[must_use]
    pub fn reduced(self) -> Self {
        if self.beats == 0 {
            return Self::ZERO;
        }
        let divisor = gcd(self.beats, self.subdivision);
        Self { beats: self.beats / divisor, subdivision: self.subdivision / divisor }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.beats as f64 / self.subdivision as f64
    }

    /// Sum expressed over the least common subdivision of both operands.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let subdivision = lcm(self.subdivision, rhs.subdivision)?;
        let lhs_beats = self.beats.checked_mul(subdivision / self.subdivision)?;
        let rhs_beats = rhs.beats.checked_mul(subdivision / rhs.subdivision)?;
        Some(Self { beats: lhs_beats.checked_add(rhs_beats)?, subdivision })
    }

    /// `factor` times this value over the same subdivision.
    #[must_use]
    pub fn checked_mul(self, factor: u64) -> Option<Self> {
        Some(Self { beats: self.beats.checked_mul(factor)?, subdivision: self.subdivision })
    }

    /// Difference, or `None` when `rhs > self` or the arithmetic overflows.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        let subdivision = lcm(self.subdivision, rhs.subdivision)?;
        let lhs_beats = self.beats.checked_mul(subdivision / self.subdivision)?;
        let rhs_beats = rhs.beats.checked_mul(subdivision / rhs.subdivision)?;
        Some(Self { beats: lhs_beats.checked_sub(rhs_beats)?, subdivision })
    }
}

fn gcd(mut lhs: u64, mut rhs: u64) -> u64 {
    while rhs != 0 {
        (lhs, rhs) = (rhs, lhs % rhs);
    }
    lhs
}

fn lcm(lhs: u64, rhs: u64) -> Option<u64> {
    (lhs / gcd(lhs, rhs)).checked_mul(rhs)
}

impl Default for MetricalDuration {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Ord for MetricalDuration {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.beats) * u128::from(other.subdivision);
        let rhs = u128::from(other.beats) * u128::from(self.subdivision);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for MetricalDuration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MetricalDuration {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MetricalDuration {}

impl Hash for MetricalDuration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let reduced = self.reduced();
        reduced.beats.hash(state);
        reduced.subdivision.hash(state);
    }
}

impl Display for MetricalDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.beats, self.subdivision)
    }
}

impl TryFrom<(u64, u64)> for MetricalDuration {
    type Error = ModelError;

    fn try_from((beats, subdivision): (u64, u64)) -> Result<Self, Self::Error> {
        Self::try_new(beats, subdivision)
    }
}

impl From<MetricalDuration> for (u64, u64) {
    fn from(value: MetricalDuration) -> Self {
        (value.beats, value.subdivision)
    }
}

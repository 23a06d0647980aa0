use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::duration::MetricalDuration;
use crate::error::ModelError;

/// Closed range `[lower, upper]` in metrical time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Default)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct Interval {
    lower: MetricalDuration,
    upper: MetricalDuration,
}

#[derive(Serialize, Deserialize)]
struct RawInterval {
    lower: MetricalDuration,
    upper: MetricalDuration,
}

impl Interval {
    pub const ZERO: Self = Self { lower: MetricalDuration::ZERO, upper: MetricalDuration::ZERO };

    /// # Errors
    /// Returns [`ModelError::Validation`] when `lower > upper`.
    pub fn new(lower: MetricalDuration, upper: MetricalDuration) -> Result<Self, ModelError> {
        if lower > upper {
            return Err(ModelError::Validation(format!(
                "interval lower bound {lower} MUST NOT exceed upper bound {upper}"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Interval starting at `offset` and lasting `length`.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] when the end position overflows.
    pub fn starting_at(
        offset: MetricalDuration,
        length: MetricalDuration,
    ) -> Result<Self, ModelError> {
        let upper = offset.checked_add(length).ok_or_else(|| {
            ModelError::Validation(format!("interval end {offset} + {length} overflows"))
        })?;
        Ok(Self { lower: offset, upper })
    }

    #[must_use]
    pub const fn lower_bound(&self) -> MetricalDuration {
        self.lower
    }

    #[must_use]
    pub const fn upper_bound(&self) -> MetricalDuration {
        self.upper
    }

    #[must_use]
    pub fn length(&self) -> MetricalDuration {
        self.upper.checked_sub(self.lower).unwrap_or(MetricalDuration::ZERO)
    }

    /// Allen relation of `self` with respect to `other`.
    #[must_use]
    pub fn relation(&self, other: &Self) -> IntervalRelation {
        match (self.lower.cmp(&other.lower), self.upper.cmp(&other.upper)) {
            (Ordering::Equal, Ordering::Equal) => IntervalRelation::Equals,
            (Ordering::Equal, Ordering::Less) => IntervalRelation::Starts,
            (Ordering::Equal, Ordering::Greater) => IntervalRelation::StartedBy,
            (Ordering::Greater, Ordering::Equal) => IntervalRelation::Finishes,
            (Ordering::Less, Ordering::Equal) => IntervalRelation::FinishedBy,
            (Ordering::Less, Ordering::Greater) => IntervalRelation::Contains,
            (Ordering::Greater, Ordering::Less) => IntervalRelation::During,
            (Ordering::Less, Ordering::Less) => match self.upper.cmp(&other.lower) {
                Ordering::Less => IntervalRelation::Before,
                Ordering::Equal => IntervalRelation::Meets,
                Ordering::Greater => IntervalRelation::Overlaps,
            },
            (Ordering::Greater, Ordering::Greater) => match self.lower.cmp(&other.upper) {
                Ordering::Greater => IntervalRelation::After,
                Ordering::Equal => IntervalRelation::MetBy,
                Ordering::Less => IntervalRelation::OverlappedBy,
            },
        }
    }

    /// `true` when both closed ranges share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }

    /// `true` when `other` lies within this interval, flush edges included.
    #[must_use]
    pub fn encloses(&self, other: &Self) -> bool {
        self.relation(other).is_containment()
    }
}

impl TryFrom<RawInterval> for Interval {
    type Error = ModelError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.lower, raw.upper)
    }
}

impl From<Interval> for RawInterval {
    fn from(interval: Interval) -> Self {
        Self { lower: interval.lower, upper: interval.upper }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// The thirteen qualitative relations between two intervals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntervalRelation {
    Before,
    Meets,
    Overlaps,
    FinishedBy,
    Contains,
    Starts,
    Equals,
    StartedBy,
    During,
    Finishes,
    OverlappedBy,
    MetBy,
    After,
}

impl IntervalRelation {
    /// Relations under which the other interval sits inside this one.
    pub const CONTAINMENT: [Self; 4] =
        [Self::Equals, Self::Contains, Self::StartedBy, Self::FinishedBy];

    #[must_use]
    pub fn is_containment(self) -> bool {
        Self::CONTAINMENT.contains(&self)
    }

    #[must_use]
    pub fn is_disjoint(self) -> bool {
        matches!(self, Self::Before | Self::After)
    }

    /// Relation seen from the other interval.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::Meets => Self::MetBy,
            Self::Overlaps => Self::OverlappedBy,
            Self::FinishedBy => Self::Finishes,
            Self::Contains => Self::During,
            Self::Starts => Self::StartedBy,
            Self::Equals => Self::Equals,
            Self::StartedBy => Self::Starts,
            Self::During => Self::Contains,
            Self::Finishes => Self::FinishedBy,
            Self::OverlappedBy => Self::Overlaps,
            Self::MetBy => Self::Meets,
            Self::After => Self::Before,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Meets => "meets",
            Self::Overlaps => "overlaps",
            Self::FinishedBy => "finished_by",
            Self::Contains => "contains",
            Self::Starts => "starts",
            Self::Equals => "equals",
            Self::StartedBy => "started_by",
            Self::During => "during",
            Self::Finishes => "finishes",
            Self::OverlappedBy => "overlapped_by",
            Self::MetBy => "met_by",
            Self::After => "after",
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn eighths(lower: u64, upper: u64) -> Interval {
        match Interval::new(MetricalDuration::new(lower, 8), MetricalDuration::new(upper, 8)) {
            Ok(interval) => interval,
            Err(err) => panic!("fixture interval should be valid: {err}"),
        }
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let result = Interval::new(MetricalDuration::new(3, 8), MetricalDuration::new(1, 8));
        assert!(matches!(result, Err(ModelError::Validation(_))));
    }

    #[test]
    fn relations_cover_each_endpoint_arrangement() {
        let window = eighths(2, 6);
        let cases = [
            (eighths(0, 1), IntervalRelation::Before),
            (eighths(0, 2), IntervalRelation::Meets),
            (eighths(1, 3), IntervalRelation::Overlaps),
            (eighths(1, 6), IntervalRelation::FinishedBy),
            (eighths(1, 7), IntervalRelation::Contains),
            (eighths(2, 4), IntervalRelation::Starts),
            (eighths(2, 6), IntervalRelation::Equals),
            (eighths(2, 7), IntervalRelation::StartedBy),
            (eighths(3, 5), IntervalRelation::During),
            (eighths(4, 6), IntervalRelation::Finishes),
            (eighths(5, 7), IntervalRelation::OverlappedBy),
            (eighths(6, 7), IntervalRelation::MetBy),
            (eighths(7, 8), IntervalRelation::After),
        ];
        for (candidate, expected) in cases {
            assert_eq!(candidate.relation(&window), expected, "{candidate} vs {window}");
        }
    }

    #[test]
    fn window_encloses_flush_and_inner_intervals_only() {
        let window = eighths(4, 8);
        assert!(window.encloses(&eighths(4, 8)));
        assert!(window.encloses(&eighths(4, 5)));
        assert!(window.encloses(&eighths(7, 8)));
        assert!(window.encloses(&eighths(5, 6)));
        assert!(!window.encloses(&eighths(3, 5)));
        assert!(!window.encloses(&eighths(1, 2)));
    }

    #[test]
    fn zero_length_interval_equals_itself() {
        assert_eq!(Interval::ZERO.relation(&Interval::ZERO), IntervalRelation::Equals);
        assert!(Interval::ZERO.encloses(&Interval::ZERO));
        assert!(!eighths(1, 2).encloses(&Interval::ZERO));
    }

    #[test]
    fn overlap_includes_touching_endpoints() {
        assert!(eighths(0, 2).overlaps(&eighths(2, 4)));
        assert!(!eighths(0, 1).overlaps(&eighths(2, 4)));
        assert!(eighths(0, 1).relation(&eighths(2, 4)).is_disjoint());
    }

    #[test]
    fn deserialization_rejects_inverted_bounds() {
        let decoded =
            serde_json::from_str::<Interval>(r#"{"lower":[3,8],"upper":[1,8]}"#);
        assert!(decoded.is_err());
    }

    proptest! {
        #[test]
        fn property_relation_inverse_is_symmetric(
            a in 0_u64..16, b in 0_u64..16, c in 0_u64..16, d in 0_u64..16
        ) {
            let lhs = eighths(a.min(b), a.max(b));
            let rhs = eighths(c.min(d), c.max(d));
            prop_assert_eq!(lhs.relation(&rhs).inverse(), rhs.relation(&lhs));
        }

        #[test]
        fn property_containment_implies_overlap(
            a in 0_u64..16, b in 0_u64..16, c in 0_u64..16, d in 0_u64..16
        ) {
            let lhs = eighths(a.min(b), a.max(b));
            let rhs = eighths(c.min(d), c.max(d));
            if lhs.encloses(&rhs) {
                prop_assert!(lhs.overlaps(&rhs));
            }
            prop_assert_eq!(lhs.relation(&rhs).is_disjoint(), !lhs.overlaps(&rhs));
        }
    }
}

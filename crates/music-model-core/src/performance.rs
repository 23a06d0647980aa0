//! Who performs an entity: performer, instrument and voice.
//!
//! A [`PerformanceContext`] is a roster (a performer with their instruments and
//! voices). A [`Path`] names exactly one voice by identifier and is what
//! entities carry. A [`Scope`] is the partial, query-side form of a path.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub type PerformerId = String;
pub type InstrumentId = String;
pub type VoiceId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Voice {
    pub identifier: VoiceId,
}

impl Voice {
    #[must_use]
    pub const fn new(identifier: VoiceId) -> Self {
        Self { identifier }
    }
}

/// Identifiers of voices are unique within their instrument only.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Instrument {
    pub identifier: InstrumentId,
    pub voices: BTreeMap<VoiceId, Voice>,
}

impl Instrument {
    #[must_use]
    pub fn new(
        identifier: impl Into<InstrumentId>,
        voices: impl IntoIterator<Item = Voice>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            voices: voices.into_iter().map(|voice| (voice.identifier, voice)).collect(),
        }
    }

    #[must_use]
    pub fn voice(&self, identifier: VoiceId) -> Option<&Voice> {
        self.voices.get(&identifier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Performer {
    pub identifier: PerformerId,
    pub instruments: BTreeMap<InstrumentId, Instrument>,
}

impl Performer {
    #[must_use]
    pub fn new(
        identifier: impl Into<PerformerId>,
        instruments: impl IntoIterator<Item = Instrument>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            instruments: instruments
                .into_iter()
                .map(|instrument| (instrument.identifier.clone(), instrument))
                .collect(),
        }
    }

    #[must_use]
    pub fn instrument(&self, identifier: &str) -> Option<&Instrument> {
        self.instruments.get(identifier)
    }
}

impl Display for Performer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performer: {}", self.identifier)?;
        for instrument in self.instruments.values() {
            writeln!(f, "  Instrument: {}", instrument.identifier)?;
            for voice in instrument.voices.keys() {
                writeln!(f, "    Voice: {voice}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct PerformanceContext {
    pub performer: Performer,
}

impl PerformanceContext {
    #[must_use]
    pub fn new(performer: Performer) -> Self {
        Self { performer }
    }

    /// `true` when the roster holds the performer, instrument and voice named by `path`.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        if self.performer.identifier != path.performer {
            return false;
        }
        self.performer
            .instrument(&path.instrument)
            .is_some_and(|instrument| instrument.voice(path.voice).is_some())
    }

    #[must_use]
    pub fn is_contained_by(&self, scope: &Scope) -> bool {
        scope.contains(self)
    }

    /// Every concrete voice path in this roster.
    #[must_use]
    pub fn paths(&self) -> Vec<Path> {
        self.performer
            .instruments
            .values()
            .flat_map(|instrument| {
                instrument.voices.keys().map(move |voice| {
                    let performer = self.performer.identifier.clone();
                    Path::new(performer, instrument.identifier.clone(), *voice)
                })
            })
            .collect()
    }
}

impl Default for PerformanceContext {
    fn default() -> Self {
        Self::new(Performer::new(PerformerId::new(), []))
    }
}

/// Fully specified performer/instrument/voice address.
#[derive(
    Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash, Default,
)]
pub struct Path {
    pub performer: PerformerId,
    pub instrument: InstrumentId,
    pub voice: VoiceId,
}

impl Path {
    #[must_use]
    pub fn new(
        performer: impl Into<PerformerId>,
        instrument: impl Into<InstrumentId>,
        voice: VoiceId,
    ) -> Self {
        Self { performer: performer.into(), instrument: instrument.into(), voice }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.performer, self.instrument, self.voice)
    }
}

/// Partial path used to filter queries. Unspecified levels match anything.
///
/// A level can only be specified when every level above it is, so the
/// constructors go from [`Scope::any`] to [`Scope::voice`].
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, Default)]
#[serde(try_from = "RawScope", into = "RawScope")]
pub struct Scope {
    performer: Option<PerformerId>,
    instrument: Option<InstrumentId>,
    voice: Option<VoiceId>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct RawScope {
    performer: Option<PerformerId>,
    instrument: Option<InstrumentId>,
    voice: Option<VoiceId>,
}

impl TryFrom<RawScope> for Scope {
    type Error = ModelError;

    fn try_from(raw: RawScope) -> Result<Self, Self::Error> {
        if raw.instrument.is_some() && raw.performer.is_none() {
            return Err(ModelError::Validation(
                "scope instrument MUST come with a performer".to_string(),
            ));
        }
        if raw.voice.is_some() && raw.instrument.is_none() {
            return Err(ModelError::Validation(
                "scope voice MUST come with an instrument".to_string(),
            ));
        }
        Ok(Self { performer: raw.performer, instrument: raw.instrument, voice: raw.voice })
    }
}

impl From<Scope> for RawScope {
    fn from(value: Scope) -> Self {
        Self { performer: value.performer, instrument: value.instrument, voice: value.voice }
    }
}

impl Scope {
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn performer(performer: impl Into<PerformerId>) -> Self {
        Self { performer: Some(performer.into()), instrument: None, voice: None }
    }

    #[must_use]
    pub fn instrument(
        performer: impl Into<PerformerId>,
        instrument: impl Into<InstrumentId>,
    ) -> Self {
        Self { performer: Some(performer.into()), instrument: Some(instrument.into()), voice: None }
    }

    #[must_use]
    pub fn voice(
        performer: impl Into<PerformerId>,
        instrument: impl Into<InstrumentId>,
        voice: VoiceId,
    ) -> Self {
        Self {
            performer: Some(performer.into()),
            instrument: Some(instrument.into()),
            voice: Some(voice),
        }
    }

    #[must_use]
    pub fn performer_id(&self) -> Option<&str> {
        self.performer.as_deref()
    }

    #[must_use]
    pub fn instrument_id(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    #[must_use]
    pub fn voice_id(&self) -> Option<VoiceId> {
        self.voice
    }

    /// Number of specified levels, from 0 (any) to 3 (one voice).
    #[must_use]
    pub fn specificity(&self) -> u8 {
        u8::from(self.performer.is_some())
            + u8::from(self.instrument.is_some())
            + u8::from(self.voice.is_some())
    }

    /// `true` when every specified level resolves inside the roster of `context`.
    #[must_use]
    pub fn contains(&self, context: &PerformanceContext) -> bool {
        let Some(performer) = &self.performer else {
            return true;
        };
        if context.performer.identifier != *performer {
            return false;
        }

        let Some(instrument_id) = &self.instrument else {
            return true;
        };
        let Some(instrument) = context.performer.instrument(instrument_id) else {
            return false;
        };

        let Some(voice) = self.voice else {
            return true;
        };
        instrument.voice(voice).is_some()
    }

    /// `true` when every specified level equals the corresponding level of `path`.
    #[must_use]
    pub fn contains_path(&self, path: &Path) -> bool {
        self.performer.as_ref().map_or(true, |performer| *performer == path.performer)
            && self.instrument.as_ref().map_or(true, |instrument| *instrument == path.instrument)
            && self.voice.map_or(true, |voice| voice == path.voice)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn roster() -> PerformanceContext {
        PerformanceContext::new(Performer::new(
            "P",
            [
                Instrument::new("I", [Voice::new(0)]),
                Instrument::new("J", [Voice::new(0), Voice::new(1)]),
            ],
        ))
    }

    #[test]
    fn performer_indexes_instruments_by_identifier() {
        let performer = Performer::new("P", [Instrument::new("I", [Voice::new(0)])]);
        assert!(performer.instrument("I").is_some());
        assert!(performer.instrument("J").is_none());
    }

    #[test]
    fn instrument_indexes_voices_by_identifier() {
        let instrument = Instrument::new("VN", [1, 4, 5, 6].map(Voice::new));
        assert_eq!(instrument.voices.len(), 4);
        assert!(instrument.voice(4).is_some());
        assert!(instrument.voice(2).is_none());
    }

    #[test]
    fn context_contains_resolvable_path() {
        assert!(roster().contains(&Path::new("P", "I", 0)));
        assert!(roster().contains(&Path::new("P", "J", 1)));
    }

    #[test]
    fn context_rejects_path_with_missing_level() {
        assert!(!roster().contains(&Path::new("Q", "I", 0)));
        assert!(!roster().contains(&Path::new("P", "K", 0)));
        assert!(!roster().contains(&Path::new("P", "I", 1)));
        assert!(!roster().contains(&Path::new("P", "K", 1)));
    }

    #[test]
    fn scope_resolves_levels_against_roster() {
        let context = roster();
        assert!(Scope::any().contains(&context));
        assert!(Scope::performer("P").contains(&context));
        assert!(!Scope::performer("Q").contains(&context));
        assert!(Scope::instrument("P", "J").contains(&context));
        assert!(!Scope::instrument("P", "K").contains(&context));
        assert!(Scope::voice("P", "J", 1).contains(&context));
        assert!(!Scope::voice("P", "I", 1).contains(&context));
        assert!(context.is_contained_by(&Scope::instrument("P", "I")));
    }

    #[test]
    fn scope_matches_paths_level_by_level() {
        let path = Path::new("P", "I", 0);
        assert!(Scope::any().contains_path(&path));
        assert!(Scope::performer("P").contains_path(&path));
        assert!(Scope::instrument("P", "I").contains_path(&path));
        assert!(!Scope::instrument("P", "J").contains_path(&path));
        assert!(!Scope::voice("P", "I", 2).contains_path(&path));
        assert_eq!(Scope::voice("P", "I", 0).specificity(), 3);
    }

    #[test]
    fn scope_deserialization_requires_enclosing_levels() {
        let skipped_performer = r#"{"performer":null,"instrument":"I","voice":0}"#;
        assert!(serde_json::from_str::<Scope>(skipped_performer).is_err());

        let skipped_instrument = r#"{"performer":"P","voice":0}"#;
        assert!(serde_json::from_str::<Scope>(skipped_instrument).is_err());

        match serde_json::from_str::<Scope>(r#"{"performer":"P","instrument":"I"}"#) {
            Ok(scope) => assert_eq!(scope, Scope::instrument("P", "I")),
            Err(err) => panic!("instrument scope json should decode: {err}"),
        }
        match serde_json::from_str::<Scope>("{}") {
            Ok(scope) => assert_eq!(scope, Scope::any()),
            Err(err) => panic!("empty scope json should decode: {err}"),
        }
    }

    #[test]
    fn roster_enumerates_every_voice_path() {
        let paths = roster().paths();
        assert_eq!(
            paths,
            vec![Path::new("P", "I", 0), Path::new("P", "J", 0), Path::new("P", "J", 1)]
        );
        assert!(paths.iter().all(|path| roster().contains(path)));
    }

    #[test]
    fn equality_is_structural() {
        let lhs = Performer::new("P", [Instrument::new("I", [Voice::new(0)])]);
        let rhs = Performer::new("P", [Instrument::new("I", [Voice::new(0)])]);
        let other = Performer::new("P", [Instrument::new("I", [Voice::new(1)])]);
        assert_eq!(lhs, rhs);
        assert_ne!(lhs, other);
    }

    proptest! {
        #[test]
        fn property_path_scope_agrees_with_roster_scope(
            instrument in prop::sample::select(vec!["I", "J", "K"]),
            voice in 0_u32..3,
        ) {
            let context = roster();
            let path = Path::new("P", instrument, voice);
            let scope = Scope::voice("P", instrument, voice);
            prop_assert_eq!(scope.contains(&context), context.contains(&path));
        }
    }
}

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::rhythm::Rhythm;

/// Label grouping attributes of one category ("pitch", "dynamic", ...).
pub type AttributeKind = String;

/// Kind label used when the caller does not name one.
pub const UNSPECIFIED_KIND: &str = "?";

/// Pitch as a (possibly fractional) MIDI note number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Pitch(pub f64);

impl Pitch {
    #[must_use]
    pub fn new(note_number: f64) -> Self {
        Self(note_number)
    }

    #[must_use]
    pub fn note_number(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Dynamic {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
}

impl Dynamic {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ppp => "ppp",
            Self::Pp => "pp",
            Self::P => "p",
            Self::Mp => "mp",
            Self::Mf => "mf",
            Self::F => "f",
            Self::Ff => "ff",
            Self::Fff => "fff",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ppp" => Some(Self::Ppp),
            "pp" => Some(Self::Pp),
            "p" => Some(Self::P),
            "mp" => Some(Self::Mp),
            "mf" => Some(Self::Mf),
            "f" => Some(Self::F),
            "ff" => Some(Self::Ff),
            "fff" => Some(Self::Fff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Articulation {
    Staccato,
    Staccatissimo,
    Tenuto,
    Accent,
    Marcato,
    Fermata,
}

impl Articulation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staccato => "staccato",
            Self::Staccatissimo => "staccatissimo",
            Self::Tenuto => "tenuto",
            Self::Accent => "accent",
            Self::Marcato => "marcato",
            Self::Fermata => "fermata",
        }
    }
}

/// A value stored against an entity. The model never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Attribute {
    Pitch(Pitch),
    PitchSet(Vec<Pitch>),
    Dynamic(Dynamic),
    Articulation(Articulation),
    Rhythm(Rhythm),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Attribute {
    /// Name of the variant, independent of the kind label it is stored under.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pitch(_) => "pitch",
            Self::PitchSet(_) => "pitch_set",
            Self::Dynamic(_) => "dynamic",
            Self::Articulation(_) => "articulation",
            Self::Rhythm(_) => "rhythm",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
        }
    }

    #[must_use]
    pub fn as_pitch(&self) -> Option<Pitch> {
        match self {
            Self::Pitch(pitch) => Some(*pitch),
            _ => None,
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pitch(pitch) => write!(f, "{}", pitch.0),
            Self::PitchSet(pitches) => {
                let rendered =
                    pitches.iter().map(|pitch| pitch.0.to_string()).collect::<Vec<_>>();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Self::Dynamic(dynamic) => f.write_str(dynamic.as_str()),
            Self::Articulation(articulation) => f.write_str(articulation.as_str()),
            Self::Rhythm(rhythm) => write!(f, "{rhythm}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<Pitch> for Attribute {
    fn from(value: Pitch) -> Self {
        Self::Pitch(value)
    }
}

impl From<Vec<Pitch>> for Attribute {
    fn from(value: Vec<Pitch>) -> Self {
        Self::PitchSet(value)
    }
}

impl From<Dynamic> for Attribute {
    fn from(value: Dynamic) -> Self {
        Self::Dynamic(value)
    }
}

impl From<Articulation> for Attribute {
    fn from(value: Articulation) -> Self {
        Self::Articulation(value)
    }
}

impl From<Rhythm> for Attribute {
    fn from(value: Rhythm) -> Self {
        Self::Rhythm(value)
    }
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Attribute {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

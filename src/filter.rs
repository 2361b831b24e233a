//! Query filters for the list views.
//!
//! Every field is optional and blank values count as "not set", so a form
//! submitted with empty inputs matches everything. Text filters are
//! case-insensitive substring matches.

use crate::duration::PracticeDuration;
use crate::model::{Instrument, PracticeSession, Piece};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub end_date: Option<NaiveDate>,
    /// Textual durations such as `30m` or `1h15m`; a bare number is minutes.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_duration: Option<PracticeDuration>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub max_duration: Option<PracticeDuration>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub instrument: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub piece: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
}

impl SessionFilter {
    pub fn matches(&self, session: &PracticeSession) -> bool {
        self.start_date.is_none_or(|start| session.date >= start)
            && self.end_date.is_none_or(|end| session.date <= end)
            && self.min_duration.is_none_or(|min| session.duration >= min)
            && self.max_duration.is_none_or(|max| session.duration <= max)
            && self
                .instrument
                .is_none_or(|id| session.instrument == Some(id))
            && self.piece.is_none_or(|id| session.piece == Some(id))
            && text_matches(self.notes.as_deref(), session.notes.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InstrumentFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
}

impl InstrumentFilter {
    pub fn matches(&self, instrument: &Instrument) -> bool {
        text_matches(self.name.as_deref(), Some(&instrument.name))
            && text_matches(self.notes.as_deref(), instrument.notes.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PieceFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
}

impl PieceFilter {
    pub fn matches(&self, piece: &Piece) -> bool {
        text_matches(self.name.as_deref(), Some(&piece.name))
            && text_matches(self.artist.as_deref(), piece.artist.as_deref())
            && text_matches(self.album.as_deref(), piece.album.as_deref())
            && text_matches(self.notes.as_deref(), piece.notes.as_deref())
    }
}

/// Case-insensitive containment. An unset needle matches anything, a set
/// needle never matches an absent field.
fn text_matches(needle: Option<&str>, haystack: Option<&str>) -> bool {
    match (needle, haystack) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(needle), Some(haystack)) => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
    }
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

use crate::duration::PracticeDuration;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner of a record. Every journal query is scoped to one user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Session,
    Instrument,
    Piece,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Session => "session",
            EntityKind::Instrument => "instrument",
            EntityKind::Piece => "piece",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: i64,
    pub owner: UserId,
    pub date: NaiveDate,
    pub duration: PracticeDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PracticeSession {
    /// Id of the instrument or piece this session is linked to.
    pub fn reference(&self, kind: EntityKind) -> Option<i64> {
        match kind {
            EntityKind::Instrument => self.instrument,
            EntityKind::Piece => self.piece,
            EntityKind::Session => None,
        }
    }

    fn clear_reference(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Instrument => self.instrument = None,
            EntityKind::Piece => self.piece = None,
            EntityKind::Session => {}
        }
    }

    pub(crate) fn unlink(&mut self, kind: EntityKind, id: i64) -> bool {
        if self.reference(kind) == Some(id) {
            self.clear_reference(kind);
            true
        } else {
            false
        }
    }
}

impl fmt::Display for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {}", self.date, self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: i64,
    pub owner: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: i64,
    pub owner: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Something sessions can be logged against: an instrument or a piece.
pub trait Practiceable {
    const KIND: EntityKind;

    fn id(&self) -> i64;
    fn owner(&self) -> &UserId;
    fn name(&self) -> &str;
}

impl Practiceable for Instrument {
    const KIND: EntityKind = EntityKind::Instrument;

    fn id(&self) -> i64 {
        self.id
    }

    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Practiceable for Piece {
    const KIND: EntityKind = EntityKind::Piece;

    fn id(&self) -> i64 {
        self.id
    }

    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// User-supplied fields of a session; ids and ownership are assigned by the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub date: NaiveDate,
    pub duration: PracticeDuration,
    #[serde(default)]
    pub instrument: Option<i64>,
    #[serde(default)]
    pub piece: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SessionDraft {
    pub fn new(date: NaiveDate, duration: PracticeDuration) -> Self {
        Self {
            date,
            duration,
            instrument: None,
            piece: None,
            notes: None,
        }
    }

    pub fn with_instrument(mut self, id: i64) -> Self {
        self.instrument = Some(id);
        self
    }

    pub fn with_piece(mut self, id: i64) -> Self {
        self.piece = Some(id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl From<&PracticeSession> for SessionDraft {
    fn from(session: &PracticeSession) -> Self {
        Self {
            date: session.date,
            duration: session.duration,
            instrument: session.instrument,
            piece: session.piece,
            notes: session.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentDraft {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl InstrumentDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceDraft {
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PieceDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: None,
            album: None,
            notes: None,
        }
    }
}

/// Blank optional text is stored as absent.
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

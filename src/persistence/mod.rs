use crate::journal::{IdCounters, Journal, JournalError};
use crate::model::{Instrument, PracticeSession, Piece};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("storage lock poisoned")]
    LockPoisoned,
}

impl From<JournalError> for PersistenceError {
    fn from(value: JournalError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait JournalStore {
    fn save_journal(&self, journal: &Journal) -> PersistenceResult<()>;
    fn load_journal(&self) -> PersistenceResult<Option<Journal>>;
}

/// Flat copy of every record, as written to JSON files.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct JournalSnapshot {
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub pieces: Vec<Piece>,
    #[serde(default)]
    pub sessions: Vec<PracticeSession>,
    #[serde(default)]
    pub last_ids: IdCounters,
}

impl JournalSnapshot {
    pub(crate) fn from_journal(journal: &Journal) -> Self {
        Self {
            instruments: journal.instruments().cloned().collect(),
            pieces: journal.pieces().cloned().collect(),
            sessions: journal.sessions().cloned().collect(),
            last_ids: journal.last_ids(),
        }
    }

    pub(crate) fn into_journal(self) -> PersistenceResult<Journal> {
        Ok(Journal::from_parts(
            self.instruments,
            self.pieces,
            self.sessions,
            self.last_ids,
        )?)
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    export_sessions_to_csv, import_sessions_from_csv, load_journal_from_json,
    save_journal_to_json,
};

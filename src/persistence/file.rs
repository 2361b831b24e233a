use super::{JournalSnapshot, PersistenceError, PersistenceResult};
use crate::duration::PracticeDuration;
use crate::journal::Journal;
use crate::model::{InstrumentDraft, PieceDraft, SessionDraft, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

pub fn save_journal_to_json<P: AsRef<Path>>(journal: &Journal, path: P) -> PersistenceResult<()> {
    let snapshot = JournalSnapshot::from_journal(journal);
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    info!(path = %path.as_ref().display(), sessions = snapshot.sessions.len(), "journal saved");
    Ok(())
}

pub fn load_journal_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Journal> {
    let file = File::open(path.as_ref())?;
    let snapshot: JournalSnapshot = serde_json::from_reader(file)?;
    let journal = snapshot.into_journal()?;
    info!(path = %path.as_ref().display(), "journal loaded");
    Ok(journal)
}

/// One session per row. Instruments and pieces are referenced by name so the
/// file stays readable and can be imported into another journal.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionCsvRecord {
    date: String,
    #[serde(default)]
    duration_seconds: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    instrument: String,
    #[serde(default)]
    piece: String,
    #[serde(default)]
    notes: String,
}

/// Writes the user's sessions, oldest first.
pub fn export_sessions_to_csv<P: AsRef<Path>>(
    journal: &Journal,
    user: &UserId,
    path: P,
) -> PersistenceResult<usize> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    let sessions = journal.user_sessions(user);
    for session in &sessions {
        let instrument = session
            .instrument
            .and_then(|id| journal.instrument(user, id).ok())
            .map(|i| i.name.clone())
            .unwrap_or_default();
        let piece = session
            .piece
            .and_then(|id| journal.piece(user, id).ok())
            .map(|p| p.name.clone())
            .unwrap_or_default();
        writer.serialize(SessionCsvRecord {
            date: session.date.format("%Y-%m-%d").to_string(),
            duration_seconds: session.duration.as_seconds().to_string(),
            duration: session.duration.to_string(),
            instrument,
            piece,
            notes: session.notes.clone().unwrap_or_default(),
        })?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), user = %user, count = sessions.len(), "sessions exported");
    Ok(sessions.len())
}

/// Appends the sessions of a CSV file to the user's journal.
///
/// Instruments and pieces are matched by name (case-insensitive) and created
/// when missing. The import is all-or-nothing: on any bad row the journal is
/// left untouched.
pub fn import_sessions_from_csv<P: AsRef<Path>>(
    journal: &mut Journal,
    user: &UserId,
    path: P,
) -> PersistenceResult<usize> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut staged = journal.clone();
    let mut imported = 0;
    for (row, record) in reader.deserialize::<SessionCsvRecord>().enumerate() {
        let record = record?;
        let draft = record
            .into_draft(&mut staged, user)
            .map_err(|err| PersistenceError::InvalidData(format!("row {}: {err}", row + 1)))?;
        staged
            .log_session(user, draft)
            .map_err(|err| PersistenceError::InvalidData(format!("row {}: {err}", row + 1)))?;
        imported += 1;
    }
    *journal = staged;
    info!(path = %path.as_ref().display(), user = %user, count = imported, "sessions imported");
    Ok(imported)
}

impl SessionCsvRecord {
    fn into_draft(self, journal: &mut Journal, user: &UserId) -> PersistenceResult<SessionDraft> {
        let date = parse_date(&self.date)?;
        let duration = parse_duration(&self.duration_seconds, &self.duration)?;
        let mut draft = SessionDraft::new(date, duration);
        if let Some(name) = non_blank(&self.instrument) {
            let id = match journal.find_instrument_by_name(user, name) {
                Some(existing) => existing.id,
                None => journal.add_instrument(user, InstrumentDraft::new(name))?.id,
            };
            draft = draft.with_instrument(id);
        }
        if let Some(name) = non_blank(&self.piece) {
            let id = match journal.find_piece_by_name(user, name) {
                Some(existing) => existing.id,
                None => journal.add_piece(user, PieceDraft::new(name))?.id,
            };
            draft = draft.with_piece(id);
        }
        if let Some(notes) = non_blank(&self.notes) {
            draft = draft.with_notes(notes);
        }
        Ok(draft)
    }
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

/// Prefers the exact second count and falls back to the human-readable column.
fn parse_duration(seconds: &str, label: &str) -> PersistenceResult<PracticeDuration> {
    if let Some(seconds) = non_blank(seconds) {
        return seconds
            .parse::<i64>()
            .map(PracticeDuration::from_seconds)
            .map_err(|e| PersistenceError::InvalidData(format!("invalid seconds '{seconds}': {e}")));
    }
    label
        .parse::<PracticeDuration>()
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

use super::{JournalStore, PersistenceError, PersistenceResult};
use crate::duration::PracticeDuration;
use crate::journal::{IdCounters, Journal};
use crate::model::{EntityKind, Instrument, PracticeSession, Piece, UserId};
use chrono::NaiveDate;
use rusqlite::{Connection, Transaction, params};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

pub struct SqliteJournalStore {
    connection: Mutex<Connection>,
}

impl SqliteJournalStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS instruments (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                notes TEXT
            );
            CREATE TABLE IF NOT EXISTS pieces (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                artist TEXT,
                album TEXT,
                notes TEXT
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                date TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                instrument_id INTEGER REFERENCES instruments(id) ON DELETE SET NULL,
                piece_id INTEGER REFERENCES pieces(id) ON DELETE SET NULL,
                notes TEXT
            );
            CREATE INDEX IF NOT EXISTS sessions_owner_date ON sessions (owner, date);
            CREATE TABLE IF NOT EXISTS id_counters (
                kind TEXT PRIMARY KEY,
                last_id INTEGER NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_instruments(&self, tx: &Transaction, journal: &Journal) -> PersistenceResult<()> {
        let mut stmt = tx.prepare("INSERT INTO instruments (id, owner, name, notes) VALUES (?1, ?2, ?3, ?4)")?;
        for instrument in journal.instruments() {
            stmt.execute(params![
                instrument.id,
                instrument.owner.as_str(),
                instrument.name,
                instrument.notes
            ])?;
        }
        Ok(())
    }

    fn save_pieces(&self, tx: &Transaction, journal: &Journal) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO pieces (id, owner, name, artist, album, notes) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for piece in journal.pieces() {
            stmt.execute(params![
                piece.id,
                piece.owner.as_str(),
                piece.name,
                piece.artist,
                piece.album,
                piece.notes
            ])?;
        }
        Ok(())
    }

    fn save_sessions(&self, tx: &Transaction, journal: &Journal) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO sessions (id, owner, date, duration_seconds, instrument_id, piece_id, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for session in journal.sessions() {
            stmt.execute(params![
                session.id,
                session.owner.as_str(),
                session.date.format("%Y-%m-%d").to_string(),
                session.duration.as_seconds(),
                session.instrument,
                session.piece,
                session.notes
            ])?;
        }
        Ok(())
    }

    fn save_id_counters(&self, tx: &Transaction, journal: &Journal) -> PersistenceResult<()> {
        let last_ids = journal.last_ids();
        let mut stmt = tx.prepare("INSERT INTO id_counters (kind, last_id) VALUES (?1, ?2)")?;
        for kind in [EntityKind::Instrument, EntityKind::Piece, EntityKind::Session] {
            stmt.execute(params![kind.as_str(), last_ids.last(kind)])?;
        }
        Ok(())
    }

    fn load_id_counters(conn: &Connection) -> PersistenceResult<IdCounters> {
        let mut stmt = conn.prepare("SELECT kind, last_id FROM id_counters")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut last_ids = IdCounters::default();
        for row in rows {
            let (kind, last_id) = row?;
            match kind.as_str() {
                "instrument" => last_ids.instrument = last_id,
                "piece" => last_ids.piece = last_id,
                "session" => last_ids.session = last_id,
                other => {
                    return Err(PersistenceError::InvalidData(format!(
                        "unknown id counter '{other}'"
                    )));
                }
            }
        }
        Ok(last_ids)
    }

    fn load_instruments(conn: &Connection) -> PersistenceResult<Vec<Instrument>> {
        let mut stmt = conn.prepare("SELECT id, owner, name, notes FROM instruments ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Instrument {
                id: row.get(0)?,
                owner: UserId::new(row.get::<_, String>(1)?),
                name: row.get(2)?,
                notes: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_pieces(conn: &Connection) -> PersistenceResult<Vec<Piece>> {
        let mut stmt = conn.prepare(
            "SELECT id, owner, name, artist, album, notes FROM pieces ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Piece {
                id: row.get(0)?,
                owner: UserId::new(row.get::<_, String>(1)?),
                name: row.get(2)?,
                artist: row.get(3)?,
                album: row.get(4)?,
                notes: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_sessions(conn: &Connection) -> PersistenceResult<Vec<PracticeSession>> {
        let mut stmt = conn.prepare(
            "SELECT id, owner, date, duration_seconds, instrument_id, piece_id, notes \
             FROM sessions ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, owner, date, seconds, instrument, piece, notes) = row?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                PersistenceError::InvalidData(format!("session {id} has invalid date '{date}': {e}"))
            })?;
            sessions.push(PracticeSession {
                id,
                owner: UserId::new(owner),
                date,
                duration: PracticeDuration::from_seconds(seconds),
                instrument,
                piece,
                notes,
            });
        }
        Ok(sessions)
    }
}

impl JournalStore for SqliteJournalStore {
    fn save_journal(&self, journal: &Journal) -> PersistenceResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM sessions", [])?;
        tx.execute("DELETE FROM pieces", [])?;
        tx.execute("DELETE FROM instruments", [])?;
        tx.execute("DELETE FROM id_counters", [])?;
        self.save_instruments(&tx, journal)?;
        self.save_pieces(&tx, journal)?;
        self.save_sessions(&tx, journal)?;
        self.save_id_counters(&tx, journal)?;
        tx.commit()?;
        info!("journal saved to sqlite");
        Ok(())
    }

    fn load_journal(&self) -> PersistenceResult<Option<Journal>> {
        let conn = self.lock()?;
        let instruments = Self::load_instruments(&conn)?;
        let pieces = Self::load_pieces(&conn)?;
        let sessions = Self::load_sessions(&conn)?;
        let last_ids = Self::load_id_counters(&conn)?;
        if instruments.is_empty() && pieces.is_empty() && sessions.is_empty() && last_ids.is_zero() {
            return Ok(None);
        }
        Ok(Some(Journal::from_parts(instruments, pieces, sessions, last_ids)?))
    }
}

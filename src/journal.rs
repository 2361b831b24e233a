use crate::aggregate::{DurationSummary, select_most_practiced};
use crate::filter::{InstrumentFilter, PieceFilter, SessionFilter};
use crate::model::{
    EntityKind, Instrument, InstrumentDraft, PracticeSession, Practiceable, Piece, PieceDraft,
    SessionDraft, UserId, normalize_text,
};
use crate::streak::current_streak;
use crate::validation::{self, ValidationError};
use crate::views::{EntityDetailView, EntityListView, SessionListView};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("no {kind} ids left")]
    IdsExhausted { kind: EntityKind },
}

impl JournalError {
    fn not_found(kind: EntityKind, id: i64) -> Self {
        JournalError::NotFound { kind, id }
    }
}

pub type JournalResult<T> = Result<T, JournalError>;

/// Highest id handed out so far for each kind.
///
/// Ids are never reused, including after the record holding the highest id
/// is deleted, so the counters are persisted along with the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    #[serde(default)]
    pub instrument: i64,
    #[serde(default)]
    pub piece: i64,
    #[serde(default)]
    pub session: i64,
}

impl IdCounters {
    pub fn last(&self, kind: EntityKind) -> i64 {
        match kind {
            EntityKind::Instrument => self.instrument,
            EntityKind::Piece => self.piece,
            EntityKind::Session => self.session,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn slot_mut(&mut self, kind: EntityKind) -> &mut i64 {
        match kind {
            EntityKind::Instrument => &mut self.instrument,
            EntityKind::Piece => &mut self.piece,
            EntityKind::Session => &mut self.session,
        }
    }

    fn next(&self, kind: EntityKind) -> JournalResult<i64> {
        self.last(kind)
            .checked_add(1)
            .ok_or(JournalError::IdsExhausted { kind })
    }

    fn record(&mut self, kind: EntityKind, id: i64) {
        let slot = self.slot_mut(kind);
        *slot = (*slot).max(id);
    }
}

/// Practice records of every user, keyed by id.
///
/// All accessors take the requesting user and only ever see that user's
/// records; another user's record is reported as not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journal {
    instruments: BTreeMap<i64, Instrument>,
    pieces: BTreeMap<i64, Piece>,
    sessions: BTreeMap<i64, PracticeSession>,
    last_ids: IdCounters,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a journal from stored records after validating them as a whole.
    pub fn from_records(
        instruments: Vec<Instrument>,
        pieces: Vec<Piece>,
        sessions: Vec<PracticeSession>,
    ) -> JournalResult<Self> {
        Self::from_parts(instruments, pieces, sessions, IdCounters::default())
    }

    /// Like [`Journal::from_records`], also restoring the id counters. A
    /// counter below the highest stored id of its kind is raised to it.
    pub fn from_parts(
        instruments: Vec<Instrument>,
        pieces: Vec<Piece>,
        sessions: Vec<PracticeSession>,
        mut last_ids: IdCounters,
    ) -> JournalResult<Self> {
        validation::validate_records(&instruments, &pieces, &sessions)?;
        for instrument in &instruments {
            last_ids.record(EntityKind::Instrument, instrument.id);
        }
        for piece in &pieces {
            last_ids.record(EntityKind::Piece, piece.id);
        }
        for session in &sessions {
            last_ids.record(EntityKind::Session, session.id);
        }
        Ok(Self {
            instruments: instruments.into_iter().map(|i| (i.id, i)).collect(),
            pieces: pieces.into_iter().map(|p| (p.id, p)).collect(),
            sessions: sessions.into_iter().map(|s| (s.id, s)).collect(),
            last_ids,
        })
    }

    pub fn last_ids(&self) -> IdCounters {
        self.last_ids
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &PracticeSession> {
        self.sessions.values()
    }

    // ---- instruments ----

    pub fn user_instruments<'a>(&'a self, user: &UserId) -> impl Iterator<Item = &'a Instrument> {
        self.instruments.values().filter(move |i| &i.owner == user)
    }

    pub fn instrument(&self, user: &UserId, id: i64) -> JournalResult<&Instrument> {
        self.instruments
            .get(&id)
            .filter(|i| &i.owner == user)
            .ok_or_else(|| JournalError::not_found(EntityKind::Instrument, id))
    }

    pub fn find_instrument_by_name(&self, user: &UserId, name: &str) -> Option<&Instrument> {
        let name = name.trim();
        self.user_instruments(user)
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }

    pub fn add_instrument(&mut self, user: &UserId, draft: InstrumentDraft) -> JournalResult<Instrument> {
        let instrument = Instrument {
            id: self.last_ids.next(EntityKind::Instrument)?,
            owner: user.clone(),
            name: draft.name.trim().to_string(),
            notes: normalize_text(draft.notes),
        };
        validation::validate_instrument(&instrument)?;
        debug!(user = %user, id = instrument.id, name = %instrument.name, "instrument added");
        self.last_ids.record(EntityKind::Instrument, instrument.id);
        self.instruments.insert(instrument.id, instrument.clone());
        Ok(instrument)
    }

    pub fn update_instrument(
        &mut self,
        user: &UserId,
        id: i64,
        draft: InstrumentDraft,
    ) -> JournalResult<Instrument> {
        let mut instrument = self.instrument(user, id)?.clone();
        instrument.name = draft.name.trim().to_string();
        instrument.notes = normalize_text(draft.notes);
        validation::validate_instrument(&instrument)?;
        debug!(user = %user, id, "instrument updated");
        self.instruments.insert(id, instrument.clone());
        Ok(instrument)
    }

    /// Removes the instrument. Its sessions stay, with the link cleared.
    pub fn delete_instrument(&mut self, user: &UserId, id: i64) -> JournalResult<Instrument> {
        self.instrument(user, id)?;
        let removed = self
            .instruments
            .remove(&id)
            .ok_or_else(|| JournalError::not_found(EntityKind::Instrument, id))?;
        let unlinked = self.unlink_sessions(EntityKind::Instrument, id);
        debug!(user = %user, id, unlinked, "instrument deleted");
        Ok(removed)
    }

    // ---- pieces ----

    pub fn user_pieces<'a>(&'a self, user: &UserId) -> impl Iterator<Item = &'a Piece> {
        self.pieces.values().filter(move |p| &p.owner == user)
    }

    pub fn piece(&self, user: &UserId, id: i64) -> JournalResult<&Piece> {
        self.pieces
            .get(&id)
            .filter(|p| &p.owner == user)
            .ok_or_else(|| JournalError::not_found(EntityKind::Piece, id))
    }

    pub fn find_piece_by_name(&self, user: &UserId, name: &str) -> Option<&Piece> {
        let name = name.trim();
        self.user_pieces(user).find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn add_piece(&mut self, user: &UserId, draft: PieceDraft) -> JournalResult<Piece> {
        let id = self.last_ids.next(EntityKind::Piece)?;
        let piece = Self::piece_from_draft(id, user, draft);
        validation::validate_piece(&piece)?;
        debug!(user = %user, id, name = %piece.name, "piece added");
        self.last_ids.record(EntityKind::Piece, id);
        self.pieces.insert(piece.id, piece.clone());
        Ok(piece)
    }

    pub fn update_piece(&mut self, user: &UserId, id: i64, draft: PieceDraft) -> JournalResult<Piece> {
        self.piece(user, id)?;
        let piece = Self::piece_from_draft(id, user, draft);
        validation::validate_piece(&piece)?;
        debug!(user = %user, id, "piece updated");
        self.pieces.insert(id, piece.clone());
        Ok(piece)
    }

    /// Removes the piece. Its sessions stay, with the link cleared.
    pub fn delete_piece(&mut self, user: &UserId, id: i64) -> JournalResult<Piece> {
        self.piece(user, id)?;
        let removed = self
            .pieces
            .remove(&id)
            .ok_or_else(|| JournalError::not_found(EntityKind::Piece, id))?;
        let unlinked = self.unlink_sessions(EntityKind::Piece, id);
        debug!(user = %user, id, unlinked, "piece deleted");
        Ok(removed)
    }

    fn piece_from_draft(id: i64, user: &UserId, draft: PieceDraft) -> Piece {
        Piece {
            id,
            owner: user.clone(),
            name: draft.name.trim().to_string(),
            artist: normalize_text(draft.artist),
            album: normalize_text(draft.album),
            notes: normalize_text(draft.notes),
        }
    }

    // ---- sessions ----

    /// The user's sessions in date order, oldest first.
    pub fn user_sessions(&self, user: &UserId) -> Vec<&PracticeSession> {
        let mut sessions: Vec<&PracticeSession> =
            self.sessions.values().filter(|s| &s.owner == user).collect();
        sessions.sort_by_key(|s| (s.date, s.id));
        sessions
    }

    pub fn session(&self, user: &UserId, id: i64) -> JournalResult<&PracticeSession> {
        self.sessions
            .get(&id)
            .filter(|s| &s.owner == user)
            .ok_or_else(|| JournalError::not_found(EntityKind::Session, id))
    }

    pub fn log_session(&mut self, user: &UserId, draft: SessionDraft) -> JournalResult<PracticeSession> {
        let id = self.last_ids.next(EntityKind::Session)?;
        let session = self.session_from_draft(id, user, draft)?;
        debug!(user = %user, id, date = %session.date, "session logged");
        self.last_ids.record(EntityKind::Session, id);
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    pub fn update_session(
        &mut self,
        user: &UserId,
        id: i64,
        draft: SessionDraft,
    ) -> JournalResult<PracticeSession> {
        self.session(user, id)?;
        let session = self.session_from_draft(id, user, draft)?;
        debug!(user = %user, id, "session updated");
        self.sessions.insert(id, session.clone());
        Ok(session)
    }

    pub fn delete_session(&mut self, user: &UserId, id: i64) -> JournalResult<PracticeSession> {
        self.session(user, id)?;
        let removed = self
            .sessions
            .remove(&id)
            .ok_or_else(|| JournalError::not_found(EntityKind::Session, id))?;
        debug!(user = %user, id, "session deleted");
        Ok(removed)
    }

    fn session_from_draft(
        &self,
        id: i64,
        user: &UserId,
        draft: SessionDraft,
    ) -> JournalResult<PracticeSession> {
        validation::validate_duration(draft.duration)?;
        if let Some(instrument) = draft.instrument {
            self.instrument(user, instrument).map_err(|_| {
                ValidationError::UnknownReference {
                    kind: EntityKind::Instrument,
                    id: instrument,
                }
            })?;
        }
        if let Some(piece) = draft.piece {
            self.piece(user, piece).map_err(|_| ValidationError::UnknownReference {
                kind: EntityKind::Piece,
                id: piece,
            })?;
        }
        Ok(PracticeSession {
            id,
            owner: user.clone(),
            date: draft.date,
            duration: draft.duration,
            instrument: draft.instrument,
            piece: draft.piece,
            notes: normalize_text(draft.notes),
        })
    }

    fn unlink_sessions(&mut self, kind: EntityKind, id: i64) -> usize {
        let mut unlinked = 0;
        for session in self.sessions.values_mut() {
            if session.unlink(kind, id) {
                unlinked += 1;
            }
        }
        unlinked
    }

    fn sessions_of<T: Practiceable>(&self, entity: &T) -> Vec<PracticeSession> {
        let mut sessions: Vec<PracticeSession> = self
            .sessions
            .values()
            .filter(|s| s.owner == *entity.owner() && s.reference(T::KIND) == Some(entity.id()))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        sessions
    }

    // ---- views ----

    pub fn streak(&self, user: &UserId, today: NaiveDate) -> u32 {
        current_streak(self.user_sessions(user).iter().map(|s| s.date), today)
    }

    pub fn session_list(
        &self,
        user: &UserId,
        filter: &SessionFilter,
        today: NaiveDate,
    ) -> SessionListView {
        let all = self.user_sessions(user);
        let summary = DurationSummary::from_durations(all.iter().map(|s| s.duration));
        let streak = current_streak(all.iter().map(|s| s.date), today);
        let mut listed: Vec<PracticeSession> = all
            .into_iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        listed.reverse();
        SessionListView::new(listed, streak, summary)
    }

    pub fn instrument_list(&self, user: &UserId, filter: &InstrumentFilter) -> EntityListView<Instrument> {
        let all: Vec<&Instrument> = self.user_instruments(user).collect();
        self.entity_list(all, |i| filter.matches(i))
    }

    pub fn piece_list(&self, user: &UserId, filter: &PieceFilter) -> EntityListView<Piece> {
        let all: Vec<&Piece> = self.user_pieces(user).collect();
        self.entity_list(all, |p| filter.matches(p))
    }

    fn entity_list<T, F>(&self, all: Vec<&T>, keep: F) -> EntityListView<T>
    where
        T: Practiceable + Clone,
        F: Fn(&T) -> bool,
    {
        let grouped: Vec<(&str, Vec<_>)> = all
            .iter()
            .map(|entity| {
                let durations = self
                    .sessions_of(*entity)
                    .into_iter()
                    .map(|s| s.duration)
                    .collect();
                (entity.name(), durations)
            })
            .collect();
        let most_practiced = select_most_practiced(grouped);
        let total_count = all.len();
        let items = all.into_iter().filter(|e| keep(e)).cloned().collect();
        EntityListView::new(items, most_practiced, total_count)
    }

    pub fn instrument_detail(&self, user: &UserId, id: i64) -> JournalResult<EntityDetailView<Instrument>> {
        let instrument = self.instrument(user, id)?;
        Ok(EntityDetailView::new(instrument.clone(), self.sessions_of(instrument)))
    }

    pub fn piece_detail(&self, user: &UserId, id: i64) -> JournalResult<EntityDetailView<Piece>> {
        let piece = self.piece(user, id)?;
        Ok(EntityDetailView::new(piece.clone(), self.sessions_of(piece)))
    }
}

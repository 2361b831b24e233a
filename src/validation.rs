use crate::duration::PracticeDuration;
use crate::model::{EntityKind, Instrument, PracticeSession, Piece};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duration is too low")]
    DurationTooLow,
    #[error("duration is too high")]
    DurationTooHigh,
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters (got {len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
    #[error("{kind} {id} does not exist for this user")]
    UnknownReference { kind: EntityKind, id: i64 },
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: i64 },
}

pub fn validate_duration(duration: PracticeDuration) -> Result<(), ValidationError> {
    if duration < PracticeDuration::ZERO {
        return Err(ValidationError::DurationTooLow);
    }
    if duration > PracticeDuration::MAX_SESSION {
        return Err(ValidationError::DurationTooHigh);
    }
    Ok(())
}

pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    validate_length(field, Some(name))
}

pub fn validate_length(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    let len = value.map(|v| v.chars().count()).unwrap_or(0);
    if len > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
            len,
        });
    }
    Ok(())
}

pub fn validate_instrument(instrument: &Instrument) -> Result<(), ValidationError> {
    validate_name("name", &instrument.name)
}

pub fn validate_piece(piece: &Piece) -> Result<(), ValidationError> {
    validate_name("name", &piece.name)?;
    validate_length("artist", piece.artist.as_deref())?;
    validate_length("album", piece.album.as_deref())
}

pub fn validate_session(session: &PracticeSession) -> Result<(), ValidationError> {
    validate_duration(session.duration)
}

/// Checks a full set of records as loaded from storage: unique ids, valid
/// fields, and every session reference pointing at a record of the same owner.
pub fn validate_records(
    instruments: &[Instrument],
    pieces: &[Piece],
    sessions: &[PracticeSession],
) -> Result<(), ValidationError> {
    let mut instrument_owners = HashMap::with_capacity(instruments.len());
    for instrument in instruments {
        if instrument_owners
            .insert(instrument.id, &instrument.owner)
            .is_some()
        {
            return Err(ValidationError::DuplicateId {
                kind: EntityKind::Instrument,
                id: instrument.id,
            });
        }
        validate_instrument(instrument)?;
    }

    let mut piece_owners = HashMap::with_capacity(pieces.len());
    for piece in pieces {
        if piece_owners.insert(piece.id, &piece.owner).is_some() {
            return Err(ValidationError::DuplicateId {
                kind: EntityKind::Piece,
                id: piece.id,
            });
        }
        validate_piece(piece)?;
    }

    let mut session_ids = HashSet::with_capacity(sessions.len());
    for session in sessions {
        if !session_ids.insert(session.id) {
            return Err(ValidationError::DuplicateId {
                kind: EntityKind::Session,
                id: session.id,
            });
        }
        validate_session(session)?;
        if let Some(id) = session.instrument {
            if instrument_owners.get(&id) != Some(&&session.owner) {
                return Err(ValidationError::UnknownReference {
                    kind: EntityKind::Instrument,
                    id,
                });
            }
        }
        if let Some(id) = session.piece {
            if piece_owners.get(&id) != Some(&&session.owner) {
                return Err(ValidationError::UnknownReference {
                    kind: EntityKind::Piece,
                    id,
                });
            }
        }
    }
    Ok(())
}

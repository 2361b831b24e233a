pub mod aggregate;
pub mod config;
pub mod duration;
pub mod filter;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod journal;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod streak;
pub mod validation;
pub mod views;

pub use aggregate::{
    DurationSummary, MostPracticed, average_duration, max_duration, select_most_practiced,
    total_duration,
};
pub use config::{AppConfig, ConfigError};
pub use duration::{DurationParseError, PracticeDuration, format_duration, format_total_time};
pub use filter::{InstrumentFilter, PieceFilter, SessionFilter};
pub use journal::{IdCounters, Journal, JournalError, JournalResult};
pub use model::{
    EntityKind, Instrument, InstrumentDraft, PracticeSession, Practiceable, Piece, PieceDraft,
    SessionDraft, UserId,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteJournalStore;
pub use persistence::{
    JournalStore, PersistenceError, PersistenceResult, export_sessions_to_csv,
    import_sessions_from_csv, load_journal_from_json, save_journal_to_json,
};
pub use streak::current_streak;
pub use validation::ValidationError;
pub use views::{EntityDetailView, EntityListView, SessionListView, SessionStatsDisplay};

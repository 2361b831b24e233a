use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    EntityDetailView, EntityListView, Instrument, InstrumentDraft, InstrumentFilter, Journal,
    JournalError, JournalStore, Piece, PieceDraft, PieceFilter, PracticeSession, SessionDraft,
    SessionFilter, SessionListView, UserId,
};

/// Header carrying the requesting user's name.
pub const USER_HEADER: &str = "x-practice-user";

type SharedStore = Arc<dyn JournalStore + Send + Sync>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;
type IdPath = Result<Path<i64>, PathRejection>;

#[derive(Clone)]
pub struct AppState {
    journal: Arc<RwLock<Journal>>,
    store: Option<SharedStore>,
}

impl AppState {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal: Arc::new(RwLock::new(journal)),
            store: None,
        }
    }

    /// Every successful mutation is written through to `store`.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    fn read<T>(&self, view: impl FnOnce(&Journal) -> T) -> T {
        let guard = self.journal.read();
        view(&*guard)
    }

    /// Applies `change` under the write lock. With a store configured the
    /// change is made on a copy, which replaces the shared journal only after
    /// it has been saved.
    fn mutate<T, F>(&self, change: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Journal) -> Result<T, JournalError>,
    {
        let mut guard = self.journal.write();
        let Some(store) = &self.store else {
            return Ok(change(&mut *guard)?);
        };
        let mut staged = guard.clone();
        let output = change(&mut staged)?;
        store
            .save_journal(&staged)
            .map_err(|err| ApiError::internal(format!("failed to save journal: {err}")))?;
        *guard = staged;
        Ok(output)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Unauthorized(String),
    Internal(String),
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<JournalError> for ApiError {
    fn from(value: JournalError) -> Self {
        match value {
            JournalError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            JournalError::Invalid(err) => ApiError::Invalid(err.to_string()),
            JournalError::IdsExhausted { .. } => ApiError::Internal(value.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "unauthorized", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        }
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

fn current_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let value = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            warn!("request without {USER_HEADER} header");
            ApiError::Unauthorized(format!("missing {USER_HEADER} header"))
        })?;
    Ok(UserId::new(value))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", get(list_sessions).post(create_session))
        .route(
            "/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/instruments", get(list_instruments).post(create_instrument))
        .route(
            "/instruments/:id",
            get(get_instrument)
                .put(update_instrument)
                .delete(delete_instrument),
        )
        .route("/pieces", get(list_pieces).post(create_piece))
        .route(
            "/pieces/:id",
            get(get_piece).put(update_piece).delete(delete_piece),
        )
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "practice-log HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ---- sessions ----

async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
    filter: Result<Query<SessionFilter>, QueryRejection>,
) -> Result<Json<SessionListView>, ApiError> {
    let user = current_user(&headers)?;
    let Query(filter) = filter?;
    let view = state.read(|journal| journal.session_list(&user, &filter, today()));
    Ok(Json(view))
}

async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
) -> Result<Json<PracticeSession>, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    let found = state.read(|journal| journal.session(&user, id).cloned())?;
    Ok(Json(found))
}

async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    draft: JsonBody<SessionDraft>,
) -> Result<(StatusCode, Json<PracticeSession>), ApiError> {
    let user = current_user(&headers)?;
    let Json(draft) = draft?;
    let created = state.mutate(|journal| journal.log_session(&user, draft))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
    draft: JsonBody<SessionDraft>,
) -> Result<Json<PracticeSession>, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    let Json(draft) = draft?;
    let updated = state.mutate(|journal| journal.update_session(&user, id, draft))?;
    Ok(Json(updated))
}

async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
) -> Result<StatusCode, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    state.mutate(|journal| journal.delete_session(&user, id))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- instruments ----

async fn list_instruments(
    State(state): State<AppState>,
    headers: HeaderMap,
    filter: Result<Query<InstrumentFilter>, QueryRejection>,
) -> Result<Json<EntityListView<Instrument>>, ApiError> {
    let user = current_user(&headers)?;
    let Query(filter) = filter?;
    let view = state.read(|journal| journal.instrument_list(&user, &filter));
    Ok(Json(view))
}

async fn get_instrument(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
) -> Result<Json<EntityDetailView<Instrument>>, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    let found = state.read(|journal| journal.instrument_detail(&user, id))?;
    Ok(Json(found))
}

async fn create_instrument(
    State(state): State<AppState>,
    headers: HeaderMap,
    draft: JsonBody<InstrumentDraft>,
) -> Result<(StatusCode, Json<Instrument>), ApiError> {
    let user = current_user(&headers)?;
    let Json(draft) = draft?;
    let created = state.mutate(|journal| journal.add_instrument(&user, draft))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_instrument(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
    draft: JsonBody<InstrumentDraft>,
) -> Result<Json<Instrument>, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    let Json(draft) = draft?;
    let updated = state.mutate(|journal| journal.update_instrument(&user, id, draft))?;
    Ok(Json(updated))
}

async fn delete_instrument(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
) -> Result<StatusCode, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    state.mutate(|journal| journal.delete_instrument(&user, id))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- pieces ----

async fn list_pieces(
    State(state): State<AppState>,
    headers: HeaderMap,
    filter: Result<Query<PieceFilter>, QueryRejection>,
) -> Result<Json<EntityListView<Piece>>, ApiError> {
    let user = current_user(&headers)?;
    let Query(filter) = filter?;
    let view = state.read(|journal| journal.piece_list(&user, &filter));
    Ok(Json(view))
}

async fn get_piece(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
) -> Result<Json<EntityDetailView<Piece>>, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    let found = state.read(|journal| journal.piece_detail(&user, id))?;
    Ok(Json(found))
}

async fn create_piece(
    State(state): State<AppState>,
    headers: HeaderMap,
    draft: JsonBody<PieceDraft>,
) -> Result<(StatusCode, Json<Piece>), ApiError> {
    let user = current_user(&headers)?;
    let Json(draft) = draft?;
    let created = state.mutate(|journal| journal.add_piece(&user, draft))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_piece(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
    draft: JsonBody<PieceDraft>,
) -> Result<Json<Piece>, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    let Json(draft) = draft?;
    let updated = state.mutate(|journal| journal.update_piece(&user, id, draft))?;
    Ok(Json(updated))
}

async fn delete_piece(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: IdPath,
) -> Result<StatusCode, ApiError> {
    let user = current_user(&headers)?;
    let Path(id) = id?;
    state.mutate(|journal| journal.delete_piece(&user, id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_errors_map_to_api_errors() {
        let not_found = JournalError::NotFound {
            kind: crate::EntityKind::Piece,
            id: 7,
        };
        assert!(matches!(ApiError::from(not_found), ApiError::NotFound(m) if m == "piece 7 not found"));
        let invalid = JournalError::Invalid(crate::ValidationError::DurationTooHigh);
        assert!(matches!(ApiError::from(invalid), ApiError::Invalid(m) if m == "duration is too high"));
        let exhausted = JournalError::IdsExhausted {
            kind: crate::EntityKind::Session,
        };
        assert!(matches!(ApiError::from(exhausted), ApiError::Internal(m) if m == "no session ids left"));
    }
}

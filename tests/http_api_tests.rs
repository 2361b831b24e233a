#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    response::Response,
};
use practice_log::{
    Instrument, Journal, JournalStore, PersistenceError, PersistenceResult, PracticeSession,
    SessionListView, http_api::{self, USER_HEADER},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Store whose every save fails.
struct ReadOnlyStore;

impl JournalStore for ReadOnlyStore {
    fn save_journal(&self, _journal: &Journal) -> PersistenceResult<()> {
        Err(PersistenceError::InvalidData("store is read-only".into()))
    }

    fn load_journal(&self) -> PersistenceResult<Option<Journal>> {
        Ok(None)
    }
}

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(Journal::new());
    http_api::router(state)
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_user() {
    let response = new_router()
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response).await;
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn requests_without_user_are_unauthorized() {
    let response = new_router()
        .oneshot(request("GET", "/sessions", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], json!("unauthorized"));
}

#[tokio::test]
async fn session_lifecycle_via_http_api() {
    let app = new_router();

    // Create an instrument to link against
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/instruments",
            Some("ivy"),
            Some(json!({ "name": "Piano" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let piano: Instrument = json_body(response).await;
    assert_eq!(piano.id, 1);

    // Log a session
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/sessions",
            Some("ivy"),
            Some(json!({ "date": "2025-03-01", "duration": 5400, "instrument": piano.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let session: PracticeSession = json_body(response).await;
    assert_eq!(session.instrument, Some(piano.id));

    // Fetch it back
    let response = app
        .clone()
        .oneshot(request("GET", "/sessions/1", Some("ivy"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: PracticeSession = json_body(response).await;
    assert_eq!(fetched, session);

    // Another user cannot see it
    let response = app
        .clone()
        .oneshot(request("GET", "/sessions/1", Some("jon"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Update the notes
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/sessions/1",
            Some("ivy"),
            Some(json!({ "date": "2025-03-01", "duration": 5400, "notes": "hands separately" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: PracticeSession = json_body(response).await;
    assert_eq!(updated.notes.as_deref(), Some("hands separately"));
    assert_eq!(updated.instrument, None);

    // Delete the session
    let response = app
        .clone()
        .oneshot(request("DELETE", "/sessions/1", Some("ivy"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Ensure the session is gone
    let response = app
        .oneshot(request("GET", "/sessions/1", Some("ivy"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], json!("not_found"));
    assert_eq!(body["message"], json!("session 1 not found"));
}

#[tokio::test]
async fn out_of_range_duration_is_a_bad_request() {
    let response = new_router()
        .oneshot(request(
            "POST",
            "/sessions",
            Some("ivy"),
            Some(json!({ "date": "2025-03-01", "duration": 90_000 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], json!("invalid_request"));
    assert_eq!(body["message"], json!("duration is too high"));
}

#[tokio::test]
async fn linking_another_users_instrument_is_rejected() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/instruments",
            Some("ivy"),
            Some(json!({ "name": "Harp" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request(
            "POST",
            "/sessions",
            Some("jon"),
            Some(json!({ "date": "2025-03-01", "duration": 600, "instrument": 1 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response).await;
    assert_eq!(body["message"], json!("instrument 1 does not exist for this user"));
}

#[tokio::test]
async fn session_list_applies_query_filters() {
    let app = new_router();
    for (date, seconds) in [("2025-03-01", 600), ("2025-03-02", 3_600), ("2025-03-03", 1_800)] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/sessions",
                Some("kim"),
                Some(json!({ "date": date, "duration": seconds })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/sessions?start_date=2025-03-02&min_duration=30m&instrument=&notes=",
            Some("kim"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: SessionListView = json_body(response).await;
    let dates: Vec<String> = view.sessions.iter().map(|s| s.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-03-03", "2025-03-02"]);
    assert_eq!(view.display.sum_session, "1h");
    assert_eq!(view.display.longest_session, "1h0m");

    let response = app
        .oneshot(request("GET", "/sessions?start_date=soon", Some("kim"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], json!("invalid_request"));
}

#[tokio::test]
async fn instrument_list_reports_most_practiced() {
    let app = new_router();
    for name in ["Violin", "Viola"] {
        app.clone()
            .oneshot(request(
                "POST",
                "/instruments",
                Some("lee"),
                Some(json!({ "name": name })),
            ))
            .await
            .unwrap();
    }
    app.clone()
        .oneshot(request(
            "POST",
            "/sessions",
            Some("lee"),
            Some(json!({ "date": "2025-03-01", "duration": 7_200, "instrument": 2 })),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", "/instruments?name=viol", Some("lee"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response).await;
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["most_practiced_name"], json!("Viola"));
    assert_eq!(body["most_practiced_display"], json!("2h"));
    assert_eq!(body["total_count"], json!(2));

    // Deleting the instrument keeps the session, unlinked
    let response = app
        .clone()
        .oneshot(request("DELETE", "/instruments/2", Some("lee"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", "/sessions/1", Some("lee"), None))
        .await
        .unwrap();
    let session: PracticeSession = json_body(response).await;
    assert_eq!(session.instrument, None);
}

#[tokio::test]
async fn piece_detail_summarises_sessions() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/pieces",
            Some("max"),
            Some(json!({ "name": "Clair de Lune", "artist": "Debussy" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    for seconds in [1_200, 2_400] {
        app.clone()
            .oneshot(request(
                "POST",
                "/sessions",
                Some("max"),
                Some(json!({ "date": "2025-03-01", "duration": seconds, "piece": 1 })),
            ))
            .await
            .unwrap();
    }

    let response = app
        .oneshot(request("GET", "/pieces/1", Some("max"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response).await;
    assert_eq!(body["entity"]["artist"], json!("Debussy"));
    assert_eq!(body["sessions"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["avg_session_display"], json!("30m"));
    assert_eq!(body["sum_session_display"], json!("1h"));
}

#[tokio::test]
async fn failed_save_leaves_journal_unchanged() {
    let state = http_api::AppState::new(Journal::new()).with_store(Arc::new(ReadOnlyStore));
    let app = http_api::router(state);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/instruments",
            Some("pat"),
            Some(json!({ "name": "Oboe" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], json!("internal_error"));

    let response = app
        .clone()
        .oneshot(request("GET", "/instruments/1", Some("pat"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(request("GET", "/instruments", Some("pat"), None))
        .await
        .unwrap();
    let body: Value = json_body(response).await;
    assert_eq!(body["total_count"], json!(0));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn mutations_are_saved_to_the_store() {
    use practice_log::SqliteJournalStore;

    let store = Arc::new(SqliteJournalStore::in_memory().unwrap());
    let state = http_api::AppState::new(Journal::new()).with_store(store.clone());
    let app = http_api::router(state);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/instruments",
            Some("quinn"),
            Some(json!({ "name": "Trumpet" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    for date in ["2025-03-01", "2025-03-02"] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/sessions",
                Some("quinn"),
                Some(json!({ "date": date, "duration": 900, "instrument": 1 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let response = app
        .oneshot(request("DELETE", "/sessions/2", Some("quinn"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = store.load_journal().unwrap().expect("journal stored");
    let quinn = practice_log::UserId::new("quinn");
    assert_eq!(stored.user_instruments(&quinn).count(), 1);
    let sessions = stored.user_sessions(&quinn);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].instrument, Some(1));
    assert_eq!(stored.last_ids().session, 2);
}

#[tokio::test]
async fn malformed_body_is_a_json_bad_request() {
    let response = new_router()
        .oneshot(request(
            "POST",
            "/sessions",
            Some("ray"),
            Some(json!({ "date": "March 1st", "duration": 600 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], json!("invalid_request"));
}

#[tokio::test]
async fn non_numeric_id_is_a_json_bad_request() {
    let response = new_router()
        .oneshot(request("GET", "/sessions/abc", Some("ray"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], json!("invalid_request"));
}

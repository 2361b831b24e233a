use chrono::NaiveDate;
use practice_log::{
    InstrumentFilter, Journal, PieceDraft, PieceFilter, PracticeDuration, SessionDraft,
    SessionFilter, UserId,
};
use serde_json::json;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn mins(m: i64) -> PracticeDuration {
    PracticeDuration::from_minutes(m)
}

#[test]
fn blank_query_values_are_unset() {
    let filter: SessionFilter = serde_json::from_value(json!({
        "start_date": "",
        "end_date": "  ",
        "min_duration": "",
        "instrument": "",
        "notes": ""
    }))
    .unwrap();
    assert_eq!(filter, SessionFilter::default());

    let filter: InstrumentFilter = serde_json::from_value(json!({})).unwrap();
    assert_eq!(filter, InstrumentFilter::default());
}

#[test]
fn query_values_parse_from_text() {
    let filter: SessionFilter = serde_json::from_value(json!({
        "start_date": "2025-03-01",
        "min_duration": "1h15m",
        "max_duration": "90",
        "piece": "7"
    }))
    .unwrap();
    assert_eq!(filter.start_date, Some(d(2025, 3, 1)));
    assert_eq!(filter.min_duration, Some(mins(75)));
    assert_eq!(filter.max_duration, Some(mins(90)));
    assert_eq!(filter.piece, Some(7));
    assert_eq!(filter.end_date, None);
}

#[test]
fn malformed_query_values_are_errors() {
    let result: Result<SessionFilter, _> =
        serde_json::from_value(json!({ "start_date": "yesterday" }));
    assert!(result.is_err());

    let result: Result<SessionFilter, _> =
        serde_json::from_value(json!({ "min_duration": "forever" }));
    assert!(result.is_err());
}

#[test]
fn session_filter_bounds_are_inclusive() {
    let mut journal = Journal::new();
    let user = UserId::new("dana");
    for (day, minutes) in [(1, 20), (2, 40), (3, 60), (4, 80)] {
        journal
            .log_session(&user, SessionDraft::new(d(2025, 3, day), mins(minutes)))
            .unwrap();
    }

    let filter = SessionFilter {
        start_date: Some(d(2025, 3, 2)),
        end_date: Some(d(2025, 3, 3)),
        ..SessionFilter::default()
    };
    let view = journal.session_list(&user, &filter, d(2025, 3, 4));
    let dates: Vec<_> = view.sessions.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![d(2025, 3, 3), d(2025, 3, 2)]);

    let filter = SessionFilter {
        min_duration: Some(mins(40)),
        max_duration: Some(mins(60)),
        ..SessionFilter::default()
    };
    let view = journal.session_list(&user, &filter, d(2025, 3, 4));
    assert_eq!(view.sessions.len(), 2);
    assert_eq!(view.streak, 4);
}

#[test]
fn notes_filter_skips_sessions_without_notes() {
    let mut journal = Journal::new();
    let user = UserId::new("eli");
    journal
        .log_session(
            &user,
            SessionDraft::new(d(2025, 5, 1), mins(30)).with_notes("Worked on Arpeggios"),
        )
        .unwrap();
    journal
        .log_session(&user, SessionDraft::new(d(2025, 5, 2), mins(30)))
        .unwrap();

    let filter = SessionFilter {
        notes: Some("arpeggio".into()),
        ..SessionFilter::default()
    };
    let view = journal.session_list(&user, &filter, d(2025, 5, 2));
    assert_eq!(view.sessions.len(), 1);
    assert_eq!(view.sessions[0].date, d(2025, 5, 1));
}

#[test]
fn piece_filter_combines_fields() {
    let mut journal = Journal::new();
    let user = UserId::new("fay");
    let mut suite = PieceDraft::new("Cello Suite No. 1");
    suite.artist = Some("Bach".into());
    suite.album = Some("Suites".into());
    journal.add_piece(&user, suite).unwrap();
    let mut prelude = PieceDraft::new("Prelude in C");
    prelude.artist = Some("Bach".into());
    journal.add_piece(&user, prelude).unwrap();

    let filter = PieceFilter {
        artist: Some("BACH".into()),
        album: Some("suite".into()),
        ..PieceFilter::default()
    };
    let view = journal.piece_list(&user, &filter);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].name, "Cello Suite No. 1");
    assert_eq!(view.total_count, 2);
    assert_eq!(view.most_practiced_name, "");
    assert_eq!(view.most_practiced_display, "0m");
}

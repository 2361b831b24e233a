use practice_log::{
    DurationSummary, MostPracticed, PracticeDuration, average_duration, format_duration,
    format_total_time, max_duration, select_most_practiced, total_duration,
};

fn mins(m: i64) -> PracticeDuration {
    PracticeDuration::from_minutes(m)
}

#[test]
fn most_practiced_of_nothing_is_empty() {
    let entities: Vec<(&str, Vec<PracticeDuration>)> = Vec::new();
    let result = select_most_practiced(entities);
    assert_eq!(result, MostPracticed::default());
    assert_eq!(result.name, "");
    assert_eq!(result.total, PracticeDuration::ZERO);
}

#[test]
fn most_practiced_picks_greatest_total() {
    let entities = vec![
        ("Piano", vec![mins(60), mins(60)]),
        ("Violin", vec![mins(90), mins(90)]),
    ];
    let result = select_most_practiced(entities);
    assert_eq!(result.name, "Violin");
    assert_eq!(result.total, mins(180));
}

#[test]
fn tie_keeps_the_first_seen_entity() {
    let entities = vec![
        ("Piano", vec![mins(120)]),
        ("Violin", vec![mins(60), mins(60)]),
    ];
    let result = select_most_practiced(entities);
    assert_eq!(result.name, "Piano");
    assert_eq!(result.total, mins(120));
}

#[test]
fn entities_without_sessions_are_skipped() {
    let entities = vec![("Flute", vec![]), ("Oboe", vec![mins(5)]), ("Harp", vec![])];
    let result = select_most_practiced(entities);
    assert_eq!(result.name, "Oboe");

    let only_empty = vec![("Flute", Vec::<PracticeDuration>::new())];
    assert!(select_most_practiced(only_empty).is_empty());
}

#[test]
fn zero_length_sessions_never_win() {
    let entities = vec![("Drums", vec![PracticeDuration::ZERO])];
    assert_eq!(select_most_practiced(entities), MostPracticed::default());
}

#[test]
fn reductions_over_empty_collections_are_zero() {
    assert_eq!(total_duration(Vec::<PracticeDuration>::new()), PracticeDuration::ZERO);
    assert_eq!(average_duration(Vec::<PracticeDuration>::new()), PracticeDuration::ZERO);
    assert_eq!(max_duration(Vec::<PracticeDuration>::new()), PracticeDuration::ZERO);
}

#[test]
fn reductions_over_sessions() {
    let sessions = [mins(30), mins(90), mins(60)];
    assert_eq!(total_duration(sessions), mins(180));
    assert_eq!(average_duration(sessions), mins(60));
    assert_eq!(max_duration(sessions), mins(90));

    let summary = DurationSummary::from_durations(sessions);
    assert_eq!(summary.count, 3);
    assert_eq!(summary.longest, mins(90));
    assert!(!summary.is_empty());
}

#[test]
fn total_saturates_instead_of_overflowing() {
    let huge = PracticeDuration::from_seconds(i64::MAX - 10);
    assert_eq!(
        total_duration([huge, mins(1)]),
        PracticeDuration::from_seconds(i64::MAX)
    );
}

#[test]
fn duration_formatting() {
    assert_eq!(format_duration(Some(mins(90))), "1h30m");
    assert_eq!(format_duration(Some(mins(45))), "45m");
    assert_eq!(format_duration(Some(mins(120))), "2h0m");
    assert_eq!(format_duration(None), "0m");
    assert_eq!(format_duration(Some(mins(26 * 60 + 5))), "26h5m");
    assert_eq!(mins(75).to_string(), "1h15m");
}

#[test]
fn total_time_formatting_drops_minutes_past_an_hour() {
    assert_eq!(format_total_time(Some(mins(90))), "1h");
    assert_eq!(format_total_time(Some(mins(45))), "45m");
    assert_eq!(format_total_time(None), "0m");
}

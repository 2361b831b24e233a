use chrono::{Local, NaiveDate};
use practice_log::{
    AppConfig, InstrumentDraft, InstrumentFilter, Journal, PieceDraft, PieceFilter,
    PracticeDuration, PracticeSession, SessionDraft, SessionFilter, UserId,
    export_sessions_to_csv, format_duration, format_total_time, import_sessions_from_csv,
    load_journal_from_json, logging, save_journal_to_json,
};
use std::io::{self, Write};

const DEFAULT_USER: &str = "local";

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    // Compute column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(ci) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    // Build horizontal separator
    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    // Build output
    let render_row = |cells: Vec<&str>| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            let pad = widths[ci].saturating_sub(cell.chars().count());
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    // Header
    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(headers.to_vec()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    // Rows
    for row in rows {
        out.push_str(&render_row(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                  Show this help\n  user [name]                           Show or switch the active user\n  log <YYYY-MM-DD|today> <duration> [i=<id>] [p=<id>] [notes...]\n                                        Log a session (duration like 1h30m, 45m, 1:30)\n  sessions                              List sessions with streak and totals\n  session show <id>                     Show one session\n  session notes <id> <text...>          Replace a session's notes\n  session delete <id>                   Delete a session\n  streak                                Show the current streak\n  instrument add <name...>              Add an instrument\n  instrument list [name]                List instruments (optional name filter)\n  instrument show <id>                  Show an instrument with its sessions\n  instrument delete <id>                Delete an instrument (sessions are kept)\n  piece add <name...>                   Add a piece\n  piece artist <id> <text...>           Set a piece's artist\n  piece album <id> <text...>            Set a piece's album\n  piece list [name]                     List pieces (optional name filter)\n  piece show <id>                       Show a piece with its sessions\n  piece delete <id>                     Delete a piece (sessions are kept)\n  save json <path>                      Save the journal to a JSON file\n  load json <path>                      Load the journal from a JSON file\n  export csv <path>                     Export the active user's sessions\n  import csv <path>                     Import sessions for the active user\n  quit|exit                             Exit"
    );
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.eq_ignore_ascii_case("today") {
        return Some(today());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.parse().ok())
}

fn rest_of_line<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn session_rows(journal: &Journal, user: &UserId, sessions: &[PracticeSession]) -> Vec<Vec<String>> {
    sessions
        .iter()
        .map(|s| {
            let instrument = s
                .instrument
                .and_then(|id| journal.instrument(user, id).ok())
                .map(|i| i.name.clone())
                .unwrap_or_default();
            let piece = s
                .piece
                .and_then(|id| journal.piece(user, id).ok())
                .map(|p| p.name.clone())
                .unwrap_or_default();
            vec![
                s.id.to_string(),
                s.date.to_string(),
                format_duration(Some(s.duration)),
                instrument,
                piece,
                s.notes.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

const SESSION_HEADERS: [&str; 6] = ["id", "date", "duration", "instrument", "piece", "notes"];

fn print_sessions(journal: &Journal, user: &UserId) {
    let view = journal.session_list(user, &SessionFilter::default(), today());
    let rows = session_rows(journal, user, &view.sessions);
    println!("{}", render_table(&SESSION_HEADERS, &rows));
    println!("Current streak     : {} day(s)", view.streak);
    println!("Longest session    : {}", view.display.longest_session);
    println!("Average session    : {}", view.display.avg_session);
    println!("Total practice     : {}", view.display.sum_session);
}

fn print_instruments(journal: &Journal, user: &UserId, name: Option<String>) {
    let filter = InstrumentFilter { name, notes: None };
    let view = journal.instrument_list(user, &filter);
    let rows: Vec<Vec<String>> = view
        .items
        .iter()
        .map(|i| vec![i.id.to_string(), i.name.clone(), i.notes.clone().unwrap_or_default()])
        .collect();
    println!("{}", render_table(&["id", "name", "notes"], &rows));
    println!("Instruments        : {}", view.total_count);
    if !view.most_practiced_name.is_empty() {
        println!(
            "Most practiced     : {} ({})",
            view.most_practiced_name, view.most_practiced_display
        );
    }
}

fn print_pieces(journal: &Journal, user: &UserId, name: Option<String>) {
    let filter = PieceFilter {
        name,
        ..PieceFilter::default()
    };
    let view = journal.piece_list(user, &filter);
    let rows: Vec<Vec<String>> = view
        .items
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.artist.clone().unwrap_or_default(),
                p.album.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!("{}", render_table(&["id", "name", "artist", "album"], &rows));
    println!("Pieces             : {}", view.total_count);
    if !view.most_practiced_name.is_empty() {
        println!(
            "Most practiced     : {} ({})",
            view.most_practiced_name, view.most_practiced_display
        );
    }
}

fn handle_log<'a>(journal: &mut Journal, user: &UserId, mut parts: impl Iterator<Item = &'a str>) {
    let (Some(date_s), Some(dur_s)) = (parts.next(), parts.next()) else {
        println!("Usage: log <YYYY-MM-DD|today> <duration> [i=<id>] [p=<id>] [notes...]");
        return;
    };
    let Some(date) = parse_date(date_s) else {
        println!("Invalid date (YYYY-MM-DD or today)");
        return;
    };
    let duration: PracticeDuration = match dur_s.parse() {
        Ok(d) => d,
        Err(e) => {
            println!("Error: {e}");
            return;
        }
    };

    // Remaining words are i=/p= links or notes
    let mut draft = SessionDraft::new(date, duration);
    let mut notes = Vec::new();
    for part in parts {
        if let Some(id) = part.strip_prefix("i=") {
            match id.parse() {
                Ok(id) => draft = draft.with_instrument(id),
                Err(_) => {
                    println!("Invalid instrument id");
                    return;
                }
            }
        } else if let Some(id) = part.strip_prefix("p=") {
            match id.parse() {
                Ok(id) => draft = draft.with_piece(id),
                Err(_) => {
                    println!("Invalid piece id");
                    return;
                }
            }
        } else {
            notes.push(part);
        }
    }
    if !notes.is_empty() {
        draft = draft.with_notes(notes.join(" "));
    }

    match journal.log_session(user, draft) {
        Ok(session) => println!(
            "Logged session {} ({} on {}).",
            session.id,
            format_duration(Some(session.duration)),
            session.date
        ),
        Err(e) => println!("Error: {e}"),
    }
}

fn handle_session<'a>(journal: &mut Journal, user: &UserId, mut parts: impl Iterator<Item = &'a str>) {
    let sub = parts.next().unwrap_or("");
    let Some(id) = parse_id(parts.next()) else {
        println!("Usage: session <show|notes|delete> <id>");
        return;
    };
    match sub {
        "show" => match journal.session(user, id) {
            Ok(session) => {
                let rows = session_rows(journal, user, std::slice::from_ref(session));
                println!("{}", render_table(&SESSION_HEADERS, &rows));
            }
            Err(e) => println!("Error: {e}"),
        },
        "notes" => {
            // Keep every other field, replace the notes
            let text = rest_of_line(parts);
            let draft = match journal.session(user, id) {
                Ok(session) => SessionDraft {
                    notes: Some(text),
                    ..SessionDraft::from(session)
                },
                Err(e) => {
                    println!("Error: {e}");
                    return;
                }
            };
            match journal.update_session(user, id, draft) {
                Ok(_) => println!("Updated notes of session {id}."),
                Err(e) => println!("Error: {e}"),
            }
        }
        "delete" => match journal.delete_session(user, id) {
            Ok(_) => println!("Deleted session {id}."),
            Err(e) => println!("Error: {e}"),
        },
        _ => println!("Usage: session <show|notes|delete> <id>"),
    }
}

fn handle_instrument<'a>(
    journal: &mut Journal,
    user: &UserId,
    mut parts: impl Iterator<Item = &'a str>,
) {
    match parts.next().unwrap_or("") {
        "add" => {
            let name = rest_of_line(parts);
            match journal.add_instrument(user, InstrumentDraft::new(name)) {
                Ok(instrument) => println!(
                    "Added instrument {} ({}).",
                    instrument.id, instrument.name
                ),
                Err(e) => println!("Error: {e}"),
            }
        }
        "list" => {
            let name = rest_of_line(parts);
            print_instruments(journal, user, (!name.is_empty()).then_some(name));
        }
        "show" => match parse_id(parts.next()).map(|id| journal.instrument_detail(user, id)) {
            Some(Ok(view)) => {
                println!("Instrument         : {}", view.entity.name);
                println!("Average session    : {}", view.avg_session_display);
                println!("Total practice     : {}", view.sum_session_display);
                let rows = session_rows(journal, user, &view.sessions);
                println!("{}", render_table(&SESSION_HEADERS, &rows));
            }
            Some(Err(e)) => println!("Error: {e}"),
            None => println!("Usage: instrument show <id>"),
        },
        "delete" => match parse_id(parts.next()) {
            Some(id) => match journal.delete_instrument(user, id) {
                Ok(_) => println!("Deleted instrument {id}."),
                Err(e) => println!("Error: {e}"),
            },
            None => println!("Usage: instrument delete <id>"),
        },
        _ => println!("Usage: instrument <add|list|show|delete> ..."),
    }
}

fn handle_piece<'a>(journal: &mut Journal, user: &UserId, mut parts: impl Iterator<Item = &'a str>) {
    let cmd = parts.next().unwrap_or("");
    match cmd {
        "add" => {
            let name = rest_of_line(parts);
            match journal.add_piece(user, PieceDraft::new(name)) {
                Ok(piece) => println!("Added piece {} ({}).", piece.id, piece.name),
                Err(e) => println!("Error: {e}"),
            }
        }
        "artist" | "album" => {
            let Some(id) = parse_id(parts.next()) else {
                println!("Usage: piece {cmd} <id> <text...>");
                return;
            };
            let text = rest_of_line(parts);
            let mut draft = match journal.piece(user, id) {
                Ok(piece) => PieceDraft {
                    name: piece.name.clone(),
                    artist: piece.artist.clone(),
                    album: piece.album.clone(),
                    notes: piece.notes.clone(),
                },
                Err(e) => {
                    println!("Error: {e}");
                    return;
                }
            };
            if cmd == "artist" {
                draft.artist = Some(text);
            } else {
                draft.album = Some(text);
            }
            match journal.update_piece(user, id, draft) {
                Ok(_) => println!("Updated {cmd} of piece {id}."),
                Err(e) => println!("Error: {e}"),
            }
        }
        "list" => {
            let name = rest_of_line(parts);
            print_pieces(journal, user, (!name.is_empty()).then_some(name));
        }
        "show" => match parse_id(parts.next()).map(|id| journal.piece_detail(user, id)) {
            Some(Ok(view)) => {
                println!("Piece              : {}", view.entity.name);
                println!("Average session    : {}", view.avg_session_display);
                println!("Total practice     : {}", view.sum_session_display);
                let rows = session_rows(journal, user, &view.sessions);
                println!("{}", render_table(&SESSION_HEADERS, &rows));
            }
            Some(Err(e)) => println!("Error: {e}"),
            None => println!("Usage: piece show <id>"),
        },
        "delete" => match parse_id(parts.next()) {
            Some(id) => match journal.delete_piece(user, id) {
                Ok(_) => println!("Deleted piece {id}."),
                Err(e) => println!("Error: {e}"),
            },
            None => println!("Usage: piece delete <id>"),
        },
        _ => println!("Usage: piece <add|artist|album|list|show|delete> ..."),
    }
}

fn main() {
    // Logging
    let log_level = AppConfig::from_env()
        .map(|config| config.log_level)
        .unwrap_or_else(|_| "warn".to_string());
    logging::init(&log_level);

    let mut journal = Journal::new();
    let mut user = UserId::new(DEFAULT_USER);

    println!("Practice Log (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("[{user}]> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Dispatch on the first word
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "user" => match parts.next() {
                Some(name) => {
                    user = UserId::new(name);
                    println!("Active user is now {user}.");
                }
                None => println!("Active user: {user}"),
            },
            "log" => handle_log(&mut journal, &user, parts),
            "sessions" => print_sessions(&journal, &user),
            "session" => handle_session(&mut journal, &user, parts),
            "streak" => println!(
                "Current streak: {} day(s)",
                journal.streak(&user, today())
            ),
            "instrument" => handle_instrument(&mut journal, &user, parts),
            "piece" => handle_piece(&mut journal, &user, parts),
            "save" | "load" | "export" | "import" => {
                let (Some(format), Some(path)) = (parts.next(), parts.next()) else {
                    println!("Usage: {cmd} <json|csv> <path>");
                    continue;
                };
                match (cmd, format) {
                    ("save", "json") => match save_journal_to_json(&journal, path) {
                        Ok(()) => println!("Journal saved to {path}."),
                        Err(e) => println!("Save error: {e}"),
                    },
                    ("load", "json") => match load_journal_from_json(path) {
                        Ok(loaded) => {
                            journal = loaded;
                            println!("Journal loaded from {path}.");
                        }
                        Err(e) => println!("Load error: {e}"),
                    },
                    ("export", "csv") => match export_sessions_to_csv(&journal, &user, path) {
                        Ok(count) => println!("Exported {count} session(s) to {path}."),
                        Err(e) => println!("Export error: {e}"),
                    },
                    ("import", "csv") => {
                        match import_sessions_from_csv(&mut journal, &user, path) {
                            Ok(count) => println!("Imported {count} session(s) from {path}."),
                            Err(e) => println!("Import error: {e}"),
                        }
                    }
                    _ => println!("Unsupported: {cmd} {format} (use save/load json, export/import csv)"),
                }
            }
            _ => {
                println!("Unknown command '{cmd}'. Type 'help'.");
            }
        }
    }

    // Summary for the active user
    if !journal.user_sessions(&user).is_empty() {
        let view = journal.session_list(&user, &SessionFilter::default(), today());
        println!(
            "Goodbye. {} session(s), {} total.",
            view.sessions.len(),
            format_total_time(view.sum_session)
        );
    }
}

use crate::aggregate::{DurationSummary, MostPracticed};
use crate::duration::{PracticeDuration, format_duration, format_total_time};
use crate::model::PracticeSession;
use serde::{Deserialize, Serialize};

/// Context for the session list page.
///
/// Statistics cover all of the user's sessions; `sessions` is the filtered
/// list, most recent first. Duration fields are absent when the user has no
/// sessions yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionListView {
    pub sessions: Vec<PracticeSession>,
    pub streak: u32,
    pub longest_session: Option<PracticeDuration>,
    pub avg_session: Option<PracticeDuration>,
    pub sum_session: Option<PracticeDuration>,
    pub display: SessionStatsDisplay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatsDisplay {
    pub longest_session: String,
    pub avg_session: String,
    pub sum_session: String,
}

impl SessionListView {
    pub(crate) fn new(sessions: Vec<PracticeSession>, streak: u32, summary: DurationSummary) -> Self {
        let present = |value: PracticeDuration| (!summary.is_empty()).then_some(value);
        let longest_session = present(summary.longest);
        let avg_session = present(summary.average);
        let sum_session = present(summary.total);
        Self {
            sessions,
            streak,
            longest_session,
            avg_session,
            sum_session,
            display: SessionStatsDisplay {
                longest_session: format_duration(longest_session),
                avg_session: format_duration(avg_session),
                sum_session: format_total_time(sum_session),
            },
        }
    }
}

/// Context for the instrument and piece list pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityListView<T> {
    pub items: Vec<T>,
    pub most_practiced_name: String,
    pub most_practiced_hours: PracticeDuration,
    pub most_practiced_display: String,
    /// Number of the user's entities, regardless of the filter.
    pub total_count: usize,
}

impl<T> EntityListView<T> {
    pub(crate) fn new(items: Vec<T>, most_practiced: MostPracticed, total_count: usize) -> Self {
        let display = if most_practiced.is_empty() {
            format_total_time(None)
        } else {
            format_total_time(Some(most_practiced.total))
        };
        Self {
            items,
            most_practiced_name: most_practiced.name,
            most_practiced_hours: most_practiced.total,
            most_practiced_display: display,
            total_count,
        }
    }
}

/// Context for an instrument or piece detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDetailView<T> {
    pub entity: T,
    pub sessions: Vec<PracticeSession>,
    pub avg_session: Option<PracticeDuration>,
    pub sum_session: Option<PracticeDuration>,
    pub avg_session_display: String,
    pub sum_session_display: String,
}

impl<T> EntityDetailView<T> {
    pub(crate) fn new(entity: T, sessions: Vec<PracticeSession>) -> Self {
        let summary = DurationSummary::from_durations(sessions.iter().map(|s| s.duration));
        let avg_session = (!summary.is_empty()).then_some(summary.average);
        let sum_session = (!summary.is_empty()).then_some(summary.total);
        Self {
            entity,
            sessions,
            avg_session,
            sum_session,
            avg_session_display: format_duration(avg_session),
            sum_session_display: format_total_time(sum_session),
        }
    }
}

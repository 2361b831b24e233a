use crate::duration::PracticeDuration;
use serde::{Deserialize, Serialize};

/// Winner of a most-practiced scan. An empty name with a zero total means no
/// entity had any sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostPracticed {
    pub name: String,
    pub total: PracticeDuration,
}

impl MostPracticed {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.total == PracticeDuration::ZERO
    }
}

/// Sum of all durations. Saturates instead of overflowing.
pub fn total_duration<I>(durations: I) -> PracticeDuration
where
    I: IntoIterator<Item = PracticeDuration>,
{
    durations.into_iter().sum()
}

/// Mean duration, or zero for an empty collection.
pub fn average_duration<I>(durations: I) -> PracticeDuration
where
    I: IntoIterator<Item = PracticeDuration>,
{
    let (total, count) = durations
        .into_iter()
        .fold((PracticeDuration::ZERO, 0_i64), |(total, count), d| {
            (total.saturating_add(d), count + 1)
        });
    if count == 0 {
        return PracticeDuration::ZERO;
    }
    PracticeDuration::from_seconds(total.as_seconds() / count)
}

/// Longest duration, or zero for an empty collection.
pub fn max_duration<I>(durations: I) -> PracticeDuration
where
    I: IntoIterator<Item = PracticeDuration>,
{
    durations
        .into_iter()
        .max()
        .unwrap_or(PracticeDuration::ZERO)
}

/// Picks the entity with the strictly greatest cumulative duration.
///
/// Entities without sessions are skipped rather than competing with a zero
/// total. On a tie the entity seen first keeps the title.
pub fn select_most_practiced<'a, I, D>(entities: I) -> MostPracticed
where
    I: IntoIterator<Item = (&'a str, D)>,
    D: IntoIterator<Item = PracticeDuration>,
{
    entities
        .into_iter()
        .fold(MostPracticed::default(), |best, (name, durations)| {
            let mut sessions = durations.into_iter().peekable();
            if sessions.peek().is_none() {
                return best;
            }
            let total = total_duration(sessions);
            if total > best.total {
                MostPracticed {
                    name: name.to_string(),
                    total,
                }
            } else {
                best
            }
        })
}

/// Count plus the three reductions over one session collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub count: usize,
    pub total: PracticeDuration,
    pub average: PracticeDuration,
    pub longest: PracticeDuration,
}

impl DurationSummary {
    pub fn from_durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = PracticeDuration>,
    {
        let durations: Vec<PracticeDuration> = durations.into_iter().collect();
        Self {
            count: durations.len(),
            total: total_duration(durations.iter().copied()),
            average: average_duration(durations.iter().copied()),
            longest: max_duration(durations.iter().copied()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

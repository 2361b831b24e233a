use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Elapsed practice time with second precision.
///
/// Serialized as a plain integer count of seconds. Displayed with minute
/// granularity (see [`format_duration`]).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PracticeDuration(i64);

impl PracticeDuration {
    pub const ZERO: PracticeDuration = PracticeDuration(0);

    /// Longest duration a single session may record (23:59:59).
    pub const MAX_SESSION: PracticeDuration =
        PracticeDuration(23 * SECONDS_PER_HOUR + 59 * SECONDS_PER_MINUTE + 59);

    pub const fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Self(minutes.saturating_mul(SECONDS_PER_MINUTE))
    }

    pub const fn from_hours_minutes(hours: i64, minutes: i64) -> Self {
        Self(
            hours
                .saturating_mul(SECONDS_PER_HOUR)
                .saturating_add(minutes.saturating_mul(SECONDS_PER_MINUTE)),
        )
    }

    pub const fn as_seconds(self) -> i64 {
        self.0
    }

    /// Whole hours, days folded in. Floors towards negative infinity.
    pub const fn whole_hours(self) -> i64 {
        self.0.div_euclid(SECONDS_PER_HOUR)
    }

    /// Minutes past the last whole hour, in `0..60`.
    pub const fn minutes_past_hour(self) -> i64 {
        self.0.rem_euclid(SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
    }

    pub const fn saturating_add(self, other: PracticeDuration) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Sum for PracticeDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(PracticeDuration::ZERO, PracticeDuration::saturating_add)
    }
}

impl fmt::Display for PracticeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(Some(*self)))
    }
}

/// Renders a duration as `"{h}h{m}m"`, or `"{m}m"` under one hour.
/// An absent duration renders as `"0m"`.
pub fn format_duration(duration: Option<PracticeDuration>) -> String {
    let Some(duration) = duration else {
        return "0m".to_string();
    };
    let hours = duration.whole_hours();
    let minutes = duration.minutes_past_hour();
    if hours == 0 {
        format!("{minutes}m")
    } else {
        format!("{hours}h{minutes}m")
    }
}

/// Coarser rendering for accumulated totals: `"{h}h"`, or `"{m}m"` under one hour.
pub fn format_total_time(duration: Option<PracticeDuration>) -> String {
    let Some(duration) = duration else {
        return "0m".to_string();
    };
    let hours = duration.whole_hours();
    if hours == 0 {
        format!("{}m", duration.minutes_past_hour())
    } else {
        format!("{hours}h")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration '{input}' (expected forms like 1h30m, 45m, 2h, 1:30 or a minute count)")]
pub struct DurationParseError {
    input: String,
}

impl DurationParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

impl FromStr for PracticeDuration {
    type Err = DurationParseError;

    /// Accepts `1h30m`, `2h`, `45m`, `1:30` (H:MM) and a bare minute count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(DurationParseError::new(s));
        }

        if let Some((hours, minutes)) = input.split_once(':') {
            let hours: i64 = parse_component(hours).ok_or_else(|| DurationParseError::new(s))?;
            let minutes: i64 =
                parse_component(minutes).ok_or_else(|| DurationParseError::new(s))?;
            if minutes >= 60 {
                return Err(DurationParseError::new(s));
            }
            return Ok(Self::from_hours_minutes(hours, minutes));
        }

        if let Some(minutes) = parse_component(input) {
            return Ok(Self::from_minutes(minutes));
        }

        let lowered = input.to_ascii_lowercase();
        let (hours, rest) = match lowered.split_once('h') {
            Some((hours, rest)) => (
                Some(parse_component(hours).ok_or_else(|| DurationParseError::new(s))?),
                rest,
            ),
            None => (None, lowered.as_str()),
        };
        let minutes = if rest.is_empty() {
            None
        } else {
            let digits = rest
                .strip_suffix('m')
                .ok_or_else(|| DurationParseError::new(s))?;
            Some(parse_component(digits).ok_or_else(|| DurationParseError::new(s))?)
        };

        match (hours, minutes) {
            (None, None) => Err(DurationParseError::new(s)),
            (hours, minutes) => Ok(Self::from_hours_minutes(
                hours.unwrap_or(0),
                minutes.unwrap_or(0),
            )),
        }
    }
}

fn parse_component(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

use chrono::NaiveDate;

/// Number of consecutive calendar days, ending on `today`, with at least one
/// practice date.
///
/// Dates after `today` are ignored and the input may come in any order.
/// The walk starts from a cursor one day past `today`, so a streak is only
/// anchored by a session dated `today`: if the latest session is yesterday
/// the result is 0. Several sessions on the same day count once.
pub fn current_streak<I>(dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut days: Vec<NaiveDate> = dates.into_iter().filter(|date| *date <= today).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));

    // Gaps are measured from a cursor one day past `today`. The first gap is
    // computed as `today - day + 1` so `NaiveDate::MAX` needs no successor.
    let mut previous: Option<NaiveDate> = None;
    let mut streak = 0;
    for day in days {
        let gap = match previous {
            Some(cursor) => (cursor - day).num_days(),
            None => (today - day).num_days() + 1,
        };
        match gap {
            1 => streak += 1,
            0 => {}
            _ => break,
        }
        previous = Some(day);
    }
    streak
}

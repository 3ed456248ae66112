//! Most-recent-past occurrence of a weekly program
//!
//! All arithmetic happens in one fixed civil timezone (JST, UTC+09:00). The
//! caller's "now" is converted into that zone first, so the result does not
//! depend on the zone the caller used.

use super::{ScheduleEntry, ScheduleError};
use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone};

/// UTC offset of the reference timezone in seconds (JST has no DST).
pub const REFERENCE_UTC_OFFSET_SECS: i32 = 9 * 60 * 60;

/// The fixed reference timezone used for every schedule computation.
pub fn reference_offset() -> FixedOffset {
    // +09:00 is inside the ±24h range FixedOffset accepts
    FixedOffset::east_opt(REFERENCE_UTC_OFFSET_SECS).expect("UTC+09:00 is a valid offset")
}

/// Resolve the most recent start of `entry` at or before `now`.
///
/// The occurrence of the target weekday in the current week (Sunday-based) is
/// built first; if it lies strictly after `now` the answer is the same slot
/// one week earlier. An occurrence exactly equal to `now` counts as past.
///
/// # Errors
///
/// [`ScheduleError::InvalidDayOfWeek`] or [`ScheduleError::InvalidStartTime`]
/// when the entry does not validate.
pub fn resolve<Tz: TimeZone>(
    entry: &ScheduleEntry,
    now: &DateTime<Tz>,
) -> Result<DateTime<FixedOffset>, ScheduleError> {
    let target_weekday = entry.weekday()?;
    let start_time = entry.start_time()?;

    let zone = reference_offset();
    let now = now.with_timezone(&zone);

    let days_offset = i64::from(target_weekday.num_days_from_sunday())
        - i64::from(now.weekday().num_days_from_sunday());

    let candidate_date = now.date_naive() + Duration::days(days_offset);
    let candidate = zone
        .from_local_datetime(&candidate_date.and_time(start_time))
        .single()
        .ok_or_else(|| ScheduleError::InvalidStartTime(entry.start_time.clone()))?;

    if candidate > now {
        Ok(candidate - Duration::days(7))
    } else {
        Ok(candidate)
    }
}

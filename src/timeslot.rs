//! Time-label parsing and slot resolution.
//!
//! The time grid hands the engine raw label text which may arrive as
//! `"1:00 PM"`, `"13:00"`, `"14:45:00"`, or `"2 PM"` depending on which part
//! of the grid produced it. The label never carries a date; the absolute
//! instants are always built from the calendar's active date.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Default width of a newly selected slot.
pub const DEFAULT_SLOT_MINUTES: i64 = 15;

/// An absolute start/end pair resolved from a grid label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parse ambiguous time-label text into an unambiguous (hour, minute) pair.
///
/// Ordered attempts, first match wins:
/// 1. 12-hour with meridiem: `H:MM am|pm` (12pm stays 12, 12am becomes 0)
/// 2. 24-hour `H:MM[:SS]`
/// 3. Hour-only with meridiem: `H am|pm`, minute defaults to 0
pub fn parse_label(label: &str) -> EngineResult<(u32, u32)> {
    let text = label.trim().to_ascii_lowercase();

    if let Some((time_part, is_pm)) = split_meridiem(&text) {
        if let Some((hour, minute)) = split_clock(time_part) {
            return twelve_to_twenty_four(hour, minute, is_pm);
        }
        if let Ok(hour) = time_part.trim().parse::<u32>() {
            return twelve_to_twenty_four(hour, 0, is_pm);
        }
        return Err(EngineError::UnparseableTimeLabel(label.to_string()));
    }

    if let Some((hour, minute)) = split_clock(&text) {
        return check_range(hour, minute);
    }

    Err(EngineError::UnparseableTimeLabel(label.to_string()))
}

/// Resolve a grid label against the calendar's active date into an absolute
/// start instant and a default-width end instant.
pub fn resolve(label: &str, date: NaiveDate) -> EngineResult<TimeSlot> {
    let (hour, minute) = parse_label(label)?;
    slot_at(date, hour, minute)
}

/// Degraded fallback: resolve the label, and on parse failure clamp "now"'s
/// time-of-day onto the active date instead of failing the interaction.
pub fn resolve_or_now(label: &str, date: NaiveDate, now: DateTime<Utc>) -> TimeSlot {
    match resolve(label, date) {
        Ok(slot) => slot,
        Err(err) => {
            debug!(label, %err, "time label unusable, falling back to current time");
            let time = now.time();
            // Minutes are the grid's resolution; seconds are dropped.
            slot_at(date, time.hour(), time.minute()).unwrap_or(TimeSlot {
                start: now,
                end: now + Duration::minutes(DEFAULT_SLOT_MINUTES),
            })
        }
    }
}

fn slot_at(date: NaiveDate, hour: u32, minute: u32) -> EngineResult<TimeSlot> {
    let start = date
        .and_hms_opt(hour, minute, 0)
        .ok_or(EngineError::InvalidTimeValue { hour, minute })?
        .and_utc();
    Ok(TimeSlot {
        start,
        end: start + Duration::minutes(DEFAULT_SLOT_MINUTES),
    })
}

/// Strip a trailing `am`/`pm` marker, returning the remaining text and
/// whether the marker was `pm`.
fn split_meridiem(text: &str) -> Option<(&str, bool)> {
    for (suffix, is_pm) in [("pm", true), ("am", false)] {
        if let Some(rest) = text.strip_suffix(suffix) {
            return Some((rest.trim_end(), is_pm));
        }
    }
    None
}

/// Split `H:MM` or `H:MM:SS` into numeric hour and minute. Seconds are
/// accepted and discarded.
fn split_clock(text: &str) -> Option<(u32, u32)> {
    let mut parts = text.split(':');
    let hour = parts.next()?.trim().parse::<u32>().ok()?;
    let minute = parts.next()?.trim().parse::<u32>().ok()?;
    if let Some(seconds) = parts.next() {
        seconds.trim().parse::<u32>().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some((hour, minute))
}

fn twelve_to_twenty_four(hour: u32, minute: u32, is_pm: bool) -> EngineResult<(u32, u32)> {
    if hour < 1 || hour > 12 {
        return Err(EngineError::InvalidTimeValue { hour, minute });
    }
    let hour = match (hour, is_pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };
    check_range(hour, minute)
}

fn check_range(hour: u32, minute: u32) -> EngineResult<(u32, u32)> {
    if hour > 23 || minute > 59 {
        return Err(EngineError::InvalidTimeValue { hour, minute });
    }
    Ok((hour, minute))
}

//! Blocked-time conflict detection.
//!
//! Answers "is resource R blocked at instant/interval T?" over the in-memory
//! appointment set. Blocked time never affects a different resource's column.

use chrono::{DateTime, NaiveDate, Utc};

use crate::appointment::{Appointment, AppointmentId, ResourceId};
use crate::error::{EngineError, EngineResult};

/// Midnight and 23:59:59.999 of a calendar date, the interval a full-day
/// block covers.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    // Both components are always constructible for a valid NaiveDate.
    let start = date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default();
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|dt| dt.and_utc())
        .unwrap_or(start);
    (start, end)
}

/// Whether `resource` is blocked at a single instant: some blocked
/// appointment B on the same resource has `B.start <= t < B.end`.
pub fn blocked_at<'a>(
    appointments: impl IntoIterator<Item = &'a Appointment>,
    resource: &ResourceId,
    instant: DateTime<Utc>,
) -> bool {
    appointments
        .into_iter()
        .filter(|a| a.is_blocked() && a.resource_id == *resource)
        .any(|b| b.start <= instant && instant < b.end)
}

/// Whether any blocked time for `resource` overlaps `[start, end)`.
pub fn blocked_during<'a>(
    appointments: impl IntoIterator<Item = &'a Appointment>,
    resource: &ResourceId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    appointments
        .into_iter()
        .filter(|a| a.is_blocked() && a.resource_id == *resource)
        .any(|b| b.start < end && start < b.end)
}

/// Whether some single blocked appointment covers the entire day for
/// `resource` on `date`.
pub fn blocked_all_day<'a>(
    appointments: impl IntoIterator<Item = &'a Appointment>,
    resource: &ResourceId,
    date: NaiveDate,
) -> bool {
    let (day_start, day_end) = day_bounds(date);
    appointments
        .into_iter()
        .filter(|a| a.is_blocked() && a.resource_id == *resource)
        .any(|b| b.start <= day_start && day_end <= b.end)
}

/// Gate for the reconciler: reject a candidate `(resource, start, end)` that
/// lands inside blocked time for the same resource.
///
/// `exclude` names the appointment being moved itself, so a blocked-time
/// appointment can be dragged without colliding with its own interval.
pub fn check<'a>(
    appointments: impl IntoIterator<Item = &'a Appointment>,
    resource: &ResourceId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<&AppointmentId>,
) -> EngineResult<()> {
    let collides = appointments
        .into_iter()
        .filter(|a| a.is_blocked() && a.resource_id == *resource)
        .filter(|a| exclude != Some(&a.id))
        .any(|b| b.start < end && start < b.end);

    if collides {
        return Err(EngineError::ConflictRejected {
            resource: resource.to_string(),
            start,
        });
    }
    Ok(())
}

//! Recurring-series expansion.
//!
//! Expands a recurrence pattern plus an anchor appointment template into a
//! concrete sequence of appointments, each with a fresh id and a shared
//! series id. Expansion goes through the `rrule` crate: the pattern is
//! rendered as an iCalendar RRULE string and iterated.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::appointment::{Appointment, AppointmentId, GroupId, SeriesId};
use crate::error::{EngineError, EngineResult};

/// Hard cap on occurrences one expansion can produce.
const EXPANSION_LIMIT: u16 = 365;

/// How a weekly series ends. Exactly one bound, by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesEnd {
    AfterOccurrences(u32),
    OnDate(NaiveDate),
}

/// A weekly recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    /// Weeks between occurrences (1 = every week).
    pub interval_weeks: u32,
    pub end: SeriesEnd,
    /// When false, occurrences may take a flexible time-of-day. Reserved:
    /// expansion currently always keeps the anchor's time.
    pub keep_same_time: bool,
}

/// Build an iCalendar-format rule string for the rrule crate parser.
fn build_rrule_string(anchor: DateTime<Utc>, pattern: &RecurrencePattern) -> String {
    let mut rule = format!("FREQ=WEEKLY;INTERVAL={}", pattern.interval_weeks.max(1));
    match pattern.end {
        SeriesEnd::AfterOccurrences(n) => {
            rule.push_str(&format!(";COUNT={}", n));
        }
        SeriesEnd::OnDate(date) => {
            // Inclusive end date: UNTIL is the last instant of that day.
            rule.push_str(&format!(";UNTIL={}T235959Z", date.format("%Y%m%d")));
        }
    }
    format!(
        "DTSTART:{}\nRRULE:{}",
        anchor.format("%Y%m%dT%H%M%SZ"),
        rule
    )
}

/// Expand a pattern into concrete appointments.
///
/// Every occurrence inherits the template's staff, client, services, notes,
/// kind and block metadata; each gets a fresh id, and all share one new
/// series id. Occurrences are `interval_weeks` apart starting at
/// `anchor_date` + `start_time`, each `duration` long.
pub fn expand(
    template: &Appointment,
    pattern: &RecurrencePattern,
    anchor_date: NaiveDate,
    start_time: NaiveTime,
    duration: Duration,
) -> EngineResult<Vec<Appointment>> {
    if duration <= Duration::zero() {
        return Err(EngineError::InvalidInterval);
    }
    if let SeriesEnd::OnDate(end_date) = pattern.end {
        if end_date < anchor_date {
            return Err(EngineError::EmptySeries);
        }
    }

    let anchor = anchor_date.and_time(start_time).and_utc();
    let rrule_str = build_rrule_string(anchor, pattern);

    let rrule_set: RRuleSet = rrule_str
        .parse()
        .map_err(|e| EngineError::Recurrence(format!("failed to parse rule '{}': {}", rrule_str, e)))?;

    let result = rrule_set.all(EXPANSION_LIMIT);

    let series_id = SeriesId::new();
    let mut occurrences = Vec::with_capacity(result.dates.len());

    for occ_dt in &result.dates {
        let start = occ_dt.with_timezone(&Utc);
        occurrences.push(Appointment {
            id: AppointmentId::new(),
            start,
            end: start + duration,
            resource_id: template.resource_id.clone(),
            client: template.client.clone(),
            service_names: template.service_names.clone(),
            notes: template.notes.clone(),
            kind: template.kind,
            series_id: Some(series_id.clone()),
            group_id: template.group_id.clone(),
            block: template.block.clone(),
        });
    }

    if occurrences.is_empty() {
        return Err(EngineError::EmptySeries);
    }
    Ok(occurrences)
}

/// Expand a group booking: one expansion per member template, concatenated.
///
/// Every member's occurrences share one group id; each member gets its own
/// series and is otherwise an independent appointment run.
pub fn expand_group(
    member_templates: &[Appointment],
    pattern: &RecurrencePattern,
    anchor_date: NaiveDate,
    start_time: NaiveTime,
    duration: Duration,
) -> EngineResult<Vec<Appointment>> {
    if member_templates.is_empty() {
        return Err(EngineError::EmptySeries);
    }

    let group_id = member_templates
        .iter()
        .find_map(|t| t.group_id.clone())
        .unwrap_or_default();

    let mut all = Vec::new();
    for template in member_templates {
        let mut member = template.clone();
        member.group_id = Some(group_id.clone());
        all.extend(expand(&member, pattern, anchor_date, start_time, duration)?);
    }
    Ok(all)
}

//! Domain types for the scheduling engine.
//!
//! These types represent appointments in a rendering-agnostic way. The
//! calendar UI works exclusively with them; the engine never sees pixels or
//! DOM state beyond the click geometry handed to the resource resolver.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Sentinel column id for appointments with no assigned staff member.
pub const WALK_INS: &str = "walk-ins";

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                $name(Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Unique appointment identifier, stable across edits.
    AppointmentId
);
string_id!(
    /// Identifier shared by every occurrence of one recurring series.
    SeriesId
);
string_id!(
    /// Identifier linking sibling appointments created from one group booking.
    GroupId
);
string_id!(
    /// Staff member identifier (owned by the staff directory).
    StaffId
);

/// A calendar column: a specific staff member or the shared walk-ins pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceId {
    Staff(StaffId),
    WalkIns,
}

impl ResourceId {
    pub fn staff(id: impl Into<String>) -> Self {
        ResourceId::Staff(StaffId(id.into()))
    }

    pub fn staff_id(&self) -> Option<&StaffId> {
        match self {
            ResourceId::Staff(id) => Some(id),
            ResourceId::WalkIns => None,
        }
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        if s == WALK_INS {
            ResourceId::WalkIns
        } else {
            ResourceId::Staff(StaffId(s))
        }
    }
}

impl From<ResourceId> for String {
    fn from(r: ResourceId) -> Self {
        match r {
            ResourceId::Staff(id) => id.0,
            ResourceId::WalkIns => WALK_INS.to_string(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Staff(id) => f.write_str(&id.0),
            ResourceId::WalkIns => f.write_str(WALK_INS),
        }
    }
}

/// An appointment on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    /// Absolute start instant (UTC-normalized). Invariant: `end > start`.
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Column this appointment belongs to.
    pub resource_id: ResourceId,

    /// Denormalized client snapshot, kept for display resilience when the
    /// customer directory can no longer resolve the reference.
    pub client: Option<ClientSnapshot>,
    /// Ordered service names (insertion order = display order).
    pub service_names: Vec<String>,
    pub notes: Option<String>,

    pub kind: AppointmentKind,
    /// Present iff this occurrence belongs to a recurring series.
    pub series_id: Option<SeriesId>,
    /// Links sibling appointments created from one group booking.
    pub group_id: Option<GroupId>,
    /// Present only when `kind == Blocked`.
    pub block: Option<BlockMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    Single,
    Group,
    Blocked,
}

/// Metadata for a blocked-time appointment (staff unavailability).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub reason: String,
    pub scope: BlockScope,
    pub repeat_weekly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockScope {
    FullDay,
    Partial,
}

/// Denormalized customer contact data carried on the appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    /// Reference into the customer directory, when known.
    pub client_ref: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ClientSnapshot {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            "Walk-in Client".to_string()
        } else {
            name.to_string()
        }
    }

    /// Whether the snapshot carries any usable contact channel.
    pub fn has_contact(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.is_empty())
            || self.email.as_deref().is_some_and(|e| !e.is_empty())
    }
}

impl Appointment {
    /// Check the structural invariants of an appointment.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end <= self.start {
            return Err(EngineError::InvalidInterval);
        }
        Ok(())
    }

    /// Calendar date the appointment starts on.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_blocked(&self) -> bool {
        self.kind == AppointmentKind::Blocked
    }

    /// Display name for the client column, falling back to the walk-in label
    /// when no snapshot was captured.
    pub fn client_display_name(&self) -> String {
        self.client
            .as_ref()
            .map(|c| c.display_name())
            .unwrap_or_else(|| "Walk-in Client".to_string())
    }
}

/// A staff member as the engine sees it (owned by the staff directory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub color: String,
    /// Lower value = higher display priority.
    pub priority: i32,
    pub is_active: bool,
}

impl StaffMember {
    /// Placeholder entry for a staff id the directory cannot resolve.
    /// Shown instead of hiding the appointment.
    pub fn placeholder(id: StaffId) -> Self {
        StaffMember {
            name: format!("Staff {}", id),
            id,
            color: "#9e9e9e".to_string(),
            priority: i32::MAX,
            is_active: false,
        }
    }
}

/// A pending time-slot selection made in the UI, persisted transiently so a
/// reload does not lose it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotSelection {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resource_id: ResourceId,
    pub date_key: NaiveDate,
    pub saved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_appointment() -> Appointment {
        Appointment {
            id: AppointmentId::from("appt-1"),
            start: Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 10, 13, 45, 0).unwrap(),
            resource_id: ResourceId::staff("staff-1"),
            client: None,
            service_names: vec!["Cut".to_string()],
            notes: None,
            kind: AppointmentKind::Single,
            series_id: None,
            group_id: None,
            block: None,
        }
    }

    #[test]
    fn validate_rejects_inverted_interval() {
        let mut appt = make_appointment();
        appt.end = appt.start;
        assert!(matches!(appt.validate(), Err(EngineError::InvalidInterval)));
        appt.end = appt.start + Duration::minutes(15);
        assert!(appt.validate().is_ok());
    }

    #[test]
    fn resource_id_round_trips_through_strings() {
        assert_eq!(ResourceId::from("walk-ins".to_string()), ResourceId::WalkIns);
        assert_eq!(
            ResourceId::from("staff-7".to_string()),
            ResourceId::staff("staff-7")
        );
        assert_eq!(String::from(ResourceId::WalkIns), "walk-ins");
    }

    #[test]
    fn resource_id_serde_uses_wire_strings() {
        let json = serde_json::to_string(&ResourceId::WalkIns).unwrap();
        assert_eq!(json, "\"walk-ins\"");
        let back: ResourceId = serde_json::from_str("\"staff-3\"").unwrap();
        assert_eq!(back, ResourceId::staff("staff-3"));
    }

    #[test]
    fn client_display_name_falls_back_to_walk_in() {
        let appt = make_appointment();
        assert_eq!(appt.client_display_name(), "Walk-in Client");

        let mut with_client = make_appointment();
        with_client.client = Some(ClientSnapshot {
            client_ref: None,
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            phone: None,
            email: None,
        });
        assert_eq!(with_client.client_display_name(), "Dana Reyes");
    }

    #[test]
    fn has_contact_requires_non_empty_channel() {
        let mut snapshot = ClientSnapshot {
            client_ref: None,
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            phone: Some(String::new()),
            email: None,
        };
        assert!(!snapshot.has_contact());
        snapshot.phone = Some("555-0100".to_string());
        assert!(snapshot.has_contact());
    }
}

//! Column resolution for clicks and appointments.
//!
//! Decides which calendar column (a staff member or the walk-ins pool) a UI
//! click or a displayed appointment belongs to. The rendering layer does not
//! always expose resource metadata reliably, so click resolution keeps a
//! positional fallback over the known column boundaries.

use crate::appointment::{Appointment, ResourceId, StaffId, StaffMember};
use crate::remote::StaffDirectory;
use crate::roster::StaffRoster;

/// Horizontal extent of one rendered column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBounds {
    pub resource_id: ResourceId,
    pub left: f64,
    pub right: f64,
}

impl ColumnBounds {
    fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// Ordered column boundaries for the currently rendered grid.
#[derive(Debug, Clone, Default)]
pub struct ColumnGeometry {
    columns: Vec<ColumnBounds>,
}

impl ColumnGeometry {
    pub fn new(columns: Vec<ColumnBounds>) -> Self {
        ColumnGeometry { columns }
    }

    /// The column whose `[left, right)` interval contains `x`.
    pub fn column_at(&self, x: f64) -> Option<&ColumnBounds> {
        self.columns.iter().find(|c| c.left <= x && x < c.right)
    }

    /// The column whose center is closest to `x`.
    pub fn nearest_column(&self, x: f64) -> Option<&ColumnBounds> {
        self.columns.iter().min_by(|a, b| {
            let da = (a.center() - x).abs();
            let db = (b.center() - x).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Resolve a click to a column id.
///
/// An explicit resource id carried by the grid cell wins. Without one, the
/// click falls back to horizontal position: the containing column if any,
/// otherwise the column with the nearest center. A click never fails to
/// resolve; an empty geometry lands in the walk-ins pool.
pub fn resolve_click(
    explicit: Option<ResourceId>,
    x: f64,
    geometry: &ColumnGeometry,
) -> ResourceId {
    if let Some(resource) = explicit {
        return resource;
    }
    if let Some(column) = geometry.column_at(x) {
        return column.resource_id.clone();
    }
    geometry
        .nearest_column(x)
        .map(|c| c.resource_id.clone())
        .unwrap_or(ResourceId::WalkIns)
}

/// Resolve the column an appointment is displayed in.
///
/// A staff-assigned appointment always lands in that staff member's column.
/// If the roster for the appointment's own date has not caught up yet, the
/// staff id is auto-registered there so the appointment is never silently
/// misplaced into walk-ins.
pub fn resolve_appointment(appointment: &Appointment, roster: &mut StaffRoster) -> ResourceId {
    match &appointment.resource_id {
        ResourceId::WalkIns => ResourceId::WalkIns,
        ResourceId::Staff(staff_id) => {
            let date = appointment.date();
            if !roster.contains(date, staff_id) {
                roster.add_worker(date, staff_id.clone());
            }
            ResourceId::Staff(staff_id.clone())
        }
    }
}

/// Display metadata for a staff column, tolerating an unresolvable id by
/// returning a placeholder entry instead of hiding the column.
pub fn display_staff(id: &StaffId, directory: &dyn StaffDirectory) -> StaffMember {
    directory
        .resolve(id)
        .unwrap_or_else(|| StaffMember::placeholder(id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{AppointmentId, AppointmentKind};
    use chrono::{TimeZone, Utc};

    struct EmptyDirectory;

    impl StaffDirectory for EmptyDirectory {
        fn resolve(&self, _id: &StaffId) -> Option<StaffMember> {
            None
        }
    }

    fn make_geometry() -> ColumnGeometry {
        ColumnGeometry::new(vec![
            ColumnBounds {
                resource_id: ResourceId::staff("staff-1"),
                left: 0.0,
                right: 100.0,
            },
            ColumnBounds {
                resource_id: ResourceId::staff("staff-2"),
                left: 100.0,
                right: 200.0,
            },
            ColumnBounds {
                resource_id: ResourceId::WalkIns,
                left: 200.0,
                right: 300.0,
            },
        ])
    }

    fn make_appointment(resource: ResourceId) -> Appointment {
        Appointment {
            id: AppointmentId::from("appt-1"),
            start: Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 10, 13, 45, 0).unwrap(),
            resource_id: resource,
            client: None,
            service_names: vec![],
            notes: None,
            kind: AppointmentKind::Single,
            series_id: None,
            group_id: None,
            block: None,
        }
    }

    #[test]
    fn explicit_resource_wins_over_position() {
        let resolved = resolve_click(Some(ResourceId::WalkIns), 50.0, &make_geometry());
        assert_eq!(resolved, ResourceId::WalkIns);
    }

    #[test]
    fn click_resolves_to_containing_column() {
        let resolved = resolve_click(None, 150.0, &make_geometry());
        assert_eq!(resolved, ResourceId::staff("staff-2"));
    }

    #[test]
    fn out_of_bounds_click_snaps_to_nearest_center() {
        // Past the right edge of every column: nearest center is walk-ins.
        let resolved = resolve_click(None, 450.0, &make_geometry());
        assert_eq!(resolved, ResourceId::WalkIns);

        // Left of everything: nearest center is the first staff column.
        let resolved = resolve_click(None, -40.0, &make_geometry());
        assert_eq!(resolved, ResourceId::staff("staff-1"));
    }

    #[test]
    fn empty_geometry_falls_back_to_walk_ins() {
        let resolved = resolve_click(None, 10.0, &ColumnGeometry::default());
        assert_eq!(resolved, ResourceId::WalkIns);
    }

    #[test]
    fn unknown_staff_id_is_auto_registered_not_walk_ins() {
        let mut roster = StaffRoster::new();
        let appt = make_appointment(ResourceId::staff("staff-9"));

        let resolved = resolve_appointment(&appt, &mut roster);

        assert_eq!(resolved, ResourceId::staff("staff-9"));
        assert!(roster.contains(appt.date(), &StaffId::from("staff-9")));
    }

    #[test]
    fn walk_in_appointment_stays_in_the_pool() {
        let mut roster = StaffRoster::new();
        let appt = make_appointment(ResourceId::WalkIns);
        assert_eq!(resolve_appointment(&appt, &mut roster), ResourceId::WalkIns);
        assert!(roster.workers(appt.date()).is_empty());
    }

    #[test]
    fn unresolvable_staff_gets_a_placeholder() {
        let member = display_staff(&StaffId::from("ghost"), &EmptyDirectory);
        assert_eq!(member.id, StaffId::from("ghost"));
        assert!(!member.is_active);
    }
}

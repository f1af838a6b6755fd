//! Per-date staff roster.
//!
//! Tracks which staff members are visible as a column on each calendar date.
//! Insertion order is display order; staff blocked for the entire day are
//! sorted to the end so an operator scans bookable staff first.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::appointment::{Appointment, ResourceId, StaffId};
use crate::conflict;
use crate::remote::StaffDirectory;
use crate::resource::display_staff;

/// Ordered list of staff ids visible on the calendar, per date.
#[derive(Debug, Clone, Default)]
pub struct StaffRoster {
    entries: HashMap<NaiveDate, Vec<StaffId>>,
}

impl StaffRoster {
    pub fn new() -> Self {
        StaffRoster::default()
    }

    /// Staff ids rostered for `date`, in insertion order.
    pub fn workers(&self, date: NaiveDate) -> &[StaffId] {
        self.entries.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, date: NaiveDate, staff_id: &StaffId) -> bool {
        self.workers(date).contains(staff_id)
    }

    /// Append a staff id for `date` if absent. Idempotent; the order of
    /// existing entries is never perturbed.
    pub fn add_worker(&mut self, date: NaiveDate, staff_id: StaffId) -> bool {
        let workers = self.entries.entry(date).or_default();
        if workers.contains(&staff_id) {
            return false;
        }
        workers.push(staff_id);
        true
    }

    /// Remove a staff id from `date`'s roster.
    pub fn remove_worker(&mut self, date: NaiveDate, staff_id: &StaffId) -> bool {
        match self.entries.get_mut(&date) {
            Some(workers) => {
                let before = workers.len();
                workers.retain(|w| w != staff_id);
                workers.len() != before
            }
            None => false,
        }
    }

    /// Display order for `date`: available staff first (insertion order),
    /// then staff blocked for the whole day, sorted by priority.
    pub fn display_order<'a>(
        &self,
        date: NaiveDate,
        appointments: impl IntoIterator<Item = &'a Appointment> + Copy,
        directory: &dyn StaffDirectory,
    ) -> Vec<StaffId> {
        let mut available = Vec::new();
        let mut blocked = Vec::new();

        for staff_id in self.workers(date) {
            let resource = ResourceId::Staff(staff_id.clone());
            if conflict::blocked_all_day(appointments, &resource, date) {
                blocked.push(staff_id.clone());
            } else {
                available.push(staff_id.clone());
            }
        }

        blocked.sort_by_key(|id| display_staff(id, directory).priority);
        available.extend(blocked);
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{
        AppointmentId, AppointmentKind, BlockMeta, BlockScope, StaffMember,
    };
    use crate::conflict::day_bounds;

    struct FixedDirectory(Vec<StaffMember>);

    impl StaffDirectory for FixedDirectory {
        fn resolve(&self, id: &StaffId) -> Option<StaffMember> {
            self.0.iter().find(|m| m.id == *id).cloned()
        }
    }

    fn march_10() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn member(id: &str, priority: i32) -> StaffMember {
        StaffMember {
            id: StaffId::from(id),
            name: id.to_string(),
            color: "#000".to_string(),
            priority,
            is_active: true,
        }
    }

    fn full_day_block(staff: &str, date: NaiveDate) -> Appointment {
        let (start, end) = day_bounds(date);
        Appointment {
            id: AppointmentId::new(),
            start,
            end,
            resource_id: ResourceId::staff(staff),
            client: None,
            service_names: vec![],
            notes: None,
            kind: AppointmentKind::Blocked,
            series_id: None,
            group_id: None,
            block: Some(BlockMeta {
                reason: "Off".to_string(),
                scope: BlockScope::FullDay,
                repeat_weekly: false,
            }),
        }
    }

    #[test]
    fn add_worker_is_idempotent_and_order_preserving() {
        let mut roster = StaffRoster::new();
        assert!(roster.add_worker(march_10(), StaffId::from("a")));
        assert!(roster.add_worker(march_10(), StaffId::from("b")));
        assert!(!roster.add_worker(march_10(), StaffId::from("a")));

        let ids: Vec<_> = roster.workers(march_10()).iter().map(|s| s.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn remove_worker_filters_only_the_target() {
        let mut roster = StaffRoster::new();
        roster.add_worker(march_10(), StaffId::from("a"));
        roster.add_worker(march_10(), StaffId::from("b"));

        assert!(roster.remove_worker(march_10(), &StaffId::from("a")));
        assert!(!roster.remove_worker(march_10(), &StaffId::from("a")));
        assert_eq!(roster.workers(march_10()), &[StaffId::from("b")]);
    }

    #[test]
    fn rosters_are_independent_per_date() {
        let mut roster = StaffRoster::new();
        let other_day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        roster.add_worker(march_10(), StaffId::from("a"));
        assert!(roster.workers(other_day).is_empty());
    }

    #[test]
    fn fully_blocked_staff_sort_to_the_end_by_priority() {
        let mut roster = StaffRoster::new();
        for id in ["a", "b", "c", "d"] {
            roster.add_worker(march_10(), StaffId::from(id));
        }

        // "a" and "c" are off all day; "a" has the lower priority value.
        let appts = vec![
            full_day_block("c", march_10()),
            full_day_block("a", march_10()),
        ];
        let directory = FixedDirectory(vec![
            member("a", 1),
            member("b", 2),
            member("c", 3),
            member("d", 4),
        ]);

        let order: Vec<_> = roster
            .display_order(march_10(), &appts, &directory)
            .into_iter()
            .map(|s| s.0)
            .collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }
}

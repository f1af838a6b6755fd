//! In-memory appointment store and change bus.
//!
//! The single owner of the appointment collection. Constructed once per
//! session and injected into the engine; every mutation publishes exactly one
//! `ScheduleEvent` on a broadcast bus that the rendering layer subscribes to.

use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::broadcast;

use crate::appointment::{Appointment, AppointmentId, SeriesId};
use crate::error::{EngineError, EngineResult};

const EVENT_BUS_CAPACITY: usize = 64;

/// Change notification published after every store mutation.
#[derive(Debug, Clone)]
pub enum ScheduleEvent {
    Created(Appointment),
    Updated(Appointment),
    Deleted(AppointmentId),
}

/// The in-memory appointment collection.
#[derive(Debug)]
pub struct AppointmentStore {
    appointments: HashMap<AppointmentId, Appointment>,
    events: broadcast::Sender<ScheduleEvent>,
}

impl Default for AppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        AppointmentStore {
            appointments: HashMap::new(),
            events,
        }
    }

    /// Subscribe to change notifications. Each subscriber gets every event
    /// published after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.events.subscribe()
    }

    pub fn get(&self, id: &AppointmentId) -> Option<&Appointment> {
        self.appointments.get(id)
    }

    pub fn contains(&self, id: &AppointmentId) -> bool {
        self.appointments.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments.values()
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    /// All appointments of one series, ordered by start.
    pub fn by_series(&self, series_id: &SeriesId) -> Vec<&Appointment> {
        let mut found: Vec<_> = self
            .appointments
            .values()
            .filter(|a| a.series_id.as_ref() == Some(series_id))
            .collect();
        found.sort_by_key(|a| a.start);
        found
    }

    /// All appointments starting on `date`, ordered by start.
    pub fn by_date(&self, date: NaiveDate) -> Vec<&Appointment> {
        let mut found: Vec<_> = self
            .appointments
            .values()
            .filter(|a| a.date() == date)
            .collect();
        found.sort_by_key(|a| a.start);
        found
    }

    /// Insert a new appointment and publish `Created`.
    pub fn insert(&mut self, appointment: Appointment) {
        self.publish(ScheduleEvent::Created(appointment.clone()));
        self.appointments.insert(appointment.id.clone(), appointment);
    }

    /// Mutate an appointment in place and publish `Updated`. Returns the
    /// updated copy.
    pub fn update(
        &mut self,
        id: &AppointmentId,
        mutate: impl FnOnce(&mut Appointment),
    ) -> EngineResult<Appointment> {
        let appointment = self
            .appointments
            .get_mut(id)
            .ok_or_else(|| EngineError::AppointmentNotFound(id.to_string()))?;
        mutate(appointment);
        let updated = appointment.clone();
        self.publish(ScheduleEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Remove an appointment and publish `Deleted`.
    pub fn remove(&mut self, id: &AppointmentId) -> Option<Appointment> {
        let removed = self.appointments.remove(id)?;
        self.publish(ScheduleEvent::Deleted(id.clone()));
        Some(removed)
    }

    fn publish(&self, event: ScheduleEvent) {
        // No subscriber listening is not an engine error.
        let _ = self.events.send(event);
    }
}

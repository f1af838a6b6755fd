//! Optimistic schedule reconciliation.
//!
//! The single mutation surface for the appointment set. Every operation is
//! two-phase: the local mutation applies synchronously (with a conflict gate
//! in front), then a sync task is queued for best-effort remote persistence.
//! The remote store is a cache of local state, never the other way around: a
//! failed save keeps the optimistic local result so the operator is never
//! blocked on the network.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::appointment::{
    Appointment, AppointmentId, AppointmentKind, ClientSnapshot, ResourceId,
};
use crate::conflict;
use crate::error::{EngineError, EngineResult, RemoteError};
use crate::recurrence::{self, RecurrencePattern};
use crate::remote::{NotificationSink, PersistenceService};
use crate::roster::StaffRoster;
use crate::store::AppointmentStore;

/// How many weeks a `repeat_weekly` block runs for.
const DEFAULT_BLOCK_REPEAT_WEEKS: u32 = 52;

/// Which occurrences a series-aware operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    Single,
    Future,
    Series,
}

/// Whether an operation came from an implicit gesture (drag/resize, already
/// visually complete) or an explicit form submission with a "did it work?"
/// expectation. Decides whether remote validation errors surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOrigin {
    Implicit,
    Explicit,
}

#[derive(Debug, Clone)]
pub enum SyncOp {
    Create(Appointment),
    Update(Appointment),
    Delete(AppointmentId),
}

/// One queued remote persistence attempt.
#[derive(Debug, Clone)]
pub struct SyncTask {
    pub op: SyncOp,
    pub origin: SyncOrigin,
}

/// Field replacements for an explicit edit. `None` keeps the current value;
/// everything not named here is carried over untouched.
#[derive(Debug, Clone, Default)]
pub struct AppointmentEdit {
    pub client: Option<ClientSnapshot>,
    pub service_names: Option<Vec<String>>,
    pub notes: Option<String>,
    pub resource_id: Option<ResourceId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Shared handles the reconciler and the sync worker both hold.
pub type SharedStore = Arc<Mutex<AppointmentStore>>;
pub type SharedRoster = Arc<Mutex<StaffRoster>>;

/// Applies schedule operations locally and queues the remote sync.
pub struct ScheduleReconciler {
    store: SharedStore,
    roster: SharedRoster,
    sync_tx: mpsc::UnboundedSender<SyncTask>,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl ScheduleReconciler {
    pub fn new(
        store: SharedStore,
        roster: SharedRoster,
        sync_tx: mpsc::UnboundedSender<SyncTask>,
        notifier: Option<Arc<dyn NotificationSink>>,
    ) -> Self {
        ScheduleReconciler {
            store,
            roster,
            sync_tx,
            notifier,
        }
    }

    /// Create one appointment from an explicit booking confirmation.
    pub fn create(&self, appointment: Appointment) -> EngineResult<Appointment> {
        appointment.validate()?;
        {
            let mut store = self.store.lock();
            conflict::check(
                store.iter(),
                &appointment.resource_id,
                appointment.start,
                appointment.end,
                None,
            )?;
            store.insert(appointment.clone());
        }
        self.register_resource(&appointment);
        self.maybe_notify(&appointment);
        self.enqueue(SyncOp::Create(appointment.clone()), SyncOrigin::Explicit);
        Ok(appointment)
    }

    /// Create a recurring series from a template and pattern.
    ///
    /// Occurrences past the anchor are not individually conflict-gated; the
    /// anchor slot was already validated when the user picked it.
    pub fn create_series(
        &self,
        template: &Appointment,
        pattern: &RecurrencePattern,
        anchor_date: NaiveDate,
        start_time: NaiveTime,
        duration: Duration,
    ) -> EngineResult<Vec<Appointment>> {
        let occurrences = recurrence::expand(template, pattern, anchor_date, start_time, duration)?;
        self.insert_expanded(&occurrences);
        Ok(occurrences)
    }

    /// Create a recurring group booking: one series per member, one shared
    /// group id.
    pub fn create_group_series(
        &self,
        member_templates: &[Appointment],
        pattern: &RecurrencePattern,
        anchor_date: NaiveDate,
        start_time: NaiveTime,
        duration: Duration,
    ) -> EngineResult<Vec<Appointment>> {
        let occurrences =
            recurrence::expand_group(member_templates, pattern, anchor_date, start_time, duration)?;
        self.insert_expanded(&occurrences);
        Ok(occurrences)
    }

    /// Create blocked time. A `repeat_weekly` block expands into a weekly
    /// series over the default horizon; otherwise it is a single block.
    pub fn create_block(&self, block: Appointment) -> EngineResult<Vec<Appointment>> {
        block.validate()?;
        let repeats = block.block.as_ref().is_some_and(|b| b.repeat_weekly);
        if !repeats {
            return self.create(block).map(|b| vec![b]);
        }

        let pattern = RecurrencePattern {
            interval_weeks: 1,
            end: recurrence::SeriesEnd::AfterOccurrences(DEFAULT_BLOCK_REPEAT_WEEKS),
            keep_same_time: true,
        };
        self.create_series(
            &block,
            &pattern,
            block.date(),
            block.start.time(),
            block.duration(),
        )
    }

    /// Move an appointment to a new column and/or time (drag-end).
    ///
    /// Everything not named by the move (client snapshot, services, notes,
    /// series/group linkage) is carried over untouched. On a rejected
    /// conflict the appointment is not modified at all.
    pub fn update_move(
        &self,
        id: &AppointmentId,
        new_resource: ResourceId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> EngineResult<Appointment> {
        if new_end <= new_start {
            return Err(EngineError::InvalidInterval);
        }
        let updated = {
            let mut store = self.store.lock();
            if !store.contains(id) {
                return Err(EngineError::AppointmentNotFound(id.to_string()));
            }
            conflict::check(store.iter(), &new_resource, new_start, new_end, Some(id))?;
            store.update(id, |a| {
                a.resource_id = new_resource.clone();
                a.start = new_start;
                a.end = new_end;
            })?
        };
        self.register_resource(&updated);
        self.enqueue(SyncOp::Update(updated.clone()), SyncOrigin::Implicit);
        Ok(updated)
    }

    /// Change an appointment's end instant (resize-end). The column and
    /// start stay put; all other fields are carried over untouched.
    pub fn update_resize(
        &self,
        id: &AppointmentId,
        new_end: DateTime<Utc>,
    ) -> EngineResult<Appointment> {
        let updated = {
            let mut store = self.store.lock();
            let current = store
                .get(id)
                .ok_or_else(|| EngineError::AppointmentNotFound(id.to_string()))?
                .clone();
            if new_end <= current.start {
                return Err(EngineError::InvalidInterval);
            }
            conflict::check(
                store.iter(),
                &current.resource_id,
                current.start,
                new_end,
                Some(id),
            )?;
            store.update(id, |a| a.end = new_end)?
        };
        self.enqueue(SyncOp::Update(updated.clone()), SyncOrigin::Implicit);
        Ok(updated)
    }

    /// Apply an explicit form edit to one appointment.
    pub fn update_edit(&self, id: &AppointmentId, edit: AppointmentEdit) -> EngineResult<Appointment> {
        let updated = {
            let mut store = self.store.lock();
            let current = store
                .get(id)
                .ok_or_else(|| EngineError::AppointmentNotFound(id.to_string()))?
                .clone();

            let resource = edit.resource_id.clone().unwrap_or(current.resource_id);
            let start = edit.start.unwrap_or(current.start);
            let end = edit.end.unwrap_or(current.end);
            if end <= start {
                return Err(EngineError::InvalidInterval);
            }
            conflict::check(store.iter(), &resource, start, end, Some(id))?;

            store.update(id, |a| {
                a.resource_id = resource.clone();
                a.start = start;
                a.end = end;
                if let Some(client) = edit.client.clone() {
                    a.client = Some(client);
                }
                if let Some(services) = edit.service_names.clone() {
                    a.service_names = services;
                }
                if let Some(notes) = edit.notes.clone() {
                    a.notes = Some(notes);
                }
            })?
        };
        self.register_resource(&updated);
        self.enqueue(SyncOp::Update(updated.clone()), SyncOrigin::Explicit);
        Ok(updated)
    }

    /// Re-plan an entire series from an edited template: every occurrence of
    /// the old series is removed and the pattern is expanded again under a
    /// fresh series id.
    pub fn reschedule_series(
        &self,
        id: &AppointmentId,
        template: &Appointment,
        pattern: &RecurrencePattern,
        anchor_date: NaiveDate,
        start_time: NaiveTime,
        duration: Duration,
    ) -> EngineResult<Vec<Appointment>> {
        self.delete(id, EditScope::Series)?;
        self.create_series(template, pattern, anchor_date, start_time, duration)
    }

    /// Delete an appointment at the given scope. Returns the removed ids.
    ///
    /// `Single` on a series occurrence (including one day of a full-day
    /// blocked run) removes only that occurrence.
    pub fn delete(&self, id: &AppointmentId, scope: EditScope) -> EngineResult<Vec<AppointmentId>> {
        let removed_ids = {
            let mut store = self.store.lock();
            let current = store
                .get(id)
                .ok_or_else(|| EngineError::AppointmentNotFound(id.to_string()))?
                .clone();

            let targets: Vec<AppointmentId> = match (scope, &current.series_id) {
                (EditScope::Single, _) | (_, None) => vec![current.id.clone()],
                (EditScope::Future, Some(series_id)) => store
                    .by_series(series_id)
                    .into_iter()
                    .filter(|a| a.start >= current.start)
                    .map(|a| a.id.clone())
                    .collect(),
                (EditScope::Series, Some(series_id)) => store
                    .by_series(series_id)
                    .into_iter()
                    .map(|a| a.id.clone())
                    .collect(),
            };

            for target in &targets {
                store.remove(target);
            }
            targets
        };

        for removed in &removed_ids {
            self.enqueue(SyncOp::Delete(removed.clone()), SyncOrigin::Explicit);
        }
        Ok(removed_ids)
    }

    fn insert_expanded(&self, occurrences: &[Appointment]) {
        {
            let mut store = self.store.lock();
            for occ in occurrences {
                store.insert(occ.clone());
            }
        }
        if let Some(first) = occurrences.first() {
            self.register_resource(first);
            self.maybe_notify(first);
        }
        for occ in occurrences {
            self.enqueue(SyncOp::Create(occ.clone()), SyncOrigin::Explicit);
        }
    }

    /// Auto-add a newly appearing staff column to the roster for the
    /// appointment's own date.
    fn register_resource(&self, appointment: &Appointment) {
        if let ResourceId::Staff(staff_id) = &appointment.resource_id {
            self.roster
                .lock()
                .add_worker(appointment.date(), staff_id.clone());
        }
    }

    /// Notification trigger: once per new non-blocked appointment with
    /// client contact present.
    fn maybe_notify(&self, appointment: &Appointment) {
        if appointment.kind == AppointmentKind::Blocked {
            return;
        }
        let has_contact = appointment
            .client
            .as_ref()
            .is_some_and(ClientSnapshot::has_contact);
        if !has_contact {
            return;
        }
        if let Some(notifier) = &self.notifier {
            notifier.appointment_created(appointment);
        }
    }

    fn enqueue(&self, op: SyncOp, origin: SyncOrigin) {
        // A closed queue means the sync worker is gone; local state is still
        // authoritative, so the operation has already succeeded.
        if self.sync_tx.send(SyncTask { op, origin }).is_err() {
            debug!("sync queue closed, keeping local state only");
        }
    }
}

// ============================================================================
// Sync worker
// ============================================================================

/// Create the queue connecting the reconciler to the sync worker.
pub fn sync_queue() -> (mpsc::UnboundedSender<SyncTask>, mpsc::UnboundedReceiver<SyncTask>) {
    mpsc::unbounded_channel()
}

/// Drain the sync queue against the persistence service until every sender
/// is dropped. User-facing messages for explicit-operation validation
/// failures go out on `alerts`.
pub async fn run_sync_worker(
    store: SharedStore,
    service: Arc<dyn PersistenceService>,
    mut tasks: mpsc::UnboundedReceiver<SyncTask>,
    alerts: Option<mpsc::UnboundedSender<String>>,
) {
    while let Some(task) = tasks.recv().await {
        sync_one(&store, service.as_ref(), task, alerts.as_ref()).await;
    }
}

/// Spawn the sync worker on the current runtime.
pub fn spawn_sync_worker(
    store: SharedStore,
    service: Arc<dyn PersistenceService>,
    tasks: mpsc::UnboundedReceiver<SyncTask>,
    alerts: Option<mpsc::UnboundedSender<String>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run_sync_worker(store, service, tasks, alerts))
}

async fn sync_one(
    store: &SharedStore,
    service: &dyn PersistenceService,
    task: SyncTask,
    alerts: Option<&mpsc::UnboundedSender<String>>,
) {
    let result = match &task.op {
        SyncOp::Create(appointment) => service
            .create(appointment)
            .await
            .map(|remote| apply_enrichment(store, &appointment.id, remote)),
        SyncOp::Update(appointment) => service
            .update(appointment)
            .await
            .map(|remote| apply_enrichment(store, &appointment.id, remote)),
        SyncOp::Delete(id) => service.delete(id).await,
    };

    match result {
        Ok(()) => {}
        Err(RemoteError::NotFound) => {
            // Already gone remotely; success-equivalent.
            debug!(op = ?task.op, "remote record not found, local state stands");
        }
        Err(RemoteError::Transport(message)) => {
            warn!(op = ?task.op, %message, "remote save failed, keeping local state");
        }
        Err(RemoteError::Validation(message)) => {
            warn!(op = ?task.op, %message, "remote rejected payload, keeping local state");
            if task.origin == SyncOrigin::Explicit {
                if let Some(alerts) = alerts {
                    let _ = alerts.send(message.clone());
                }
            }
        }
    }
}

/// Refine a local appointment with richer data from a save response.
///
/// Only the client snapshot is taken from the remote; times and column may
/// have newer local edits that a stale response must not clobber. If the
/// appointment was deleted (or replaced) meanwhile, the response is
/// discarded.
fn apply_enrichment(store: &SharedStore, id: &AppointmentId, remote: Appointment) {
    if remote.id != *id {
        debug!(%id, remote_id = %remote.id, "response identity mismatch, discarding");
        return;
    }
    let mut store = store.lock();
    if !store.contains(id) {
        debug!(%id, "appointment gone locally, discarding stale response");
        return;
    }
    if let Some(remote_client) = remote.client {
        // Ignore the update-path NotFound: contains() was just checked and
        // the lock is still held.
        let _ = store.update(id, |a| {
            if a.client.is_none() {
                a.client = Some(remote_client.clone());
            }
        });
    }
}

/// Warm the local store from the remote, once per session. Failures are
/// logged and absorbed; an unreachable remote just means starting empty.
pub async fn hydrate_from_remote(
    store: &SharedStore,
    service: &dyn PersistenceService,
) -> usize {
    match service.fetch_all().await {
        Ok(appointments) => {
            let mut store = store.lock();
            let count = appointments.len();
            for appointment in appointments {
                if !store.contains(&appointment.id) {
                    store.insert(appointment);
                }
            }
            count
        }
        Err(err) => {
            warn!(%err, "could not hydrate from remote, starting from local state");
            0
        }
    }
}

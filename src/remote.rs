//! Collaborator boundary.
//!
//! Ports for the services the engine invokes but does not own: the remote
//! persistence store, the customer and staff directories, and the
//! notification trigger. The engine is local-first; the persistence service
//! is treated as a cache of the in-memory state, not the source of truth.

use async_trait::async_trait;

use crate::appointment::{Appointment, AppointmentId, ClientSnapshot, StaffId, StaffMember};
use crate::error::RemoteError;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote appointment store, keyed by appointment id.
///
/// `update`/`delete` on an unknown id must return `RemoteError::NotFound`,
/// which callers treat as "already gone remotely": local state stands and
/// the user is not errored.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn fetch_all(&self) -> RemoteResult<Vec<Appointment>>;

    /// Persist a new appointment. The response may carry richer data than
    /// was sent (e.g. a resolved client record).
    async fn create(&self, appointment: &Appointment) -> RemoteResult<Appointment>;

    async fn update(&self, appointment: &Appointment) -> RemoteResult<Appointment>;

    async fn delete(&self, id: &AppointmentId) -> RemoteResult<()>;
}

/// Resolves a client reference to contact details. Lookups may fail; callers
/// fall back to the appointment's cached snapshot or "Walk-in Client".
pub trait CustomerDirectory: Send + Sync {
    fn resolve(&self, client_ref: &str) -> Option<ClientSnapshot>;
}

/// Resolves a staff id to display metadata. Callers tolerate an unresolved
/// id with a placeholder entry rather than hiding the appointment.
pub trait StaffDirectory: Send + Sync {
    fn resolve(&self, id: &StaffId) -> Option<StaffMember>;
}

/// Fired once per newly created non-blocked appointment with client contact
/// present. The engine only invokes the trigger; delivery lives elsewhere.
pub trait NotificationSink: Send + Sync {
    fn appointment_created(&self, appointment: &Appointment);
}

/// Freshest client details for an appointment: the directory if the
/// reference still resolves, else the denormalized snapshot.
pub fn resolve_client(
    appointment: &Appointment,
    directory: &dyn CustomerDirectory,
) -> Option<ClientSnapshot> {
    let snapshot = appointment.client.as_ref()?;
    if let Some(client_ref) = snapshot.client_ref.as_deref() {
        if let Some(resolved) = directory.resolve(client_ref) {
            return Some(resolved);
        }
    }
    Some(snapshot.clone())
}

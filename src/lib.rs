//! Appointment scheduling engine for a salon front-desk calendar.
//!
//! This crate resolves raw calendar interactions (clicks, drags, resizes)
//! into resource/time assignments, detects blocked-time conflicts, expands
//! recurring series, and reconciles optimistic local state against an
//! unreliable backend. A rendering layer displays plain data structures; the
//! engine never touches pixels beyond the click geometry it is handed.
//!
//! - [`timeslot`] turns ambiguous grid labels into absolute instants
//! - [`resource`] maps clicks and appointments to calendar columns
//! - [`conflict`] gates operations against blocked time
//! - [`roster`] tracks which staff are visible per date
//! - [`recurrence`] expands weekly patterns into occurrence runs
//! - [`store`] owns the in-memory appointment set and its change bus
//! - [`reconcile`] applies operations locally, then syncs best-effort
//! - [`remote`] declares the collaborator ports the engine invokes
//! - [`selection`] briefly persists a pending slot selection

pub mod appointment;
pub mod conflict;
pub mod error;
pub mod reconcile;
pub mod recurrence;
pub mod remote;
pub mod resource;
pub mod roster;
pub mod selection;
pub mod store;
pub mod timeslot;

// Re-export the domain types and the error alias at crate root.
pub use appointment::*;
pub use error::{EngineError, EngineResult, RemoteError};

#![deny(missing_docs)]

//! # pm-core: Foundational Types for the Patient Management Stack
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies, only `serde`, `serde_json`, `thiserror`, `chrono` and
//! `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`PatientId`] is not a
//!    bare `Uuid`, and an [`Email`] is validated and normalized once, at
//!    construction, so the uniqueness rule compares like with like.
//!
//! 2. **One event shape.** [`PatientEvent`] is the only record the stack
//!    hands to the message broker.
//!
//! 3. **Structured errors.** [`ValidationError`] carries the rejected input.
//!    No `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod error;
pub mod event;
pub mod identity;
pub mod patient;

pub use error::ValidationError;
pub use event::{PatientEvent, PatientEventType};
pub use identity::{Email, PatientId};
pub use patient::{NewPatient, Patient, PatientChanges};

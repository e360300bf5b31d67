#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! ## Module Layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`ot`] | operations, diff, transform and rebase |
//! | [`gate`] | versioned apply, preview and history |
//! | [`store`] | storage boundary and the in-memory store |
//! | [`types`] | ids, document state, change records, fingerprints |
//! | [`projection`] | plain text extracted from rich editor state |
//! | [`protocol`] | wire messages shared by server and client |
//! | [`server`] | axum router |
//! | [`client`] | reqwest client |
//! | [`error`] | error types |
//!
//! ## Consistency Model
//!
//! A document is a single string with a monotonically increasing version.
//! Clients submit operations against the version they last saw. Stale
//! submissions are rebased over every change committed since, so two clients
//! editing the same base always converge, and each accepted change produces
//! exactly one new version.

pub mod client;
pub mod error;
pub mod gate;
pub mod ot;
pub mod projection;
pub mod protocol;
pub mod server;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use gate::{AppliedChange, ChangeGate, GateConfig, Preview};
pub use ot::{diff, transform, Operation, OperationSet, Priority};
pub use store::{DocumentStore, InMemoryStore};
pub use types::{ActorId, ChangeRecord, DocumentId, DocumentState, Fingerprint};

//! The change gate: versioned, optimistic application of operation sets.
//!
//! Every apply request names the version its operations were built
//! against. The gate compares it with the stored version:
//!
//! | Claimed vs stored | Action |
//! |-------------------|--------|
//! | equal | apply directly |
//! | older | rebase over the intervening change records, then apply |
//! | newer | reject with [`Error::State`](crate::Error::State) |
//!
//! A successful apply commits content, version and change record in one
//! atomic store call conditioned on the version read at the start. Losing
//! that race restarts the whole request from a fresh read.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChangeGate`] | Apply, preview and history over a store |
//! | [`GateConfig`] | Retry budget, priority, overlap policy, paging |
//! | [`HistoryCursor`] | Opaque change log position |
//! | [`Clock`] | Timestamp source for change records |

mod change_gate;
mod clock;
mod config;
mod history;

pub use change_gate::{AppliedChange, ChangeGate, Preview};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::GateConfig;
pub use history::{HistoryCursor, HistoryPage};

//! Operational transform primitives for plain-text documents.
//!
//! Everything in this module is a pure function over immutable inputs and
//! can be called from any number of threads without synchronization.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Operation`] | Retain, delete or insert |
//! | [`OperationSet`] | Ordered operations with sequential `apply` |
//! | [`Priority`] | Tie-break for inserts at the same position |
//! | [`DeleteOverlap`] | Policy for deletes both sides made |
//!
//! # Examples
//!
//! ## Building and applying
//!
//! ```
//! use cowrite::ot::OperationSet;
//!
//! let mut set = OperationSet::new();
//! set.retain(1).delete(1).retain(1);
//! assert_eq!(set.apply("ABC").unwrap(), "AC");
//! ```
//!
//! ## Diffing
//!
//! ```
//! use cowrite::ot::diff;
//!
//! let set = diff("Hello world", "Hello brave world");
//! assert_eq!(set.apply("Hello world").unwrap(), "Hello brave world");
//! ```
//!
//! ## Rebasing a stale edit
//!
//! ```
//! use cowrite::ot::{diff, transform, Priority};
//!
//! let base = "ABC";
//! let mine = diff(base, "AC");
//! let theirs = diff(base, "AZBC");
//!
//! let rebased = transform(&mine, &theirs, Priority::Left).unwrap();
//! assert_eq!(rebased.apply("AZBC").unwrap(), "AZC");
//! ```

pub mod diff;
pub mod operation;
pub mod operation_set;
pub mod transform;

pub use diff::{diff, normalize_line_endings, summarize, EditKind, EditSummary};
pub use operation::{Attributes, Operation};
pub use operation_set::OperationSet;
pub use transform::{rebase, transform, transform_with, DeleteOverlap, Priority};

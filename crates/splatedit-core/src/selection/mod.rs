//! Compact index selections and the edits built from them
//!
//! - **SelectionSet**: run-length packed set of point indices
//! - **IndexPredicate / SortedIdPredicate**: membership tests evaluated in one ascending scan
//! - **StateOp / EditHistory**: undoable bit edits of per-point state driven by a selection

pub mod history;
pub mod predicate;
pub mod ranges;
pub mod state;

pub use history::EditHistory;
pub use predicate::{IndexPredicate, SortedIdPredicate};
pub use ranges::{RangeEntry, SelectionSet, INDEX_MASK, SINGLE_BIT};
pub use state::{BitOp, SelectMode, SplatState, StateOp, StateOpKind};

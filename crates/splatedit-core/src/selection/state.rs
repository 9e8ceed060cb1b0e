//! Undoable edits of per-point state
//!
//! The editor keeps one state byte per point. An edit is captured as the set
//! of points it touches plus a bit operation, so undo is the inverse operation
//! over the same [`SelectionSet`] and never needs a copy of the old bytes.

use bitflags::bitflags;

use super::predicate::{IndexPredicate, SortedIdPredicate};
use super::ranges::SelectionSet;
use crate::error::SelectionError;

bitflags! {
    /// Flags stored in each point's state byte
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SplatState: u8 {
        /// Point is part of the current selection
        const SELECTED = 0b001;
        /// Point is hidden and cannot be selected
        const LOCKED = 0b010;
        /// Point is deleted
        const DELETED = 0b100;
    }
}

const SELECTED: u8 = SplatState::SELECTED.bits();
const LOCKED: u8 = SplatState::LOCKED.bits();
const DELETED: u8 = SplatState::DELETED.bits();

/// Bit operation applied to every point of a selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitOp {
    Set,
    Clear,
    Toggle,
}

impl BitOp {
    /// The operation that undoes this one
    pub fn inverse(self) -> Self {
        match self {
            BitOp::Set => BitOp::Clear,
            BitOp::Clear => BitOp::Set,
            BitOp::Toggle => BitOp::Toggle,
        }
    }
}

/// How a brush, box or id list combines with the current selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectMode {
    /// Select matching points
    Add,
    /// Deselect matching points
    Remove,
    /// Replace the selection with the matching points
    Set,
}

/// What an edit does, for history display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateOpKind {
    SelectAll,
    SelectNone,
    SelectInvert,
    Select,
    HideSelection,
    UnhideAll,
    DeleteSelection,
    Reset,
    DeleteOutliers,
}

impl StateOpKind {
    pub fn name(&self) -> &'static str {
        match self {
            StateOpKind::SelectAll => "select_all",
            StateOpKind::SelectNone => "select_none",
            StateOpKind::SelectInvert => "select_invert",
            StateOpKind::Select => "select",
            StateOpKind::HideSelection => "hide_selection",
            StateOpKind::UnhideAll => "unhide_all",
            StateOpKind::DeleteSelection => "delete_selection",
            StateOpKind::Reset => "reset",
            StateOpKind::DeleteOutliers => "delete_outliers",
        }
    }
}

/// A reversible bit edit over a selection of points
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateOp {
    kind: StateOpKind,
    selection: SelectionSet,
    mask: SplatState,
    op: BitOp,
}

impl StateOp {
    pub fn new(kind: StateOpKind, selection: SelectionSet, mask: SplatState, op: BitOp) -> Self {
        Self {
            kind,
            selection,
            mask,
            op,
        }
    }

    fn scan<P>(
        kind: StateOpKind,
        state: &[u8],
        mask: SplatState,
        op: BitOp,
        predicate: P,
    ) -> Result<Self, SelectionError>
    where
        P: IndexPredicate,
    {
        let selection = SelectionSet::from_predicate(state.len(), predicate)?;
        Ok(Self::new(kind, selection, mask, op))
    }

    /// Select every point with no flags set
    pub fn select_all(state: &[u8]) -> Result<Self, SelectionError> {
        Self::scan(
            StateOpKind::SelectAll,
            state,
            SplatState::SELECTED,
            BitOp::Set,
            |i: usize| state[i] == 0,
        )
    }

    /// Deselect every selected point
    pub fn select_none(state: &[u8]) -> Result<Self, SelectionError> {
        Self::scan(
            StateOpKind::SelectNone,
            state,
            SplatState::SELECTED,
            BitOp::Clear,
            |i: usize| state[i] == SELECTED,
        )
    }

    /// Flip the selection of every visible point
    pub fn select_invert(state: &[u8]) -> Result<Self, SelectionError> {
        Self::scan(
            StateOpKind::SelectInvert,
            state,
            SplatState::SELECTED,
            BitOp::Toggle,
            |i: usize| state[i] & (LOCKED | DELETED) == 0,
        )
    }

    /// Combine the points matching `predicate` with the current selection
    ///
    /// The predicate sees every index of `state` once, in ascending order.
    pub fn select<P>(
        state: &[u8],
        mode: SelectMode,
        mut predicate: P,
    ) -> Result<Self, SelectionError>
    where
        P: IndexPredicate,
    {
        let kind = StateOpKind::Select;
        let mask = SplatState::SELECTED;
        match mode {
            SelectMode::Add => Self::scan(kind, state, mask, BitOp::Set, |i: usize| {
                predicate.test(i) && state[i] == 0
            }),
            SelectMode::Remove => Self::scan(kind, state, mask, BitOp::Clear, |i: usize| {
                predicate.test(i) && state[i] == SELECTED
            }),
            SelectMode::Set => Self::scan(kind, state, mask, BitOp::Toggle, |i: usize| {
                predicate.test(i) != (state[i] == SELECTED)
            }),
        }
    }

    /// Combine an ascending, duplicate-free id list with the current selection
    pub fn select_ids(
        state: &[u8],
        mode: SelectMode,
        ids: &[u32],
    ) -> Result<Self, SelectionError> {
        Self::select(state, mode, SortedIdPredicate::new(ids))
    }

    /// Hide the selected points
    pub fn hide_selection(state: &[u8]) -> Result<Self, SelectionError> {
        Self::scan(
            StateOpKind::HideSelection,
            state,
            SplatState::LOCKED,
            BitOp::Set,
            |i: usize| state[i] == SELECTED,
        )
    }

    /// Show every hidden point that is not deleted
    pub fn unhide_all(state: &[u8]) -> Result<Self, SelectionError> {
        Self::scan(
            StateOpKind::UnhideAll,
            state,
            SplatState::LOCKED,
            BitOp::Clear,
            |i: usize| state[i] & (LOCKED | DELETED) == LOCKED,
        )
    }

    /// Delete the selected points
    pub fn delete_selection(state: &[u8]) -> Result<Self, SelectionError> {
        Self::scan(
            StateOpKind::DeleteSelection,
            state,
            SplatState::DELETED,
            BitOp::Set,
            |i: usize| state[i] == SELECTED,
        )
    }

    /// Restore every deleted point
    pub fn reset(state: &[u8]) -> Result<Self, SelectionError> {
        Self::scan(
            StateOpKind::Reset,
            state,
            SplatState::DELETED,
            BitOp::Clear,
            |i: usize| state[i] & DELETED != 0,
        )
    }

    pub fn kind(&self) -> StateOpKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Points this edit touches
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn mask(&self) -> SplatState {
        self.mask
    }

    pub fn op(&self) -> BitOp {
        self.op
    }

    /// Whether applying this edit changes nothing
    pub fn is_noop(&self) -> bool {
        self.selection.is_empty() || self.mask.is_empty()
    }

    /// Perform the edit; indices beyond `state` are ignored
    pub fn apply(&self, state: &mut [u8]) {
        self.apply_bit_op(state, self.op);
    }

    /// Undo the edit
    pub fn revert(&self, state: &mut [u8]) {
        self.apply_bit_op(state, self.op.inverse());
    }

    fn apply_bit_op(&self, state: &mut [u8], op: BitOp) {
        let mask = self.mask.bits();
        self.selection.for_each(|i| {
            if let Some(s) = state.get_mut(i) {
                match op {
                    BitOp::Set => *s |= mask,
                    BitOp::Clear => *s &= !mask,
                    BitOp::Toggle => *s ^= mask,
                }
            }
        });
    }
}

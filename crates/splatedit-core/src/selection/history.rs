//! Linear undo/redo history of state edits

use super::state::StateOp;

/// Undo/redo stack of [`StateOp`]s
///
/// Ops before the cursor are applied; ops after it were undone and can be
/// redone until a new op is added.
#[derive(Debug, Default)]
pub struct EditHistory {
    ops: Vec<StateOp>,
    cursor: usize,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `op` to `state` and record it, discarding anything undone
    pub fn add(&mut self, op: StateOp, state: &mut [u8]) {
        op.apply(state);
        tracing::trace!(op = op.name(), points = op.selection().len(), "Applied edit");
        self.push(op);
    }

    /// Record an op the caller has already applied, discarding anything undone
    ///
    /// Undo and redo treat it exactly like an op passed to [`add`](Self::add).
    pub fn record(&mut self, op: StateOp) {
        tracing::trace!(op = op.name(), points = op.selection().len(), "Recorded edit");
        self.push(op);
    }

    fn push(&mut self, op: StateOp) {
        self.ops.truncate(self.cursor);
        self.ops.push(op);
        self.cursor = self.ops.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.ops.len()
    }

    /// Revert the most recent applied op; false when there is none
    pub fn undo(&mut self, state: &mut [u8]) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        self.ops[self.cursor].revert(state);
        true
    }

    /// Re-apply the most recently undone op; false when there is none
    pub fn redo(&mut self, state: &mut [u8]) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.ops[self.cursor].apply(state);
        self.cursor += 1;
        true
    }

    /// The op `undo` would revert
    pub fn last_applied(&self) -> Option<&StateOp> {
        self.cursor.checked_sub(1).map(|i| &self.ops[i])
    }

    /// Forget every op without touching any state
    pub fn clear(&mut self) {
        self.ops.clear();
        self.cursor = 0;
    }

    /// Number of recorded ops, applied or undone
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

//! Snapshot-based undo/redo history.
//!
//! Whole-state snapshots rather than inverse operations: each committed
//! edit stores the full local object list, so undo is an install, not a
//! replay. Both stacks are bounded at [`HISTORY_CAPACITY`]. The history is
//! purely local — peer-originated changes arrive through
//! [`HistoryManager::replace_without_history`] and never become undoable.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use events::RoomObject;

use crate::consts::HISTORY_CAPACITY;

/// One committed canvas state: the full local object list.
pub type Snapshot = Vec<RoomObject>;

/// Bounded undo/redo stacks over whole-state snapshots.
#[derive(Debug, Default)]
pub struct HistoryManager {
    undo: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
    current: Snapshot,
}

impl HistoryManager {
    /// Create an empty history with an empty current state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed edit: the pre-change state becomes undoable and
    /// any previously undone future is invalidated.
    pub fn commit(&mut self, state: Snapshot) {
        self.undo.push_back(std::mem::replace(&mut self.current, state));
        if self.undo.len() > HISTORY_CAPACITY {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Step back to the previous committed state, making the present one
    /// redoable. Returns the installed state, or `None` with no effect if
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push_back(std::mem::replace(&mut self.current, previous));
        if self.redo.len() > HISTORY_CAPACITY {
            self.redo.pop_front();
        }
        Some(self.current.clone())
    }

    /// Mirror of [`Self::undo`].
    pub fn redo(&mut self) -> Option<Snapshot> {
        let next = self.redo.pop_back()?;
        self.undo.push_back(std::mem::replace(&mut self.current, next));
        if self.undo.len() > HISTORY_CAPACITY {
            self.undo.pop_front();
        }
        Some(self.current.clone())
    }

    /// Install a state without touching either stack. Used for every
    /// peer-originated or initial-sync change.
    pub fn replace_without_history(&mut self, state: Snapshot) {
        self.current = state;
    }

    /// Drop all history. Used when switching rooms.
    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// The most recently installed state.
    #[must_use]
    pub fn current(&self) -> &[RoomObject] {
        &self.current
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable steps.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of redoable steps.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

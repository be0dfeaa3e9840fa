use crate::plate::Plate;
use serde::{Deserialize, Serialize};

/// Linear undo/redo log over whole-plate snapshots. Every mutation derives a
/// complete new plate from the current one and commits it here; there is no
/// partial/patch history. The cursor is always a valid index, and a commit
/// truncates everything after it, so redo after a divergent edit is
/// impossible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateHistory {
    snapshots: Vec<Plate>,
    cursor: usize,
}

impl PlateHistory {
    pub fn new(initial: Plate) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// The plate at the cursor.
    pub fn current(&self) -> &Plate {
        &self.snapshots[self.cursor]
    }

    #[inline(always)]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[inline(always)]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        // At least the initial snapshot is always present.
        false
    }

    pub fn commit(&mut self, next: Plate) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(next);
        self.cursor = self.snapshots.len() - 1;
    }

    /// Moves the cursor back one snapshot; no-op at the beginning.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Moves the cursor forward one snapshot; no-op at the end.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }
}

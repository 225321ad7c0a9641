//! Sibling navigation over the visible rows.
//!
//! A [`Navigator`] is a borrowed view over the row index and the selection
//! that answers "which row comes next". Masked rows are never a navigation
//! target; the caller decides what masked means by passing a predicate.

use crate::record::RecordId;
use crate::row_index::{Direction, RowIndex};
use crate::selection::SelectionTracker;

/// Read-only navigation over one snapshot of table state.
pub struct Navigator<'a, M>
where
    M: Fn(RecordId) -> bool,
{
    rows: &'a RowIndex,
    selection: &'a SelectionTracker,
    is_masked: M,
}

impl<'a, M> Navigator<'a, M>
where
    M: Fn(RecordId) -> bool,
{
    /// Create a navigator. `is_masked` returns true for rows to skip.
    pub fn new(rows: &'a RowIndex, selection: &'a SelectionTracker, is_masked: M) -> Self {
        Self {
            rows,
            selection,
            is_masked,
        }
    }

    /// First visible row that is not masked.
    pub fn first(&self) -> Option<RecordId> {
        self.rows.first_where(&self.is_masked)
    }

    /// Sibling of `start` in `direction`, skipping masked rows.
    ///
    /// Without `start` the walk begins at the first selected id. Returns
    /// `None` when there is nowhere to start from, when the start row is
    /// not visible, or when the walk runs off the end.
    pub fn sibling(&self, start: Option<RecordId>, direction: Direction) -> Option<RecordId> {
        let start = start.or_else(|| self.selection.first())?;
        self.rows.sibling(start, direction, &self.is_masked)
    }

    /// Row a "move" should select.
    ///
    /// With nothing selected this is the first unmasked row; otherwise the
    /// sibling of `start` (or of the first selected id).
    pub fn move_target(&self, start: Option<RecordId>, direction: Direction) -> Option<RecordId> {
        if self.selection.is_empty() {
            self.first()
        } else {
            self.sibling(start, direction)
        }
    }

    /// The row following the selection: the next sibling of the last
    /// selected id, skipping masked and selected rows, or the previous one
    /// when nothing follows.
    pub fn after_selection(&self) -> Option<RecordId> {
        let last = self.selection.last()?;
        let skip = |id: RecordId| (self.is_masked)(id) || self.selection.is_selected(id);
        self.rows
            .sibling(last, Direction::Next, skip)
            .or_else(|| self.rows.sibling(last, Direction::Previous, skip))
    }
}

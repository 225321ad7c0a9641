//! Ranked selection tracking.
//!
//! [`SelectionTracker`] keeps the set of selected record ids together with a
//! rank for each: the order in which the id joined the selection. Ranks are
//! what give every selected row a stable color in multi-selection, so they
//! are kept dense: after any removal the remaining members are renumbered
//! `0..k-1` in their existing order.
//!
//! # Example
//!
//! ```
//! use tablekit::SelectionTracker;
//!
//! let mut selection = SelectionTracker::default();
//! selection.replace([2, 0, 3]);
//! assert_eq!(selection.selected(), vec![2, 0, 3]);
//!
//! selection.toggle(0);
//! assert_eq!(selection.selected(), vec![2, 3]);
//! assert_eq!(selection.rank(3), Some(1));
//! ```

use std::collections::HashMap;

use serde::Serialize;
use tablekit_core::logging::targets;

use crate::record::RecordId;

/// How selection ranks map to color indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorScheme {
    /// Added to the rank.
    pub offset: usize,
    /// Number of colors to wrap around, if bounded.
    pub palette_size: Option<usize>,
}

impl ColorScheme {
    /// Color index for a selection rank.
    pub fn color_for(&self, rank: usize) -> usize {
        let color = rank + self.offset;
        match self.palette_size {
            Some(size) if size > 0 => color % size,
            _ => color,
        }
    }
}

/// Display state derived for a selected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowMarker {
    /// Always true for markers returned by the tracker.
    pub selected: bool,
    /// Dense selection rank.
    pub rank: usize,
    /// Color index derived from the rank.
    pub color: usize,
}

impl RowMarker {
    /// Class tags for the row: `selected`, `selected-N`, `color-N`.
    pub fn classes(&self) -> Vec<String> {
        vec![
            "selected".to_owned(),
            format!("selected-{}", self.rank),
            format!("color-{}", self.color),
        ]
    }
}

/// Ordered set of selected ids with dense ranks.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    ranks: HashMap<RecordId, usize>,
    /// Rank the next inserted id receives.
    next_rank: usize,
    colors: ColorScheme,
}

impl SelectionTracker {
    /// Create an empty tracker.
    pub fn new(colors: ColorScheme) -> Self {
        Self {
            ranks: HashMap::new(),
            next_rank: 0,
            colors,
        }
    }

    /// The active color scheme.
    pub fn colors(&self) -> ColorScheme {
        self.colors
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: RecordId) -> bool {
        self.ranks.contains_key(&id)
    }

    /// Rank of `id`, if selected.
    pub fn rank(&self, id: RecordId) -> Option<usize> {
        self.ranks.get(&id).copied()
    }

    /// Selected ids ordered by ascending rank.
    pub fn selected(&self) -> Vec<RecordId> {
        let mut members: Vec<(usize, RecordId)> =
            self.ranks.iter().map(|(&id, &rank)| (rank, id)).collect();
        members.sort_unstable();
        members.into_iter().map(|(_, id)| id).collect()
    }

    /// The id with rank 0.
    pub fn first(&self) -> Option<RecordId> {
        self.ranks
            .iter()
            .min_by_key(|&(_, &rank)| rank)
            .map(|(&id, _)| id)
    }

    /// The id with the highest rank.
    pub fn last(&self) -> Option<RecordId> {
        self.ranks
            .iter()
            .max_by_key(|&(_, &rank)| rank)
            .map(|(&id, _)| id)
    }

    /// Add `id` with the next rank. Returns `false` if already selected.
    pub fn insert(&mut self, id: RecordId) -> bool {
        if self.ranks.contains_key(&id) {
            return false;
        }
        self.ranks.insert(id, self.next_rank);
        self.next_rank += 1;
        true
    }

    /// Remove `id` and renumber. Returns `false` if it was not selected.
    pub fn remove(&mut self, id: RecordId) -> bool {
        if self.ranks.remove(&id).is_none() {
            return false;
        }
        self.renumber();
        true
    }

    /// Flip membership of `id`. Returns the new membership.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.remove(id) {
            false
        } else {
            self.insert(id)
        }
    }

    /// Clear the selection and reset the rank counter.
    pub fn clear(&mut self) {
        self.ranks.clear();
        self.next_rank = 0;
    }

    /// Clear, then insert each id in order. Duplicates keep their first rank.
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RecordId>,
    {
        self.clear();
        for id in ids {
            self.insert(id);
        }
    }

    /// Keep only ids for which `keep` is true. Returns how many were dropped.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: Fn(RecordId) -> bool,
    {
        let before = self.ranks.len();
        self.ranks.retain(|&id, _| keep(id));
        let dropped = before - self.ranks.len();
        if dropped > 0 {
            self.renumber();
        }
        dropped
    }

    /// Marker for `id`, if selected.
    pub fn marker(&self, id: RecordId) -> Option<RowMarker> {
        self.rank(id).map(|rank| RowMarker {
            selected: true,
            rank,
            color: self.colors.color_for(rank),
        })
    }

    /// Markers of all selected ids in rank order.
    pub fn markers(&self) -> Vec<(RecordId, RowMarker)> {
        self.selected()
            .into_iter()
            .filter_map(|id| self.marker(id).map(|marker| (id, marker)))
            .collect()
    }

    /// Whether the ranks are exactly `0..len`.
    pub fn ranks_are_dense(&self) -> bool {
        let mut seen = vec![false; self.ranks.len()];
        for &rank in self.ranks.values() {
            match seen.get_mut(rank) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        self.next_rank == self.ranks.len()
    }

    /// Reassign ranks `0..k-1` keeping the current order.
    fn renumber(&mut self) {
        let ordered = self.selected();
        for (rank, id) in ordered.iter().enumerate() {
            self.ranks.insert(*id, rank);
        }
        self.next_rank = ordered.len();
        tracing::trace!(target: targets::SELECTION, count = ordered.len(), "renumbered selection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order_not_numeric_order() {
        let mut selection = SelectionTracker::default();
        selection.replace([2, 0, 3]);
        assert_eq!(selection.selected(), vec![2, 0, 3]);
        assert_eq!(selection.first(), Some(2));
        assert_eq!(selection.last(), Some(3));
    }

    #[test]
    fn test_toggle_renumbers() {
        let mut selection = SelectionTracker::default();
        selection.replace([1, 2, 3]);
        assert!(!selection.toggle(2));

        assert_eq!(selection.selected(), vec![1, 3]);
        assert_eq!(selection.rank(1), Some(0));
        assert_eq!(selection.rank(3), Some(1));
        assert!(selection.ranks_are_dense());

        assert!(selection.toggle(2));
        assert_eq!(selection.selected(), vec![1, 3, 2]);
    }

    #[test]
    fn test_ranks_beyond_nine_sort_numerically() {
        let mut selection = SelectionTracker::default();
        let ids: Vec<RecordId> = (100..112).collect();
        selection.replace(ids.clone());
        assert_eq!(selection.selected(), ids);
        assert_eq!(selection.rank(111), Some(11));
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut selection = SelectionTracker::default();
        selection.replace([5, 6]);
        selection.clear();
        assert!(selection.is_empty());
        selection.insert(9);
        assert_eq!(selection.rank(9), Some(0));
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut selection = SelectionTracker::default();
        selection.replace([4, 4, 1]);
        assert_eq!(selection.selected(), vec![4, 1]);
        assert!(!selection.insert(1));
        assert!(selection.ranks_are_dense());
    }

    #[test]
    fn test_retain_renumbers() {
        let mut selection = SelectionTracker::default();
        selection.replace([7, 8, 9, 10]);
        assert_eq!(selection.retain(|id| id % 2 == 0), 2);
        assert_eq!(selection.selected(), vec![8, 10]);
        assert_eq!(selection.rank(10), Some(1));
        assert_eq!(selection.retain(|_| true), 0);
    }

    #[test]
    fn test_markers_and_colors() {
        let colors = ColorScheme {
            offset: 1,
            palette_size: Some(3),
        };
        let mut selection = SelectionTracker::new(colors);
        selection.replace([10, 20, 30]);

        let marker = selection.marker(30).unwrap();
        assert_eq!(marker.rank, 2);
        assert_eq!(marker.color, 0);
        assert_eq!(marker.classes(), vec!["selected", "selected-2", "color-0"]);
        assert!(selection.marker(40).is_none());

        let ids: Vec<RecordId> = selection.markers().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}

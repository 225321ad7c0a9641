//! Mapping between record ids and display positions.
//!
//! The row index is rebuilt from the list source every time the visible
//! rows change. It is the only way the table resolves a clicked position or
//! a typed-in id to a record, so no lookup ever walks rendered elements.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// Direction of sibling traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards higher display positions.
    #[default]
    Next,
    /// Towards lower display positions.
    Previous,
}

impl Direction {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Next => Self::Previous,
            Self::Previous => Self::Next,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("next"),
            Self::Previous => f.write_str("previous"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Self::Next),
            "previous" | "prev" => Ok(Self::Previous),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Display order of the visible rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndex {
    order: Vec<RecordId>,
    positions: HashMap<RecordId, usize>,
}

impl RowIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from ids in display order.
    pub fn from_ids(ids: Vec<RecordId>) -> Self {
        let mut index = Self::new();
        index.rebuild(ids);
        index
    }

    /// Replace the display order.
    pub fn rebuild(&mut self, ids: Vec<RecordId>) {
        self.positions = ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();
        self.order = ids;
    }

    /// Display position of `id`, if visible.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Id shown at display position `pos`.
    pub fn id_at(&self, pos: usize) -> Option<RecordId> {
        self.order.get(pos).copied()
    }

    /// Whether `id` is visible.
    pub fn contains(&self, id: RecordId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Visible ids in display order.
    pub fn ids(&self) -> &[RecordId] {
        &self.order
    }

    /// Iterate visible ids in display order.
    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.order.iter().copied()
    }

    /// Number of visible rows.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no rows are visible.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// First id in display order for which `skip` is false.
    pub fn first_where<F>(&self, skip: F) -> Option<RecordId>
    where
        F: Fn(RecordId) -> bool,
    {
        self.iter().find(|&id| !skip(id))
    }

    /// Walk from `id` in `direction`, returning the first row for which
    /// `skip` is false. `None` if `id` is not visible or the walk runs off
    /// the end.
    pub fn sibling<F>(&self, id: RecordId, direction: Direction, skip: F) -> Option<RecordId>
    where
        F: Fn(RecordId) -> bool,
    {
        let start = self.position(id)?;
        match direction {
            Direction::Next => self.order[start + 1..].iter().copied().find(|&id| !skip(id)),
            Direction::Previous => self.order[..start].iter().rev().copied().find(|&id| !skip(id)),
        }
    }

    /// Ids in the closed position range between `a` and `b`, in ascending
    /// display position. `None` if either is not visible.
    pub fn range_between(&self, a: RecordId, b: RecordId) -> Option<&[RecordId]> {
        let pa = self.position(a)?;
        let pb = self.position(b)?;
        let (lo, hi) = if pa <= pb { (pa, pb) } else { (pb, pa) };
        Some(&self.order[lo..=hi])
    }
}

/// Parse an id the way a lenient UI layer would: surrounding whitespace is
/// ignored and a leading integer is taken even if text follows it.
///
/// Returns `None` when no digits lead the text.
pub fn parse_id(text: &str) -> Option<RecordId> {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    digits[..end].parse::<RecordId>().ok().map(|n| sign * n)
}

//! The list capability a table is composed with.
//!
//! A [`ListSource`] owns the record set and decides which records are
//! visible and in what order. The table never inherits from it; it holds one
//! and asks it to add, change, remove, sort and filter.
//!
//! [`MemoryList`] is the in-memory implementation. It keeps records in
//! insertion order and maintains a visible-row mapping rebuilt from the
//! active filter and sort, leaving the underlying record set untouched.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tablekit_core::logging::targets;

use crate::record::{Record, RecordId};

/// Predicate deciding whether a record is visible.
pub type FilterFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Sort direction of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
    /// Not sorted; insertion order.
    #[default]
    None,
}

impl SortOrder {
    /// Next order when the column header is clicked.
    ///
    /// An unsorted or descending column becomes ascending; an ascending one
    /// becomes descending.
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc | Self::None => Self::Asc,
        }
    }

    /// Lowercase name (`asc`, `desc`, `none`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::None => "none",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            "none" | "" => Ok(Self::None),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// The active sort of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column being sorted.
    pub column: String,
    /// Direction.
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    /// Create a sort spec.
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }
}

/// Operations the table needs from a list implementation.
pub trait ListSource: Send {
    /// Append records. A record whose id already exists replaces the
    /// existing values instead.
    fn add(&mut self, records: Vec<Record>);

    /// Merge new values into existing records. Unknown ids are ignored.
    /// Returns how many records were updated.
    fn change(&mut self, records: &[Record]) -> usize;

    /// Remove one record. Returns `false` if it did not exist.
    fn remove(&mut self, id: RecordId) -> bool;

    /// Remove every record.
    fn remove_all(&mut self);

    /// Sort visible rows by `column`. [`SortOrder::None`] clears the sort.
    fn sort(&mut self, column: &str, order: SortOrder);

    /// Set or clear the visibility predicate.
    fn filter(&mut self, predicate: Option<FilterFn>);

    /// Ids of visible records in display order.
    fn visible_ids(&self) -> Vec<RecordId>;

    /// Look up a record by id, visible or not.
    fn get(&self, id: RecordId) -> Option<&Record>;

    /// Ids of all records in insertion order.
    fn all_ids(&self) -> Vec<RecordId>;

    /// Whether a record with `id` exists.
    fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Number of records, visible or not.
    fn len(&self) -> usize;

    /// Whether there are no records at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory list with filter and sort.
pub struct MemoryList {
    /// Records in insertion order.
    records: Vec<Record>,
    /// Record id to position in `records`.
    positions: HashMap<RecordId, usize>,
    /// Positions in `records` of the visible rows, in display order.
    visible: Vec<usize>,
    sort: Option<SortSpec>,
    filter: Option<FilterFn>,
}

impl Default for MemoryList {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            positions: HashMap::new(),
            visible: Vec::new(),
            sort: None,
            filter: None,
        }
    }

    /// Create a list holding `records`.
    pub fn with_records(records: Vec<Record>) -> Self {
        let mut list = Self::new();
        list.add(records);
        list
    }

    /// The active sort, if any.
    pub fn current_sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Whether a filter predicate is set.
    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    fn reindex(&mut self) {
        self.positions = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.id(), pos))
            .collect();
    }

    /// Rebuilds the visible mapping from the filter and sort.
    fn rebuild_mapping(&mut self) {
        let mut visible: Vec<usize> = (0..self.records.len())
            .filter(|&pos| match &self.filter {
                Some(filter) => filter(&self.records[pos]),
                None => true,
            })
            .collect();

        if let Some(sort) = &self.sort {
            let column = sort.column.as_str();
            let descending = sort.order == SortOrder::Desc;
            visible.sort_by(|&a, &b| {
                let cmp = compare_column(&self.records[a], &self.records[b], column);
                if descending { cmp.reverse() } else { cmp }
            });
        }

        tracing::trace!(
            target: targets::LIST,
            total = self.records.len(),
            visible = visible.len(),
            "rebuilt visible rows"
        );
        self.visible = visible;
    }
}

/// Compares two records on one column; missing values sort as null.
fn compare_column(a: &Record, b: &Record, column: &str) -> Ordering {
    let null = crate::record::Value::Null;
    let va = a.get(column).unwrap_or(&null);
    let vb = b.get(column).unwrap_or(&null);
    va.sort_cmp(vb)
}

impl ListSource for MemoryList {
    fn add(&mut self, records: Vec<Record>) {
        for record in records {
            match self.positions.get(&record.id()) {
                Some(&pos) => self.records[pos].merge(&record),
                None => {
                    self.positions.insert(record.id(), self.records.len());
                    self.records.push(record);
                }
            }
        }
        self.rebuild_mapping();
    }

    fn change(&mut self, records: &[Record]) -> usize {
        let mut updated = 0;
        for record in records {
            if let Some(&pos) = self.positions.get(&record.id()) {
                self.records[pos].merge(record);
                updated += 1;
            }
        }
        if updated > 0 {
            self.rebuild_mapping();
        }
        updated
    }

    fn remove(&mut self, id: RecordId) -> bool {
        let Some(pos) = self.positions.remove(&id) else {
            return false;
        };
        self.records.remove(pos);
        self.reindex();
        self.rebuild_mapping();
        true
    }

    fn remove_all(&mut self) {
        self.records.clear();
        self.positions.clear();
        self.visible.clear();
    }

    fn sort(&mut self, column: &str, order: SortOrder) {
        self.sort = match order {
            SortOrder::None => None,
            order => Some(SortSpec::new(column, order)),
        };
        self.rebuild_mapping();
    }

    fn filter(&mut self, predicate: Option<FilterFn>) {
        self.filter = predicate;
        self.rebuild_mapping();
    }

    fn visible_ids(&self) -> Vec<RecordId> {
        self.visible
            .iter()
            .map(|&pos| self.records[pos].id())
            .collect()
    }

    fn get(&self, id: RecordId) -> Option<&Record> {
        self.positions.get(&id).map(|&pos| &self.records[pos])
    }

    fn all_ids(&self) -> Vec<RecordId> {
        self.records.iter().map(Record::id).collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

//! The interactive table model.
//!
//! [`Table`] composes a [`ListSource`] with the row index, the selection
//! tracker, the filter compiler and a debouncer, and publishes what happens
//! on its own [`EventBus`].
//!
//! # Re-entrancy
//!
//! All methods take `&self`. Mutable state lives behind one mutex that is
//! always released before a subscriber runs, so handlers may call straight
//! back into the table. Every mutation, including rank renumbering, is
//! complete before the corresponding event goes out.
//!
//! # Events
//!
//! | Name | Payload | When |
//! |------|---------|------|
//! | `select` | `Ids` or `Selection` | selection changed, through the debouncer |
//! | `sortComplete` | `Ids` | the list finished a sort pass |
//! | `table_sort` | `Ids` | relayed from `sortComplete` |
//! | `filterComplete` | `Ids` | the list finished a filter pass |
//! | `table_filter` | `Ids` | relayed from `filterComplete` when the filter succeeded |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use tablekit::{EventPayload, Record, Table, TableConfig};
//!
//! let table = Table::with_records(
//!     TableConfig::new(["id", "n_spikes"]),
//!     vec![
//!         Record::new(0).with("n_spikes", 10),
//!         Record::new(1).with("n_spikes", 20),
//!         Record::new(2).with("n_spikes", 30),
//!     ],
//! )
//! .unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = seen.clone();
//! table.on_event("select", move |payload| seen_clone.lock().push(payload.clone()));
//!
//! table.select(&[2, 0]);
//! assert_eq!(table.selected(), vec![2, 0]);
//! assert_eq!(*seen.lock(), vec![EventPayload::Ids(vec![2, 0])]);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tablekit_core::logging::targets;
use tablekit_core::{BusyHandle, ConnectionId, DebounceState, Debouncer, EventBus, PerfSpan};

use crate::config::TableConfig;
use crate::error::Result;
use crate::events::{ClickTarget, EventPayload, Key, ListEvent, Modifiers, Request, names};
use crate::filter::{self, CompiledFilter};
use crate::list_source::{FilterFn, ListSource, MemoryList, SortOrder, SortSpec};
use crate::navigation::Navigator;
use crate::record::{Record, RecordId};
use crate::row_index::{Direction, RowIndex};
use crate::selection::{ColorScheme, RowMarker, SelectionTracker};

/// Class tag added to masked rows.
pub const MASKED_CLASS: &str = "masked";

struct TableState<L> {
    list: L,
    rows: RowIndex,
    selection: SelectionTracker,
    debouncer: Debouncer<EventPayload>,
    sort: Option<SortSpec>,
    filter: Option<CompiledFilter>,
}

impl<L: ListSource> TableState<L> {
    fn is_masked(&self, id: RecordId) -> bool {
        self.list.get(id).is_some_and(Record::is_masked)
    }

    fn navigator(&self) -> Navigator<'_, impl Fn(RecordId) -> bool + '_> {
        let list = &self.list;
        Navigator::new(&self.rows, &self.selection, move |id| {
            list.get(id).is_some_and(Record::is_masked)
        })
    }

    fn selection_payload(&self, with_next: bool) -> EventPayload {
        let selected = self.selection.selected();
        if with_next {
            let next = self.navigator().after_selection();
            EventPayload::Selection { selected, next }
        } else {
            EventPayload::Ids(selected)
        }
    }

    fn discard_pending(&mut self) {
        if self.debouncer.cancel().is_some() {
            tracing::debug!(target: targets::SELECTION, "held select dropped with its selection");
        }
    }

    /// Re-derive rows from the list and drop selected ids that no longer exist.
    fn refresh(&mut self) {
        self.rows.rebuild(self.list.visible_ids());
        let Self {
            list, selection, ..
        } = self;
        let dropped = selection.retain(|id| list.contains(id));
        if dropped > 0 {
            tracing::debug!(target: targets::SELECTION, dropped, "pruned removed ids from selection");
        }
    }
}

/// An interactive table over a [`ListSource`].
pub struct Table<L: ListSource = MemoryList> {
    state: Mutex<TableState<L>>,
    bus: Arc<EventBus<EventPayload>>,
    config: TableConfig,
    filter_succeeded: Arc<AtomicBool>,
}

impl Table<MemoryList> {
    /// Create a table over an in-memory list holding `records`.
    pub fn with_records(config: TableConfig, records: Vec<Record>) -> Result<Self> {
        Self::new(MemoryList::with_records(records), config)
    }

    /// Create a table from a JSON array of record objects.
    pub fn from_json(config: TableConfig, records: &serde_json::Value) -> Result<Self> {
        let records = Record::many_from_json(records, &config.id_column)?;
        Self::with_records(config, records)
    }
}

impl<L: ListSource> Table<L> {
    /// Create a table over `list`.
    pub fn new(mut list: L, config: TableConfig) -> Result<Self> {
        config.validate()?;

        let sort = config
            .initial_sort
            .clone()
            .filter(|sort| sort.order != SortOrder::None);
        if let Some(sort) = &sort {
            list.sort(&sort.column, sort.order);
        }

        let colors = ColorScheme {
            offset: config.color_offset,
            palette_size: config.palette_size,
        };
        let bus = Arc::new(EventBus::new());
        let filter_succeeded = Arc::new(AtomicBool::new(true));
        install_completion_hooks(&bus, &filter_succeeded);

        tracing::debug!(
            target: targets::TABLE,
            records = list.len(),
            columns = config.columns.len(),
            "table created"
        );

        Ok(Self {
            state: Mutex::new(TableState {
                rows: RowIndex::from_ids(list.visible_ids()),
                list,
                selection: SelectionTracker::new(colors),
                debouncer: Debouncer::new(config.debounce_config()),
                sort,
                filter: None,
            }),
            bus,
            config,
            filter_succeeded,
        })
    }

    /// The table configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The table's event bus.
    pub fn bus(&self) -> &Arc<EventBus<EventPayload>> {
        &self.bus
    }

    /// Subscribe to a table event.
    pub fn on_event<F>(&self, name: &str, callback: F) -> ConnectionId
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.bus.on_event(name, callback)
    }

    /// Remove a subscriber.
    pub fn off(&self, name: &str, id: ConnectionId) -> bool {
        self.bus.off(name, id)
    }

    fn emit(&self, name: &str, payload: EventPayload) {
        tracing::trace!(target: targets::TABLE, event = name, "emitting");
        self.bus.emit(name, payload);
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Replace the selection with `ids`, in order. Ids without a visible row
    /// and duplicates are skipped.
    pub fn select(&self, ids: &[RecordId]) {
        let mut state = self.state.lock();
        let known: Vec<RecordId> = ids
            .iter()
            .copied()
            .filter(|&id| state.rows.contains(id))
            .collect();
        state.selection.replace(known);
        tracing::debug!(
            target: targets::SELECTION,
            requested = ids.len(),
            selected = state.selection.len(),
            "select"
        );
        self.submit_selection(state);
    }

    /// Flip the membership of `id`. No-op if `id` has no visible row.
    pub fn select_toggle(&self, id: RecordId) {
        let mut state = self.state.lock();
        if !state.rows.contains(id) {
            tracing::trace!(target: targets::SELECTION, id, "toggle ignored, no such row");
            return;
        }
        let now_selected = state.selection.toggle(id);
        tracing::debug!(target: targets::SELECTION, id, now_selected, "select toggle");
        self.submit_selection(state);
    }

    /// Toggle an id given as text, as it arrives from the host.
    pub fn select_toggle_raw(&self, text: &str) {
        match crate::row_index::parse_id(text) {
            Some(id) => self.select_toggle(id),
            None => tracing::trace!(target: targets::SELECTION, text, "toggle ignored, not an id"),
        }
    }

    /// Extend a single selected row to `id`.
    ///
    /// Only acts when exactly one row is selected. Every row between that
    /// anchor and `id` joins the selection in ascending display order.
    pub fn select_until(&self, id: RecordId) {
        let mut state = self.state.lock();
        if state.selection.len() != 1 {
            tracing::debug!(
                target: targets::SELECTION,
                selected = state.selection.len(),
                "range select needs exactly one selected row"
            );
            return;
        }
        let Some(anchor) = state.selection.first() else {
            return;
        };
        let Some(range) = state.rows.range_between(anchor, id).map(<[RecordId]>::to_vec) else {
            tracing::trace!(target: targets::SELECTION, anchor, id, "range select ignored, row not visible");
            return;
        };
        for member in range {
            state.selection.insert(member);
        }
        tracing::debug!(target: targets::SELECTION, anchor, id, selected = state.selection.len(), "select until");
        self.submit_selection(state);
    }

    /// Clear the selection. Nothing is emitted.
    pub fn clear(&self) {
        self.state.lock().selection.clear();
        tracing::debug!(target: targets::SELECTION, "selection cleared");
    }

    /// Selected ids in rank order.
    pub fn selected(&self) -> Vec<RecordId> {
        self.state.lock().selection.selected()
    }

    /// Select the first unmasked row.
    pub fn select_first(&self) {
        let first = self.state.lock().navigator().first();
        if let Some(id) = first {
            self.select(&[id]);
        }
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: RecordId) -> bool {
        self.state.lock().selection.is_selected(id)
    }

    /// Selection rank of `id`.
    pub fn rank(&self, id: RecordId) -> Option<usize> {
        self.state.lock().selection.rank(id)
    }

    /// Number of selected ids.
    pub fn selection_len(&self) -> usize {
        self.state.lock().selection.len()
    }

    /// Selection marker of `id`, if selected.
    pub fn marker(&self, id: RecordId) -> Option<RowMarker> {
        self.state.lock().selection.marker(id)
    }

    /// Class tags for the row of `id`.
    pub fn row_classes(&self, id: RecordId) -> Vec<String> {
        let state = self.state.lock();
        let mut classes = state
            .selection
            .marker(id)
            .map(|marker| marker.classes())
            .unwrap_or_default();
        if state.is_masked(id) {
            classes.push(MASKED_CLASS.to_owned());
        }
        classes
    }

    fn submit_selection(&self, mut state: MutexGuard<'_, TableState<L>>) {
        let payload = state.selection_payload(self.config.emit_next_with_select);
        let due = state.debouncer.submit(payload, Instant::now());
        drop(state);
        if let Some(payload) = due {
            self.emit(names::SELECT, payload);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Sibling of `start` (default: the first selected id) in `direction`,
    /// skipping masked rows.
    pub fn sibling_id(&self, start: Option<RecordId>, direction: Direction) -> Option<RecordId> {
        self.state.lock().navigator().sibling(start, direction)
    }

    /// Move the selection to a sibling.
    ///
    /// With nothing selected the first unmasked row is selected instead.
    /// Returns the newly selected id, or `None` if nothing changed.
    pub fn move_to_sibling(&self, start: Option<RecordId>, direction: Direction) -> Option<RecordId> {
        let target = self.state.lock().navigator().move_target(start, direction);
        match target {
            Some(id) => self.select(&[id]),
            None => tracing::trace!(target: targets::TABLE, %direction, "no sibling to move to"),
        }
        target
    }

    /// The selection and the row that should be selected after it.
    pub fn selected_and_next(&self) -> (Vec<RecordId>, Option<RecordId>) {
        let state = self.state.lock();
        (state.selection.selected(), state.navigator().after_selection())
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Add records, re-applying the active sort.
    pub fn add(&self, records: Vec<Record>) {
        let count = records.len();
        let mut state = self.state.lock();
        state.list.add(records);
        tracing::debug!(target: targets::TABLE, count, "records added");
        self.resort_and_finish(state);
    }

    /// Add records from a JSON array of objects.
    pub fn add_json(&self, records: &serde_json::Value) -> Result<usize> {
        let records = Record::many_from_json(records, &self.config.id_column)?;
        let count = records.len();
        self.add(records);
        Ok(count)
    }

    /// Merge new values into existing records. Returns how many matched.
    pub fn change(&self, records: &[Record]) -> usize {
        let mut state = self.state.lock();
        let updated = state.list.change(records);
        tracing::debug!(target: targets::TABLE, updated, "records changed");
        if updated == 0 {
            return 0;
        }
        self.resort_and_finish(state);
        updated
    }

    /// Remove one record and clear the selection.
    ///
    /// A held `select` is dropped along with the selection it carried.
    pub fn remove(&self, id: RecordId) -> bool {
        let mut state = self.state.lock();
        let removed = state.list.remove(id);
        if removed {
            state.selection.clear();
            state.discard_pending();
            state.refresh();
            tracing::debug!(target: targets::TABLE, id, "record removed");
        }
        removed
    }

    /// Remove every record and clear the selection.
    pub fn remove_all(&self) {
        let mut state = self.state.lock();
        state.list.remove_all();
        state.selection.clear();
        state.discard_pending();
        state.refresh();
        tracing::debug!(target: targets::TABLE, "all records removed");
    }

    /// Replace the whole record set.
    pub fn remove_all_and_add(&self, records: Vec<Record>) {
        self.remove_all();
        self.add(records);
    }

    /// Copy of the record with `id`, visible or not.
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.state.lock().list.get(id).cloned()
    }

    /// Visible ids in display order.
    pub fn visible_ids(&self) -> Vec<RecordId> {
        self.state.lock().rows.ids().to_vec()
    }

    /// Id shown at display position `pos`.
    pub fn id_at(&self, pos: usize) -> Option<RecordId> {
        self.state.lock().rows.id_at(pos)
    }

    /// Number of records, visible or not.
    pub fn len(&self) -> usize {
        self.state.lock().list.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resort_and_finish(&self, mut state: MutexGuard<'_, TableState<L>>) {
        let resort = state.sort.clone();
        if let Some(sort) = &resort {
            state.list.sort(&sort.column, sort.order);
        }
        self.finish_pass(state, resort.map(|_| ListEvent::SortComplete));
    }

    fn finish_pass(&self, mut state: MutexGuard<'_, TableState<L>>, event: Option<ListEvent>) {
        state.refresh();
        let visible = state.rows.ids().to_vec();
        drop(state);
        if let Some(event) = event {
            self.emit(event.name(), EventPayload::Ids(visible));
        }
    }

    // =========================================================================
    // Sort and filter
    // =========================================================================

    /// Sort by `column`. [`SortOrder::None`] restores insertion order.
    /// Unknown columns are ignored.
    pub fn sort(&self, column: &str, order: SortOrder) {
        if !self.config.has_column(column) {
            tracing::debug!(target: targets::TABLE, column, "sort ignored, unknown column");
            return;
        }
        let _perf = PerfSpan::new("table_sort");
        let mut state = self.state.lock();
        state.list.sort(column, order);
        state.sort = match order {
            SortOrder::None => None,
            order => Some(SortSpec::new(column, order)),
        };
        tracing::debug!(target: targets::TABLE, column, %order, "sorted");
        self.finish_pass(state, Some(ListEvent::SortComplete));
    }

    /// Toggle the sort of `column` and return the order applied.
    ///
    /// A column that is not currently sorted, or sorted descending, becomes
    /// ascending; an ascending one becomes descending.
    pub fn sort_toggle(&self, column: &str) -> SortOrder {
        let order = match &self.state.lock().sort {
            Some(sort) if sort.column == column => sort.order.toggled(),
            _ => SortOrder::None.toggled(),
        };
        self.sort(column, order);
        order
    }

    /// The active sort.
    pub fn current_sort(&self) -> Option<SortSpec> {
        self.state.lock().sort.clone()
    }

    /// Recompile the filter from `text` and apply it.
    ///
    /// Blank text clears the filter. Text that does not parse leaves every
    /// row visible. A record the expression fails on stays visible. Returns
    /// whether the filter applied cleanly, which also decides whether
    /// `table_filter` is emitted.
    pub fn filter_text(&self, text: &str) -> bool {
        let _perf = PerfSpan::new("table_filter");
        let compiled = filter::compile(text, &self.config.columns);
        let mut state = self.state.lock();
        self.filter_succeeded.store(true, Ordering::SeqCst);

        match compiled {
            Ok(None) => {
                state.list.filter(None);
                state.filter = None;
                tracing::debug!(target: targets::FILTER, "filter cleared");
            }
            Ok(Some(compiled)) => {
                state.list.filter(Some(self.predicate(compiled.clone())));
                state.filter = Some(compiled);
                if !self.filter_succeeded() {
                    tracing::warn!(
                        target: targets::FILTER,
                        filter = text,
                        "filter failed on some records, keeping them visible"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(target: targets::FILTER, filter = text, %err, "invalid filter, showing all rows");
                self.filter_succeeded.store(false, Ordering::SeqCst);
                state.list.filter(None);
                state.filter = None;
            }
        }

        self.finish_pass(state, Some(ListEvent::FilterComplete));
        self.filter_succeeded()
    }

    /// Whether the last filter applied cleanly.
    pub fn filter_succeeded(&self) -> bool {
        self.filter_succeeded.load(Ordering::SeqCst)
    }

    /// Source text of the active filter.
    pub fn current_filter(&self) -> Option<String> {
        self.state
            .lock()
            .filter
            .as_ref()
            .map(|filter| filter.source().to_owned())
    }

    /// Fail-open predicate: evaluation errors keep the record visible and
    /// mark the filter as failed.
    fn predicate(&self, compiled: CompiledFilter) -> FilterFn {
        let succeeded = self.filter_succeeded.clone();
        Arc::new(move |record: &Record| match compiled.matches(record) {
            Ok(visible) => visible,
            Err(err) => {
                tracing::trace!(target: targets::FILTER, id = record.id(), %err, "filter failed on record");
                succeeded.store(false, Ordering::SeqCst);
                true
            }
        })
    }

    // =========================================================================
    // Debounced emission
    // =========================================================================

    /// Report the `select` consumer as busy or idle.
    pub fn set_busy(&self, busy: bool) {
        self.state.lock().debouncer.set_busy(busy);
    }

    /// Shared busy flag, for subscribers that report busy themselves.
    pub fn busy_handle(&self) -> BusyHandle {
        self.state.lock().debouncer.busy_handle()
    }

    /// Emit the held `select` if its poll is due and the consumer is free.
    /// Returns whether something was emitted.
    pub fn poll_pending(&self, now: Instant) -> bool {
        let due = self.state.lock().debouncer.poll(now);
        match due {
            Some(payload) => {
                self.emit(names::SELECT, payload);
                true
            }
            None => false,
        }
    }

    /// Time until the held `select` should be polled.
    pub fn time_until_next_poll(&self, now: Instant) -> Option<Duration> {
        self.state.lock().debouncer.time_until_next_poll(now)
    }

    /// Whether a `select` emission is held.
    pub fn is_waiting(&self) -> bool {
        self.state.lock().debouncer.is_waiting()
    }

    /// Debouncer state.
    pub fn debounce_state(&self) -> DebounceState {
        self.state.lock().debouncer.state()
    }

    /// Drop the held `select` emission.
    pub fn cancel_pending(&self) -> bool {
        self.state.lock().debouncer.cancel().is_some()
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Apply a request.
    pub fn dispatch(&self, request: Request) {
        tracing::trace!(target: targets::TABLE, ?request, "dispatch");
        match request {
            Request::Select(ids) => self.select(&ids),
            Request::SelectToggle(Some(id)) => self.select_toggle(id),
            Request::SelectUntil(Some(id)) => self.select_until(id),
            Request::SelectToggle(None) | Request::SelectUntil(None) => {
                tracing::trace!(target: targets::SELECTION, "request ignored, not an id");
            }
            Request::SortToggle(column) => {
                self.sort_toggle(&column);
            }
            Request::Filter(text) => {
                self.filter_text(&text);
            }
            Request::Move(direction) => {
                self.move_to_sibling(None, direction);
            }
            Request::SelectFirst => self.select_first(),
            Request::Clear => self.clear(),
        }
    }

    /// Apply a named inbound event. Returns `false` for names or payloads
    /// the table does not understand.
    pub fn dispatch_event(&self, name: &str, payload: &EventPayload) -> bool {
        match Request::from_event(name, payload) {
            Some(request) => {
                self.dispatch(request);
                true
            }
            None => {
                tracing::trace!(target: targets::TABLE, event = name, "inbound event ignored");
                false
            }
        }
    }

    /// Handle a click. Returns whether it was acted on.
    ///
    /// On a row: shift extends, control or meta toggles, otherwise the row
    /// becomes the only selection. On a header: toggles that column's sort.
    pub fn handle_click(&self, target: &ClickTarget, modifiers: Modifiers) -> bool {
        match target {
            ClickTarget::Row(pos) => {
                let Some(id) = self.id_at(*pos) else {
                    return false;
                };
                let request = if modifiers.shift {
                    Request::SelectUntil(Some(id))
                } else if modifiers.is_toggle() {
                    Request::SelectToggle(Some(id))
                } else {
                    Request::Select(vec![id])
                };
                self.dispatch(request);
                true
            }
            ClickTarget::Header(column) if self.config.has_column(column) => {
                self.dispatch(Request::SortToggle(column.clone()));
                true
            }
            ClickTarget::Header(_) | ClickTarget::Outside => false,
        }
    }

    /// Handle a navigation key.
    pub fn handle_key(&self, key: Key) {
        self.dispatch(Request::from_key(key));
    }

    /// Handle a change of the filter input.
    pub fn handle_filter_input(&self, text: &str) -> bool {
        self.filter_text(text)
    }
}

/// Relay list completion notifications to the outbound events.
///
/// The hooks hold the bus weakly; the bus owns them.
fn install_completion_hooks(bus: &Arc<EventBus<EventPayload>>, filter_succeeded: &Arc<AtomicBool>) {
    let weak = Arc::downgrade(bus);
    bus.on_event(names::SORT_COMPLETE, move |payload| {
        if let Some(bus) = weak.upgrade() {
            bus.emit(names::TABLE_SORT, payload.clone());
        }
    });

    let weak = Arc::downgrade(bus);
    let succeeded = filter_succeeded.clone();
    bus.on_event(names::FILTER_COMPLETE, move |payload| {
        if !succeeded.load(Ordering::SeqCst) {
            tracing::debug!(target: targets::FILTER, "filter failed, table_filter suppressed");
            return;
        }
        if let Some(bus) = weak.upgrade() {
            bus.emit(names::TABLE_FILTER, payload.clone());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::with_records(
            TableConfig::new(["id", "n_spikes", "quality"]),
            vec![
                Record::new(0).with("n_spikes", 10).with("quality", 1.0),
                Record::new(1).with("n_spikes", 20).with("quality", 0.9),
                Record::new(2).with("n_spikes", 30).with("quality", 0.8),
                Record::new(3).with("n_spikes", 40).with("quality", 0.7),
            ],
        )
        .unwrap()
    }

    fn record_events(table: &Table, name: &str) -> Arc<Mutex<Vec<EventPayload>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        table.on_event(name, move |payload| log_clone.lock().push(payload.clone()));
        log
    }

    #[test]
    fn test_select_skips_unknown_ids() {
        let table = sample();
        table.select(&[3, 42, 1, 3]);
        assert_eq!(table.selected(), vec![3, 1]);
    }

    #[test]
    fn test_select_toggle_renumbers() {
        let table = sample();
        let events = record_events(&table, names::SELECT);
        table.select(&[1, 2, 3]);
        table.select_toggle(2);

        assert_eq!(table.selected(), vec![1, 3]);
        assert_eq!(table.rank(1), Some(0));
        assert_eq!(table.rank(3), Some(1));
        assert_eq!(events.lock().len(), 2);
    }

    #[test]
    fn test_toggle_invalid_is_silent() {
        let table = sample();
        let events = record_events(&table, names::SELECT);
        table.select_toggle(99);
        table.select_toggle_raw("abc");
        assert!(events.lock().is_empty());

        table.select_toggle_raw("2");
        assert_eq!(table.selected(), vec![2]);
    }

    #[test]
    fn test_select_until_from_anchor() {
        let table = sample();
        table.select(&[3]);
        table.select_until(1);
        assert_eq!(table.selected(), vec![3, 1, 2]);
    }

    #[test]
    fn test_select_until_needs_single_anchor() {
        let table = sample();
        let events = record_events(&table, names::SELECT);
        table.select_until(2);
        assert!(table.selected().is_empty());

        table.select(&[0, 1]);
        table.select_until(3);
        assert_eq!(table.selected(), vec![0, 1]);
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn test_clear_does_not_emit() {
        let table = sample();
        table.select(&[1]);
        let events = record_events(&table, names::SELECT);
        table.clear();
        assert!(table.selected().is_empty());
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_markers_follow_ranks() {
        let table = Table::with_records(
            TableConfig::new(["id"]).with_color_offset(2),
            vec![Record::new(0), Record::new(1).with("is_masked", true)],
        )
        .unwrap();
        table.select(&[1, 0]);
        assert_eq!(table.row_classes(0), vec!["selected", "selected-1", "color-3"]);
        assert_eq!(
            table.row_classes(1),
            vec!["selected", "selected-0", "color-2", "masked"]
        );
        table.clear();
        assert!(table.row_classes(0).is_empty());
    }

    #[test]
    fn test_sort_toggle_cycle() {
        let table = sample();
        let sorts = record_events(&table, names::TABLE_SORT);

        assert_eq!(table.sort_toggle("quality"), SortOrder::Asc);
        assert_eq!(table.visible_ids(), vec![3, 2, 1, 0]);
        assert_eq!(table.sort_toggle("quality"), SortOrder::Desc);
        assert_eq!(table.visible_ids(), vec![0, 1, 2, 3]);
        assert_eq!(table.sort_toggle("n_spikes"), SortOrder::Asc);

        assert_eq!(sorts.lock().len(), 3);
        assert_eq!(sorts.lock()[0], EventPayload::Ids(vec![3, 2, 1, 0]));
    }

    #[test]
    fn test_sort_unknown_column_ignored() {
        let table = sample();
        let sorts = record_events(&table, names::TABLE_SORT);
        table.sort("bogus", SortOrder::Asc);
        assert!(table.current_sort().is_none());
        assert!(sorts.lock().is_empty());
    }

    #[test]
    fn test_add_reapplies_sort() {
        let table = sample();
        table.sort("n_spikes", SortOrder::Desc);
        let sorts = record_events(&table, names::TABLE_SORT);

        table.add(vec![Record::new(4).with("n_spikes", 25)]);
        assert_eq!(table.visible_ids(), vec![3, 2, 4, 1, 0]);
        assert_eq!(sorts.lock().len(), 1);
    }

    #[test]
    fn test_change_keeps_selection() {
        let table = sample();
        table.sort("n_spikes", SortOrder::Asc);
        table.select(&[0]);
        assert_eq!(table.change(&[Record::new(0).with("n_spikes", 99)]), 1);
        assert_eq!(table.visible_ids(), vec![1, 2, 3, 0]);
        assert_eq!(table.selected(), vec![0]);
        assert_eq!(table.change(&[Record::new(77)]), 0);
    }

    #[test]
    fn test_remove_clears_selection() {
        let table = sample();
        table.select(&[1, 2]);
        assert!(table.remove(1));
        assert!(table.selected().is_empty());
        assert!(!table.remove(1));
        assert_eq!(table.len(), 3);

        table.select(&[0]);
        table.remove_all();
        assert!(table.selected().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_drops_held_select() {
        let table = sample();
        let events = record_events(&table, names::SELECT);

        table.set_busy(true);
        table.select(&[1]);
        assert!(table.is_waiting());
        assert!(table.remove(1));
        assert!(!table.is_waiting());

        table.set_busy(false);
        assert!(!table.poll_pending(Instant::now() + Duration::from_secs(1)));
        assert!(events.lock().is_empty());

        table.set_busy(true);
        table.select(&[2]);
        table.remove_all();
        table.set_busy(false);
        assert!(!table.poll_pending(Instant::now() + Duration::from_secs(1)));
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_deeply_nested_filter_fails_open() {
        let table = sample();
        let filtered = record_events(&table, names::TABLE_FILTER);
        table.filter_text("id < 2");

        let nested = format!("{}id == 1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(!table.filter_text(&nested));
        assert_eq!(table.visible_ids(), vec![0, 1, 2, 3]);
        assert!(table.current_filter().is_none());
        assert_eq!(filtered.lock().len(), 1);

        let chain = vec!["n_spikes == 20"; 5_000].join(" || ");
        assert!(table.filter_text(&chain));
        assert_eq!(table.visible_ids(), vec![1]);
    }

    #[test]
    fn test_filter_success_emits() {
        let table = sample();
        let filtered = record_events(&table, names::TABLE_FILTER);

        assert!(table.filter_text("n_spikes >= 20 && quality > 0.75"));
        assert_eq!(table.visible_ids(), vec![1, 2]);
        assert_eq!(table.current_filter().as_deref(), Some("n_spikes >= 20 && quality > 0.75"));
        assert_eq!(*filtered.lock(), vec![EventPayload::Ids(vec![1, 2])]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_filter_unknown_column_fails_open() {
        let table = sample();
        let filtered = record_events(&table, names::TABLE_FILTER);
        let completed = record_events(&table, names::FILTER_COMPLETE);

        assert!(!table.filter_text("bogus > 1"));
        assert_eq!(table.visible_ids(), vec![0, 1, 2, 3]);
        assert!(filtered.lock().is_empty());
        assert_eq!(completed.lock().len(), 1);
    }

    #[test]
    fn test_filter_parse_error_shows_all() {
        let table = sample();
        table.filter_text("n_spikes > 20");
        assert_eq!(table.visible_ids(), vec![2, 3]);

        assert!(!table.filter_text("n_spikes >"));
        assert_eq!(table.visible_ids(), vec![0, 1, 2, 3]);
        assert!(table.current_filter().is_none());

        assert!(table.filter_text(""));
        assert!(table.filter_succeeded());
    }

    #[test]
    fn test_select_hidden_row_ignored() {
        let table = sample();
        table.filter_text("id < 2");
        table.select(&[3, 0]);
        assert_eq!(table.selected(), vec![0]);
    }

    #[test]
    fn test_handle_click() {
        let table = sample();
        assert!(table.handle_click(&ClickTarget::Row(1), Modifiers::NONE));
        assert!(table.handle_click(&ClickTarget::Row(3), Modifiers::CTRL));
        assert_eq!(table.selected(), vec![1, 3]);

        assert!(table.handle_click(&ClickTarget::Row(0), Modifiers::NONE));
        assert!(table.handle_click(&ClickTarget::Row(2), Modifiers::SHIFT));
        assert_eq!(table.selected(), vec![0, 1, 2]);

        assert!(table.handle_click(&ClickTarget::Header("quality".into()), Modifiers::NONE));
        assert_eq!(table.current_sort(), Some(SortSpec::new("quality", SortOrder::Asc)));

        assert!(!table.handle_click(&ClickTarget::Row(10), Modifiers::NONE));
        assert!(!table.handle_click(&ClickTarget::Header("nope".into()), Modifiers::NONE));
        assert!(!table.handle_click(&ClickTarget::Outside, Modifiers::NONE));
    }

    #[test]
    fn test_keys_navigate() {
        let table = sample();
        table.handle_key(Key::Down);
        assert_eq!(table.selected(), vec![0]);
        table.handle_key(Key::Down);
        assert_eq!(table.selected(), vec![1]);
        table.handle_key(Key::Up);
        assert_eq!(table.selected(), vec![0]);
        table.select(&[3]);
        table.handle_key(Key::Home);
        assert_eq!(table.selected(), vec![0]);
    }

    #[test]
    fn test_dispatch_event() {
        let table = sample();
        assert!(table.dispatch_event(names::SELECT, &EventPayload::Ids(vec![2])));
        assert!(table.dispatch_event(names::SELECT_TOGGLE, &EventPayload::Text("3".into())));
        assert_eq!(table.selected(), vec![2, 3]);
        assert!(table.dispatch_event(names::FILTER, &EventPayload::Text("id > 1".into())));
        assert_eq!(table.visible_ids(), vec![2, 3]);
        assert!(!table.dispatch_event("unknown", &EventPayload::Empty));
    }

    #[test]
    fn test_selection_payload_with_next() {
        let table = Table::with_records(
            TableConfig::new(["id"]).with_next_in_select(true),
            vec![Record::new(0), Record::new(1), Record::new(2)],
        )
        .unwrap();
        let events = record_events(&table, names::SELECT);
        table.select(&[1]);
        assert_eq!(
            *events.lock(),
            vec![EventPayload::Selection {
                selected: vec![1],
                next: Some(2),
            }]
        );
    }

    #[test]
    fn test_from_json_and_initial_sort() {
        let config = TableConfig::new(["id", "n_spikes"])
            .with_initial_sort(SortSpec::new("n_spikes", SortOrder::Desc));
        let table = Table::from_json(
            config,
            &serde_json::json!([
                {"id": 0, "n_spikes": 5},
                {"id": 1, "n_spikes": 50},
            ]),
        )
        .unwrap();
        assert_eq!(table.visible_ids(), vec![1, 0]);
        assert_eq!(table.add_json(&serde_json::json!([{"id": 2, "n_spikes": 20}])).unwrap(), 1);
        assert_eq!(table.visible_ids(), vec![1, 2, 0]);
        assert!(table.add_json(&serde_json::json!([{"n_spikes": 1}])).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Table::with_records(TableConfig::new(["n_spikes"]), Vec::new()).is_err());
    }
}

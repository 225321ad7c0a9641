//! tablekit: the model behind an interactive data table.
//!
//! This crate owns everything about a table that is not pixels: which
//! records are visible and in what order, which of them are selected and
//! with what rank, how the selection moves, and which notifications go out
//! when any of that changes.
//!
//! # Components
//!
//! - [`Record`] / [`Value`]: one data item and its cell values
//! - [`ListSource`]: the record store a table is composed with, with
//!   [`MemoryList`] as the in-memory implementation
//! - [`RowIndex`]: id to display position mapping
//! - [`SelectionTracker`]: ranked selection with dense renumbering
//! - [`Navigator`]: sibling navigation that skips masked rows
//! - [`filter`]: safe compiler for user-typed filter expressions
//! - [`Table`]: the composition, publishing on its own event bus
//!
//! # Quick start
//!
//! ```
//! use tablekit::{Direction, Record, Table, TableConfig};
//!
//! let table = Table::with_records(
//!     TableConfig::new(["id", "n_spikes"]),
//!     vec![
//!         Record::new(0).with("n_spikes", 10),
//!         Record::new(1).with("n_spikes", 20).with("is_masked", true),
//!         Record::new(2).with("n_spikes", 30),
//!     ],
//! )
//! .unwrap();
//!
//! table.select(&[0]);
//! assert_eq!(table.sibling_id(None, Direction::Next), Some(2));
//!
//! table.filter_text("n_spikes > 15");
//! assert_eq!(table.visible_ids(), vec![1, 2]);
//! ```
//!
//! # Feature flags
//!
//! - `tokio`: enables [`DebounceDriver`], a task that drives held `select`
//!   emissions.

mod config;
#[cfg(feature = "tokio")]
mod driver;
mod error;
pub mod events;
pub mod filter;
mod list_source;
mod navigation;
mod record;
mod row_index;
mod selection;
mod table;

pub use config::TableConfig;
#[cfg(feature = "tokio")]
pub use driver::DebounceDriver;
pub use error::{ConfigError, EvalError, FilterError, RecordError, Result, TableError};
pub use events::{ClickTarget, EventPayload, Key, ListEvent, Modifiers, Request};
pub use filter::CompiledFilter;
pub use list_source::{FilterFn, ListSource, MemoryList, SortOrder, SortSpec};
pub use navigation::Navigator;
pub use record::{DEFAULT_ID_COLUMN, MASKED_FIELD, META_FIELD, Record, RecordId, Value};
pub use row_index::{Direction, RowIndex, parse_id};
pub use selection::{ColorScheme, RowMarker, SelectionTracker};
pub use table::{MASKED_CLASS, Table};

pub use tablekit_core::{BusyHandle, ConnectionId, DebounceConfig, DebounceState, EventBus};

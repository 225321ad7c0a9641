//! Event names, payloads and inbound input types.
//!
//! Outbound notifications travel on the table's [`EventBus`](tablekit_core::EventBus)
//! as an [`EventPayload`] under one of the names in [`names`]. Inbound
//! requests from the host (clicks, key presses, or named events coming from
//! other views) are turned into a [`Request`] and handed to
//! [`Table::dispatch`](crate::Table::dispatch). Inbound requests are never
//! read off the outbound bus, so emitting `select` cannot feed back into
//! the table that emitted it.

use serde::{Deserialize, Serialize};

use crate::record::RecordId;
use crate::row_index::{Direction, parse_id};

/// Event names used on the bus and in inbound requests.
pub mod names {
    /// Selection changed (outbound) or replace the selection (inbound).
    pub const SELECT: &str = "select";
    /// Toggle one row.
    pub const SELECT_TOGGLE: &str = "select-toggle";
    /// Extend the selection to a row.
    pub const SELECT_UNTIL: &str = "select-until";
    /// Toggle the sort of a column.
    pub const SORT_TOGGLE: &str = "sort-toggle";
    /// Recompile the filter from text.
    pub const FILTER: &str = "filter";
    /// Visible ids after a sort.
    pub const TABLE_SORT: &str = "table_sort";
    /// Visible ids after a successful filter.
    pub const TABLE_FILTER: &str = "table_filter";
    /// The list finished a sort pass.
    pub const SORT_COMPLETE: &str = "sortComplete";
    /// The list finished a filter pass.
    pub const FILTER_COMPLETE: &str = "filterComplete";
}

/// Payload carried by every table event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    /// No data.
    #[default]
    Empty,
    /// Ordered record ids.
    Ids(Vec<RecordId>),
    /// The selection together with the row after it.
    Selection {
        selected: Vec<RecordId>,
        next: Option<RecordId>,
    },
    /// A single record id.
    Id(RecordId),
    /// Free text: a raw id, a column name or a filter expression.
    Text(String),
}

impl EventPayload {
    /// The ids carried by `Ids` or `Selection`.
    pub fn ids(&self) -> Option<&[RecordId]> {
        match self {
            Self::Ids(ids) | Self::Selection { selected: ids, .. } => Some(ids.as_slice()),
            _ => None,
        }
    }

    /// A single id, parsing text leniently.
    pub fn id(&self) -> Option<RecordId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Text(text) => parse_id(text),
            _ => None,
        }
    }

    /// The text of a `Text` payload.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Completion notification raised after a list pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListEvent {
    SortComplete,
    FilterComplete,
}

impl ListEvent {
    /// Bus name of the notification.
    pub fn name(self) -> &'static str {
        match self {
            Self::SortComplete => names::SORT_COMPLETE,
            Self::FilterComplete => names::FILTER_COMPLETE,
        }
    }
}

/// Modifier keys held during a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Modifiers {
    /// The Control key is held.
    pub control: bool,
    /// The Meta/Command key is held.
    pub meta: bool,
    /// The Shift key is held.
    pub shift: bool,
    /// The Alt key is held.
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        control: false,
        meta: false,
        shift: false,
        alt: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        control: true,
        meta: false,
        shift: false,
        alt: false,
    };

    /// Meta only.
    pub const META: Self = Self {
        control: false,
        meta: true,
        shift: false,
        alt: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        control: false,
        meta: false,
        shift: true,
        alt: false,
    };

    /// Whether the click should toggle rather than replace.
    pub fn is_toggle(&self) -> bool {
        self.control || self.meta
    }
}

/// What a click landed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// A data row, by display position.
    Row(usize),
    /// A column header.
    Header(String),
    /// Anywhere else.
    Outside,
}

/// Navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Down,
    Up,
    Home,
}

/// A request to change table state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Replace the selection.
    Select(Vec<RecordId>),
    /// Toggle one id. `None` for input that is not an id.
    SelectToggle(Option<RecordId>),
    /// Extend the selection to one id.
    SelectUntil(Option<RecordId>),
    /// Toggle the sort of a column.
    SortToggle(String),
    /// Recompile the filter.
    Filter(String),
    /// Move the selection to a sibling.
    Move(Direction),
    /// Select the first unmasked row.
    SelectFirst,
    /// Clear the selection.
    Clear,
}

impl Request {
    /// Interpret a named inbound event. Unknown names and payloads of the
    /// wrong shape yield `None`.
    pub fn from_event(name: &str, payload: &EventPayload) -> Option<Self> {
        match name {
            names::SELECT => payload.ids().map(|ids| Self::Select(ids.to_vec())),
            names::SELECT_TOGGLE => Some(Self::SelectToggle(payload.id())),
            names::SELECT_UNTIL => Some(Self::SelectUntil(payload.id())),
            names::SORT_TOGGLE => payload.text().map(|column| Self::SortToggle(column.to_owned())),
            names::FILTER => match payload {
                EventPayload::Empty => Some(Self::Filter(String::new())),
                other => other.text().map(|text| Self::Filter(text.to_owned())),
            },
            _ => None,
        }
    }

    /// Request for a key press.
    pub fn from_key(key: Key) -> Self {
        match key {
            Key::Down => Self::Move(Direction::Next),
            Key::Up => Self::Move(Direction::Previous),
            Key::Home => Self::SelectFirst,
        }
    }
}

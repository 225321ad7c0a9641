//! Table configuration.
//!
//! [`TableConfig`] can be built in code or loaded from a TOML or JSON
//! document:
//!
//! ```
//! use tablekit::TableConfig;
//!
//! let config = TableConfig::from_toml_str(r#"
//!     columns = ["id", "n_spikes", "quality"]
//!     poll_interval_ms = 25
//!     color_offset = 1
//! "#).unwrap();
//!
//! assert_eq!(config.columns.len(), 3);
//! assert_eq!(config.poll_interval_ms, 25);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tablekit_core::{ConfigError, DebounceConfig};

use crate::error::Result;
use crate::list_source::SortSpec;
use crate::record::DEFAULT_ID_COLUMN;

fn default_id_column() -> String {
    DEFAULT_ID_COLUMN.to_owned()
}

fn default_poll_interval_ms() -> u64 {
    DebounceConfig::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

/// Configuration for a [`Table`](crate::Table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Column names in display order. Also the names a filter expression
    /// may reference.
    pub columns: Vec<String>,

    /// Column holding the record id.
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// How often a held `select` emission re-checks the busy flag.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Emit a held `select` anyway after this long. Unset keeps waiting
    /// until the consumer is no longer busy.
    #[serde(default)]
    pub max_wait_ms: Option<u64>,

    /// Added to a row's selection rank to form its color index.
    #[serde(default)]
    pub color_offset: usize,

    /// Wrap color indices into this many colors.
    #[serde(default)]
    pub palette_size: Option<usize>,

    /// Emit `select` with the next sibling alongside the selection.
    #[serde(default)]
    pub emit_next_with_select: bool,

    /// Sort applied when the table is created.
    #[serde(default)]
    pub initial_sort: Option<SortSpec>,
}

impl TableConfig {
    /// Create a config with default settings for the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            id_column: default_id_column(),
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_ms: None,
            color_offset: 0,
            palette_size: None,
            emit_next_with_select: false,
            initial_sort: None,
        }
    }

    /// Load and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the starvation guard.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = Some(max_wait.as_millis() as u64);
        self
    }

    /// Set the color offset.
    pub fn with_color_offset(mut self, offset: usize) -> Self {
        self.color_offset = offset;
        self
    }

    /// Set the palette size.
    pub fn with_palette_size(mut self, size: usize) -> Self {
        self.palette_size = Some(size);
        self
    }

    /// Emit the next sibling alongside each `select`.
    pub fn with_next_in_select(mut self, enabled: bool) -> Self {
        self.emit_next_with_select = enabled;
        self
    }

    /// Sort applied at construction.
    pub fn with_initial_sort(mut self, sort: SortSpec) -> Self {
        self.initial_sort = Some(sort);
        self
    }

    /// Whether `name` is one of the configured columns.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Debouncer settings derived from this config.
    pub fn debounce_config(&self) -> DebounceConfig {
        DebounceConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_wait: self.max_wait_ms.map(Duration::from_millis),
        }
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::missing("columns"));
        }
        if !self.has_column(&self.id_column) {
            return Err(ConfigError::invalid_value(
                "id_column",
                format!("'{}' is not one of the columns", self.id_column),
            ));
        }
        if self.palette_size == Some(0) {
            return Err(ConfigError::invalid_value("palette_size", "must be greater than zero"));
        }
        if let Some(sort) = &self.initial_sort
            && !self.has_column(&sort.column)
        {
            return Err(ConfigError::invalid_value(
                "initial_sort",
                format!("unknown column '{}'", sort.column),
            ));
        }
        self.debounce_config().validate()
    }
}

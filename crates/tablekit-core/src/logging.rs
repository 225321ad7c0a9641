//! Logging facilities for tablekit.
//!
//! tablekit uses the `tracing` crate for instrumentation and never installs
//! a subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("tablekit=debug,tablekit_core=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "tablekit_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "tablekit_core::signal";
    /// Event bus target.
    pub const EVENT_BUS: &str = "tablekit_core::event_bus";
    /// Debouncer target.
    pub const DEBOUNCE: &str = "tablekit_core::debounce";
    /// Table model target.
    pub const TABLE: &str = "tablekit::table";
    /// Selection tracker target.
    pub const SELECTION: &str = "tablekit::selection";
    /// Filter compiler target.
    pub const FILTER: &str = "tablekit::filter";
    /// List source target.
    pub const LIST: &str = "tablekit::list";
    /// Performance spans.
    pub const PERF: &str = "tablekit::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing whole passes such as a filter or sort.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "tablekit::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

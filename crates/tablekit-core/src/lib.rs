//! Core systems for tablekit.
//!
//! This crate provides the runtime pieces the table model is built from.
//! None of them know anything about tables:
//!
//! - **Signal/Slot System**: Type-safe multi-subscriber notification
//! - **Event Bus**: Per-instance publish/subscribe keyed by event name
//! - **Debouncer**: Coalesces rapid submissions while a consumer is busy
//! - **Logging**: Tracing targets and performance spans
//!
//! # Signal Example
//!
//! ```
//! use tablekit_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Event Bus Example
//!
//! ```
//! use tablekit_core::EventBus;
//!
//! let bus = EventBus::<Vec<i64>>::new();
//! bus.on_event("select", |ids| println!("selected {:?}", ids));
//! bus.emit("select", vec![2, 0, 3]);
//! ```
//!
//! # Debounce Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use tablekit_core::{Debouncer, DebounceConfig};
//!
//! let mut debouncer = Debouncer::new(DebounceConfig::default());
//! let now = Instant::now();
//!
//! // Idle: the action is handed back for immediate execution.
//! assert_eq!(debouncer.submit("a", now), Some("a"));
//!
//! // Busy: actions are held, the latest one wins.
//! debouncer.set_busy(true);
//! assert_eq!(debouncer.submit("b", now), None);
//! assert_eq!(debouncer.submit("c", now), None);
//!
//! debouncer.set_busy(false);
//! let later = now + Duration::from_millis(50);
//! assert_eq!(debouncer.poll(later), Some("c"));
//! ```

mod debounce;
mod error;
pub mod event_bus;
pub mod logging;
pub mod signal;

pub use debounce::{BusyHandle, DebounceConfig, DebounceState, Debouncer};
pub use error::{ConfigError, Result};
pub use event_bus::EventBus;
pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};

//! Tokio task that drives debounced `select` emission.
//!
//! A table holds back `select` while its consumer reports busy and only
//! emits from [`Table::poll_pending`]. Hosts with their own event loop call
//! that themselves; hosts running on tokio can spawn a [`DebounceDriver`]
//! instead.
//!
//! ```no_run
//! # async fn run() {
//! use std::sync::Arc;
//! use tablekit::{DebounceDriver, Table, TableConfig};
//!
//! let table = Arc::new(Table::with_records(TableConfig::new(["id"]), Vec::new()).unwrap());
//! let driver = DebounceDriver::spawn(&table);
//!
//! table.set_busy(true);
//! table.select(&[]);
//! table.set_busy(false);
//! // The held `select` goes out on the next poll.
//!
//! driver.shutdown().await;
//! # }
//! ```

use std::sync::{Arc, Weak};
use std::time::Instant;

use tablekit_core::logging::targets;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::list_source::ListSource;
use crate::table::Table;

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct DebounceDriver {
    handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl DebounceDriver {
    /// Spawn the poll loop on the current tokio runtime.
    ///
    /// The loop holds the table weakly and ends when the table is dropped.
    pub fn spawn<L>(table: &Arc<Table<L>>) -> Self
    where
        L: ListSource + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(poll_loop(Arc::downgrade(table), shutdown_rx));
        tracing::debug!(target: targets::TABLE, "debounce driver started");
        Self {
            handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for DebounceDriver {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn poll_loop<L>(table: Weak<Table<L>>, mut shutdown_rx: oneshot::Receiver<()>)
where
    L: ListSource + 'static,
{
    loop {
        let wait = {
            let Some(table) = table.upgrade() else {
                break;
            };
            table
                .time_until_next_poll(Instant::now())
                .unwrap_or_else(|| table.config().debounce_config().poll_interval)
        };

        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = tokio::time::sleep(wait) => {}
        }

        let Some(table) = table.upgrade() else {
            break;
        };
        if table.poll_pending(Instant::now()) {
            tracing::trace!(target: targets::TABLE, "driver emitted held select");
        }
    }
    tracing::debug!(target: targets::TABLE, "debounce driver stopped");
}

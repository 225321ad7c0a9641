//! Busy-aware debouncing of deferred actions.
//!
//! A [`Debouncer`] sits between a producer that fires rapidly (selection
//! changes) and a consumer that can tell it is still busy with the previous
//! notification. While the consumer is busy, submitted actions are held and
//! each new submission replaces the held one. Once the consumer reports it is
//! no longer busy, the next poll hands back the latest action.
//!
//! The debouncer never runs anything itself. `submit` and `poll` return the
//! action that is due, and the caller executes it. That keeps execution out
//! of any lock the caller may be holding around the debouncer.
//!
//! # States
//!
//! - `Idle`: consumer not busy, nothing held
//! - `Busy`: consumer busy, nothing held
//! - `BusyAndWaiting`: an action is held and polling is scheduled
//!
//! # Starvation
//!
//! If the consumer never clears its busy flag, a held action waits forever.
//! This is a caller obligation. Set [`DebounceConfig::max_wait`] to fire the
//! held action anyway after a bounded delay.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{ConfigError, Result};
use crate::logging::targets;

/// Polling configuration for a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// How often the busy flag is re-checked while an action is held.
    pub poll_interval: Duration,
    /// Fire a held action after this long even if the consumer is still busy.
    ///
    /// `None` keeps the action held for as long as the consumer stays busy.
    pub max_wait: Option<Duration>,
}

impl DebounceConfig {
    /// Default polling interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Create a config with the given poll interval and no starvation guard.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            max_wait: None,
        }
    }

    /// Set the starvation guard.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Check that the configuration can drive a poll loop.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "poll_interval",
                "must be greater than zero",
            ));
        }
        if self.max_wait.is_some_and(|max| max < self.poll_interval) {
            return Err(ConfigError::invalid_value(
                "max_wait",
                "must not be shorter than the poll interval",
            ));
        }
        Ok(())
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::with_poll_interval(Self::DEFAULT_POLL_INTERVAL)
    }
}

/// Observable state of a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Consumer not busy and nothing held.
    Idle,
    /// Consumer busy, nothing held.
    Busy,
    /// An action is held until the consumer is no longer busy.
    BusyAndWaiting,
}

/// Shared busy flag.
///
/// Cloning yields another handle to the same flag, so an event subscriber can
/// report busy/idle without access to the debouncer itself.
#[derive(Debug, Clone, Default)]
pub struct BusyHandle(Arc<AtomicBool>);

impl BusyHandle {
    /// Create a handle in the not-busy state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the consumer as busy or idle.
    pub fn set(&self, busy: bool) {
        self.0.store(busy, Ordering::SeqCst);
    }

    /// Whether the consumer is currently busy.
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Holds at most one pending action while the consumer is busy.
pub struct Debouncer<A> {
    config: DebounceConfig,
    busy: BusyHandle,
    pending: Option<A>,
    /// When the busy flag is next re-checked. `Some` exactly while waiting.
    next_poll: Option<Instant>,
    /// When the current wait started.
    waiting_since: Option<Instant>,
    /// Actions replaced before they could run.
    superseded: u64,
}

impl<A> Debouncer<A> {
    /// Create a debouncer with its own busy flag.
    pub fn new(config: DebounceConfig) -> Self {
        Self::with_busy_handle(config, BusyHandle::new())
    }

    /// Create a debouncer sharing an existing busy flag.
    pub fn with_busy_handle(config: DebounceConfig, busy: BusyHandle) -> Self {
        Self {
            config,
            busy,
            pending: None,
            next_poll: None,
            waiting_since: None,
            superseded: 0,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// A handle to the busy flag.
    pub fn busy_handle(&self) -> BusyHandle {
        self.busy.clone()
    }

    /// Report the consumer as busy or idle.
    ///
    /// This never releases a held action by itself; the next due poll does.
    pub fn set_busy(&self, busy: bool) {
        tracing::debug!(target: targets::DEBOUNCE, busy, "busy flag changed");
        self.busy.set(busy);
    }

    /// Whether the consumer is currently busy.
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Whether an action is held and polling is scheduled.
    pub fn is_waiting(&self) -> bool {
        self.next_poll.is_some()
    }

    /// Current state.
    pub fn state(&self) -> DebounceState {
        if self.is_waiting() {
            DebounceState::BusyAndWaiting
        } else if self.is_busy() {
            DebounceState::Busy
        } else {
            DebounceState::Idle
        }
    }

    /// Number of held actions that were replaced by a newer submission.
    pub fn superseded_count(&self) -> u64 {
        self.superseded
    }

    /// Submit an action.
    ///
    /// Returns the action back when it should run now. Otherwise it is held,
    /// replacing any previously held action, and `None` is returned.
    pub fn submit(&mut self, action: A, now: Instant) -> Option<A> {
        if !self.is_busy() {
            if self.pending.take().is_some() {
                self.superseded += 1;
            }
            self.stop_waiting();
            return Some(action);
        }

        if self.pending.replace(action).is_some() {
            self.superseded += 1;
            tracing::trace!(target: targets::DEBOUNCE, "held action superseded");
        }
        if self.next_poll.is_none() {
            self.next_poll = Some(now + self.config.poll_interval);
            self.waiting_since = Some(now);
            tracing::debug!(target: targets::DEBOUNCE, "consumer busy, waiting");
        }
        None
    }

    /// Re-check the busy flag if a poll is due.
    ///
    /// Returns the held action once the consumer is no longer busy, or once
    /// `max_wait` has elapsed. Otherwise schedules the next poll.
    pub fn poll(&mut self, now: Instant) -> Option<A> {
        let due = self.next_poll?;
        if now < due {
            return None;
        }

        let starved = match (self.config.max_wait, self.waiting_since) {
            (Some(max_wait), Some(since)) => now.duration_since(since) >= max_wait,
            _ => false,
        };

        if !self.is_busy() || starved {
            if starved && self.is_busy() {
                tracing::warn!(target: targets::DEBOUNCE, "max wait elapsed, firing while busy");
            }
            self.stop_waiting();
            return self.pending.take();
        }

        self.next_poll = Some(now + self.config.poll_interval);
        None
    }

    /// Time until the next scheduled poll, if waiting.
    pub fn time_until_next_poll(&self, now: Instant) -> Option<Duration> {
        self.next_poll
            .map(|due| due.checked_duration_since(now).unwrap_or(Duration::ZERO))
    }

    /// Drop the held action and stop waiting.
    pub fn cancel(&mut self) -> Option<A> {
        self.stop_waiting();
        self.pending.take()
    }

    fn stop_waiting(&mut self) {
        self.next_poll = None;
        self.waiting_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_idle_submit_runs_immediately() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();

        assert_eq!(debouncer.state(), DebounceState::Idle);
        assert_eq!(debouncer.submit(1, now), Some(1));
        assert!(!debouncer.is_waiting());
        assert_eq!(debouncer.poll(now + ms(100)), None);
    }

    #[test]
    fn test_last_submission_wins() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();

        debouncer.set_busy(true);
        assert_eq!(debouncer.state(), DebounceState::Busy);
        assert_eq!(debouncer.submit("a", now), None);
        assert_eq!(debouncer.submit("b", now + ms(10)), None);
        assert_eq!(debouncer.state(), DebounceState::BusyAndWaiting);
        assert_eq!(debouncer.superseded_count(), 1);

        debouncer.set_busy(false);
        assert_eq!(debouncer.poll(now + ms(50)), Some("b"));
        assert_eq!(debouncer.poll(now + ms(100)), None);
        assert_eq!(debouncer.state(), DebounceState::Idle);
    }

    #[test]
    fn test_set_busy_does_not_execute() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();

        debouncer.set_busy(true);
        debouncer.submit(1, now);
        debouncer.set_busy(false);

        // Not due yet, even though no longer busy.
        assert_eq!(debouncer.poll(now + ms(20)), None);
        assert!(debouncer.is_waiting());
        assert_eq!(debouncer.poll(now + ms(50)), Some(1));
    }

    #[test]
    fn test_polling_reschedules_while_busy() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();

        debouncer.set_busy(true);
        debouncer.submit(1, now);

        assert_eq!(debouncer.poll(now + ms(50)), None);
        assert_eq!(debouncer.time_until_next_poll(now + ms(50)), Some(ms(50)));
        assert_eq!(debouncer.poll(now + ms(60)), None);

        debouncer.set_busy(false);
        assert_eq!(debouncer.poll(now + ms(100)), Some(1));
    }

    #[test]
    fn test_starvation_without_max_wait() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();

        debouncer.set_busy(true);
        debouncer.submit(1, now);
        for step in 1..100 {
            assert_eq!(debouncer.poll(now + ms(50 * step)), None);
        }
        assert!(debouncer.is_waiting());
    }

    #[test]
    fn test_max_wait_fires_while_busy() {
        let config = DebounceConfig::default().with_max_wait(ms(200));
        let mut debouncer = Debouncer::new(config);
        let now = Instant::now();

        debouncer.set_busy(true);
        debouncer.submit(1, now);
        assert_eq!(debouncer.poll(now + ms(150)), None);
        assert_eq!(debouncer.poll(now + ms(200)), Some(1));
        assert_eq!(debouncer.state(), DebounceState::Busy);
    }

    #[test]
    fn test_submit_after_busy_clears_drops_held_action() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();

        debouncer.set_busy(true);
        debouncer.submit("old", now);
        debouncer.set_busy(false);

        assert_eq!(debouncer.submit("new", now + ms(10)), Some("new"));
        assert!(!debouncer.is_waiting());
        assert_eq!(debouncer.poll(now + ms(60)), None);
    }

    #[test]
    fn test_shared_busy_handle() {
        let handle = BusyHandle::new();
        let mut debouncer = Debouncer::with_busy_handle(DebounceConfig::default(), handle.clone());
        let now = Instant::now();

        handle.set(true);
        assert!(debouncer.is_busy());
        assert_eq!(debouncer.submit(5, now), None);
        handle.set(false);
        assert_eq!(debouncer.poll(now + ms(50)), Some(5));
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();

        debouncer.set_busy(true);
        debouncer.submit(3, now);
        assert_eq!(debouncer.cancel(), Some(3));
        assert!(!debouncer.is_waiting());
        assert_eq!(debouncer.time_until_next_poll(now), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(DebounceConfig::default().validate().is_ok());
        assert!(DebounceConfig::with_poll_interval(Duration::ZERO).validate().is_err());
        assert!(
            DebounceConfig::with_poll_interval(ms(50))
                .with_max_wait(ms(10))
                .validate()
                .is_err()
        );
    }
}

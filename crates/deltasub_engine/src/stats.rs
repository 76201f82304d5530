//! Statistics-recording wrapper around a callback boundary.
//!
//! [`StatsCallbacks`] also owns the initial fetch timer: it is armed when the
//! subscription starts and disarmed by the first accepted or rejected update.

use crate::callbacks::{ConfigUpdateCallbacks, FailureReason};
use crate::error::SubscriptionError;
use crate::ttl::{SystemTimeSource, TimeSource};
use deltasub_protocol::Resource;
use std::time::{Duration, Instant};

/// Counters for one subscription.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionStats {
    /// Updates attempted, successful or not.
    pub update_attempt: u64,
    /// Updates accepted.
    pub update_success: u64,
    /// Updates rejected by validation.
    pub update_rejected: u64,
    /// Connection-level failures.
    pub update_failure: u64,
    /// Initial fetch timeouts.
    pub init_fetch_timeout: u64,
    /// Last non-empty response-wide version accepted.
    pub version_text: String,
    /// When the last update was accepted.
    pub last_update_time: Option<Instant>,
}

/// Counts updates and failures, then passes them to the wrapped callbacks.
///
/// Connection failures are counted but not forwarded: a new stream will
/// restate interest and the consumer has nothing to act on.
#[derive(Debug)]
pub struct StatsCallbacks<C, S: TimeSource = SystemTimeSource> {
    inner: C,
    stats: SubscriptionStats,
    time_source: S,
    init_fetch_deadline: Option<Instant>,
}

impl<C: ConfigUpdateCallbacks> StatsCallbacks<C, SystemTimeSource> {
    /// Wraps `inner`, timing on the system clock.
    pub fn new(inner: C) -> Self {
        Self::with_time_source(inner, SystemTimeSource)
    }
}

impl<C: ConfigUpdateCallbacks, S: TimeSource> StatsCallbacks<C, S> {
    /// Wraps `inner`, timing on the given clock.
    pub fn with_time_source(inner: C, time_source: S) -> Self {
        Self {
            inner,
            stats: SubscriptionStats::default(),
            time_source,
            init_fetch_deadline: None,
        }
    }

    /// Current counters.
    pub fn stats(&self) -> &SubscriptionStats {
        &self.stats
    }

    /// The wrapped callbacks.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The wrapped callbacks, mutably.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwraps the inner callbacks.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Arms the initial fetch timer. `None` leaves it disarmed.
    pub fn start_init_fetch_timer(&mut self, timeout: Option<Duration>) {
        self.init_fetch_deadline = timeout.and_then(|t| self.time_source.now().checked_add(t));
    }

    /// When the initial fetch times out, if the timer is armed.
    pub fn init_fetch_deadline(&self) -> Option<Instant> {
        self.init_fetch_deadline
    }

    /// Fires the initial fetch timeout if its deadline has passed.
    ///
    /// Reports [`FailureReason::FetchTimedOut`] at most once per arming and
    /// returns whether it fired.
    pub fn poll_init_fetch_timeout(&mut self) -> bool {
        match self.init_fetch_deadline {
            Some(deadline) if deadline <= self.time_source.now() => {
                self.on_config_update_failed(FailureReason::FetchTimedOut, None);
                true
            }
            _ => false,
        }
    }
}

impl<C: ConfigUpdateCallbacks, S: TimeSource> ConfigUpdateCallbacks for StatsCallbacks<C, S> {
    fn on_config_update(&mut self, added: &[Resource], removed: &[String], version: &str) {
        self.init_fetch_deadline = None;
        self.stats.update_attempt += 1;
        self.stats.update_success += 1;
        self.stats.last_update_time = Some(self.time_source.now());
        if !version.is_empty() {
            self.stats.version_text = version.to_string();
        }
        self.inner.on_config_update(added, removed, version);
    }

    fn on_config_update_failed(
        &mut self,
        reason: FailureReason,
        error: Option<&SubscriptionError>,
    ) {
        self.stats.update_attempt += 1;
        match reason {
            FailureReason::ConnectionFailure => {
                self.stats.update_failure += 1;
                return;
            }
            FailureReason::FetchTimedOut => self.stats.init_fetch_timeout += 1,
            FailureReason::UpdateRejected => self.stats.update_rejected += 1,
        }
        self.init_fetch_deadline = None;
        self.inner.on_config_update_failed(reason, error);
    }
}

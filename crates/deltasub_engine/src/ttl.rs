//! Time-to-live tracking for subscribed resources.
//!
//! The engine only talks to [`TtlScheduler`]. [`TtlManager`] is an in-memory
//! scheduler that keeps one deadline per name and exposes a single "next
//! deadline" for the owner's event loop to arm a timer against. When that
//! timer fires the owner calls
//! [`process_ttl_expiry`](crate::DeltaSubscriptionState::process_ttl_expiry).

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait TimeSource {
    /// Returns the current monotonic time.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    now: Arc<Mutex<Instant>>,
}

impl ManualTimeSource {
    /// Creates a clock starting at the current instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Schedules per-resource expiry.
///
/// Each name has at most one outstanding deadline. Between `begin_batch` and
/// the matching `end_batch` the scheduler may defer rescheduling its timer.
pub trait TtlScheduler {
    /// Starts or refreshes the deadline for `name`.
    fn add(&mut self, ttl: Duration, name: &str);

    /// Drops any deadline for `name`.
    fn clear(&mut self, name: &str);

    /// Enters batch mode.
    fn begin_batch(&mut self);

    /// Leaves batch mode and reschedules once if needed.
    fn end_batch(&mut self);

    /// Removes and returns every name whose deadline has passed.
    fn poll_expired(&mut self) -> Vec<String>;

    /// Returns the earliest outstanding deadline.
    fn next_deadline(&self) -> Option<Instant>;

    /// Enters batch mode until the returned guard is dropped.
    fn scoped_update(&mut self) -> ScopedTtlUpdate<'_, Self>
    where
        Self: Sized,
    {
        ScopedTtlUpdate::new(self)
    }
}

/// Keeps a scheduler in batch mode for the guard's lifetime.
pub struct ScopedTtlUpdate<'a, T: TtlScheduler + ?Sized> {
    ttl: &'a mut T,
}

impl<'a, T: TtlScheduler + ?Sized> ScopedTtlUpdate<'a, T> {
    /// Begins a batch on `ttl`.
    pub fn new(ttl: &'a mut T) -> Self {
        ttl.begin_batch();
        Self { ttl }
    }
}

impl<T: TtlScheduler + ?Sized> Deref for ScopedTtlUpdate<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.ttl
    }
}

impl<T: TtlScheduler + ?Sized> DerefMut for ScopedTtlUpdate<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.ttl
    }
}

impl<T: TtlScheduler + ?Sized> Drop for ScopedTtlUpdate<'_, T> {
    fn drop(&mut self) {
        self.ttl.end_batch();
    }
}

/// In-memory [`TtlScheduler`].
#[derive(Debug)]
pub struct TtlManager<S: TimeSource = SystemTimeSource> {
    time_source: S,
    deadlines: BTreeMap<String, Instant>,
    batch_depth: usize,
    next_deadline: Option<Instant>,
    reschedules: u64,
}

impl TtlManager<SystemTimeSource> {
    /// Creates a manager on the system clock.
    pub fn new() -> Self {
        Self::with_time_source(SystemTimeSource)
    }
}

impl Default for TtlManager<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> TtlManager<S> {
    /// Creates a manager on the given clock.
    pub fn with_time_source(time_source: S) -> Self {
        Self {
            time_source,
            deadlines: BTreeMap::new(),
            batch_depth: 0,
            next_deadline: None,
            reschedules: 0,
        }
    }

    /// Returns the deadline for a name.
    pub fn deadline(&self, name: &str) -> Option<Instant> {
        self.deadlines.get(name).copied()
    }

    /// Number of names with an outstanding deadline.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Returns true if no deadlines are outstanding.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// How many times the next deadline has been recomputed.
    pub fn reschedule_count(&self) -> u64 {
        self.reschedules
    }

    fn refresh(&mut self) {
        if self.batch_depth == 0 {
            self.reschedule();
        }
    }

    fn reschedule(&mut self) {
        self.next_deadline = self.deadlines.values().min().copied();
        self.reschedules += 1;
    }
}

impl<S: TimeSource> TtlScheduler for TtlManager<S> {
    fn add(&mut self, ttl: Duration, name: &str) {
        // A TTL past the end of the clock's range never expires.
        match self.time_source.now().checked_add(ttl) {
            Some(deadline) => {
                self.deadlines.insert(name.to_string(), deadline);
                self.refresh();
            }
            None => self.clear(name),
        }
    }

    fn clear(&mut self, name: &str) {
        if self.deadlines.remove(name).is_some() {
            self.refresh();
        }
    }

    fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            self.reschedule();
        }
    }

    fn poll_expired(&mut self) -> Vec<String> {
        let now = self.time_source.now();
        let expired: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(name, _)| name.clone())
            .collect();
        if expired.is_empty() {
            return expired;
        }
        for name in &expired {
            self.deadlines.remove(name);
        }
        self.refresh();
        expired
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }
}

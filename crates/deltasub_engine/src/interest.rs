//! Tracking of interest changes not yet sent to the server.

use std::collections::BTreeSet;

/// Interest changes not yet delivered in a request.
///
/// # Invariants
///
/// - A name is never in both `names_added` and `names_removed`
/// - `any_request_sent_yet_in_current_stream` only goes back to false on
///   [`InterestTracker::mark_stream_fresh`]
#[derive(Debug, Clone, Default)]
pub struct InterestTracker {
    names_added: BTreeSet<String>,
    names_removed: BTreeSet<String>,
    any_request_sent_yet_in_current_stream: bool,
}

impl InterestTracker {
    /// Creates a tracker for a stream that has not sent anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records new interest in a name.
    ///
    /// A pending remove of the same name is dropped: remove-then-add must go
    /// out as a fresh subscribe, since the caller may have discarded its copy.
    pub fn add(&mut self, name: &str) {
        self.names_removed.remove(name);
        self.names_added.insert(name.to_string());
    }

    /// Records lost interest in a name.
    ///
    /// Add-then-remove within one window still yields an unsubscribe. It can't be
    /// told apart from remove-add-remove without more history.
    pub fn remove(&mut self, name: &str) {
        self.names_added.remove(name);
        self.names_removed.insert(name.to_string());
    }

    /// Returns true if there are undelivered interest changes.
    pub fn has_pending_changes(&self) -> bool {
        !self.names_added.is_empty() || !self.names_removed.is_empty()
    }

    /// Returns true if the next request is the first of the current stream.
    pub fn is_first_request(&self) -> bool {
        !self.any_request_sent_yet_in_current_stream
    }

    /// Forgets that anything was sent, so the next request restates full interest.
    pub fn mark_stream_fresh(&mut self) {
        self.any_request_sent_yet_in_current_stream = false;
    }

    /// Prepares the pending sets for the first request of a stream.
    ///
    /// Every currently subscribed name becomes a pending subscribe and
    /// pending removes are dropped: nothing is subscribed on a fresh stream.
    pub(crate) fn restate<'a, I>(&mut self, subscribed: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.any_request_sent_yet_in_current_stream = true;
        self.names_added.extend(subscribed.into_iter().cloned());
        self.names_removed.clear();
    }

    /// Drains the pending sets as `(subscribe, unsubscribe)` lists in name order.
    pub(crate) fn take(&mut self) -> (Vec<String>, Vec<String>) {
        let added = std::mem::take(&mut self.names_added);
        let removed = std::mem::take(&mut self.names_removed);
        (added.into_iter().collect(), removed.into_iter().collect())
    }

    /// Names waiting to be subscribed.
    pub fn pending_added(&self) -> &BTreeSet<String> {
        &self.names_added
    }

    /// Names waiting to be unsubscribed.
    pub fn pending_removed(&self) -> &BTreeSet<String> {
        &self.names_removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tracker_wants_first_request() {
        let tracker = InterestTracker::new();
        assert!(tracker.is_first_request());
        assert!(!tracker.has_pending_changes());
    }

    #[test]
    fn remove_then_add_resubscribes() {
        let mut tracker = InterestTracker::new();
        tracker.remove("a");
        tracker.add("a");

        assert!(tracker.pending_added().contains("a"));
        assert!(!tracker.pending_removed().contains("a"));
    }

    #[test]
    fn add_then_remove_unsubscribes() {
        let mut tracker = InterestTracker::new();
        tracker.add("a");
        tracker.remove("a");

        assert!(!tracker.pending_added().contains("a"));
        assert!(tracker.pending_removed().contains("a"));
    }

    #[test]
    fn take_drains_in_order() {
        let mut tracker = InterestTracker::new();
        tracker.add("c");
        tracker.add("a");
        tracker.remove("b");

        let (added, removed) = tracker.take();
        assert_eq!(added, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(removed, vec!["b".to_string()]);
        assert!(!tracker.has_pending_changes());
    }

    #[test]
    fn restate_replaces_removals() {
        let mut tracker = InterestTracker::new();
        tracker.remove("gone");
        let subscribed = vec!["x".to_string(), "y".to_string()];
        tracker.restate(&subscribed);

        assert!(!tracker.is_first_request());
        assert!(tracker.pending_removed().is_empty());
        assert_eq!(tracker.pending_added().len(), 2);

        tracker.mark_stream_fresh();
        assert!(tracker.is_first_request());
    }
}

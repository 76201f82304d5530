//! Delta subscription state machine.

use crate::callbacks::{ConfigUpdateCallbacks, FailureReason};
use crate::config::SubscriptionConfig;
use crate::context::DynamicContextFlag;
use crate::error::{SubscriptionError, SubscriptionResult};
use crate::interest::InterestTracker;
use crate::resource_state::ResourceState;
use crate::stats::StatsCallbacks;
use crate::ttl::{TimeSource, TtlManager, TtlScheduler};
use deltasub_protocol::{
    DeltaDiscoveryRequest, DeltaDiscoveryResponse, ErrorDetail, Resource, StatusCode, UpdateAck,
};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Client-side subscription state for one resource type.
///
/// Tracks which names the subscriber wants, which versions it holds, and
/// turns both into requests. Responses are validated as a whole before any
/// state is touched.
///
/// # Invariants
///
/// - A ledger entry exists for every name currently subscribed
/// - The first request of a stream restates every subscribed name
/// - A rejected response leaves the ledger and TTL state untouched
///
/// All operations are synchronous and expect a single serialized caller.
pub struct DeltaSubscriptionState<C: ConfigUpdateCallbacks, T: TtlScheduler = TtlManager> {
    config: SubscriptionConfig,
    resource_state: BTreeMap<String, ResourceState>,
    interest: InterestTracker,
    callbacks: C,
    ttl: T,
    dynamic_context: DynamicContextFlag,
}

impl<C: ConfigUpdateCallbacks, T: TtlScheduler> DeltaSubscriptionState<C, T> {
    /// Creates an empty subscription.
    pub fn new(config: SubscriptionConfig, callbacks: C, ttl: T) -> Self {
        Self {
            config,
            resource_state: BTreeMap::new(),
            interest: InterestTracker::new(),
            callbacks,
            ttl,
            dynamic_context: DynamicContextFlag::new(),
        }
    }

    /// Uses a shared context-change flag instead of a private one.
    pub fn with_dynamic_context(mut self, flag: DynamicContextFlag) -> Self {
        self.dynamic_context = flag;
        self
    }

    /// Type identifier of this subscription.
    pub fn type_url(&self) -> &str {
        &self.config.type_url
    }

    /// The configuration.
    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Ledger entry for a name.
    pub fn resource_state(&self, name: &str) -> Option<&ResourceState> {
        self.resource_state.get(name)
    }

    /// Currently subscribed names in order.
    pub fn subscribed_names(&self) -> impl Iterator<Item = &str> {
        self.resource_state.keys().map(String::as_str)
    }

    /// Pending interest changes.
    pub fn interest(&self) -> &InterestTracker {
        &self.interest
    }

    /// The callback boundary.
    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    /// The callback boundary, mutably.
    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    /// The TTL scheduler.
    pub fn ttl(&self) -> &T {
        &self.ttl
    }

    /// The context-change flag polled by [`Self::subscription_update_pending`].
    pub fn dynamic_context(&self) -> &DynamicContextFlag {
        &self.dynamic_context
    }

    /// Folds interest changes into the ledger and the pending sets.
    ///
    /// Re-subscribing forgets any known version: the subscriber may have
    /// dropped its copy and must get it again.
    pub fn update_subscription_interest<A, R>(&mut self, added: A, removed: R)
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        for name in added {
            let name = name.as_ref();
            self.resource_state
                .insert(name.to_string(), ResourceState::waiting_for_server());
            self.interest.add(name);
        }
        for name in removed {
            let name = name.as_ref();
            self.resource_state.remove(name);
            self.ttl.clear(name);
            self.interest.remove(name);
        }
    }

    /// Returns true if a request should be sent.
    ///
    /// Having sent nothing yet on this stream counts: a fresh stream must
    /// restate all interest even if nothing changed.
    pub fn subscription_update_pending(&self) -> bool {
        self.interest.has_pending_changes()
            || self.interest.is_first_request()
            || self.dynamic_context.is_changed()
    }

    /// Signals that a new stream started. Known versions are kept.
    pub fn mark_stream_fresh(&mut self) {
        self.interest.mark_stream_fresh();
    }

    /// Builds the next request without acknowledging anything.
    pub fn next_request(&mut self) -> DeltaDiscoveryRequest {
        let mut request = DeltaDiscoveryRequest::new(self.config.type_url.clone());
        if self.interest.is_first_request() {
            // Waiting entries have no version to report but are still subscribed.
            request.initial_resource_versions = self
                .resource_state
                .iter()
                .filter_map(|(name, state)| {
                    state.version().map(|v| (name.clone(), v.to_string()))
                })
                .collect();
            self.interest.restate(self.resource_state.keys());
        }

        let (subscribe, unsubscribe) = self.interest.take();
        request.resource_names_subscribe = subscribe;
        request.resource_names_unsubscribe = unsubscribe;
        self.dynamic_context.clear();
        request
    }

    /// Builds the next request, acknowledging or rejecting a response.
    pub fn next_request_with_ack(&mut self, ack: &UpdateAck) -> DeltaDiscoveryRequest {
        let mut request = self.next_request();
        // The nonce is echoed even when rejecting; it sequences the stream.
        request.response_nonce = ack.nonce.clone();
        request.error_detail = ack.error_detail.clone();
        debug!(
            "ACK for {} will have nonce {}",
            self.config.type_url, ack.nonce
        );
        request
    }

    /// Validates and applies a response, returning the ack for the next request.
    ///
    /// Never fails: a malformed response yields a NACK and an
    /// [`FailureReason::UpdateRejected`] callback.
    pub fn handle_response(&mut self, response: &DeltaDiscoveryResponse) -> UpdateAck {
        let ack = UpdateAck::new(response.nonce.clone(), self.config.type_url.clone());
        match self.validate(response) {
            Ok(delivered) => {
                self.apply(response, &delivered);
                ack
            }
            Err(err) => self.reject(ack, &err),
        }
    }

    /// Reports that the stream could not be established.
    pub fn handle_establishment_failure(&mut self) {
        self.callbacks
            .on_config_update_failed(FailureReason::ConnectionFailure, None);
    }

    /// Reverts expired names to waiting and reports them as removed.
    ///
    /// Names no longer subscribed are ignored.
    pub fn on_names_expired<I>(&mut self, names: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut removed = Vec::new();
        for name in names {
            let name = name.as_ref();
            if let Some(state) = self.resource_state.get_mut(name) {
                *state = ResourceState::waiting_for_server();
                removed.push(name.to_string());
            }
        }
        if removed.is_empty() {
            return;
        }
        debug!(
            "{} resources of {} expired by TTL",
            removed.len(),
            self.config.type_url
        );
        self.callbacks.on_config_update(&[], &removed, "");
    }

    /// Polls the TTL scheduler and expires whatever is due.
    ///
    /// Returns the names that expired.
    pub fn process_ttl_expiry(&mut self) -> Vec<String> {
        let expired = self.ttl.poll_expired();
        self.on_names_expired(&expired);
        expired
    }

    /// Checks a response without mutating anything.
    ///
    /// Returns the resources to deliver, with heartbeats filtered out.
    fn validate(&self, response: &DeltaDiscoveryResponse) -> SubscriptionResult<Vec<Resource>> {
        let mut names_added_removed: HashSet<&str> = HashSet::new();
        let mut delivered = Vec::with_capacity(response.resources.len());

        for resource in &response.resources {
            if !names_added_removed.insert(resource.name.as_str()) {
                return Err(SubscriptionError::DuplicateResourceName {
                    name: resource.name.clone(),
                });
            }
            if self.is_heartbeat(resource) {
                continue;
            }
            delivered.push(resource.clone());
            // Unresolved aliases carry no body to type-check.
            if let Some(payload) = &resource.resource {
                if payload.type_url != response.type_url {
                    return Err(SubscriptionError::TypeUrlMismatch {
                        embedded: payload.type_url.clone(),
                        expected: response.type_url.clone(),
                    });
                }
            }
        }

        for name in &response.removed_resources {
            if !names_added_removed.insert(name.as_str()) {
                return Err(SubscriptionError::DuplicateAddedRemoved { name: name.clone() });
            }
        }

        Ok(delivered)
    }

    fn is_heartbeat(&self, resource: &Resource) -> bool {
        if !self.config.supports_heartbeats || resource.has_payload() {
            return false;
        }
        self.resource_state
            .get(&resource.name)
            .and_then(ResourceState::version)
            .is_some_and(|version| version == resource.version)
    }

    fn apply(&mut self, response: &DeltaDiscoveryResponse, delivered: &[Resource]) {
        {
            let mut ttl = self.ttl.scoped_update();
            for resource in &response.resources {
                match resource.ttl {
                    Some(duration) => ttl.add(duration, &resource.name),
                    None => ttl.clear(&resource.name),
                }
                self.resource_state.insert(
                    resource.name.clone(),
                    ResourceState::known(resource.version.clone()),
                );
            }
        }

        self.callbacks.on_config_update(
            delivered,
            &response.removed_resources,
            &response.system_version_info,
        );

        // A removed resource has no version worth reporting on reconnect, but
        // the entry stays so a later unsubscribe is still sent.
        for name in &response.removed_resources {
            if let Some(state) = self.resource_state.get_mut(name) {
                *state = ResourceState::waiting_for_server();
            }
        }

        debug!(
            "Delta config for {} accepted with {} resources added, {} removed",
            self.config.type_url,
            response.resources.len(),
            response.removed_resources.len()
        );
    }

    fn reject(&mut self, mut ack: UpdateAck, err: &SubscriptionError) -> UpdateAck {
        ack.error_detail = Some(ErrorDetail::new(StatusCode::Internal, err.to_string()));
        warn!("delta config for {} rejected: {}", self.config.type_url, err);
        self.callbacks
            .on_config_update_failed(FailureReason::UpdateRejected, Some(err));
        ack
    }
}

impl<C, S, T> DeltaSubscriptionState<StatsCallbacks<C, S>, T>
where
    C: ConfigUpdateCallbacks,
    S: TimeSource,
    T: TtlScheduler,
{
    /// Arms the initial fetch timer from [`SubscriptionConfig::init_fetch_timeout`].
    ///
    /// Call once when the subscription starts.
    pub fn start_init_fetch_timer(&mut self) {
        let timeout = self.config.init_fetch_timeout;
        self.callbacks.start_init_fetch_timer(timeout);
    }

    /// Reports a fetch timeout if no update arrived in time.
    pub fn poll_init_fetch_timeout(&mut self) -> bool {
        let fired = self.callbacks.poll_init_fetch_timeout();
        if fired {
            warn!(
                "initial fetch for {} timed out after {:?}",
                self.config.type_url, self.config.init_fetch_timeout
            );
        }
        fired
    }
}

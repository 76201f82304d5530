//! Property tests for interest folding and stream restatement.

use deltasub_engine::{DeltaSubscriptionState, MemoryCallbacks, SubscriptionConfig, TtlManager};
use deltasub_protocol::{DeltaDiscoveryResponse, Resource, TypedPayload};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const TYPE_URL: &str = "type.Cluster";

#[derive(Debug, Clone)]
enum InterestOp {
    Add(String),
    Remove(String),
}

/// Small name pool so sequences hit the same names repeatedly.
fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(str::to_string)
}

fn op_strategy() -> impl Strategy<Value = InterestOp> {
    prop_oneof![
        name_strategy().prop_map(InterestOp::Add),
        name_strategy().prop_map(InterestOp::Remove),
    ]
}

fn new_state() -> DeltaSubscriptionState<MemoryCallbacks> {
    DeltaSubscriptionState::new(
        SubscriptionConfig::new(TYPE_URL),
        MemoryCallbacks::new(),
        TtlManager::new(),
    )
}

fn apply(state: &mut DeltaSubscriptionState<MemoryCallbacks>, op: &InterestOp) {
    match op {
        InterestOp::Add(name) => state.update_subscription_interest([name], None::<&str>),
        InterestOp::Remove(name) => state.update_subscription_interest(None::<&str>, [name]),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn request_carries_net_interest_diff(
        initial in prop::collection::btree_set(name_strategy(), 0..5),
        ops in prop::collection::vec(op_strategy(), 0..20),
    ) {
        let mut state = new_state();
        state.update_subscription_interest(&initial, None::<&str>);
        state.next_request();

        let mut added = BTreeSet::new();
        let mut removed = BTreeSet::new();
        let mut subscribed = initial.clone();
        for op in &ops {
            apply(&mut state, op);
            match op {
                InterestOp::Add(name) => {
                    removed.remove(name);
                    added.insert(name.clone());
                    subscribed.insert(name.clone());
                }
                InterestOp::Remove(name) => {
                    added.remove(name);
                    removed.insert(name.clone());
                    subscribed.remove(name);
                }
            }
        }

        prop_assert_eq!(state.subscription_update_pending(), !ops.is_empty());
        let request = state.next_request();
        let added: Vec<String> = added.into_iter().collect();
        let removed: Vec<String> = removed.into_iter().collect();
        prop_assert_eq!(request.resource_names_subscribe, added);
        prop_assert_eq!(request.resource_names_unsubscribe, removed);
        prop_assert!(request.initial_resource_versions.is_empty());

        let ledger: BTreeSet<String> = state.subscribed_names().map(str::to_string).collect();
        prop_assert_eq!(ledger, subscribed);
        prop_assert!(!state.subscription_update_pending());
    }

    #[test]
    fn fresh_stream_restates_ledger(
        names in prop::collection::btree_set(name_strategy(), 1..5),
        versions in prop::collection::btree_map(name_strategy(), "[0-9]{1,3}", 0..5),
        ops in prop::collection::vec(op_strategy(), 0..10),
    ) {
        let mut state = new_state();
        state.update_subscription_interest(&names, None::<&str>);
        state.next_request();

        let mut response = DeltaDiscoveryResponse::new(TYPE_URL, "n1");
        for (name, version) in &versions {
            if names.contains(name) {
                response = response.with_resource(
                    Resource::new(name.clone(), version.clone())
                        .with_payload(TypedPayload::new(TYPE_URL, vec![])),
                );
            }
        }
        prop_assert!(!state.handle_response(&response).is_nack());
        for op in &ops {
            apply(&mut state, op);
        }

        state.mark_stream_fresh();
        prop_assert!(state.subscription_update_pending());
        let request = state.next_request();

        let ledger: Vec<String> = state.subscribed_names().map(str::to_string).collect();
        prop_assert_eq!(&request.resource_names_subscribe, &ledger);
        prop_assert!(request.resource_names_unsubscribe.is_empty());

        let expected: BTreeMap<String, String> = ledger
            .iter()
            .filter_map(|name| {
                let version = state.resource_state(name)?.version()?;
                Some((name.clone(), version.to_string()))
            })
            .collect();
        prop_assert_eq!(request.initial_resource_versions, expected);
    }

    #[test]
    fn duplicate_names_never_touch_ledger(
        name in name_strategy(),
        first in "[0-9]{1,3}",
        second in "[0-9]{1,3}",
    ) {
        let mut state = new_state();
        state.update_subscription_interest([&name], None::<&str>);
        state.next_request();

        let response = DeltaDiscoveryResponse::new(TYPE_URL, "n1")
            .with_resource(
                Resource::new(name.clone(), first)
                    .with_payload(TypedPayload::new(TYPE_URL, vec![])),
            )
            .with_resource(
                Resource::new(name.clone(), second)
                    .with_payload(TypedPayload::new(TYPE_URL, vec![])),
            );
        let ack = state.handle_response(&response);

        prop_assert!(ack.is_nack());
        prop_assert_eq!(ack.nonce.as_str(), "n1");
        prop_assert!(state.resource_state(&name).unwrap().is_waiting_for_server());
    }
}

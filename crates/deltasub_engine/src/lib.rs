//! # deltasub Engine
//!
//! Client-side subscription state machine for incremental (delta) discovery.
//!
//! This crate provides:
//! - Per-resource version ledger
//! - Pending interest tracking (subscribe / unsubscribe diffs)
//! - Request building, including full restatement on a fresh stream
//! - Response validation, heartbeat filtering and ACK/NACK construction
//! - TTL-driven expiry of resources
//! - A stats-recording wrapper for the callback boundary, with the initial fetch timer
//!
//! ## Architecture
//!
//! [`DeltaSubscriptionState`] serves exactly one subscriber's interest set
//! for one type. The transport asks it whether a request is pending, sends
//! what it builds, and hands back each response. The returned [`UpdateAck`]
//! goes into the next request.
//!
//! ## Key Invariants
//!
//! - The first request of a stream carries all interest and known versions
//! - Each interest change is sent exactly once per stream
//! - A response is applied entirely or not at all
//! - Every response is answered with its nonce, even when rejected
//!
//! [`UpdateAck`]: deltasub_protocol::UpdateAck

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod callbacks;
mod config;
mod context;
mod error;
mod interest;
mod resource_state;
mod state;
mod stats;
mod ttl;

pub use callbacks::{CallbackEvent, ConfigUpdateCallbacks, FailureReason, MemoryCallbacks};
pub use config::SubscriptionConfig;
pub use context::DynamicContextFlag;
pub use error::{SubscriptionError, SubscriptionResult};
pub use interest::InterestTracker;
pub use resource_state::ResourceState;
pub use state::DeltaSubscriptionState;
pub use stats::{StatsCallbacks, SubscriptionStats};
pub use ttl::{
    ManualTimeSource, ScopedTtlUpdate, SystemTimeSource, TimeSource, TtlManager, TtlScheduler,
};

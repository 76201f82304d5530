//! # deltasub Protocol
//!
//! Value types for the incremental (delta) discovery protocol.
//!
//! This crate provides:
//! - `DeltaDiscoveryRequest` / `DeltaDiscoveryResponse` messages
//! - `Resource` entries with optional typed payload, TTL and aliases
//! - `UpdateAck` for folding ACK/NACK state into the next request
//! - gRPC-style `StatusCode` and `ErrorDetail`
//!
//! This is a pure protocol crate with no I/O operations. Messages are
//! assumed to be already decoded when they reach the engine.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod ack;
mod messages;
mod status;

pub use ack::UpdateAck;
pub use messages::{DeltaDiscoveryRequest, DeltaDiscoveryResponse, Resource, TypedPayload};
pub use status::{truncate_status_message, ErrorDetail, StatusCode, MAX_STATUS_MESSAGE_LEN};

//! Protocol messages for delta discovery.

use crate::status::ErrorDetail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// An opaque, already-decoded resource body tagged with its type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedPayload {
    /// Type identifier embedded in the payload.
    pub type_url: String,
    /// Encoded resource body.
    pub value: Vec<u8>,
}

impl TypedPayload {
    /// Creates a new payload.
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }
}

/// A single resource entry in a delta response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Resource name.
    pub name: String,
    /// Resource version as assigned by the server.
    pub version: String,
    /// Resource body. Absent for heartbeats and unresolved aliases.
    pub resource: Option<TypedPayload>,
    /// Time-to-live after which the resource is considered gone.
    pub ttl: Option<Duration>,
    /// Aliases this resource is known by.
    pub aliases: Vec<String>,
}

impl Resource {
    /// Creates a bodiless resource entry.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Attaches a payload.
    pub fn with_payload(mut self, payload: TypedPayload) -> Self {
        self.resource = Some(payload);
        self
    }

    /// Sets the time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the aliases.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if the entry carries a concrete body.
    pub fn has_payload(&self) -> bool {
        self.resource.is_some()
    }

    /// Returns true if this entry only reports an alias the server could not resolve.
    pub fn is_unresolved_alias(&self) -> bool {
        !self.has_payload() && !self.aliases.is_empty()
    }
}

/// Server-to-client delta update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeltaDiscoveryResponse {
    /// Response-wide version string.
    pub system_version_info: String,
    /// Added or updated resources.
    pub resources: Vec<Resource>,
    /// Type identifier of every resource in this response.
    pub type_url: String,
    /// Names of resources the server removed.
    pub removed_resources: Vec<String>,
    /// Sequencing token to echo in the next request.
    pub nonce: String,
}

impl DeltaDiscoveryResponse {
    /// Creates an empty response for a type.
    pub fn new(type_url: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            type_url: type_url.into(),
            nonce: nonce.into(),
            ..Self::default()
        }
    }

    /// Sets the response-wide version string.
    pub fn with_version_info(mut self, version: impl Into<String>) -> Self {
        self.system_version_info = version.into();
        self
    }

    /// Appends an added or updated resource.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Appends a removed resource name.
    pub fn with_removed(mut self, name: impl Into<String>) -> Self {
        self.removed_resources.push(name.into());
        self
    }
}

/// Client-to-server delta request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeltaDiscoveryRequest {
    /// Type identifier this request is about.
    pub type_url: String,
    /// Names to start watching.
    pub resource_names_subscribe: Vec<String>,
    /// Names to stop watching.
    pub resource_names_unsubscribe: Vec<String>,
    /// Versions already held. Only populated on the first request of a stream.
    pub initial_resource_versions: BTreeMap<String, String>,
    /// Nonce of the response being acknowledged. Empty if none.
    pub response_nonce: String,
    /// Present iff this request rejects the acknowledged response.
    pub error_detail: Option<ErrorDetail>,
}

impl DeltaDiscoveryRequest {
    /// Creates an empty request for a type.
    pub fn new(type_url: impl Into<String>) -> Self {
        Self {
            type_url: type_url.into(),
            ..Self::default()
        }
    }

    /// Returns true if this request is a NACK.
    pub fn is_nack(&self) -> bool {
        self.error_detail.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;

    #[test]
    fn unresolved_alias_detection() {
        let alias = Resource::new("vhost.example.com", "").with_aliases(["example.com"]);
        assert!(alias.is_unresolved_alias());

        let resolved = Resource::new("vhost.example.com", "1")
            .with_aliases(["example.com"])
            .with_payload(TypedPayload::new("type.RouteConfiguration", vec![1]));
        assert!(!resolved.is_unresolved_alias());

        let heartbeat = Resource::new("cluster_a", "1");
        assert!(!heartbeat.is_unresolved_alias());
        assert!(!heartbeat.has_payload());
    }

    #[test]
    fn response_builder() {
        let response = DeltaDiscoveryResponse::new("type.Cluster", "nonce-1")
            .with_version_info("v7")
            .with_resource(Resource::new("a", "1"))
            .with_removed("b");

        assert_eq!(response.type_url, "type.Cluster");
        assert_eq!(response.nonce, "nonce-1");
        assert_eq!(response.system_version_info, "v7");
        assert_eq!(response.resources.len(), 1);
        assert_eq!(response.removed_resources, vec!["b".to_string()]);
    }

    #[test]
    fn request_nack_flag() {
        let mut request = DeltaDiscoveryRequest::new("type.Cluster");
        assert!(!request.is_nack());

        request.error_detail = Some(ErrorDetail::new(StatusCode::Internal, "bad"));
        assert!(request.is_nack());
    }

    #[test]
    fn request_serializes_for_transport() {
        let mut request = DeltaDiscoveryRequest::new("type.Cluster");
        request.resource_names_subscribe.push("a".into());
        request
            .initial_resource_versions
            .insert("a".into(), "3".into());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type_url"], "type.Cluster");
        assert_eq!(json["resource_names_subscribe"][0], "a");
        assert_eq!(json["initial_resource_versions"]["a"], "3");
        assert!(json["error_detail"].is_null());
    }
}

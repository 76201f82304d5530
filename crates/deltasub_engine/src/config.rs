//! Configuration for a delta subscription.

use std::time::Duration;

/// Configuration for one type's subscription state.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionConfig {
    /// Type identifier of the resources this subscription tracks.
    pub type_url: String,
    /// Whether bodiless entries re-asserting a known version are filtered out.
    pub supports_heartbeats: bool,
    /// How long to wait for the first update before reporting a fetch timeout.
    ///
    /// Armed by `DeltaSubscriptionState::start_init_fetch_timer` when the
    /// callbacks are a `StatsCallbacks`.
    pub init_fetch_timeout: Option<Duration>,
}

impl SubscriptionConfig {
    /// Creates a new configuration for a type.
    pub fn new(type_url: impl Into<String>) -> Self {
        Self {
            type_url: type_url.into(),
            supports_heartbeats: false,
            init_fetch_timeout: None,
        }
    }

    /// Enables or disables heartbeat suppression.
    pub fn with_heartbeats(mut self, enabled: bool) -> Self {
        self.supports_heartbeats = enabled;
        self
    }

    /// Sets the initial fetch timeout. A zero duration disables it.
    pub fn with_init_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.init_fetch_timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_config_builder() {
        let config = SubscriptionConfig::new("type.Cluster")
            .with_heartbeats(true)
            .with_init_fetch_timeout(Duration::from_secs(15));

        assert_eq!(config.type_url, "type.Cluster");
        assert!(config.supports_heartbeats);
        assert_eq!(config.init_fetch_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn zero_fetch_timeout_disables() {
        let config =
            SubscriptionConfig::new("type.Cluster").with_init_fetch_timeout(Duration::ZERO);
        assert_eq!(config.init_fetch_timeout, None);
    }

    #[test]
    fn default_config() {
        let config = SubscriptionConfig::default();
        assert!(config.type_url.is_empty());
        assert!(!config.supports_heartbeats);
    }
}

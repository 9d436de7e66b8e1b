//! Transport configuration.
//!
//! Connection tuning is passed explicitly to `ReqwestTransport::new` instead
//! of being applied to process-wide state, so several clients (and tests) can
//! coexist with different settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::ApiError;

/// Default values for `TransportConfig`.
pub mod defaults {
    /// DNS cache refresh interval in seconds.
    pub const DNS_REFRESH_SECS: u64 = 60;

    /// Concurrent outbound connections allowed per destination.
    pub const MAX_CONNECTIONS_PER_HOST: usize = 1024;

    /// Lifetime of a destination's pooled connections in seconds.
    pub const LEASE_TIMEOUT_SECS: u64 = 60;

    pub fn dns_refresh_secs() -> u64 {
        DNS_REFRESH_SECS
    }

    pub fn max_connections_per_host() -> usize {
        MAX_CONNECTIONS_PER_HOST
    }

    pub fn lease_timeout_secs() -> u64 {
        LEASE_TIMEOUT_SECS
    }
}

/// Settings for the reqwest-backed transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// How long resolved addresses are cached before being looked up again.
    #[serde(default = "defaults::dns_refresh_secs")]
    pub dns_refresh_secs: u64,

    /// Upper bound on in-flight requests to a single origin.
    #[serde(default = "defaults::max_connections_per_host")]
    pub max_connections_per_host: usize,

    /// Maximum age of a pooled connection before it is recycled.
    #[serde(default = "defaults::lease_timeout_secs")]
    pub lease_timeout_secs: u64,

    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Whole-request timeout. `None` leaves reqwest's default (no timeout).
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            dns_refresh_secs: defaults::DNS_REFRESH_SECS,
            max_connections_per_host: defaults::MAX_CONNECTIONS_PER_HOST,
            lease_timeout_secs: defaults::LEASE_TIMEOUT_SECS,
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

impl TransportConfig {
    pub fn dns_refresh(&self) -> Duration {
        Duration::from_secs(self.dns_refresh_secs)
    }

    pub fn lease_timeout(&self) -> Duration {
        Duration::from_secs(self.lease_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Reject settings that would make the transport unusable.
    ///
    /// # Errors
    /// Returns `ApiError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.dns_refresh_secs == 0 {
            return Err(ApiError::Config("dns_refresh_secs must be positive".to_string()));
        }
        if self.max_connections_per_host == 0 {
            return Err(ApiError::Config(
                "max_connections_per_host must be positive".to_string(),
            ));
        }
        if self.max_connections_per_host > Semaphore::MAX_PERMITS {
            return Err(ApiError::Config(format!(
                "max_connections_per_host must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.lease_timeout_secs == 0 {
            return Err(ApiError::Config("lease_timeout_secs must be positive".to_string()));
        }
        if self.connect_timeout_secs == Some(0) || self.request_timeout_secs == Some(0) {
            return Err(ApiError::Config("timeouts must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TransportConfig::default();
        assert_eq!(config.dns_refresh(), Duration::from_secs(60));
        assert_eq!(config.lease_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_connections_per_host, 1024);
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: TransportConfig = serde_json::from_str(r#"{"lease_timeout_secs":5}"#).unwrap();
        assert_eq!(config.lease_timeout_secs, 5);
        assert_eq!(config.max_connections_per_host, defaults::MAX_CONNECTIONS_PER_HOST);
        assert_eq!(config.dns_refresh_secs, defaults::DNS_REFRESH_SECS);
    }

    #[test]
    fn zero_values_are_rejected() {
        let config = TransportConfig {
            max_connections_per_host: 0,
            ..TransportConfig::default()
        };
        assert!(matches!(config.validate(), Err(ApiError::Config(_))));

        let config = TransportConfig {
            request_timeout_secs: Some(0),
            ..TransportConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn connection_limit_above_semaphore_capacity_is_rejected() {
        let config = TransportConfig {
            max_connections_per_host: usize::MAX,
            ..TransportConfig::default()
        };
        assert!(matches!(config.validate(), Err(ApiError::Config(_))));

        let config = TransportConfig {
            max_connections_per_host: Semaphore::MAX_PERMITS,
            ..TransportConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}

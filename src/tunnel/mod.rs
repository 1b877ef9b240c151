//! Tunnel entry seam and lifecycle control
//!
//! The decentralized relay network is an external collaborator. This
//! module owns the seam: the configuration types an entry is built from,
//! the [`TunnelEntry`] trait every entry implements, the loopback
//! [`DirectEntry`] used for baseline runs and tests, and the
//! [`TunnelProxy`] controller that starts and stops an entry with a
//! bounded handshake.

pub mod entry;
pub mod proxy;

pub use entry::DirectEntry;
pub use proxy::{ProxyState, TunnelProxy};

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::watch;

/// Service advertised through the tunnel entry
#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    /// Local TCP ports the service is reachable on
    pub tcp: Vec<u16>,
    /// Encryption scheme identifier negotiated with relays
    pub encryption: String,
}

impl Service {
    /// Validate the service definition
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AppError::config("service name must not be empty"));
        }
        if self.tcp.is_empty() {
            return Err(AppError::config(format!(
                "service '{}' advertises no TCP port",
                self.name
            )));
        }
        if self.tcp.contains(&0) {
            return Err(AppError::config(format!(
                "service '{}' advertises port 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Per-service entry parameters
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub listen_ip: IpAddr,
    /// Price ceiling accepted for relayed traffic, as a decimal string
    pub max_price: String,
}

impl ServiceInfo {
    /// Validate the per-service parameters
    pub fn validate(&self) -> Result<()> {
        let price: f64 = self
            .max_price
            .parse()
            .map_err(|_| AppError::config(format!("invalid price format '{}'", self.max_price)))?;
        if price < 0.0 {
            return Err(AppError::config(format!(
                "price must not be negative, got '{}'",
                self.max_price
            )));
        }
        Ok(())
    }
}

/// Entry-wide configuration
#[derive(Debug, Clone)]
pub struct EntryConfig {
    pub subscription_prefix: String,
    /// Timeout for the entry's upstream dials
    pub dial_timeout: Duration,
    /// Services the entry serves, keyed by service name
    pub services: HashMap<String, ServiceInfo>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            subscription_prefix: crate::defaults::SUBSCRIPTION_PREFIX.to_string(),
            dial_timeout: crate::defaults::DIAL_TIMEOUT,
            services: HashMap::new(),
        }
    }
}

/// A tunnel entry exposing a local TCP port routed to the wider network.
///
/// `start` runs the entry until it is closed and resolves early only on
/// failure; reachability is signalled separately through
/// `connect_signal`, so starting and becoming connected are independent
/// outcomes (see [`TunnelProxy::start`] for the race between them).
#[async_trait]
pub trait TunnelEntry: Send + Sync {
    /// Bind and serve until closed. An error may surface at any point.
    async fn start(&self) -> Result<()>;

    /// Receiver observing `true` once the entry is reachable.
    fn connect_signal(&self) -> watch::Receiver<bool>;

    /// Release the listener and serve tasks. Idempotent.
    async fn close(&self);

    /// Identity the entry presents to relays
    fn identity(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;

    fn service(ports: Vec<u16>) -> Service {
        Service {
            name: defaults::SERVICE_NAME.to_string(),
            tcp: ports,
            encryption: defaults::SERVICE_ENCRYPTION.to_string(),
        }
    }

    #[test]
    fn test_service_validation() {
        assert!(service(vec![8080]).validate().is_ok());
        assert!(service(vec![]).validate().is_err());
        assert!(service(vec![8080, 0]).validate().is_err());

        let mut unnamed = service(vec![8080]);
        unnamed.name.clear();
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_service_info_validation() {
        let info = ServiceInfo {
            listen_ip: defaults::LISTEN_IP,
            max_price: defaults::MAX_PRICE.to_string(),
        };
        assert!(info.validate().is_ok());

        let bad_price = ServiceInfo {
            listen_ip: defaults::LISTEN_IP,
            max_price: "one-coin".to_string(),
        };
        let err = bad_price.validate().unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(err.to_string().contains("price format"));

        let negative = ServiceInfo {
            listen_ip: defaults::LISTEN_IP,
            max_price: "-0.5".to_string(),
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_entry_config_defaults() {
        let config = EntryConfig::default();
        assert_eq!(config.subscription_prefix, defaults::SUBSCRIPTION_PREFIX);
        assert_eq!(config.dial_timeout, defaults::DIAL_TIMEOUT);
        assert!(config.services.is_empty());
    }
}

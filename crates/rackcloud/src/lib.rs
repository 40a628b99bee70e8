//! # rackcloud
//!
//! Single entry point for the Rackspace Cloud v1.0 APIs.
//!
//! [`CloudClient`] authenticates once and shares one [`Dispatcher`] between
//! the compute, load-balancer and DNS clients.
//!
//! ```no_run
//! use rackcloud::{CloudClient, CloudConfig};
//!
//! # async fn run() -> rackcloud::Result<()> {
//! let config = CloudConfig::from_env()?;
//! let cloud = CloudClient::connect(&config)?;
//! for flavor in cloud.servers().list_flavors(true).await? {
//!     println!("{} {}", flavor.id, flavor.name);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub use rackcloud_compute as compute;
pub use rackcloud_core as core;
pub use rackcloud_dns as dns;
pub use rackcloud_loadbalancer as loadbalancer;

pub use rackcloud_compute::ServersClient;
pub use rackcloud_core::{CloudConfig, Dispatcher, Error, Region, Result};
pub use rackcloud_dns::DnsClient;
pub use rackcloud_loadbalancer::LoadBalancersClient;

use tracing::debug;

/// Typed client for every sub-service, sharing one dispatcher.
#[derive(Debug, Clone)]
pub struct CloudClient {
    servers: ServersClient,
    load_balancers: LoadBalancersClient,
    dns: DnsClient,
}

impl CloudClient {
    /// Build a client that authenticates with the configured credentials on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn connect(config: &CloudConfig) -> Result<Self> {
        debug!(user = %config.username, region = %config.region, "Creating cloud client");
        Ok(Self::with_dispatcher(Dispatcher::from_config(config)?))
    }

    /// Build a client around an existing dispatcher.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            servers: ServersClient::new(dispatcher.clone()),
            load_balancers: LoadBalancersClient::new(dispatcher.clone()),
            dns: DnsClient::new(dispatcher),
        }
    }

    /// Cloud Servers operations.
    #[must_use]
    pub const fn servers(&self) -> &ServersClient {
        &self.servers
    }

    /// Cloud Servers operations that touch the pending personality files.
    pub fn servers_mut(&mut self) -> &mut ServersClient {
        &mut self.servers
    }

    /// Cloud Load Balancers operations.
    #[must_use]
    pub const fn load_balancers(&self) -> &LoadBalancersClient {
        &self.load_balancers
    }

    /// Cloud Load Balancers operations that touch the pending node list.
    pub fn load_balancers_mut(&mut self) -> &mut LoadBalancersClient {
        &mut self.load_balancers
    }

    /// Cloud DNS operations.
    #[must_use]
    pub const fn dns(&self) -> &DnsClient {
        &self.dns
    }
}

//! Core Rackspace Cloud domain types.
//!
//! This module names the provider sub-services a request can target and the
//! datacenter regions that determine where the regional APIs live.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default v1.0 authentication endpoint for US accounts.
pub const DEFAULT_AUTH_URL: &str = "https://auth.api.rackspacecloud.com/v1.0";
/// v1.0 authentication endpoint for UK accounts.
pub const LON_AUTH_URL: &str = "https://lon.auth.api.rackspacecloud.com/v1.0";
/// DNS API root; the account id is appended.
pub const DNS_API_ROOT: &str = "https://dns.api.rackspacecloud.com/v1.0";

/// Provider sub-service a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceTarget {
    /// Cloud Servers (servers, flavors, images, shared IP groups, backups)
    Compute,
    /// Cloud Load Balancers
    LoadBalancer,
    /// Cloud DNS
    Dns,
}

impl ServiceTarget {
    /// Returns the service name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::LoadBalancer => "load-balancer",
            Self::Dns => "dns",
        }
    }

    /// Returns all sub-services.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Compute, Self::LoadBalancer, Self::Dns]
    }
}

impl FromStr for ServiceTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "compute" | "servers" => Ok(Self::Compute),
            "load-balancer" | "loadbalancer" | "loadbalancers" => Ok(Self::LoadBalancer),
            "dns" => Ok(Self::Dns),
            _ => Err(Error::ValidationError(format!("Unknown service: {s}"))),
        }
    }
}

impl std::fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Datacenter region hosting the regional APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    /// Dallas/Fort Worth
    #[default]
    Dfw,
    /// Chicago
    Ord,
    /// London
    Lon,
}

impl Region {
    /// Returns the region code as used by the provider.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Dfw => "DFW",
            Self::Ord => "ORD",
            Self::Lon => "LON",
        }
    }

    /// Returns the v1.0 authentication endpoint serving accounts in this region.
    #[must_use]
    pub const fn auth_url(&self) -> &'static str {
        match self {
            Self::Lon => LON_AUTH_URL,
            Self::Dfw | Self::Ord => DEFAULT_AUTH_URL,
        }
    }

    /// Returns the load-balancer API root for this region; the account id is appended.
    #[must_use]
    pub fn load_balancer_root(&self) -> String {
        format!(
            "https://{}.loadbalancers.api.rackspacecloud.com/v1.0",
            self.code().to_lowercase()
        )
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DFW" => Ok(Self::Dfw),
            "ORD" => Ok(Self::Ord),
            "LON" => Ok(Self::Lon),
            _ => Err(Error::ValidationError(format!("Unknown region: {s}"))),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

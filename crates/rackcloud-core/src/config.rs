//! Configuration structures for Rackspace Cloud clients.
//!
//! [`CloudConfig`] carries the account credentials, the region, and optional
//! endpoint overrides. It is serde-friendly (the API key is never serialized)
//! and validated with `validator`.

use crate::error::Error;
use crate::types::Region;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the account user name.
pub const ENV_USERNAME: &str = "RACKSPACE_USERNAME";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "RACKSPACE_API_KEY";
/// Environment variable holding the region code.
pub const ENV_REGION: &str = "RACKSPACE_REGION";
/// Environment variable overriding the authentication URL.
pub const ENV_AUTH_URL: &str = "RACKSPACE_AUTH_URL";

/// Configuration for a Rackspace Cloud client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CloudConfig {
    /// Account user name
    #[validate(length(min = 1))]
    pub username: String,

    /// API key generated in the control panel
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1))]
    pub api_key: String,

    /// Datacenter region for the regional APIs
    #[serde(default)]
    pub region: Region,

    /// Authentication endpoint override
    #[validate(url)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Static endpoint overrides
    #[serde(default)]
    pub endpoints: ServiceEndpoints,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl CloudConfig {
    /// Create a new client configuration from account credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is empty.
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            username: username.into(),
            api_key: api_key.into(),
            region: Region::default(),
            auth_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
            endpoints: ServiceEndpoints::default(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;

        Ok(config)
    }

    /// Build a configuration from the `RACKSPACE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::ConfigError(format!("{key} is not set")))
        };

        let mut config = Self::new(required(ENV_USERNAME)?, required(ENV_API_KEY)?)?;

        if let Some(region) = lookup(ENV_REGION).filter(|value| !value.is_empty()) {
            config.region = region
                .parse()
                .map_err(|_| Error::ConfigError(format!("Invalid {ENV_REGION}: {region}")))?;
        }

        if let Some(auth_url) = lookup(ENV_AUTH_URL).filter(|value| !value.is_empty()) {
            config = config.with_auth_url(auth_url);
            config
                .validate()
                .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;
        }

        Ok(config)
    }

    /// Set the datacenter region.
    #[must_use]
    pub const fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Override the authentication URL.
    #[must_use]
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = Some(auth_url.into());
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set static endpoint overrides.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve and parse the authentication URL, falling back to the region default.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_auth_url(&self) -> Result<Url, Error> {
        let raw = self
            .auth_url
            .as_deref()
            .unwrap_or_else(|| self.region.auth_url());
        Url::parse(raw).map_err(|e| Error::ConfigError(format!("Invalid auth URL: {}", e)))
    }
}

/// Static service endpoint overrides.
///
/// Any endpoint left unset is derived from the authentication handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// Cloud Servers endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute: Option<ServiceEndpointConfig>,

    /// Cloud Load Balancers endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<ServiceEndpointConfig>,

    /// Cloud DNS endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<ServiceEndpointConfig>,
}

impl ServiceEndpoints {
    /// Create a new empty set of overrides.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            compute: None,
            load_balancer: None,
            dns: None,
        }
    }

    /// Set the compute endpoint.
    #[must_use]
    pub fn with_compute(mut self, endpoint: ServiceEndpointConfig) -> Self {
        self.compute = Some(endpoint);
        self
    }

    /// Set the load-balancer endpoint.
    #[must_use]
    pub fn with_load_balancer(mut self, endpoint: ServiceEndpointConfig) -> Self {
        self.load_balancer = Some(endpoint);
        self
    }

    /// Set the DNS endpoint.
    #[must_use]
    pub fn with_dns(mut self, endpoint: ServiceEndpointConfig) -> Self {
        self.dns = Some(endpoint);
        self
    }
}

/// Configuration for a single service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceEndpointConfig {
    /// Service base URL, including the account path
    #[validate(url)]
    pub url: String,
}

impl ServiceEndpointConfig {
    /// Create a new service endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let config = Self { url: url.into() };

        config.validate().map_err(|e| {
            Error::ConfigError(format!("Invalid endpoint configuration: {}", e))
        })?;

        Ok(config)
    }

    /// Parse and validate the URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_url(&self) -> Result<Url, Error> {
        Url::parse(&self.url)
            .map_err(|e| Error::ConfigError(format!("Invalid service URL: {}", e)))
    }
}

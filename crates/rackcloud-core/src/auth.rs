//! Authentication and per-account service endpoints.
//!
//! The v1.0 handshake exchanges a user name and API key for a token and the
//! compute management URL. The load-balancer and DNS endpoints are derived from
//! the account id found at the end of that URL.

use std::fmt;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::config::{CloudConfig, ServiceEndpointConfig, ServiceEndpoints};
use crate::error::{Error, Result};
use crate::types::{Region, ServiceTarget, DNS_API_ROOT};

/// Request header carrying the account user name during authentication.
pub const AUTH_USER_HEADER: &str = "X-Auth-User";
/// Request header carrying the API key during authentication.
pub const AUTH_KEY_HEADER: &str = "X-Auth-Key";
/// Header carrying the session token, on the handshake response and on every request.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Handshake response header carrying the compute endpoint.
pub const SERVER_MANAGEMENT_URL_HEADER: &str = "X-Server-Management-Url";

/// Account credentials supplied once at construction.
pub struct Credentials {
    username: String,
    api_key: SecretString,
}

impl Credentials {
    /// Create credentials from a user name and API key.
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    /// Take the credentials held by a [`CloudConfig`].
    #[must_use]
    pub fn from_config(config: &CloudConfig) -> Self {
        Self::new(config.username.clone(), config.api_key.clone())
    }

    /// Account user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Base URLs of the three sub-services for one account.
///
/// Every URL ends with `/` so resource paths can be joined onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    compute: Url,
    load_balancer: Url,
    dns: Url,
}

impl Endpoints {
    /// Parse the three base URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if any URL is invalid.
    pub fn parse(compute: &str, load_balancer: &str, dns: &str) -> Result<Self> {
        Ok(Self::new(
            Url::parse(compute)?,
            Url::parse(load_balancer)?,
            Url::parse(dns)?,
        ))
    }

    /// Build from already-parsed URLs.
    #[must_use]
    pub fn new(compute: Url, load_balancer: Url, dns: Url) -> Self {
        Self {
            compute: as_base(compute),
            load_balancer: as_base(load_balancer),
            dns: as_base(dns),
        }
    }

    /// Base URL for a sub-service.
    #[must_use]
    pub const fn for_target(&self, target: ServiceTarget) -> &Url {
        match target {
            ServiceTarget::Compute => &self.compute,
            ServiceTarget::LoadBalancer => &self.load_balancer,
            ServiceTarget::Dns => &self.dns,
        }
    }

    /// Derive the endpoints from the compute management URL.
    ///
    /// Overrides take precedence over the derived URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL carries no account id or an override is invalid.
    pub fn derive(
        management_url: &Url,
        region: Region,
        overrides: &ServiceEndpoints,
    ) -> Result<Self> {
        let account = account_id(management_url).ok_or_else(|| {
            Error::AuthenticationFailed(format!(
                "No account id in management URL `{management_url}`"
            ))
        })?;

        let compute = resolve(overrides.compute.as_ref(), || Ok(management_url.clone()))?;
        let load_balancer = resolve(overrides.load_balancer.as_ref(), || {
            Ok(Url::parse(&format!(
                "{}/{account}/",
                region.load_balancer_root()
            ))?)
        })?;
        let dns = resolve(overrides.dns.as_ref(), || {
            Ok(Url::parse(&format!("{DNS_API_ROOT}/{account}/"))?)
        })?;

        Ok(Self::new(compute, load_balancer, dns))
    }
}

fn resolve<F>(configured: Option<&ServiceEndpointConfig>, derived: F) -> Result<Url>
where
    F: FnOnce() -> Result<Url>,
{
    match configured {
        Some(endpoint) => endpoint.parse_url(),
        None => derived(),
    }
}

fn as_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Returns the last non-empty path segment of the management URL.
#[must_use]
pub fn account_id(management_url: &Url) -> Option<String> {
    management_url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// An authenticated session: token plus resolved endpoints.
pub struct Session {
    token: SecretString,
    endpoints: Endpoints,
}

impl Session {
    /// Create a session from a token and endpoints.
    pub fn new(token: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            token: SecretString::from(token.into()),
            endpoints,
        }
    }

    /// Token attached to every request.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Resolved service endpoints.
    #[must_use]
    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// Source of the authenticated session used by the dispatcher.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Return the current session, authenticating first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    async fn session(&self) -> Result<Arc<Session>>;
}

/// A pre-issued token with explicit endpoints.
#[derive(Debug, Clone)]
pub struct StaticSession {
    session: Arc<Session>,
}

impl StaticSession {
    /// Wrap a token and endpoints.
    pub fn new(token: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            session: Arc::new(Session::new(token, endpoints)),
        }
    }
}

#[async_trait::async_trait]
impl SessionProvider for StaticSession {
    async fn session(&self) -> Result<Arc<Session>> {
        Ok(Arc::clone(&self.session))
    }
}

/// Password (API key) authentication against the v1.0 auth endpoint.
///
/// The handshake runs once, on first use; the session is then cached for the
/// lifetime of the provider.
pub struct PasswordAuth {
    http: Client,
    auth_url: Url,
    credentials: Credentials,
    region: Region,
    overrides: ServiceEndpoints,
    cached: OnceCell<Arc<Session>>,
}

impl PasswordAuth {
    /// Create a provider from configuration, sharing an HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth URL is invalid.
    pub fn new(config: &CloudConfig, http: Client) -> Result<Self> {
        Ok(Self {
            http,
            auth_url: config.parse_auth_url()?,
            credentials: Credentials::from_config(config),
            region: config.region,
            overrides: config.endpoints.clone(),
            cached: OnceCell::new(),
        })
    }

    /// Returns true once the handshake has completed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.cached.initialized()
    }

    async fn authenticate(&self) -> Result<Arc<Session>> {
        debug!(url = %self.auth_url, user = %self.credentials.username(), "Authenticating");

        let response = self
            .http
            .get(self.auth_url.clone())
            .header(AUTH_USER_HEADER, self.credentials.username())
            .header(AUTH_KEY_HEADER, self.credentials.api_key())
            .send()
            .await?;

        let status = response.status();
        if !matches!(status.as_u16(), 200 | 204) {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::AuthenticationFailed(format!(
                "Auth endpoint returned {status}: {message}"
            )));
        }

        let headers = response.headers();
        let token = required_header(headers, AUTH_TOKEN_HEADER)?;
        let management_url = Url::parse(&required_header(headers, SERVER_MANAGEMENT_URL_HEADER)?)
            .map_err(|e| Error::AuthenticationFailed(format!("Invalid management URL: {e}")))?;

        let endpoints = Endpoints::derive(&management_url, self.region, &self.overrides)?;
        info!(
            user = %self.credentials.username(),
            compute = %endpoints.for_target(ServiceTarget::Compute),
            "Authenticated"
        );

        Ok(Arc::new(Session::new(token, endpoints)))
    }
}

impl fmt::Debug for PasswordAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordAuth")
            .field("auth_url", &self.auth_url.as_str())
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl SessionProvider for PasswordAuth {
    async fn session(&self) -> Result<Arc<Session>> {
        self.cached
            .get_or_try_init(|| self.authenticate())
            .await
            .map(Arc::clone)
    }
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::AuthenticationFailed(format!("Missing `{name}` response header")))
}

//! The shared request dispatcher.
//!
//! Every sub-service client builds a [`RequestSpec`], hands it to
//! [`Dispatcher::dispatch`] together with a [`ServiceTarget`], and checks the
//! returned [`DispatchOutcome`] against the operation's success codes.

use std::sync::Arc;

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use validator::Validate;

use crate::auth::{PasswordAuth, SessionProvider, AUTH_TOKEN_HEADER};
use crate::client::{ClientConfig, USER_AGENT};
use crate::config::CloudConfig;
use crate::error::{Error, Result};
use crate::query::QueryParams;
use crate::types::ServiceTarget;

/// One request: verb, resource path, query pairs and optional JSON body.
///
/// The path is relative to the sub-service base URL, e.g. `servers/detail`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: QueryParams,
    body: Option<Value>,
}

impl RequestSpec {
    /// Create a request with the given verb and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: None,
        }
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn with_json<B>(mut self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach an already-built JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// HTTP verb.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Resource path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs.
    #[must_use]
    pub const fn query(&self) -> &QueryParams {
        &self.query
    }

    /// JSON body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Status code and decoded body of exactly one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    status: StatusCode,
    body: Option<Value>,
}

impl DispatchOutcome {
    /// Build an outcome from its parts.
    #[must_use]
    pub const fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// Numeric status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Decoded body. A non-JSON body is kept as a JSON string.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns true if the status is one of `codes`.
    #[must_use]
    pub fn is_success_for(&self, codes: &[u16]) -> bool {
        codes.contains(&self.status())
    }

    /// Return the body if the status is one of `codes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] for any other status.
    pub fn require(self, codes: &[u16]) -> Result<Option<Value>> {
        if self.is_success_for(codes) {
            return Ok(self.body);
        }

        let message = match self.body {
            Some(Value::String(text)) => text,
            Some(value) => value.to_string(),
            None => self
                .status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        Err(Error::OperationFailed {
            status: self.status.as_u16(),
            message,
        })
    }

    /// Decode the body into `T` if the status is one of `codes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] for any other status, or
    /// [`Error::ParseError`] if the body is missing or has the wrong shape.
    pub fn into_json<T>(self, codes: &[u16]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = self.status();
        let body = self.require(codes)?.ok_or_else(|| {
            Error::ParseError(format!("Expected a JSON body with status {status}"))
        })?;
        serde_json::from_value(body).map_err(|err| {
            Error::ParseError(format!("Failed to decode response with status {status}: {err}"))
        })
    }

    /// Decode the value under `key` (e.g. `{"server": {..}}`) if the status is one of `codes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] for any other status, or
    /// [`Error::ParseError`] if the key is missing or has the wrong shape.
    pub fn into_keyed<T>(self, key: &str, codes: &[u16]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = self.status();
        let mut body = self.require(codes)?;
        let value = body
            .as_mut()
            .and_then(Value::as_object_mut)
            .and_then(|object| object.remove(key))
            .ok_or_else(|| {
                Error::ParseError(format!("Missing `{key}` in response with status {status}"))
            })?;
        serde_json::from_value(value).map_err(|err| {
            Error::ParseError(format!("Failed to decode `{key}` with status {status}: {err}"))
        })
    }

    /// Succeed with `()` if the status is one of `codes`, ignoring any body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] for any other status.
    pub fn into_unit(self, codes: &[u16]) -> Result<()> {
        self.require(codes).map(|_| ())
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    session: Arc<dyn SessionProvider>,
    http_config: ClientConfig,
}

impl DispatcherBuilder {
    /// Create a builder around a session provider.
    #[must_use]
    pub fn new(session: Arc<dyn SessionProvider>) -> Self {
        Self {
            session,
            http_config: ClientConfig::new(),
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Finalise the builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<Dispatcher> {
        let http = build_http_client(&self.http_config)?;
        Ok(Dispatcher {
            http,
            session: self.session,
            log_requests: self.http_config.enable_logging,
        })
    }
}

/// Sends authenticated requests to the compute, load-balancer and DNS APIs.
///
/// Cloning is cheap: clones share the connection pool and the session.
#[derive(Clone)]
pub struct Dispatcher {
    http: Client,
    session: Arc<dyn SessionProvider>,
    log_requests: bool,
}

impl Dispatcher {
    /// Start building a dispatcher around a session provider.
    #[must_use]
    pub fn builder(session: Arc<dyn SessionProvider>) -> DispatcherBuilder {
        DispatcherBuilder::new(session)
    }

    /// Build a dispatcher that authenticates with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &CloudConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        let http_config = ClientConfig::new()
            .with_timeout(config.timeout())
            .with_tls_verify(config.tls_verify);
        let http = build_http_client(&http_config)?;
        let auth = PasswordAuth::new(config, http.clone())?;

        Ok(Self {
            http,
            session: Arc::new(auth),
            log_requests: http_config.enable_logging,
        })
    }

    /// Perform one authenticated request and return its status and body.
    ///
    /// Any status code is returned as an outcome; only transport failures are
    /// errors. Redirects are not followed, so a `3xx` comes back as its own status.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the URL cannot be built, or
    /// the request cannot be sent.
    pub async fn dispatch(&self, target: ServiceTarget, spec: RequestSpec) -> Result<DispatchOutcome> {
        let session = self.session.session().await?;
        let base = session.endpoints().for_target(target);
        let relative = spec.path.trim_start_matches('/');
        let url = base.join(relative).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid {target} path `{relative}`: {err}"))
        })?;

        if self.log_requests {
            debug!(service = %target, method = %spec.method, path = %relative, "Sending request");
        }

        let mut request = self
            .http
            .request(spec.method.clone(), url)
            .header("Accept", "application/json")
            .header(AUTH_TOKEN_HEADER, session.token());

        if !spec.query.is_empty() {
            request = request.query(spec.query.as_pairs());
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if self.log_requests {
            debug!(service = %target, path = %relative, status = status.as_u16(), "Received response");
        }

        Ok(DispatchOutcome::new(status, decode_body(&bytes)))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("log_requests", &self.log_requests)
            .finish_non_exhaustive()
    }
}

fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .gzip(config.enable_compression)
        .redirect(Policy::none());

    if !config.tls_verify {
        warn!("TLS verification disabled for Rackspace Cloud client");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Endpoints, MockSessionProvider, Session, StaticSession};
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher_for(server: &MockServer) -> Dispatcher {
        let uri = server.uri();
        let endpoints = Endpoints::parse(
            &format!("{uri}/v1.0/123"),
            &format!("{uri}/lb/v1.0/123"),
            &format!("{uri}/dns/v1.0/123"),
        )
        .unwrap();
        Dispatcher::builder(Arc::new(StaticSession::new("test-token", endpoints)))
            .build()
            .unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_request_spec_builders() {
        let spec = RequestSpec::put("servers/1")
            .with_json(&json!({"server": {"name": "web01"}}))
            .unwrap();
        assert_eq!(spec.method(), &Method::PUT);
        assert_eq!(spec.path(), "servers/1");
        assert_eq!(spec.body(), Some(&json!({"server": {"name": "web01"}})));
        assert!(spec.query().is_empty());

        assert!(RequestSpec::delete("images/2").body().is_none());
    }

    #[test]
    fn test_outcome_require_success_and_failure() {
        let ok = DispatchOutcome::new(StatusCode::ACCEPTED, Some(json!({"a": 1})));
        assert_eq!(ok.clone().require(&[202]).unwrap(), Some(json!({"a": 1})));

        let err = ok.require(&[200, 203]).unwrap_err();
        assert_eq!(err.status(), Some(202));
    }

    #[test]
    fn test_outcome_failure_message_uses_body() {
        let text = DispatchOutcome::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            Some(Value::String("overLimit".to_string())),
        );
        assert_eq!(
            text.into_unit(&[202]).unwrap_err(),
            Error::OperationFailed {
                status: 413,
                message: "overLimit".to_string()
            }
        );

        let empty = DispatchOutcome::new(StatusCode::NOT_FOUND, None);
        assert_eq!(
            empty.into_unit(&[204]).unwrap_err(),
            Error::OperationFailed {
                status: 404,
                message: "Not Found".to_string()
            }
        );
    }

    #[test]
    fn test_outcome_into_json() {
        let outcome = DispatchOutcome::new(StatusCode::OK, Some(json!({"name": "web01"})));
        let named: Named = outcome.into_json(&[200, 203]).unwrap();
        assert_eq!(named.name, "web01");

        let missing = DispatchOutcome::new(StatusCode::OK, None);
        assert!(matches!(
            missing.into_json::<Named>(&[200]),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_outcome_into_keyed() {
        let outcome = DispatchOutcome::new(
            StatusCode::NON_AUTHORITATIVE_INFORMATION,
            Some(json!({"server": {"name": "web01"}})),
        );
        let named: Named = outcome.clone().into_keyed("server", &[200, 203]).unwrap();
        assert_eq!(named.name, "web01");

        assert!(matches!(
            outcome.into_keyed::<Named>("image", &[203]),
            Err(Error::ParseError(msg)) if msg.contains("`image`")
        ));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), None);
        assert_eq!(decode_body(b"  \n"), None);
        assert_eq!(decode_body(br#"{"x":1}"#), Some(json!({"x": 1})));
        assert_eq!(
            decode_body(b"Service Unavailable"),
            Some(Value::String("Service Unavailable".to_string()))
        );
    }

    #[tokio::test]
    async fn test_dispatch_get_sends_token_and_accept() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.0/123/servers/detail"))
            .and(header("X-Auth-Token", "test-token"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(203).set_body_json(json!({"servers": []})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = dispatcher_for(&server)
            .dispatch(ServiceTarget::Compute, RequestSpec::get("servers/detail"))
            .await
            .unwrap();

        assert_eq!(outcome.status(), 203);
        assert_eq!(outcome.body(), Some(&json!({"servers": []})));
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_target() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lb/v1.0/123/loadbalancers/protocols"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"protocols": []})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/dns/v1.0/123/domains"))
            .and(query_param("name", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"domains": []})))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server);
        let lb = dispatcher
            .dispatch(
                ServiceTarget::LoadBalancer,
                RequestSpec::get("/loadbalancers/protocols"),
            )
            .await
            .unwrap();
        assert_eq!(lb.status(), 200);

        let mut query = QueryParams::new();
        query.push("name", "example.com");
        let dns = dispatcher
            .dispatch(
                ServiceTarget::Dns,
                RequestSpec::get("domains").with_query(query),
            )
            .await
            .unwrap();
        assert_eq!(dns.status(), 200);
    }

    #[tokio::test]
    async fn test_dispatch_post_serializes_body() {
        let server = MockServer::start().await;
        let payload = json!({"image": {"serverId": 12, "name": "nightly"}});

        Mock::given(method("POST"))
            .and(path("/v1.0/123/images"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = dispatcher_for(&server)
            .dispatch(
                ServiceTarget::Compute,
                RequestSpec::post("images").with_json(&payload).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status(), 202);
        assert!(outcome.body().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_returns_error_statuses_as_outcomes() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1.0/123/servers/9"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"itemNotFound": {"code": 404, "message": "Not found"}})),
            )
            .mount(&server)
            .await;

        let outcome = dispatcher_for(&server)
            .dispatch(ServiceTarget::Compute, RequestSpec::delete("servers/9"))
            .await
            .unwrap();
        assert_eq!(outcome.status(), 404);

        let err = outcome.into_unit(&[202]).unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("itemNotFound"));
    }

    #[tokio::test]
    async fn test_dispatch_does_not_follow_redirects() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.0/123/servers/1"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/elsewhere"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/elsewhere"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"server": {"id": 99, "name": "other"}})),
            )
            .expect(0)
            .mount(&server)
            .await;

        let outcome = dispatcher_for(&server)
            .dispatch(ServiceTarget::Compute, RequestSpec::get("servers/1"))
            .await
            .unwrap();
        assert_eq!(outcome.status(), 302);

        let err = outcome.into_keyed::<Named>("server", &[200, 203]).unwrap_err();
        assert!(matches!(err, Error::OperationFailed { status: 302, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_transport_failure_is_not_a_status() {
        let endpoints = Endpoints::parse(
            "http://127.0.0.1:1/v1.0/123",
            "http://127.0.0.1:1/lb",
            "http://127.0.0.1:1/dns",
        )
        .unwrap();
        let dispatcher = Dispatcher::builder(Arc::new(StaticSession::new("t", endpoints)))
            .build()
            .unwrap();

        let err = dispatcher
            .dispatch(ServiceTarget::Compute, RequestSpec::get("limits"))
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_propagates_session_failure() {
        let mut provider = MockSessionProvider::new();
        provider
            .expect_session()
            .times(1)
            .returning(|| Err(Error::AuthenticationFailed("expired".to_string())));

        let dispatcher = Dispatcher::builder(Arc::new(provider)).build().unwrap();
        let err = dispatcher
            .dispatch(ServiceTarget::Dns, RequestSpec::get("domains"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_dispatch_uses_mocked_session_endpoints() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("GET"))
            .and(path("/v1.0/77/limits"))
            .and(header("X-Auth-Token", "from-mock"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"limits": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let mut provider = MockSessionProvider::new();
        provider.expect_session().returning(move || {
            let endpoints = Endpoints::parse(
                &format!("{uri}/v1.0/77"),
                &format!("{uri}/lb/v1.0/77"),
                &format!("{uri}/dns/v1.0/77"),
            )?;
            Ok(Arc::new(Session::new("from-mock", endpoints)))
        });

        let dispatcher = Dispatcher::builder(Arc::new(provider))
            .with_http_config(ClientConfig::new().with_logging(false))
            .build()
            .unwrap();
        let outcome = dispatcher
            .dispatch(ServiceTarget::Compute, RequestSpec::get("limits"))
            .await
            .unwrap();
        assert_eq!(outcome.status(), 200);
    }
}

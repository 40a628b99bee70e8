//! Asynchronous Cloud DNS client implementation.

use crate::models::{Domain, DomainPage, ListDomainsRequest, Record};
use crate::Result;
use rackcloud_core::ids::DomainId;
use rackcloud_core::query::QueryParams;
use rackcloud_core::{CloudConfig, DispatchOutcome, Dispatcher, RequestSpec, ServiceTarget};
use tracing::debug;

/// Asynchronous client for Cloud DNS.
#[derive(Debug, Clone)]
pub struct DnsClient {
    dispatcher: Dispatcher,
}

impl DnsClient {
    /// Create a client on top of a shared dispatcher.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Create a client that authenticates with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &CloudConfig) -> Result<Self> {
        Ok(Self::new(Dispatcher::from_config(config)?))
    }

    /// Return the underlying dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// List domains on the account.
    ///
    /// The provider answers `200`, or `202` while the listing is still being
    /// assembled; both are accepted.
    pub async fn list_domains(&self, request: &ListDomainsRequest) -> Result<DomainPage> {
        let path = if request.detailed {
            "domains/detail"
        } else {
            "domains"
        };

        let mut query = QueryParams::new();
        query.push_opt("name", request.name.as_deref().filter(|name| !name.is_empty()));

        debug!(detailed = request.detailed, filter = ?request.name, "Listing domains");
        self.send(RequestSpec::get(path).with_query(query))
            .await?
            .into_json(&[200, 202])
    }

    /// Fetch a single domain.
    pub async fn get_domain(&self, id: DomainId) -> Result<Domain> {
        self.send(RequestSpec::get(format!("domains/{id}")))
            .await?
            .into_json(&[200])
    }

    /// List the records of a domain.
    pub async fn list_records(&self, id: DomainId) -> Result<Vec<Record>> {
        self.send(RequestSpec::get(format!("domains/{id}/records")))
            .await?
            .into_keyed("records", &[200])
    }

    /// Delete a domain and its records.
    pub async fn delete_domain(&self, id: DomainId) -> Result<()> {
        self.send(RequestSpec::delete(format!("domains/{id}")))
            .await?
            .into_unit(&[202])
    }

    async fn send(&self, spec: RequestSpec) -> Result<DispatchOutcome> {
        self.dispatcher.dispatch(ServiceTarget::Dns, spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackcloud_core::{Endpoints, Error, StaticSession};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> DnsClient {
        let uri = server.uri();
        let endpoints = Endpoints::parse(
            &format!("{uri}/v1.0/123"),
            &format!("{uri}/lb/v1.0/123"),
            &format!("{uri}/dns/v1.0/123"),
        )
        .unwrap();
        let dispatcher = Dispatcher::builder(Arc::new(StaticSession::new("token", endpoints)))
            .build()
            .unwrap();
        DnsClient::new(dispatcher)
    }

    #[tokio::test]
    async fn list_domains_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dns/v1.0/123/domains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domains": [
                    {"id": 2725233, "name": "example.com", "accountId": 123},
                    {"id": 2725257, "name": "sub1.example.com", "accountId": 123}
                ],
                "totalEntries": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server)
            .list_domains(&ListDomainsRequest::default())
            .await
            .unwrap();
        assert_eq!(page.domains.len(), 2);
        assert_eq!(page.total_entries, Some(2));
        assert_eq!(page.domains[1].name, "sub1.example.com");
    }

    #[tokio::test]
    async fn list_domains_detailed_with_filter_accepts_202() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dns/v1.0/123/domains/detail"))
            .and(query_param("name", "example.com"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "domains": [{
                    "id": 2725233, "name": "example.com", "ttl": 300,
                    "emailAddress": "admin@example.com"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ListDomainsRequest::default()
            .detailed()
            .with_name("example.com");
        let page = test_client(&server).list_domains(&request).await.unwrap();
        assert_eq!(page.domains[0].ttl, Some(300));
        assert!(page.total_entries.is_none());
    }

    #[tokio::test]
    async fn list_domains_rejects_other_codes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dns/v1.0/123/domains"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .list_domains(&ListDomainsRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OperationFailed { status: 401, .. }));
    }

    #[tokio::test]
    async fn get_domain_with_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dns/v1.0/123/domains/2725233"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 2725233,
                "name": "example.com",
                "recordsList": {
                    "records": [
                        {"id": "A-6817754", "name": "example.com", "type": "A", "data": "192.0.2.17", "ttl": 3600},
                        {"id": "NS-6251982", "name": "example.com", "type": "NS", "data": "dns1.stabletransit.com", "ttl": 3600}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let domain = test_client(&server)
            .get_domain(DomainId::new(2_725_233))
            .await
            .unwrap();
        assert_eq!(domain.records().len(), 2);
        assert_eq!(domain.records()[1].kind, "NS");
    }

    #[tokio::test]
    async fn get_domain_rejects_202() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dns/v1.0/123/domains/1"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": 1, "name": "x.com"})))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .get_domain(DomainId::new(1))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(202));
    }

    #[tokio::test]
    async fn list_records_and_delete_domain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dns/v1.0/123/domains/10/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    {"id": "MX-3151218", "name": "example.com", "type": "MX", "data": "mail.example.com", "priority": 5}
                ],
                "totalEntries": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/dns/v1.0/123/domains/10"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "status": "RUNNING", "jobId": "b5d3a2f0"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let records = client.list_records(DomainId::new(10)).await.unwrap();
        assert_eq!(records[0].priority, Some(5));
        client.delete_domain(DomainId::new(10)).await.unwrap();
    }

    #[derive(Debug, Clone, Copy)]
    enum Operation {
        ListDomains,
        GetDomain,
        ListRecords,
        DeleteDomain,
    }

    async fn invoke(client: &DnsClient, operation: Operation) -> Result<()> {
        let id = DomainId::new(10);
        match operation {
            Operation::ListDomains => client
                .list_domains(&ListDomainsRequest::default())
                .await
                .map(drop),
            Operation::GetDomain => client.get_domain(id).await.map(drop),
            Operation::ListRecords => client.list_records(id).await.map(drop),
            Operation::DeleteDomain => client.delete_domain(id).await,
        }
    }

    #[tokio::test]
    async fn operations_reject_codes_outside_their_success_set() {
        let cases = [
            (Operation::ListDomains, 203),
            (Operation::ListDomains, 204),
            (Operation::GetDomain, 203),
            (Operation::GetDomain, 404),
            (Operation::ListRecords, 202),
            (Operation::ListRecords, 203),
            (Operation::DeleteDomain, 200),
            (Operation::DeleteDomain, 204),
        ];

        for (operation, code) in cases {
            let server = MockServer::start().await;
            let template = if code == 204 {
                ResponseTemplate::new(code)
            } else {
                ResponseTemplate::new(code).set_body_json(json!({"code": code}))
            };
            Mock::given(any())
                .respond_with(template)
                .expect(1)
                .mount(&server)
                .await;

            let err = invoke(&test_client(&server), operation)
                .await
                .expect_err(&format!("{operation:?} accepted {code}"));
            assert_eq!(err.status(), Some(code), "{operation:?} with {code}");
        }
    }
}

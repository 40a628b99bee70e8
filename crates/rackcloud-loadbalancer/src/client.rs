//! Asynchronous Cloud Load Balancers client implementation.

use crate::models::{
    Algorithm, CreateLoadBalancerRequest, LoadBalancer, Node, NodeCondition, PendingNode,
    PersistenceType, Protocol, SessionPersistence, UpdateLoadBalancerRequest, UpdateNodeRequest,
    UsageRecord, VirtualIp,
};
use crate::Result;
use chrono::NaiveDate;
use rackcloud_core::ids::{LoadBalancerId, NodeId};
use rackcloud_core::naming::{ensure_unique_name, sanitize_name};
use rackcloud_core::query::QueryParams;
use rackcloud_core::{CloudConfig, DispatchOutcome, Dispatcher, Error, RequestSpec, ServiceTarget};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

/// Success codes for reads.
const READ_OK: &[u16] = &[200, 203];

/// Date format accepted by the usage report.
const USAGE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize)]
struct AlgorithmEntry {
    name: Algorithm,
}

/// Asynchronous client for Cloud Load Balancers.
///
/// Nodes queued with [`LoadBalancersClient::add_node`] are sent with the next
/// [`create_load_balancer`](LoadBalancersClient::create_load_balancer) or
/// [`add_nodes`](LoadBalancersClient::add_nodes) call and cleared once it succeeds.
#[derive(Debug, Clone)]
pub struct LoadBalancersClient {
    dispatcher: Dispatcher,
    pending_nodes: Vec<PendingNode>,
}

impl LoadBalancersClient {
    /// Create a client on top of a shared dispatcher.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            pending_nodes: Vec::new(),
        }
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

    /// List balancers on the account.
    pub async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        self.send(RequestSpec::get("loadbalancers"))
            .await?
            .into_keyed("loadBalancers", READ_OK)
    }

    /// Fetch a single balancer with its nodes and virtual IPs.
    pub async fn get_load_balancer(&self, id: LoadBalancerId) -> Result<LoadBalancer> {
        self.send(RequestSpec::get(format!("loadbalancers/{id}")))
            .await?
            .into_keyed("loadBalancer", READ_OK)
    }

    /// Queue a node for the next create or add-nodes call.
    pub fn add_node(&mut self, address: impl Into<String>, port: u16, enabled: bool) -> &[PendingNode] {
        let condition = if enabled {
            NodeCondition::Enabled
        } else {
            NodeCondition::Disabled
        };
        self.pending_nodes.push(PendingNode {
            address: address.into(),
            port,
            condition,
        });
        &self.pending_nodes
    }

    /// Nodes queued so far, in insertion order.
    #[must_use]
    pub fn pending_nodes(&self) -> &[PendingNode] {
        &self.pending_nodes
    }

    /// Drop every queued node.
    pub fn clear_pending_nodes(&mut self) {
        self.pending_nodes.clear();
    }

    /// Create a balancer from the queued nodes.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no node is queued or the name is unusable
    /// or already taken (ignoring case), and [`Error::OperationFailed`] if the
    /// provider does not answer `202`. The queue is kept on failure.
    pub async fn create_load_balancer(
        &mut self,
        request: &CreateLoadBalancerRequest,
    ) -> Result<LoadBalancer> {
        self.ensure_pending("create a load balancer")?;
        let name = sanitize_name(&request.name)?;

        let existing = self.list_load_balancers().await?;
        ensure_unique_name(
            "Load balancer",
            &name,
            existing.iter().map(|balancer| &balancer.name),
        )?;

        debug!(name = %name, nodes = self.pending_nodes.len(), "Creating load balancer");
        let spec = RequestSpec::post("loadbalancers").with_json(&json!({
            "loadBalancer": {
                "name": name,
                "port": request.port,
                "protocol": request.protocol,
                "virtualIps": [request.virtual_ip.to_wire()],
                "nodes": self.pending_nodes,
            }
        }))?;
        let balancer: LoadBalancer = self.send(spec).await?.into_keyed("loadBalancer", &[202])?;

        self.pending_nodes.clear();
        info!(balancer = %balancer.id, name = %balancer.name, "Load balancer creation accepted");
        Ok(balancer)
    }

    /// Change a balancer's name, algorithm, protocol or port.
    pub async fn update_load_balancer(
        &self,
        id: LoadBalancerId,
        request: &UpdateLoadBalancerRequest,
    ) -> Result<()> {
        if request.is_empty() {
            return Err(Error::ValidationError(
                "Load balancer update changes nothing".to_string(),
            ));
        }
        let spec = RequestSpec::put(format!("loadbalancers/{id}"))
            .with_json(&json!({ "loadBalancer": request }))?;
        self.send(spec).await?.into_unit(&[202])
    }

    /// Delete a balancer.
    pub async fn delete_load_balancer(&self, id: LoadBalancerId) -> Result<()> {
        self.send(RequestSpec::delete(format!("loadbalancers/{id}")))
            .await?
            .into_unit(&[202])
    }

    /// List a balancer's nodes.
    pub async fn list_nodes(&self, id: LoadBalancerId) -> Result<Vec<Node>> {
        self.send(RequestSpec::get(format!("loadbalancers/{id}/nodes")))
            .await?
            .into_keyed("nodes", &[200])
    }

    /// Fetch a single node.
    pub async fn get_node(&self, id: LoadBalancerId, node: NodeId) -> Result<Node> {
        self.send(RequestSpec::get(format!("loadbalancers/{id}/nodes/{node}")))
            .await?
            .into_keyed("node", &[200])
    }

    /// Attach the queued nodes to an existing balancer.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no node is queued, and
    /// [`Error::OperationFailed`] if the provider does not answer `202`.
    pub async fn add_nodes(&mut self, id: LoadBalancerId) -> Result<Vec<Node>> {
        self.ensure_pending("add nodes")?;

        let spec = RequestSpec::post(format!("loadbalancers/{id}/nodes"))
            .with_json(&json!({ "nodes": self.pending_nodes }))?;
        let nodes: Vec<Node> = self.send(spec).await?.into_keyed("nodes", &[202])?;

        self.pending_nodes.clear();
        info!(balancer = %id, added = nodes.len(), "Nodes added");
        Ok(nodes)
    }

    /// Change a node's condition or weight.
    pub async fn update_node(
        &self,
        id: LoadBalancerId,
        node: NodeId,
        request: &UpdateNodeRequest,
    ) -> Result<()> {
        if request.condition.is_none() && request.weight.is_none() {
            return Err(Error::ValidationError(
                "Node update changes nothing".to_string(),
            ));
        }
        let spec = RequestSpec::put(format!("loadbalancers/{id}/nodes/{node}"))
            .with_json(&json!({ "node": request }))?;
        self.send(spec).await?.into_unit(&[202])
    }

    /// Detach a node from a balancer.
    pub async fn remove_node(&self, id: LoadBalancerId, node: NodeId) -> Result<()> {
        self.send(RequestSpec::delete(format!("loadbalancers/{id}/nodes/{node}")))
            .await?
            .into_unit(&[202])
    }

    /// List a balancer's virtual IPs.
    pub async fn list_virtual_ips(&self, id: LoadBalancerId) -> Result<Vec<VirtualIp>> {
        self.send(RequestSpec::get(format!("loadbalancers/{id}/virtualips")))
            .await?
            .into_keyed("virtualIps", &[200, 202])
    }

    /// List supported protocols and their default ports.
    pub async fn list_protocols(&self) -> Result<Vec<Protocol>> {
        self.send(RequestSpec::get("loadbalancers/protocols"))
            .await?
            .into_keyed("protocols", READ_OK)
    }

    /// List supported balancing algorithms.
    pub async fn list_algorithms(&self) -> Result<Vec<Algorithm>> {
        let entries: Vec<AlgorithmEntry> = self
            .send(RequestSpec::get("loadbalancers/algorithms"))
            .await?
            .into_keyed("algorithms", READ_OK)?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Fetch usage records, optionally bounded by start and end dates.
    pub async fn usage_report(
        &self,
        id: LoadBalancerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<UsageRecord>> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Error::ValidationError(format!(
                    "Usage window starts ({start}) after it ends ({end})"
                )));
            }
        }

        let mut query = QueryParams::new();
        let day = |date: NaiveDate| date.format(USAGE_DATE_FORMAT).to_string();
        query.push_opt_with("startTime", start, day);
        query.push_opt_with("endTime", end, day);

        self.send(RequestSpec::get(format!("loadbalancers/{id}/usage")).with_query(query))
            .await?
            .into_keyed("loadBalancerUsageRecords", &[200])
    }

    /// Fetch a balancer's session persistence setting.
    ///
    /// Returns `None` when persistence is disabled.
    pub async fn get_session_persistence(
        &self,
        id: LoadBalancerId,
    ) -> Result<Option<SessionPersistence>> {
        let body = self
            .send(RequestSpec::get(format!("loadbalancers/{id}/sessionpersistence")))
            .await?
            .require(&[200])?;

        let Some(mut body) = body else {
            return Ok(None);
        };
        match body.get_mut("sessionPersistence").map(serde_json::Value::take) {
            Some(value) if value.get("persistenceType").is_some() => {
                Ok(Some(serde_json::from_value(value)?))
            }
            _ => Ok(None),
        }
    }

    /// Enable session persistence.
    pub async fn set_session_persistence(
        &self,
        id: LoadBalancerId,
        persistence: PersistenceType,
    ) -> Result<()> {
        let spec = RequestSpec::put(format!("loadbalancers/{id}/sessionpersistence")).with_json(
            &json!({ "sessionPersistence": SessionPersistence { persistence_type: persistence } }),
        )?;
        self.send(spec).await?.into_unit(&[202])
    }

    /// Disable session persistence.
    pub async fn disable_session_persistence(&self, id: LoadBalancerId) -> Result<()> {
        self.send(RequestSpec::delete(format!(
            "loadbalancers/{id}/sessionpersistence"
        )))
        .await?
        .into_unit(&[202])
    }

    fn ensure_pending(&self, action: &str) -> Result<()> {
        if self.pending_nodes.is_empty() {
            return Err(Error::ValidationError(format!(
                "At least one node must be added before you {action}"
            )));
        }
        Ok(())
    }

    async fn send(&self, spec: RequestSpec) -> Result<DispatchOutcome> {
        self.dispatcher
            .dispatch(ServiceTarget::LoadBalancer, spec)
            .await
    }
}

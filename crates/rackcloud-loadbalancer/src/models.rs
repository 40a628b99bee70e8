//! Cloud Load Balancers models.

use rackcloud_core::ids::{LoadBalancerId, NodeId, VirtualIpId};
use rackcloud_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

rackcloud_core::provider_enum!(
    /// Balancing algorithm.
    Algorithm, "load balancing algorithm", {
        /// Fewest open connections.
        LeastConnections => "LEAST_CONNECTIONS",
        /// Random node.
        Random => "RANDOM",
        /// Rotate through nodes.
        RoundRobin => "ROUND_ROBIN",
        /// Fewest connections, scaled by node weight.
        WeightedLeastConnections => "WEIGHTED_LEAST_CONNECTIONS",
        /// Rotation scaled by node weight.
        WeightedRoundRobin => "WEIGHTED_ROUND_ROBIN",
    }
);

rackcloud_core::provider_enum!(
    /// Session persistence mode.
    PersistenceType, "session persistence type", {
        /// Cookie inserted by the balancer.
        HttpCookie => "HTTP_COOKIE",
        /// Pin by client address.
        SourceIp => "SOURCE_IP",
    }
);

rackcloud_core::provider_enum!(
    /// Whether a node receives traffic.
    NodeCondition, "node condition", {
        /// Receives traffic.
        Enabled => "ENABLED",
        /// Receives no traffic.
        Disabled => "DISABLED",
        /// Finishes existing connections only.
        Draining => "DRAINING",
    }
);

/// Timestamp wrapper used by the load-balancer API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiTime {
    /// ISO 8601 time.
    pub time: String,
}

/// A load balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    /// Balancer id.
    pub id: LoadBalancerId,
    /// Balancer name.
    pub name: String,
    /// Protocol name (e.g. `HTTP`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Listening port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Balancing algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    /// Status (`BUILD`, `ACTIVE`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Virtual IPs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_ips: Vec<VirtualIp>,
    /// Back-end nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    /// Session persistence setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_persistence: Option<SessionPersistence>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<ApiTime>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<ApiTime>,
}

/// A virtual IP attached to a balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualIp {
    /// Virtual IP id.
    pub id: VirtualIpId,
    /// Address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// `PUBLIC` or `SERVICENET`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `IPV4` or `IPV6`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<String>,
}

/// A back-end node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    /// Node id.
    pub id: NodeId,
    /// Node address.
    pub address: String,
    /// Node port.
    pub port: u16,
    /// Node condition.
    pub condition: NodeCondition,
    /// Health status (`ONLINE`, `OFFLINE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Weight for the weighted algorithms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// A node queued client-side for the next create or add-nodes call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingNode {
    /// Node address.
    pub address: String,
    /// Node port.
    pub port: u16,
    /// `ENABLED` or `DISABLED`.
    pub condition: NodeCondition,
}

/// Virtual IP to attach to a new balancer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VirtualIpSpec {
    /// A new public address.
    #[default]
    Public,
    /// A new ServiceNet address.
    ServiceNet,
    /// An existing virtual IP, shared with another balancer.
    Existing(VirtualIpId),
}

impl VirtualIpSpec {
    /// Wire form: `{"type": ..}` for new addresses, `{"id": ..}` for existing ones.
    #[must_use]
    pub fn to_wire(self) -> Value {
        match self {
            Self::Public => json!({ "type": "PUBLIC" }),
            Self::ServiceNet => json!({ "type": "SERVICENET" }),
            Self::Existing(id) => json!({ "id": id.get() }),
        }
    }
}

impl FromStr for VirtualIpSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PUBLIC" => Ok(Self::Public),
            "SERVICENET" => Ok(Self::ServiceNet),
            other => other.parse::<VirtualIpId>().map(Self::Existing).map_err(|_| {
                Error::ValidationError(format!(
                    "Virtual IP must be PUBLIC, SERVICENET or an existing id, got `{s}`"
                ))
            }),
        }
    }
}

/// Parameters for a new balancer; nodes come from the pending list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLoadBalancerRequest {
    /// Requested name; sanitized before use.
    pub name: String,
    /// Listening port.
    pub port: u16,
    /// Protocol name as listed by the protocols call.
    pub protocol: String,
    /// Virtual IP to attach.
    pub virtual_ip: VirtualIpSpec,
}

impl CreateLoadBalancerRequest {
    /// Create a request with a public virtual IP.
    pub fn new(name: impl Into<String>, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port,
            protocol: protocol.into(),
            virtual_ip: VirtualIpSpec::Public,
        }
    }

    /// Choose the virtual IP.
    #[must_use]
    pub fn with_virtual_ip(mut self, virtual_ip: VirtualIpSpec) -> Self {
        self.virtual_ip = virtual_ip;
        self
    }
}

/// Balancer attributes to change.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateLoadBalancerRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    /// New protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// New port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl UpdateLoadBalancerRequest {
    /// Returns true if nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.algorithm.is_none()
            && self.protocol.is_none()
            && self.port.is_none()
    }
}

/// Node attributes to change.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct UpdateNodeRequest {
    /// New condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<NodeCondition>,
    /// New weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// A supported protocol and its default port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Protocol {
    /// Protocol name.
    pub name: String,
    /// Default port.
    pub port: u16,
}

/// Session persistence setting of a balancer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionPersistence {
    /// Persistence mode.
    pub persistence_type: PersistenceType,
}

/// One usage record of a balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Record id.
    pub id: u64,
    /// Average concurrent connections.
    #[serde(default)]
    pub average_num_connections: f64,
    /// Bytes received.
    #[serde(default)]
    pub incoming_transfer: u64,
    /// Bytes sent.
    #[serde(default)]
    pub outgoing_transfer: u64,
    /// Number of virtual IPs.
    #[serde(default)]
    pub num_vips: u32,
    /// Number of polls in the period.
    #[serde(default)]
    pub num_polls: u32,
    /// Period start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Period end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Virtual IP type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_type: Option<String>,
    /// Event that closed the record, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

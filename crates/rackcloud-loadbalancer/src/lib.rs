//! Cloud Load Balancers client and data models.
//!
//! Balancers are created from a client-side queue of pending nodes; see
//! [`LoadBalancersClient::add_node`].

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::LoadBalancersClient;
pub use models::{
    Algorithm, CreateLoadBalancerRequest, LoadBalancer, Node, NodeCondition, PendingNode,
    PersistenceType, Protocol, SessionPersistence, UpdateLoadBalancerRequest, UpdateNodeRequest,
    UsageRecord, VirtualIp, VirtualIpSpec,
};

/// Convenient result alias using the shared error type.
pub type Result<T> = rackcloud_core::Result<T>;

//! Integration tests for parsing Cloud Load Balancers data.

use rackcloud_core::ids::{LoadBalancerId, NodeId};
use rackcloud_loadbalancer::models::{
    Algorithm, LoadBalancer, NodeCondition, PersistenceType, Protocol, UsageRecord,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_keyed<T: DeserializeOwned>(file: &str, key: &str) -> T {
    let fixture_path = fixtures_dir().join(file);
    let json_data = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });

    let mut document: Value = serde_json::from_str(&json_data)
        .unwrap_or_else(|e| panic!("Invalid JSON in {file}: {e}"));
    let inner = document
        .get_mut(key)
        .map(Value::take)
        .unwrap_or_else(|| panic!("Fixture {file} has no `{key}` key"));

    serde_json::from_value(inner)
        .unwrap_or_else(|e| panic!("Failed to deserialize `{key}` from {file}: {e}"))
}

#[test]
fn test_deserialize_load_balancer_list() {
    let balancers: Vec<LoadBalancer> = load_keyed("loadbalancers_list.json", "loadBalancers");

    assert_eq!(balancers.len(), 2);
    assert_eq!(balancers[0].id, LoadBalancerId::new(71));
    assert_eq!(balancers[1].algorithm, Some(Algorithm::WeightedRoundRobin));
    assert_eq!(balancers[1].virtual_ips[0].kind.as_deref(), Some("SERVICENET"));
    assert!(balancers.iter().all(|b| b.nodes.is_empty()));
}

#[test]
fn test_deserialize_load_balancer_detail() {
    let balancer: LoadBalancer = load_keyed("loadbalancer_detail.json", "loadBalancer");

    assert_eq!(balancer.port, Some(80));
    assert_eq!(
        balancer.session_persistence.map(|p| p.persistence_type),
        Some(PersistenceType::HttpCookie)
    );
    assert_eq!(balancer.nodes.len(), 2);
    assert_eq!(balancer.nodes[1].id, NodeId::new(1411));
    assert_eq!(balancer.nodes[1].condition, NodeCondition::Draining);
    assert_eq!(balancer.nodes[1].weight, Some(2));
    assert_eq!(
        balancer.created.map(|t| t.time).as_deref(),
        Some("2010-11-30T03:23:42Z")
    );
}

#[test]
fn test_deserialize_usage_records() {
    let records: Vec<UsageRecord> = load_keyed("usage.json", "loadBalancerUsageRecords");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].event_type.as_deref(), Some("CREATE_LOADBALANCER"));
    assert!(records[1].event_type.is_none());
    assert_eq!(records[1].outgoing_transfer, 2000);
}

#[test]
fn test_deserialize_protocols() {
    let protocols: Vec<Protocol> = load_keyed("protocols.json", "protocols");

    assert_eq!(protocols.len(), 8);
    let https = protocols.iter().find(|p| p.name == "HTTPS").unwrap();
    assert_eq!(https.port, 443);
}

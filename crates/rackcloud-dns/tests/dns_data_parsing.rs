//! Integration tests for parsing Cloud DNS data.

use rackcloud_core::ids::DomainId;
use rackcloud_dns::models::{Domain, DomainPage};
use std::fs;
use std::path::PathBuf;

fn load_fixture(file: &str) -> String {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(file);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

#[test]
fn test_deserialize_domain_page() {
    let page: DomainPage = serde_json::from_str(&load_fixture("domains_detail.json"))
        .expect("Failed to deserialize domain listing");

    assert_eq!(page.total_entries, Some(2));
    assert_eq!(page.domains[0].id, DomainId::new(2_725_233));
    assert_eq!(page.domains[0].comment.as_deref(), Some("Optional domain comment..."));
    assert!(page.domains[1].comment.is_none());
    assert!(page.domains.iter().all(|d| d.records().is_empty()));
}

#[test]
fn test_deserialize_domain_with_records() {
    let domain: Domain = serde_json::from_str(&load_fixture("domain.json"))
        .expect("Failed to deserialize domain");

    let kinds: Vec<&str> = domain.records().iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, ["A", "MX", "NS"]);
    assert_eq!(domain.records()[1].priority, Some(5));
    assert_eq!(domain.email_address.as_deref(), Some("sample@rackspace.com"));
}

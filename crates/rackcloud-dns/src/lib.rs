//! Cloud DNS client and data models.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::DnsClient;
pub use models::{Domain, DomainPage, ListDomainsRequest, Record, RecordList};

/// Convenient result alias using the shared error type.
pub type Result<T> = rackcloud_core::Result<T>;

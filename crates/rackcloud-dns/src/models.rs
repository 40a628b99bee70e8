//! Cloud DNS models.

use rackcloud_core::ids::DomainId;
use serde::{Deserialize, Serialize};

/// A hosted domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Domain id.
    pub id: DomainId,
    /// Fully qualified name.
    pub name: String,
    /// Owning account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<u64>,
    /// Contact address for the SOA record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// Default TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Records, when the provider includes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_list: Option<RecordList>,
}

impl Domain {
    /// Records embedded in a detailed response, or an empty slice.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        self.records_list
            .as_ref()
            .map_or(&[][..], |list| list.records.as_slice())
    }
}

/// Embedded record list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordList {
    /// Records.
    #[serde(default)]
    pub records: Vec<Record>,
}

/// A DNS record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Record id, e.g. `A-6817754`.
    pub id: String,
    /// Owner name.
    pub name: String,
    /// Record type (`A`, `CNAME`, `MX`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Record data.
    pub data: String,
    /// TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Priority for `MX` and `SRV` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// One page of the domain listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DomainPage {
    /// Domains on this page.
    #[serde(default)]
    pub domains: Vec<Domain>,
    /// Total domains on the account matching the filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_entries: Option<u64>,
}

/// Options for listing domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDomainsRequest {
    /// Return full domain details.
    pub detailed: bool,
    /// Name filter; the provider matches it as a suffix.
    pub name: Option<String>,
}

impl ListDomainsRequest {
    /// Request the detailed listing.
    #[must_use]
    pub const fn detailed(mut self) -> Self {
        self.detailed = true;
        self
    }

    /// Filter by name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

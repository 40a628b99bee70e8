//! Cloud Servers models shared by requests and responses.

use rackcloud_core::ids::{FlavorId, ImageId, ServerId, SharedIpGroupId};
use rackcloud_core::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Account limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Limits {
    /// Rate limits per verb and URI.
    #[serde(default)]
    pub rate: Vec<RateLimit>,
    /// Absolute limits, keyed by name (e.g. `maxTotalRAMSize`).
    #[serde(default)]
    pub absolute: HashMap<String, i64>,
}

/// One rate limit entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimit {
    /// HTTP verb the limit applies to.
    pub verb: String,
    /// Human-readable URI pattern.
    #[serde(rename = "URI")]
    pub uri: String,
    /// Regular expression matched against request URIs.
    #[serde(rename = "regEx", default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Requests allowed per unit.
    pub value: u64,
    /// Requests remaining in the current window.
    pub remaining: u64,
    /// Window unit (`MINUTE`, `HOUR`, `DAY`).
    pub unit: String,
    /// Unix time at which the window resets.
    #[serde(rename = "resetTime", default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<i64>,
}

/// Server flavor (hardware configuration).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flavor {
    /// Flavor id.
    pub id: FlavorId,
    /// Flavor name.
    pub name: String,
    /// Memory in MB (detailed listings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<u64>,
    /// Disk in GB (detailed listings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
}

/// Server image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image id.
    pub id: ImageId,
    /// Image name.
    pub name: String,
    /// Server the image was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
    /// Image status (`ACTIVE`, `SAVING`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Progress percentage while saving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// Public and private addresses of a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Addresses {
    /// Public addresses.
    #[serde(default)]
    pub public: Vec<String>,
    /// Private (ServiceNet) addresses.
    #[serde(default)]
    pub private: Vec<String>,
}

/// Which addresses to list for a server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressKind {
    /// Public and private addresses.
    #[default]
    All,
    /// Public addresses only.
    Public,
    /// Private addresses only.
    Private,
}

impl AddressKind {
    /// Path suffix under `servers/{id}/ips`.
    #[must_use]
    pub const fn path_suffix(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Public => "/public",
            Self::Private => "/private",
        }
    }
}

/// Cloud server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /// Server id.
    pub id: ServerId,
    /// Server name.
    pub name: String,
    /// Image the server was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<ImageId>,
    /// Flavor of the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<FlavorId>,
    /// Opaque host identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    /// Server status (`BUILD`, `ACTIVE`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Build progress percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// Assigned addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Addresses>,
    /// Metadata key/value pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    /// Root password; only returned on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
    /// Shared IP group the server belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_ip_group_id: Option<SharedIpGroupId>,
}

/// Shared IP group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedIpGroup {
    /// Group id.
    pub id: SharedIpGroupId,
    /// Group name.
    pub name: String,
    /// Member servers (detailed responses).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerId>,
    /// Initial member (creation response).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerId>,
}

/// A file injected into a server at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalityFile {
    /// Absolute path on the server.
    pub path: String,
    /// Raw file contents; base64-encoded on the wire.
    pub contents: String,
}

/// Parameters for a new server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServerRequest {
    /// Requested name; sanitized before use.
    pub name: String,
    /// Image to build from.
    pub image_id: ImageId,
    /// Flavor to build with.
    pub flavor_id: FlavorId,
    /// Optional shared IP group.
    pub shared_ip_group_id: Option<SharedIpGroupId>,
}

impl CreateServerRequest {
    /// Create a request for the given name, image and flavor.
    pub fn new(name: impl Into<String>, image_id: ImageId, flavor_id: FlavorId) -> Self {
        Self {
            name: name.into(),
            image_id,
            flavor_id,
            shared_ip_group_id: None,
        }
    }

    /// Place the server in a shared IP group.
    #[must_use]
    pub const fn with_shared_ip_group(mut self, group: SharedIpGroupId) -> Self {
        self.shared_ip_group_id = Some(group);
        self
    }
}

/// Fields to change on an existing server.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New root password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
}

impl UpdateServerRequest {
    /// Returns true if nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.admin_pass.is_none()
    }
}

/// Reboot flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebootType {
    /// Graceful restart.
    #[default]
    Soft,
    /// Power cycle.
    Hard,
}

impl FromStr for RebootType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SOFT" => Ok(Self::Soft),
            "HARD" => Ok(Self::Hard),
            _ => Err(Error::ValidationError(format!(
                "Unsupported reboot type `{s}`"
            ))),
        }
    }
}

rackcloud_core::provider_enum!(
    /// Day of the week for the weekly backup.
    WeeklyBackup, "weekly backup day", {
        /// No weekly backup.
        Disabled => "DISABLED",
        /// Sunday.
        Sunday => "SUNDAY",
        /// Monday.
        Monday => "MONDAY",
        /// Tuesday.
        Tuesday => "TUESDAY",
        /// Wednesday.
        Wednesday => "WEDNESDAY",
        /// Thursday.
        Thursday => "THURSDAY",
        /// Friday.
        Friday => "FRIDAY",
        /// Saturday.
        Saturday => "SATURDAY",
    }
);

rackcloud_core::provider_enum!(
    /// Two-hour window (GMT) for the daily backup.
    DailyBackup, "daily backup window", {
        /// No daily backup.
        Disabled => "DISABLED",
        /// 00:00 to 02:00.
        H0000To0200 => "H_0000_0200",
        /// 02:00 to 04:00.
        H0200To0400 => "H_0200_0400",
        /// 04:00 to 06:00.
        H0400To0600 => "H_0400_0600",
        /// 06:00 to 08:00.
        H0600To0800 => "H_0600_0800",
        /// 08:00 to 10:00.
        H0800To1000 => "H_0800_1000",
        /// 10:00 to 12:00.
        H1000To1200 => "H_1000_1200",
        /// 12:00 to 14:00.
        H1200To1400 => "H_1200_1400",
        /// 14:00 to 16:00.
        H1400To1600 => "H_1400_1600",
        /// 16:00 to 18:00.
        H1600To1800 => "H_1600_1800",
        /// 18:00 to 20:00.
        H1800To2000 => "H_1800_2000",
        /// 20:00 to 22:00.
        H2000To2200 => "H_2000_2200",
        /// 22:00 to 00:00.
        H2200To0000 => "H_2200_0000",
    }
);

/// Backup schedule of a server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupSchedule {
    /// Whether scheduled backups run.
    pub enabled: bool,
    /// Weekly backup day.
    pub weekly: WeeklyBackup,
    /// Daily backup window.
    pub daily: DailyBackup,
}

impl BackupSchedule {
    /// Build a schedule from typed values.
    #[must_use]
    pub const fn new(enabled: bool, weekly: WeeklyBackup, daily: DailyBackup) -> Self {
        Self {
            enabled,
            weekly,
            daily,
        }
    }

    /// Build a schedule from provider strings, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either value is not an accepted constant.
    pub fn parse(enabled: bool, weekly: &str, daily: &str) -> Result<Self, Error> {
        Ok(Self::new(enabled, weekly.parse()?, daily.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_daily_backup_has_full_two_hour_grid() {
        assert_eq!(DailyBackup::ALL.len(), 13);
        assert_eq!(
            "h_1200_1400".parse::<DailyBackup>().unwrap(),
            DailyBackup::H1200To1400
        );
    }

    #[test]
    fn test_backup_enums_parse_case_insensitively() {
        assert_eq!(
            "thursday".parse::<WeeklyBackup>().unwrap(),
            WeeklyBackup::Thursday
        );
        assert_eq!(
            " Disabled ".parse::<DailyBackup>().unwrap(),
            DailyBackup::Disabled
        );
    }

    #[test]
    fn test_backup_enums_reject_unknown_values() {
        let err = "FUNDAY".parse::<WeeklyBackup>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("weekly backup day"));

        assert!("H_0100_0300".parse::<DailyBackup>().is_err());
        assert!(BackupSchedule::parse(true, "MONDAY", "noon").is_err());
    }

    #[test]
    fn test_backup_schedule_wire_format() {
        let schedule = BackupSchedule::parse(true, "monday", "h_0400_0600").unwrap();
        assert_eq!(
            serde_json::to_value(schedule).unwrap(),
            json!({"enabled": true, "weekly": "MONDAY", "daily": "H_0400_0600"})
        );
    }

    #[test]
    fn test_reboot_type() {
        assert_eq!("hard".parse::<RebootType>().unwrap(), RebootType::Hard);
        assert_eq!(RebootType::default(), RebootType::Soft);
        assert!("warm".parse::<RebootType>().is_err());
        assert_eq!(serde_json::to_value(RebootType::Hard).unwrap(), json!("HARD"));
    }

    #[test]
    fn test_update_server_request_skips_unset_fields() {
        let request = UpdateServerRequest {
            name: None,
            admin_pass: Some("s3cret".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"adminPass": "s3cret"})
        );
        assert!(UpdateServerRequest::default().is_empty());
    }

    #[test]
    fn test_address_kind_suffix() {
        assert_eq!(AddressKind::All.path_suffix(), "");
        assert_eq!(AddressKind::Public.path_suffix(), "/public");
        assert_eq!(AddressKind::Private.path_suffix(), "/private");
    }
}

//! Asynchronous Cloud Servers client implementation.

use crate::models::{
    AddressKind, Addresses, BackupSchedule, CreateServerRequest, Flavor, Image, Limits,
    PersonalityFile, RebootType, Server, SharedIpGroup, UpdateServerRequest,
};
use crate::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use rackcloud_core::ids::{FlavorId, ImageId, ServerId, SharedIpGroupId};
use rackcloud_core::naming::{ensure_unique_name, sanitize_name};
use rackcloud_core::{CloudConfig, DispatchOutcome, Dispatcher, Error, RequestSpec, ServiceTarget};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::{debug, info};

/// Success codes for reads.
const READ_OK: &[u16] = &[200, 203];

/// Metadata key recording the sanitized name a server was created with.
pub const ORIGINAL_NAME_KEY: &str = "Original Name";
/// Metadata key recording when a server was created.
pub const CREATION_KEY: &str = "Creation";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewServer<'a> {
    name: &'a str,
    image_id: ImageId,
    flavor_id: FlavorId,
    metadata: BTreeMap<&'static str, String>,
    personality: Vec<WireFile<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shared_ip_group_id: Option<SharedIpGroupId>,
}

#[derive(Serialize)]
struct WireFile<'a> {
    path: &'a str,
    contents: String,
}

/// Asynchronous client for Cloud Servers.
///
/// Files queued with [`ServersClient::add_server_file`] are injected into the
/// next server created through this client.
#[derive(Debug, Clone)]
pub struct ServersClient {
    dispatcher: Dispatcher,
    pending_files: Vec<PersonalityFile>,
}

impl ServersClient {
    /// Create a client on top of a shared dispatcher.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            pending_files: Vec::new(),
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

    /// Fetch the account's rate and absolute limits.
    pub async fn get_limits(&self) -> Result<Limits> {
        self.send(RequestSpec::get("limits"))
            .await?
            .into_keyed("limits", READ_OK)
    }

    /// List flavors, optionally with RAM and disk details.
    pub async fn list_flavors(&self, detailed: bool) -> Result<Vec<Flavor>> {
        self.send(RequestSpec::get(listing("flavors", detailed)))
            .await?
            .into_keyed("flavors", READ_OK)
    }

    /// Fetch a single flavor.
    pub async fn get_flavor(&self, id: FlavorId) -> Result<Flavor> {
        self.send(RequestSpec::get(format!("flavors/{id}")))
            .await?
            .into_keyed("flavor", READ_OK)
    }

    /// List images, optionally with status details.
    pub async fn list_images(&self, detailed: bool) -> Result<Vec<Image>> {
        self.send(RequestSpec::get(listing("images", detailed)))
            .await?
            .into_keyed("images", READ_OK)
    }

    /// Fetch a single image.
    pub async fn get_image(&self, id: ImageId) -> Result<Image> {
        self.send(RequestSpec::get(format!("images/{id}")))
            .await?
            .into_keyed("image", READ_OK)
    }

    /// Snapshot a server into a new image.
    pub async fn create_image(&self, server: ServerId, name: &str) -> Result<Image> {
        let spec = RequestSpec::post("images").with_json(&json!({
            "image": { "serverId": server, "name": name }
        }))?;
        let image: Image = self.send(spec).await?.into_keyed("image", &[200, 202])?;
        info!(image = %image.id, server = %server, "Image creation requested");
        Ok(image)
    }

    /// Delete an image.
    pub async fn delete_image(&self, id: ImageId) -> Result<()> {
        self.send(RequestSpec::delete(format!("images/{id}")))
            .await?
            .into_unit(&[204])
    }

    /// List servers, optionally with full details.
    pub async fn list_servers(&self, detailed: bool) -> Result<Vec<Server>> {
        self.send(RequestSpec::get(listing("servers", detailed)))
            .await?
            .into_keyed("servers", READ_OK)
    }

    /// Fetch a single server.
    pub async fn get_server(&self, id: ServerId) -> Result<Server> {
        self.send(RequestSpec::get(format!("servers/{id}")))
            .await?
            .into_keyed("server", READ_OK)
    }

    /// Queue a file to inject into the next created server.
    ///
    /// Queuing the same path again replaces its contents.
    pub fn add_server_file(
        &mut self,
        path: impl Into<String>,
        contents: impl Into<String>,
    ) -> &[PersonalityFile] {
        let path = path.into();
        let contents = contents.into();
        match self.pending_files.iter_mut().find(|file| file.path == path) {
            Some(existing) => existing.contents = contents,
            None => self.pending_files.push(PersonalityFile { path, contents }),
        }
        &self.pending_files
    }

    /// Files queued for the next server creation.
    #[must_use]
    pub fn pending_files(&self) -> &[PersonalityFile] {
        &self.pending_files
    }

    /// Drop every queued file.
    pub fn clear_server_files(&mut self) {
        self.pending_files.clear();
    }

    /// Create a server.
    ///
    /// The name is sanitized and checked against the current server listing
    /// (ignoring case) before anything is created. Queued files are sent as the
    /// server's personality and cleared once the server is accepted.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unusable or duplicate name, or
    /// [`Error::OperationFailed`] if the provider does not answer `202`.
    pub async fn create_server(&mut self, request: &CreateServerRequest) -> Result<Server> {
        let name = sanitize_name(&request.name)?;

        let existing = self.list_servers(false).await?;
        ensure_unique_name("Server", &name, existing.iter().map(|server| &server.name))?;

        let payload = NewServer {
            name: &name,
            image_id: request.image_id,
            flavor_id: request.flavor_id,
            metadata: creation_metadata(&name, Utc::now()),
            personality: self
                .pending_files
                .iter()
                .map(|file| WireFile {
                    path: &file.path,
                    contents: BASE64.encode(file.contents.as_bytes()),
                })
                .collect(),
            shared_ip_group_id: request.shared_ip_group_id,
        };
        debug!(name = %name, files = payload.personality.len(), "Creating server");

        let spec = RequestSpec::post("servers").with_json(&json!({ "server": payload }))?;
        let server: Server = self.send(spec).await?.into_keyed("server", &[202])?;

        self.pending_files.clear();
        info!(server = %server.id, name = %server.name, "Server creation accepted");
        Ok(server)
    }

    /// Rename a server and/or change its root password.
    pub async fn update_server(&self, id: ServerId, request: &UpdateServerRequest) -> Result<()> {
        if request.is_empty() {
            return Err(Error::ValidationError(
                "Server update needs a name or a password".to_string(),
            ));
        }
        let spec = RequestSpec::put(format!("servers/{id}")).with_json(&json!({ "server": request }))?;
        self.send(spec).await?.into_unit(&[202, 204])
    }

    /// Delete a server.
    pub async fn delete_server(&self, id: ServerId) -> Result<()> {
        self.send(RequestSpec::delete(format!("servers/{id}")))
            .await?
            .into_unit(&[202])
    }

    /// Rebuild a server from another image.
    pub async fn rebuild_server(&self, id: ServerId, image: ImageId) -> Result<()> {
        self.action(id, json!({ "rebuild": { "imageId": image } }), &[202])
            .await
    }

    /// Resize a server to another flavor.
    pub async fn resize_server(&self, id: ServerId, flavor: FlavorId) -> Result<()> {
        self.action(id, json!({ "resize": { "flavorId": flavor } }), &[202])
            .await
    }

    /// Confirm a pending resize.
    pub async fn confirm_resize(&self, id: ServerId) -> Result<()> {
        self.action(id, json!({ "confirmResize": null }), &[202, 204])
            .await
    }

    /// Revert a pending resize.
    pub async fn revert_resize(&self, id: ServerId) -> Result<()> {
        self.action(id, json!({ "revertResize": null }), &[202])
            .await
    }

    /// Reboot a server.
    pub async fn reboot_server(&self, id: ServerId, kind: RebootType) -> Result<()> {
        self.action(id, json!({ "reboot": { "type": kind } }), &[202])
            .await
    }

    /// List a server's addresses.
    pub async fn list_addresses(&self, id: ServerId, kind: AddressKind) -> Result<Addresses> {
        let outcome = self
            .send(RequestSpec::get(format!(
                "servers/{id}/ips{}",
                kind.path_suffix()
            )))
            .await?;
        match kind {
            AddressKind::All => outcome.into_keyed("addresses", READ_OK),
            AddressKind::Public | AddressKind::Private => outcome.into_json(READ_OK),
        }
    }

    /// Share a public IP of a server with its shared IP group.
    ///
    /// # Errors
    ///
    /// Returns a validation error, without sending anything, if `ip` is not an
    /// IP address.
    pub async fn share_ip(
        &self,
        server: ServerId,
        ip: &str,
        group: SharedIpGroupId,
        configure_server: bool,
    ) -> Result<()> {
        let ip = parse_ip(ip)?;
        let spec = RequestSpec::put(format!("servers/{server}/ips/public/{ip}")).with_json(
            &json!({
                "shareIp": { "sharedIpGroupId": group, "configureServer": configure_server }
            }),
        )?;
        self.send(spec).await?.into_unit(&[201, 202])
    }

    /// Stop sharing a public IP.
    ///
    /// # Errors
    ///
    /// Returns a validation error, without sending anything, if `ip` is not an
    /// IP address.
    pub async fn unshare_ip(&self, server: ServerId, ip: &str) -> Result<()> {
        let ip = parse_ip(ip)?;
        self.send(RequestSpec::delete(format!("servers/{server}/ips/public/{ip}")))
            .await?
            .into_unit(&[202])
    }

    /// List shared IP groups, optionally with their member servers.
    pub async fn list_shared_ip_groups(&self, detailed: bool) -> Result<Vec<SharedIpGroup>> {
        self.send(RequestSpec::get(listing("shared_ip_groups", detailed)))
            .await?
            .into_keyed("sharedIpGroups", READ_OK)
    }

    /// Fetch a single shared IP group.
    pub async fn get_shared_ip_group(&self, id: SharedIpGroupId) -> Result<SharedIpGroup> {
        self.send(RequestSpec::get(format!("shared_ip_groups/{id}")))
            .await?
            .into_keyed("sharedIpGroup", READ_OK)
    }

    /// Create a shared IP group seeded with one server.
    pub async fn create_shared_ip_group(&self, name: &str, server: ServerId) -> Result<SharedIpGroup> {
        let spec = RequestSpec::post("shared_ip_groups").with_json(&json!({
            "sharedIpGroup": { "name": name, "server": server }
        }))?;
        let group: SharedIpGroup = self
            .send(spec)
            .await?
            .into_keyed("sharedIpGroup", &[201])?;
        info!(group = %group.id, name = %group.name, "Shared IP group created");
        Ok(group)
    }

    /// Delete a shared IP group.
    pub async fn delete_shared_ip_group(&self, id: SharedIpGroupId) -> Result<()> {
        self.send(RequestSpec::delete(format!("shared_ip_groups/{id}")))
            .await?
            .into_unit(&[204])
    }

    /// Fetch a server's backup schedule.
    pub async fn get_backup_schedule(&self, server: ServerId) -> Result<BackupSchedule> {
        self.send(RequestSpec::get(format!("servers/{server}/backup_schedule")))
            .await?
            .into_keyed("backupSchedule", READ_OK)
    }

    /// Replace a server's backup schedule.
    ///
    /// Use [`BackupSchedule::parse`] to validate provider strings first.
    pub async fn set_backup_schedule(&self, server: ServerId, schedule: &BackupSchedule) -> Result<()> {
        let spec = RequestSpec::post(format!("servers/{server}/backup_schedule"))
            .with_json(&json!({ "backupSchedule": schedule }))?;
        self.send(spec).await?.into_unit(&[204])
    }

    /// Remove a server's backup schedule.
    pub async fn delete_backup_schedule(&self, server: ServerId) -> Result<()> {
        self.send(RequestSpec::delete(format!("servers/{server}/backup_schedule")))
            .await?
            .into_unit(&[204])
    }

    async fn action(&self, id: ServerId, body: Value, codes: &[u16]) -> Result<()> {
        let spec = RequestSpec::post(format!("servers/{id}/action")).with_body(body);
        self.send(spec).await?.into_unit(codes)
    }

    async fn send(&self, spec: RequestSpec) -> Result<DispatchOutcome> {
        self.dispatcher.dispatch(ServiceTarget::Compute, spec).await
    }
}

fn listing(collection: &str, detailed: bool) -> String {
    if detailed {
        format!("{collection}/detail")
    } else {
        collection.to_string()
    }
}

/// The address is interpolated into the request path, so only a literal IP
/// is accepted.
fn parse_ip(raw: &str) -> Result<IpAddr> {
    raw.trim()
        .parse()
        .map_err(|_| Error::ValidationError(format!("`{raw}` is not an IP address")))
}

fn creation_metadata(name: &str, now: DateTime<Utc>) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        (ORIGINAL_NAME_KEY, name.to_string()),
        (CREATION_KEY, now.format("%B %-d, %Y, %-I:%M %P").to_string()),
    ])
}

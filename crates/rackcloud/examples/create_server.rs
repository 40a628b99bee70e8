//! Provision a server behind a new load balancer.
//!
//! Reads credentials from `RACKSPACE_USERNAME` and `RACKSPACE_API_KEY`, then:
//!   1. creates a server with an injected `/etc/motd`;
//!   2. waits for it to report a private address;
//!   3. creates an HTTP load balancer with that address as its only node.
//!
//! ```text
//! RUST_LOG=rackcloud_core=debug cargo run -p rackcloud --example create_server -- web-01 112 1
//! ```

use std::time::Duration;

use anyhow::Context;
use rackcloud::compute::{AddressKind, CreateServerRequest};
use rackcloud::core::ids::{FlavorId, ImageId};
use rackcloud::loadbalancer::CreateLoadBalancerRequest;
use rackcloud::{CloudClient, CloudConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "web-01".to_string());
    let image = ImageId::parse_str(&args.next().unwrap_or_else(|| "112".to_string()))?;
    let flavor = FlavorId::parse_str(&args.next().unwrap_or_else(|| "1".to_string()))?;

    let config = CloudConfig::from_env().context("loading credentials")?;
    let mut cloud = CloudClient::connect(&config)?;

    let servers = cloud.servers_mut();
    servers.add_server_file("/etc/motd", format!("Welcome to {name}\n"));
    let server = servers
        .create_server(&CreateServerRequest::new(&name, image, flavor))
        .await
        .context("creating server")?;
    tracing::info!(id = %server.id, name = %server.name, "server accepted");

    let private_ip = loop {
        let addresses = cloud
            .servers()
            .list_addresses(server.id, AddressKind::Private)
            .await?;
        if let Some(ip) = addresses.private.into_iter().next() {
            break ip;
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
    };

    let balancers = cloud.load_balancers_mut();
    balancers.add_node(private_ip, 80, true);
    let balancer = balancers
        .create_load_balancer(&CreateLoadBalancerRequest::new(
            format!("{name}-lb"),
            80,
            "HTTP",
        ))
        .await
        .context("creating load balancer")?;

    for vip in &balancer.virtual_ips {
        tracing::info!(balancer = %balancer.id, address = ?vip.address, "virtual IP");
    }

    Ok(())
}

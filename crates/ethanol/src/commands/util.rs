//! Shared helpers for command handlers.

use std::net::{IpAddr, SocketAddr};

use ethanol_config::Config;
use ethanol_proto::DeviceClient;

use crate::error::CliError;

/// Resolve `host` or `host:port`, filling in `default_port`.
pub async fn resolve_device(device: &str, default_port: u16) -> Result<SocketAddr, CliError> {
    if let Ok(addr) = device.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = device.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }
    let query = if device.contains(':') {
        device.to_owned()
    } else {
        format!("{device}:{default_port}")
    };
    tokio::net::lookup_host(&query)
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| CliError::Validation {
            field: "device".into(),
            reason: format!("cannot resolve '{device}'"),
        })
}

/// Outbound client using the configured trust and timeouts.
pub fn client(settings: &Config) -> Result<DeviceClient, CliError> {
    let config = settings.to_controller_config()?;
    Ok(DeviceClient::new(&config.transport)?)
}

// ── Device link ──
//
// Connection details and message-id counter shared by every entity that
// talks to a device: radios and VAPs address their AP, stations address
// themselves. Queries common to APs and stations live here.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};

use ethanol_proto::codec::schema::{ApInRange, Statistics, Uptime};
use ethanol_proto::{CounterKind, DeviceClient};

use super::MacAddress;
use crate::error::CoreError;

/// Where and how to reach one wireless interface.
pub struct DeviceLink {
    client: DeviceClient,
    addr: SocketAddr,
    intf_name: String,
    mac: MacAddress,
    next_id: AtomicI32,
}

impl fmt::Debug for DeviceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceLink")
            .field("addr", &self.addr)
            .field("intf_name", &self.intf_name)
            .field("mac", &self.mac)
            .finish_non_exhaustive()
    }
}

impl DeviceLink {
    pub fn new(
        client: DeviceClient,
        addr: SocketAddr,
        intf_name: impl Into<String>,
        mac: MacAddress,
    ) -> Self {
        Self {
            client,
            addr,
            intf_name: intf_name.into(),
            mac,
            next_id: AtomicI32::new(0),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn intf_name(&self) -> &str {
        &self.intf_name
    }

    pub fn mac(&self) -> &MacAddress {
        &self.mac
    }

    pub(crate) fn client(&self) -> &DeviceClient {
        &self.client
    }

    /// Take the next outbound message id.
    pub fn next_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    // ── Common queries ───────────────────────────────────────────────

    pub async fn ieee80211e_enabled(&self) -> Result<bool, CoreError> {
        Ok(self
            .client
            .get_80211e_enabled(self.addr, self.next_id(), &self.intf_name)
            .await?)
    }

    pub async fn fast_bss_transition_compatible(&self) -> Result<bool, CoreError> {
        Ok(self
            .client
            .get_fast_bss_transition_compatible(self.addr, self.next_id(), &self.intf_name)
            .await?)
    }

    pub async fn counter(&self, kind: CounterKind) -> Result<i64, CoreError> {
        Ok(self
            .client
            .get_counter(self.addr, self.next_id(), &self.intf_name, kind)
            .await?)
    }

    pub async fn statistics(&self) -> Result<Statistics, CoreError> {
        Ok(self
            .client
            .get_statistics(self.addr, self.next_id(), &self.intf_name)
            .await?)
    }

    pub async fn snr(&self) -> Result<i64, CoreError> {
        Ok(self
            .client
            .get_snr(self.addr, self.next_id(), &self.intf_name)
            .await?)
    }

    /// Transmit power in dBm.
    pub async fn tx_power(&self) -> Result<i64, CoreError> {
        Ok(self
            .client
            .get_tx_power(self.addr, self.next_id(), &self.intf_name)
            .await?)
    }

    pub async fn set_tx_power(&self, dbm: i64) -> Result<(), CoreError> {
        Ok(self
            .client
            .set_tx_power(self.addr, self.next_id(), &self.intf_name, dbm)
            .await?)
    }

    /// Bitrate in Mbit/s used towards `station`.
    pub async fn tx_bitrate(&self, station: &MacAddress) -> Result<f32, CoreError> {
        Ok(self
            .client
            .get_tx_bitrate(self.addr, self.next_id(), &self.intf_name, station.as_str())
            .await?)
    }

    pub async fn uptime(&self) -> Result<Uptime, CoreError> {
        Ok(self.client.get_uptime(self.addr, self.next_id()).await?)
    }

    /// CPU usage in percent.
    pub async fn cpu(&self) -> Result<i64, CoreError> {
        Ok(self.client.get_cpu(self.addr, self.next_id()).await?)
    }

    /// Memory usage in percent.
    pub async fn memory(&self) -> Result<i64, CoreError> {
        Ok(self.client.get_memory(self.addr, self.next_id()).await?)
    }

    pub async fn aps_in_range(&self) -> Result<Vec<ApInRange>, CoreError> {
        Ok(self
            .client
            .get_aps_in_range(self.addr, self.next_id(), &self.intf_name)
            .await?)
    }
}

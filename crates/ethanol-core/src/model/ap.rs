// ── Access point ──
//
// One physical AP. Discovery queries the device for its radios and
// configured SSIDs and builds the child `Radio` and `Vap` objects, which
// the AP owns for its whole lifetime.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ethanol_proto::DeviceClient;
use ethanol_proto::codec::schema::{MeanCounters, RadioWlan, TosRule, Uptime};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{DeviceLink, EntityId, MacAddress, Radio, RadioSummary, Vap, VapSummary};
use crate::error::CoreError;
use crate::store::NetworkRegistry;

/// Traffic-statistics collection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsSettings {
    /// Polling period in milliseconds; -1 means disabled.
    pub msec: i32,
    /// EWMA smoothing factor.
    pub alpha: f64,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        Self {
            msec: -1,
            alpha: 0.1,
        }
    }
}

#[derive(Debug)]
pub struct Ap {
    id: EntityId,
    link: DeviceLink,
    first_seen: DateTime<Utc>,
    radios: BTreeMap<String, Arc<Radio>>,
    vaps: Vec<Arc<Vap>>,
    stats: watch::Sender<StatisticsSettings>,
}

/// Serializable view of an AP.
#[derive(Debug, Clone, Serialize)]
pub struct ApSummary {
    pub id: EntityId,
    pub addr: SocketAddr,
    pub first_seen: DateTime<Utc>,
    pub radios: Vec<RadioSummary>,
    pub vaps: Vec<VapSummary>,
    pub statistics: StatisticsSettings,
}

impl Ap {
    /// Query the device at `addr` and build its radios and VAPs.
    ///
    /// Every VAP with a non-empty SSID joins the matching network in
    /// `networks`, which is created if needed. SSID entries on interfaces
    /// that are not radios are skipped.
    pub async fn discover(
        client: DeviceClient,
        addr: SocketAddr,
        networks: &NetworkRegistry,
    ) -> Result<Self, CoreError> {
        let id = EntityId::new();
        let link = DeviceLink::new(client.clone(), addr, "", MacAddress::default());

        let wlans = client.get_radio_wlans(addr, link.next_id()).await?;
        info!(
            %addr,
            interfaces = %wlans.iter().map(|w| w.intf_name.as_str()).collect::<Vec<_>>().join(","),
            "wireless interfaces discovered"
        );
        let radios: BTreeMap<String, Arc<Radio>> = wlans
            .into_iter()
            .filter(|w| !w.intf_name.is_empty())
            .map(|w| {
                let radio_link =
                    DeviceLink::new(client.clone(), addr, w.intf_name.clone(), MacAddress::new(&w.mac));
                (w.intf_name, Arc::new(Radio::new(id, w.wiphy, radio_link)))
            })
            .collect();

        let ssids = client.get_ap_ssids(addr, link.next_id()).await?;
        let mut vaps = Vec::with_capacity(ssids.len());
        for entry in ssids {
            let Some(radio) = radios.get(&entry.intf_name) else {
                warn!(%addr, intf = %entry.intf_name, ssid = %entry.ssid, "SSID on unknown radio, skipped");
                continue;
            };
            let vap_link = DeviceLink::new(
                client.clone(),
                addr,
                entry.intf_name.clone(),
                radio.mac().clone(),
            );
            let vap = Arc::new(Vap::new(id, Arc::clone(radio), vap_link));
            vap.set_ssid(networks, Some(&entry.ssid));
            vaps.push(vap);
        }
        info!(%addr, %id, radios = radios.len(), vaps = vaps.len(), "AP discovered");

        let (stats, _) = watch::channel(StatisticsSettings::default());
        Ok(Self {
            id,
            link,
            first_seen: Utc::now(),
            radios,
            vaps,
            stats,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.link.addr()
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    /// Radios keyed by interface name.
    pub fn radios(&self) -> &BTreeMap<String, Arc<Radio>> {
        &self.radios
    }

    pub fn radio(&self, intf_name: &str) -> Option<&Arc<Radio>> {
        self.radios.get(intf_name)
    }

    pub fn vaps(&self) -> &[Arc<Vap>] {
        &self.vaps
    }

    pub fn vap_by_mac(&self, mac: &MacAddress) -> Option<&Arc<Vap>> {
        self.vaps.iter().find(|v| v.mac() == mac)
    }

    pub fn statistics_settings(&self) -> StatisticsSettings {
        *self.stats.borrow()
    }

    pub fn summary(&self) -> ApSummary {
        ApSummary {
            id: self.id,
            addr: self.addr(),
            first_seen: self.first_seen,
            radios: self.radios.values().map(|r| r.summary()).collect(),
            vaps: self.vaps.iter().map(|v| v.summary()).collect(),
            statistics: self.statistics_settings(),
        }
    }

    /// Leave every network and drop station back-references.
    pub(crate) fn teardown(&self, networks: &NetworkRegistry) {
        for vap in &self.vaps {
            if let Some(network) = vap.ssid().and_then(|ssid| networks.get(&ssid)) {
                network.deassociate(vap);
            }
            for station in vap.stations() {
                station.detach();
            }
        }
        debug!(addr = %self.addr(), "AP torn down");
    }

    // ── Interfaces and statistics ────────────────────────────────────

    pub async fn wireless_interfaces(&self) -> Result<Vec<RadioWlan>, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_radio_wlans(link.addr(), link.next_id())
            .await?)
    }

    /// Smoothed traffic counters for every enabled interface.
    pub async fn interface_statistics(&self) -> Result<Vec<MeanCounters>, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_mean_statistics(link.addr(), link.next_id())
            .await?)
    }

    pub async fn enable_interface_stats(&self) -> Result<(), CoreError> {
        let link = &self.link;
        for wlan in self.wireless_interfaces().await? {
            link.client()
                .add_mean_interface(link.addr(), link.next_id(), &wlan.intf_name)
                .await?;
        }
        Ok(())
    }

    pub async fn disable_interface_stats(&self) -> Result<(), CoreError> {
        let link = &self.link;
        for wlan in self.wireless_interfaces().await? {
            link.client()
                .remove_mean_interface(link.addr(), link.next_id(), &wlan.intf_name)
                .await?;
        }
        Ok(())
    }

    /// Set the polling period. Non-positive values disable collection.
    pub async fn set_statistics_time(&self, msec: i32) -> Result<(), CoreError> {
        let stored = if msec > 0 { msec } else { -1 };
        self.stats.send_modify(|s| s.msec = stored);
        let link = &self.link;
        Ok(link
            .client()
            .set_mean_time(link.addr(), link.next_id(), msec)
            .await?)
    }

    pub async fn set_statistics_alpha(&self, alpha: f64) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(CoreError::ValidationFailed {
                message: format!("EWMA alpha {alpha} is outside [0, 1]"),
            });
        }
        self.stats.send_modify(|s| s.alpha = alpha);
        let link = &self.link;
        Ok(link
            .client()
            .set_mean_alpha(link.addr(), link.next_id(), alpha)
            .await?)
    }

    // ── hostapd configuration ────────────────────────────────────────

    pub async fn hostapd_conf(&self, param: &str) -> Result<String, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_hostapd_conf(link.addr(), link.next_id(), "", param)
            .await?)
    }

    pub async fn set_hostapd_conf(&self, param: &str, value: &str) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_hostapd_conf(link.addr(), link.next_id(), "", param, value)
            .await?)
    }

    // ── QoS ──────────────────────────────────────────────────────────

    pub async fn clear_tos(&self) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .tos_clean_all(link.addr(), link.next_id())
            .await?)
    }

    pub async fn add_tos(&self, rule: TosRule) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .tos_add(link.addr(), link.next_id(), rule)
            .await?)
    }

    pub async fn replace_tos(&self, rule: TosRule) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .tos_replace(link.addr(), link.next_id(), rule)
            .await?)
    }

    // ── Interface settings ───────────────────────────────────────────

    fn require_radio(&self, intf: &str) -> Result<(), CoreError> {
        if self.radios.contains_key(intf) {
            Ok(())
        } else {
            Err(CoreError::InterfaceNotFound {
                interface: intf.to_owned(),
            })
        }
    }

    pub async fn set_mtu(&self, intf: &str, mtu: i32) -> Result<(), CoreError> {
        self.require_radio(intf)?;
        let link = &self.link;
        Ok(link
            .client()
            .set_mtu(link.addr(), link.next_id(), intf, mtu)
            .await?)
    }

    pub async fn set_txqueuelen(&self, intf: &str, qlen: i32) -> Result<(), CoreError> {
        self.require_radio(intf)?;
        let link = &self.link;
        Ok(link
            .client()
            .set_txqueuelen(link.addr(), link.next_id(), intf, qlen)
            .await?)
    }

    /// Ask the AP to report `metric` every `period` ms.
    pub async fn set_metric(&self, metric: u64, enable: bool, period: i32) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_metric(link.addr(), link.next_id(), metric, enable, period)
            .await?)
    }

    // ── System ───────────────────────────────────────────────────────

    pub async fn uptime(&self) -> Result<Uptime, CoreError> {
        self.link.uptime().await
    }

    pub async fn cpu(&self) -> Result<i64, CoreError> {
        self.link.cpu().await
    }

    pub async fn memory(&self) -> Result<i64, CoreError> {
        self.link.memory().await
    }
}

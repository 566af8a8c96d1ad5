// ── Radio ──
//
// One physical wireless interface of an AP. Owned by its `Ap`; every
// query is addressed to the AP with this radio's interface name.

use ethanol_proto::codec::schema::{
    Acs, Band, ChannelFrequency, ChannelInfo, CurrentChannel, InterfaceEntry, WlanEntry,
};
use serde::Serialize;

use super::{DeviceLink, EntityId, MacAddress};
use crate::error::CoreError;

#[derive(Debug)]
pub struct Radio {
    id: EntityId,
    ap_id: EntityId,
    wiphy: u32,
    link: DeviceLink,
}

/// Serializable view of a radio.
#[derive(Debug, Clone, Serialize)]
pub struct RadioSummary {
    pub id: EntityId,
    pub intf_name: String,
    pub mac: MacAddress,
    pub wiphy: u32,
}

impl Radio {
    pub(crate) fn new(ap_id: EntityId, wiphy: u32, link: DeviceLink) -> Self {
        Self {
            id: EntityId::new(),
            ap_id,
            wiphy,
            link,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The AP this radio belongs to.
    pub fn ap_id(&self) -> EntityId {
        self.ap_id
    }

    pub fn wiphy(&self) -> u32 {
        self.wiphy
    }

    pub fn intf_name(&self) -> &str {
        self.link.intf_name()
    }

    pub fn mac(&self) -> &MacAddress {
        self.link.mac()
    }

    pub fn link(&self) -> &DeviceLink {
        &self.link
    }

    pub fn summary(&self) -> RadioSummary {
        RadioSummary {
            id: self.id,
            intf_name: self.intf_name().to_owned(),
            mac: self.mac().clone(),
            wiphy: self.wiphy,
        }
    }

    // ── Channel and frequency ────────────────────────────────────────

    pub async fn valid_channels(&self) -> Result<Vec<ChannelFrequency>, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_valid_channels(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn current_channel(&self) -> Result<CurrentChannel, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_current_channel(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_current_channel(&self, channel: i32) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_current_channel(link.addr(), link.next_id(), link.intf_name(), channel)
            .await?)
    }

    /// Operating frequency in MHz.
    pub async fn frequency(&self) -> Result<u32, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_frequency(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_frequency(&self, mhz: u32) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_frequency(link.addr(), link.next_id(), link.intf_name(), mhz)
            .await?)
    }

    pub async fn channel_info(&self, channel: i32) -> Result<ChannelInfo, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_channel_info(link.addr(), link.next_id(), link.intf_name(), channel)
            .await?)
    }

    /// Automatic channel selection scores for this radio.
    pub async fn acs(&self, num_tests: i32) -> Result<Acs, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_acs(link.addr(), link.next_id(), link.intf_name(), num_tests)
            .await?)
    }

    // ── Rates and power ──────────────────────────────────────────────

    pub async fn tx_bitrates(&self) -> Result<Vec<Band>, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_tx_bitrates(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_tx_bitrates(&self, bands: Vec<Band>) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_tx_bitrates(link.addr(), link.next_id(), link.intf_name(), bands)
            .await?)
    }

    pub async fn power_save(&self) -> Result<bool, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_power_save_mode(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_power_save(&self, enabled: bool) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_power_save_mode(link.addr(), link.next_id(), link.intf_name(), enabled)
            .await?)
    }

    // ── PHY settings ─────────────────────────────────────────────────

    /// `true` when the short preamble is in use.
    pub async fn short_preamble(&self) -> Result<bool, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_preamble(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_short_preamble(&self, short: bool) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_preamble(link.addr(), link.next_id(), link.intf_name(), short)
            .await?)
    }

    /// Beacon interval in time units.
    pub async fn beacon_interval(&self) -> Result<i32, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_beacon_interval(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_beacon_interval(&self, interval: i32) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_beacon_interval(link.addr(), link.next_id(), link.intf_name(), interval)
            .await?)
    }

    pub async fn fast_bss_transition_compatible(&self) -> Result<bool, CoreError> {
        self.link.fast_bss_transition_compatible().await
    }

    pub async fn ieee80211e_enabled(&self) -> Result<bool, CoreError> {
        self.link.ieee80211e_enabled().await
    }

    // ── Interfaces ───────────────────────────────────────────────────

    /// Wireless interfaces of the owning device.
    pub async fn wireless_interfaces(&self) -> Result<Vec<InterfaceEntry>, CoreError> {
        let link = &self.link;
        let all = link
            .client()
            .get_interfaces(link.addr(), link.next_id())
            .await?;
        Ok(all.into_iter().filter(|intf| intf.is_wifi).collect())
    }

    /// WLAN details reported for this radio's interface.
    pub async fn wlan_info(&self) -> Result<Vec<WlanEntry>, CoreError> {
        let link = &self.link;
        let wlans = link
            .client()
            .get_wlan_info(link.addr(), link.next_id())
            .await?;
        Ok(wlans
            .into_iter()
            .filter(|w| w.intf_name == link.intf_name())
            .collect())
    }
}

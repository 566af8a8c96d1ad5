// ── Station ──
//
// A wireless client, one per (IP, wireless interface). Queries go to the
// station's own control port; the VAP it is attached to is a weak
// back-reference that the fleet maintains.

use std::net::SocketAddr;
use std::sync::{Arc, Weak};

use ethanol_proto::codec::schema::{LinkInfo, MeanCounters, StaCounters};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::{DeviceLink, EntityId, MacAddress, Radio, Vap};
use crate::error::CoreError;

/// Which VAP the station is currently attached to.
#[derive(Debug, Clone, Default)]
struct Attachment {
    bssid: Option<MacAddress>,
    vap: Weak<Vap>,
}

#[derive(Debug)]
pub struct Station {
    id: EntityId,
    link: DeviceLink,
    ssid: Option<String>,
    frequency: i32,
    attachment: watch::Sender<Attachment>,
}

/// Serializable view of a station.
#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    pub id: EntityId,
    pub addr: SocketAddr,
    pub intf_name: String,
    pub mac: MacAddress,
    pub bssid: Option<MacAddress>,
    pub ssid: Option<String>,
    pub frequency: i32,
    pub managed: bool,
}

impl Station {
    /// Build a station from the link info its interface reported.
    ///
    /// `link_info.mac` is the BSSID the station is connected to.
    pub(crate) fn new(link: DeviceLink, link_info: &LinkInfo) -> Self {
        let bssid = Some(MacAddress::new(&link_info.mac)).filter(|m| !m.is_empty());
        let (attachment, _) = watch::channel(Attachment {
            bssid,
            vap: Weak::new(),
        });
        Self {
            id: EntityId::new(),
            link,
            ssid: Some(link_info.ssid.clone()).filter(|s| !s.is_empty()),
            frequency: link_info.frequency,
            attachment,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.link.addr()
    }

    pub fn intf_name(&self) -> &str {
        self.link.intf_name()
    }

    /// The station's own MAC.
    pub fn mac(&self) -> &MacAddress {
        self.link.mac()
    }

    pub fn link(&self) -> &DeviceLink {
        &self.link
    }

    pub fn ssid(&self) -> Option<&str> {
        self.ssid.as_deref()
    }

    /// Frequency in MHz at discovery time.
    pub fn frequency(&self) -> i32 {
        self.frequency
    }

    /// BSSID of the AP the station is connected to, if known.
    pub fn bssid(&self) -> Option<MacAddress> {
        self.attachment.borrow().bssid.clone()
    }

    pub fn vap(&self) -> Option<Arc<Vap>> {
        self.attachment.borrow().vap.upgrade()
    }

    /// Radio implied by the attached VAP.
    pub fn radio(&self) -> Option<Arc<Radio>> {
        self.vap().map(|vap| Arc::clone(vap.radio()))
    }

    /// Whether the station resolved to a VAP the controller manages.
    pub fn is_managed(&self) -> bool {
        self.vap().is_some()
    }

    pub fn summary(&self) -> StationSummary {
        StationSummary {
            id: self.id,
            addr: self.addr(),
            intf_name: self.intf_name().to_owned(),
            mac: self.mac().clone(),
            bssid: self.bssid(),
            ssid: self.ssid.clone(),
            frequency: self.frequency,
            managed: self.is_managed(),
        }
    }

    /// Attach to `vap`, moving the registration off the previous VAP.
    pub fn attach(self: &Arc<Self>, vap: &Arc<Vap>) {
        let previous = self.attachment.send_replace(Attachment {
            bssid: Some(vap.mac().clone()),
            vap: Arc::downgrade(vap),
        });
        if let Some(old) = previous.vap.upgrade().filter(|old| !Arc::ptr_eq(old, vap)) {
            old.unregister_station(self.mac());
        }
        vap.register_station(self);
        debug!(station = %self.mac(), bssid = %vap.mac(), "station attached");
    }

    /// Drop the VAP back-reference and unregister from it.
    pub fn detach(&self) {
        let previous = self.attachment.send_replace(Attachment::default());
        if let Some(vap) = previous.vap.upgrade() {
            vap.unregister_station(self.mac());
        }
    }

    // ── Station queries ──────────────────────────────────────────────

    pub async fn link_info(&self) -> Result<LinkInfo, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_link_info(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn statistics(&self) -> Result<Vec<StaCounters>, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_sta_statistics(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    /// Tell the station to roam to `target`. Nothing is returned.
    pub async fn trigger_transition(&self, target: &MacAddress) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .trigger_transition(
                link.addr(),
                link.next_id(),
                link.intf_name(),
                self.mac().as_str(),
                target.as_str(),
            )
            .await?)
    }

    /// SNR level below which the station reports SNR_THRESHOLD_REACHED.
    pub async fn set_snr_threshold(&self, threshold: i64) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_snr_threshold(link.addr(), link.next_id(), link.intf_name(), threshold)
            .await?)
    }

    pub async fn set_snr_interval(&self, msec: i64) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_snr_interval(link.addr(), link.next_id(), link.intf_name(), msec)
            .await?)
    }

    // ── Mean statistics ──────────────────────────────────────────────

    pub async fn mean_statistics(&self) -> Result<Vec<MeanCounters>, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_mean_statistics(link.addr(), link.next_id())
            .await?)
    }

    pub async fn add_mean_interface(&self, intf: &str) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .add_mean_interface(link.addr(), link.next_id(), intf)
            .await?)
    }

    pub async fn remove_mean_interface(&self, intf: &str) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .remove_mean_interface(link.addr(), link.next_id(), intf)
            .await?)
    }

    pub async fn set_mean_alpha(&self, alpha: f64) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(CoreError::ValidationFailed {
                message: format!("EWMA alpha {alpha} is outside [0, 1]"),
            });
        }
        let link = &self.link;
        Ok(link
            .client()
            .set_mean_alpha(link.addr(), link.next_id(), alpha)
            .await?)
    }

    pub async fn set_mean_time(&self, msec: i32) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_mean_time(link.addr(), link.next_id(), msec)
            .await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::test_support::{link, radio};

    fn station() -> Arc<Station> {
        let info = LinkInfo {
            intf_name: "wlan0".into(),
            mac: "00:11:22:33:44:55".into(),
            ssid: "lab".into(),
            frequency: 2437,
            ..LinkInfo::default()
        };
        Arc::new(Station::new(link("wlan0", "66:77:88:99:aa:bb"), &info))
    }

    fn vap(mac: &str) -> Arc<Vap> {
        Arc::new(Vap::new(EntityId::new(), radio("wlan0"), link("wlan0", mac)))
    }

    #[test]
    fn link_info_fills_bssid_and_ssid() {
        let sta = station();
        assert_eq!(sta.bssid(), Some(MacAddress::new("00:11:22:33:44:55")));
        assert_eq!(sta.ssid(), Some("lab"));
        assert_eq!(sta.frequency(), 2437);
        assert!(!sta.is_managed());
        assert!(sta.radio().is_none());
    }

    #[test]
    fn attach_moves_registration_between_vaps() {
        let sta = station();
        let first = vap("00:11:22:33:44:55");
        let second = vap("00:11:22:33:44:56");

        sta.attach(&first);
        assert!(first.has_station(sta.mac()));
        assert!(sta.is_managed());

        sta.attach(&second);
        assert!(!first.has_station(sta.mac()));
        assert!(second.has_station(sta.mac()));
        assert_eq!(sta.bssid(), Some(second.mac().clone()));

        sta.detach();
        assert!(!second.has_station(sta.mac()));
        assert!(sta.vap().is_none());
        assert_eq!(sta.bssid(), None);
    }

    #[tokio::test]
    async fn alpha_outside_unit_interval_is_rejected() {
        let sta = station();
        assert!(matches!(
            sta.set_mean_alpha(1.5).await,
            Err(CoreError::ValidationFailed { .. })
        ));
    }
}

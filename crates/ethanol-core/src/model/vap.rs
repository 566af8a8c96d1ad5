// ── Virtual access point ──
//
// One SSID served on one radio, identified by its BSSID. The VAP keeps
// the controller-side view (SSID, enabled flag, registered stations,
// association policy) and forwards per-BSS settings to its AP.

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use super::{DeviceLink, EntityId, MacAddress, Radio, Station};
use crate::association::{AllowAll, AssociationEvent, AssociationPolicy};
use crate::error::CoreError;
use crate::store::NetworkRegistry;

const MANAGEMENT_CHANNEL_SIZE: usize = 64;

/// Mutable VAP configuration as seen by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VapState {
    pub ssid: Option<String>,
    pub enabled: bool,
}

/// A management frame observed at a VAP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementFrame {
    /// 802.11 management subtype.
    pub frame_type: u16,
    pub station: MacAddress,
    pub body: Arc<[u8]>,
}

pub struct Vap {
    id: EntityId,
    ap_id: EntityId,
    radio: Arc<Radio>,
    link: DeviceLink,
    state: watch::Sender<VapState>,
    stations: DashMap<MacAddress, Weak<Station>>,
    reservations: DashMap<MacAddress, ()>,
    policy: watch::Sender<Arc<dyn AssociationPolicy>>,
    listeners: DashMap<u16, broadcast::Sender<ManagementFrame>>,
}

impl fmt::Debug for Vap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vap")
            .field("id", &self.id)
            .field("mac", self.mac())
            .field("intf_name", &self.link.intf_name())
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Serializable view of a VAP.
#[derive(Debug, Clone, Serialize)]
pub struct VapSummary {
    pub id: EntityId,
    pub mac: MacAddress,
    pub intf_name: String,
    pub ssid: Option<String>,
    pub enabled: bool,
    pub stations: Vec<MacAddress>,
}

impl Vap {
    /// Build a VAP with no SSID; `set_ssid` attaches it to a network.
    pub(crate) fn new(ap_id: EntityId, radio: Arc<Radio>, link: DeviceLink) -> Self {
        let (state, _) = watch::channel(VapState::default());
        let (policy, _) = watch::channel(Arc::new(AllowAll) as Arc<dyn AssociationPolicy>);
        Self {
            id: EntityId::new(),
            ap_id,
            radio,
            link,
            state,
            stations: DashMap::new(),
            reservations: DashMap::new(),
            policy,
            listeners: DashMap::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn ap_id(&self) -> EntityId {
        self.ap_id
    }

    pub fn radio(&self) -> &Arc<Radio> {
        &self.radio
    }

    /// BSSID.
    pub fn mac(&self) -> &MacAddress {
        self.link.mac()
    }

    pub fn link(&self) -> &DeviceLink {
        &self.link
    }

    pub fn ssid(&self) -> Option<String> {
        self.state.borrow().ssid.clone()
    }

    pub fn enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    /// Observe SSID and enabled-flag changes.
    pub fn watch_state(&self) -> watch::Receiver<VapState> {
        self.state.subscribe()
    }

    pub fn summary(&self) -> VapSummary {
        let state = self.state.borrow().clone();
        let mut stations: Vec<MacAddress> = self.stations.iter().map(|r| r.key().clone()).collect();
        stations.sort();
        VapSummary {
            id: self.id,
            mac: self.mac().clone(),
            intf_name: self.link.intf_name().to_owned(),
            ssid: state.ssid,
            enabled: state.enabled,
            stations,
        }
    }

    // ── SSID and network membership ──────────────────────────────────

    /// Move this VAP to the network for `ssid`, creating it if needed.
    ///
    /// The VAP leaves its previous network and is disabled until it is
    /// explicitly enabled again. `None` or an empty SSID detaches it.
    pub fn set_ssid(self: &Arc<Self>, networks: &NetworkRegistry, ssid: Option<&str>) {
        let ssid = ssid.filter(|s| !s.is_empty());
        let current = self.ssid();
        if current.as_deref() == ssid {
            return;
        }
        if let Some(old) = current.as_deref().and_then(|old| networks.get(old)) {
            old.deassociate(self);
        }
        if let Some(new) = ssid {
            networks.get_or_create(new).associate(self);
        }
        self.state.send_modify(|s| {
            s.ssid = ssid.map(str::to_owned);
            s.enabled = false;
        });
        info!(bssid = %self.mac(), ssid = ?ssid, "VAP SSID changed");
    }

    /// Rename in place, keeping network membership and the enabled flag.
    pub(crate) fn retarget_ssid(&self, ssid: &str) {
        self.state.send_modify(|s| s.ssid = Some(ssid.to_owned()));
    }

    /// Clear the SSID after the network dropped this VAP.
    pub(crate) fn clear_ssid(&self) {
        self.state.send_modify(|s| {
            s.ssid = None;
            s.enabled = false;
        });
    }

    /// Enabling requires an SSID.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        if enabled && self.ssid().is_none() {
            return Err(CoreError::SsidRequired {
                mac: self.mac().clone(),
            });
        }
        self.state.send_modify(|s| s.enabled = enabled);
        Ok(())
    }

    // ── Per-BSS settings on the AP ───────────────────────────────────

    fn require_ssid(&self) -> Result<String, CoreError> {
        self.ssid().ok_or_else(|| CoreError::SsidRequired {
            mac: self.mac().clone(),
        })
    }

    pub async fn broadcast_ssid(&self) -> Result<bool, CoreError> {
        let ssid = self.require_ssid()?;
        let link = &self.link;
        Ok(link
            .client()
            .get_broadcast_ssid(link.addr(), link.next_id(), link.intf_name(), &ssid)
            .await?)
    }

    pub async fn set_broadcast_ssid(&self, enabled: bool) -> Result<(), CoreError> {
        let ssid = self.require_ssid()?;
        let link = &self.link;
        Ok(link
            .client()
            .set_broadcast_ssid(link.addr(), link.next_id(), link.intf_name(), &ssid, enabled)
            .await?)
    }

    pub async fn frame_burst(&self) -> Result<bool, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_frame_burst(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_frame_burst(&self, enabled: bool) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_frame_burst(link.addr(), link.next_id(), link.intf_name(), enabled)
            .await?)
    }

    /// Guard interval in nanoseconds.
    pub async fn guard_interval(&self) -> Result<i64, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_guard_interval(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_guard_interval(&self, nanos: i64) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_guard_interval(link.addr(), link.next_id(), link.intf_name(), nanos)
            .await?)
    }

    pub async fn dtim_interval(&self) -> Result<i32, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_dtim_interval(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_dtim_interval(&self, interval: i32) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_dtim_interval(link.addr(), link.next_id(), link.intf_name(), interval)
            .await?)
    }

    pub async fn cts_protection(&self) -> Result<bool, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_cts_protection(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_cts_protection(&self, enabled: bool) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_cts_protection(link.addr(), link.next_id(), link.intf_name(), enabled)
            .await?)
    }

    pub async fn rts_threshold(&self) -> Result<u32, CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .get_rts_threshold(link.addr(), link.next_id(), link.intf_name())
            .await?)
    }

    pub async fn set_rts_threshold(&self, threshold: u32) -> Result<(), CoreError> {
        let link = &self.link;
        Ok(link
            .client()
            .set_rts_threshold(link.addr(), link.next_id(), link.intf_name(), threshold)
            .await?)
    }

    /// Ask the AP to report (or stop reporting) `events` for `station`.
    ///
    /// An empty event set sends nothing.
    pub async fn enable_association_events(
        &self,
        station: &MacAddress,
        events: &[AssociationEvent],
        enable: bool,
    ) -> Result<(), CoreError> {
        let mask = events.iter().fold(0, |mask, e| mask | e.event_mask());
        if mask == 0 {
            return Ok(());
        }
        let link = &self.link;
        Ok(link
            .client()
            .enable_assoc_events(link.addr(), link.next_id(), station.as_str(), mask, enable)
            .await?)
    }

    // ── Stations ─────────────────────────────────────────────────────

    pub fn register_station(&self, station: &Arc<Station>) {
        self.stations
            .insert(station.mac().clone(), Arc::downgrade(station));
        debug!(bssid = %self.mac(), station = %station.mac(), "station registered");
    }

    pub fn unregister_station(&self, station: &MacAddress) -> bool {
        self.stations.remove(station).is_some()
    }

    pub fn has_station(&self, station: &MacAddress) -> bool {
        self.stations.contains_key(station)
    }

    /// Registered stations that are still alive.
    pub fn stations(&self) -> Vec<Arc<Station>> {
        self.stations.iter().filter_map(|r| r.value().upgrade()).collect()
    }

    // ── Policy and handoff admission ─────────────────────────────────

    pub fn policy(&self) -> Arc<dyn AssociationPolicy> {
        Arc::clone(&*self.policy.borrow())
    }

    pub fn set_policy(&self, policy: Arc<dyn AssociationPolicy>) {
        self.policy.send_replace(policy);
    }

    /// Ask the policy about one lifecycle step.
    pub fn decide(&self, event: AssociationEvent, station: &MacAddress) -> bool {
        self.policy().decide(event, self, station)
    }

    /// Pre-admit `station` for an incoming handoff.
    pub fn reserve(&self, station: &MacAddress) -> bool {
        if !self.policy().admit_handoff(self, station) {
            return false;
        }
        self.reservations.insert(station.clone(), ());
        true
    }

    pub fn release(&self, station: &MacAddress) {
        self.reservations.remove(station);
    }

    pub fn is_reserved(&self, station: &MacAddress) -> bool {
        self.reservations.contains_key(station)
    }

    // ── Management frames ────────────────────────────────────────────

    /// Subscribe to management frames of one subtype.
    pub fn listen_management(&self, frame_type: u16) -> broadcast::Receiver<ManagementFrame> {
        self.listeners
            .entry(frame_type)
            .or_insert_with(|| broadcast::channel(MANAGEMENT_CHANNEL_SIZE).0)
            .subscribe()
    }

    pub fn unlisten_management(&self, frame_type: u16) {
        self.listeners.remove(&frame_type);
    }

    /// Hand a frame to its listeners. Returns how many received it.
    pub fn deliver_management(&self, frame: ManagementFrame) -> usize {
        let Some(sender) = self.listeners.get(&frame.frame_type) else {
            debug!(bssid = %self.mac(), frame_type = frame.frame_type, "no listener for frame");
            return 0;
        };
        sender.send(frame).unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::test_support::{link, radio};

    fn vap(mac: &str) -> Arc<Vap> {
        Arc::new(Vap::new(EntityId::new(), radio("wlan0"), link("wlan0", mac)))
    }

    struct DenyHandoff;

    impl AssociationPolicy for DenyHandoff {
        fn admit_handoff(&self, _vap: &Vap, _station: &MacAddress) -> bool {
            false
        }
    }

    #[test]
    fn changing_ssid_moves_network_and_disables() {
        let networks = NetworkRegistry::new();
        let vap = vap("00:11:22:33:44:55");

        vap.set_ssid(&networks, Some("lab"));
        vap.set_enabled(true).unwrap();
        assert!(vap.enabled());

        vap.set_ssid(&networks, Some("guest"));
        assert_eq!(vap.ssid().as_deref(), Some("guest"));
        assert!(!vap.enabled());
        assert!(networks.get("lab").unwrap().vaps().is_empty());
        assert_eq!(networks.get("guest").unwrap().vaps().len(), 1);
    }

    #[test]
    fn enabling_without_ssid_fails() {
        let vap = vap("00:11:22:33:44:55");
        assert!(matches!(
            vap.set_enabled(true),
            Err(CoreError::SsidRequired { .. })
        ));
        assert!(vap.set_enabled(false).is_ok());
    }

    #[test]
    fn empty_ssid_detaches() {
        let networks = NetworkRegistry::new();
        let vap = vap("00:11:22:33:44:55");
        vap.set_ssid(&networks, Some("lab"));
        vap.set_ssid(&networks, Some(""));
        assert_eq!(vap.ssid(), None);
        assert!(networks.get("lab").unwrap().vaps().is_empty());
    }

    #[test]
    fn reservation_respects_policy() {
        let vap = vap("00:11:22:33:44:55");
        let sta = MacAddress::new("66:77:88:99:aa:bb");
        assert!(vap.reserve(&sta));
        assert!(vap.is_reserved(&sta));
        vap.release(&sta);

        vap.set_policy(Arc::new(DenyHandoff));
        assert!(!vap.reserve(&sta));
        assert!(!vap.is_reserved(&sta));
    }

    #[tokio::test]
    async fn management_frames_reach_listeners_of_their_type() {
        let vap = vap("00:11:22:33:44:55");
        let mut probes = vap.listen_management(4);
        let frame = ManagementFrame {
            frame_type: 4,
            station: MacAddress::new("66:77:88:99:aa:bb"),
            body: Arc::from(&b"probe"[..]),
        };

        assert_eq!(vap.deliver_management(frame.clone()), 1);
        assert_eq!(probes.recv().await.unwrap(), frame);

        let beacon = ManagementFrame {
            frame_type: 8,
            ..frame
        };
        assert_eq!(vap.deliver_management(beacon), 0);

        vap.unlisten_management(4);
        assert!(probes.recv().await.is_err());
    }
}

// ── Network ──
//
// A named group of VAPs sharing one SSID. Members are held weakly; the
// owning AP decides their lifetime.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::{EntityId, MacAddress, Vap};

#[derive(Debug)]
pub struct Network {
    id: EntityId,
    ssid: watch::Sender<String>,
    vaps: DashMap<EntityId, Weak<Vap>>,
}

/// Serializable view of a network.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub id: EntityId,
    pub ssid: String,
    pub vaps: Vec<MacAddress>,
}

impl Network {
    pub(crate) fn new(ssid: impl Into<String>) -> Self {
        let (ssid, _) = watch::channel(ssid.into());
        Self {
            id: EntityId::new(),
            ssid,
            vaps: DashMap::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn ssid(&self) -> String {
        self.ssid.borrow().clone()
    }

    pub fn summary(&self) -> NetworkSummary {
        let mut vaps: Vec<MacAddress> = self.vaps().iter().map(|v| v.mac().clone()).collect();
        vaps.sort();
        NetworkSummary {
            id: self.id,
            ssid: self.ssid(),
            vaps,
        }
    }

    /// Live member VAPs.
    pub fn vaps(&self) -> Vec<Arc<Vap>> {
        self.vaps.iter().filter_map(|r| r.value().upgrade()).collect()
    }

    pub fn contains(&self, vap: &Vap) -> bool {
        self.vaps.contains_key(&vap.id())
    }

    /// Member VAP with BSSID `mac`.
    pub fn vap_by_mac(&self, mac: &MacAddress) -> Option<Arc<Vap>> {
        self.vaps().into_iter().find(|v| v.mac() == mac)
    }

    pub(crate) fn associate(&self, vap: &Arc<Vap>) {
        self.vaps.insert(vap.id(), Arc::downgrade(vap));
        debug!(ssid = %self.ssid(), bssid = %vap.mac(), "VAP joined network");
    }

    /// Remove `vap` from this network, leaving its own SSID untouched.
    pub(crate) fn deassociate(&self, vap: &Vap) -> bool {
        self.vaps.remove(&vap.id()).is_some()
    }

    /// Drop a VAP from the network: disable it and clear its SSID.
    pub fn deassociate_vap(&self, vap: &Vap) -> bool {
        if !self.deassociate(vap) {
            return false;
        }
        vap.clear_ssid();
        debug!(ssid = %self.ssid(), bssid = %vap.mac(), "VAP left network");
        true
    }

    /// Drop members whose VAP no longer exists.
    pub(crate) fn prune(&self) {
        self.vaps.retain(|_, vap| vap.strong_count() > 0);
    }

    /// Set the SSID and retarget every member. Uniqueness is checked by
    /// the registry that owns the key.
    pub(crate) fn retarget(&self, ssid: &str) {
        self.ssid.send_replace(ssid.to_owned());
        for vap in self.vaps() {
            vap.retarget_ssid(ssid);
        }
    }
}

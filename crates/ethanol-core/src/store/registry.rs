// ── Registries ──
//
// One registry per entity kind, each guarding itself: APs by IP, stations
// by (IP, interface), networks by SSID, and the BSSID index used to route
// association events.

use std::net::IpAddr;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::debug;

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{Ap, EntityId, MacAddress, Network, Station, Vap};

// ── APs ──────────────────────────────────────────────────────────────

/// APs keyed by IP.
///
/// Discovery takes a while, so an IP being built is reserved; a second
/// hello for it sees the reservation and creates nothing.
pub struct ApRegistry {
    aps: EntityCollection<Ap>,
    pending: DashMap<IpAddr, ()>,
    preregistered: DashMap<IpAddr, DateTime<Utc>>,
}

/// Holds an IP while its AP is being built. Released on drop.
#[must_use]
pub struct ApReservation<'a> {
    registry: &'a ApRegistry,
    ip: IpAddr,
}

impl Drop for ApReservation<'_> {
    fn drop(&mut self) {
        self.registry.pending.remove(&self.ip);
    }
}

impl ApRegistry {
    pub fn new() -> Self {
        Self {
            aps: EntityCollection::new(),
            pending: DashMap::new(),
            preregistered: DashMap::new(),
        }
    }

    /// Record that the network controller saw a connection from `ip`.
    pub fn preregister(&self, ip: IpAddr) {
        self.preregistered.insert(ip, Utc::now());
        debug!(%ip, "peer pre-registered");
    }

    pub fn is_preregistered(&self, ip: IpAddr) -> bool {
        self.preregistered.contains_key(&ip)
    }

    /// Reserve `ip` for construction. `None` when it is already
    /// registered or another construction holds it.
    pub fn reserve(&self, ip: IpAddr) -> Option<ApReservation<'_>> {
        if self.contains(ip) {
            return None;
        }
        match self.pending.entry(ip) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                // Re-check: a construction may have finished in between.
                let reservation = ApReservation { registry: self, ip };
                if self.contains(ip) {
                    return None;
                }
                Some(reservation)
            }
        }
    }

    /// Register a built AP, consuming its reservation.
    pub fn insert(&self, reservation: ApReservation<'_>, ap: Arc<Ap>) -> Result<(), Arc<Ap>> {
        let result = self
            .aps
            .insert_if_absent(reservation.ip.to_string(), ap.id(), ap);
        drop(reservation);
        result
    }

    pub fn get(&self, ip: IpAddr) -> Option<Arc<Ap>> {
        self.aps.get_by_key(&ip.to_string())
    }

    pub fn get_by_id(&self, id: &EntityId) -> Option<Arc<Ap>> {
        self.aps.get_by_id(id)
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.aps.contains_key(&ip.to_string())
    }

    pub fn remove(&self, ip: IpAddr) -> Option<Arc<Ap>> {
        self.preregistered.remove(&ip);
        self.aps.remove(&ip.to_string())
    }

    pub fn all(&self) -> Arc<Vec<Arc<Ap>>> {
        self.aps.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Ap>>>> {
        self.aps.subscribe()
    }

    pub fn version(&self) -> u64 {
        self.aps.version()
    }

    pub fn len(&self) -> usize {
        self.aps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aps.is_empty()
    }
}

impl Default for ApRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Stations ─────────────────────────────────────────────────────────

/// Stations keyed by `"{ip}/{intf}"`.
pub struct StationRegistry {
    stations: EntityCollection<Station>,
}

fn station_key(ip: IpAddr, intf: &str) -> String {
    format!("{ip}/{intf}")
}

impl StationRegistry {
    pub fn new() -> Self {
        Self {
            stations: EntityCollection::new(),
        }
    }

    /// Register `station` unless its (IP, interface) is taken.
    pub fn insert(&self, station: Arc<Station>) -> Result<(), Arc<Station>> {
        let key = station_key(station.addr().ip(), station.intf_name());
        self.stations.insert_if_absent(key, station.id(), station)
    }

    pub fn get(&self, ip: IpAddr, intf: &str) -> Option<Arc<Station>> {
        self.stations.get_by_key(&station_key(ip, intf))
    }

    pub fn contains(&self, ip: IpAddr, intf: &str) -> bool {
        self.stations.contains_key(&station_key(ip, intf))
    }

    pub fn get_by_id(&self, id: &EntityId) -> Option<Arc<Station>> {
        self.stations.get_by_id(id)
    }

    /// Every interface registered for `ip`.
    pub fn for_ip(&self, ip: IpAddr) -> Vec<Arc<Station>> {
        self.stations
            .snapshot()
            .iter()
            .filter(|s| s.addr().ip() == ip)
            .cloned()
            .collect()
    }

    pub fn find_by_mac(&self, mac: &MacAddress) -> Option<Arc<Station>> {
        self.stations
            .snapshot()
            .iter()
            .find(|s| s.mac() == mac)
            .cloned()
    }

    pub fn remove(&self, ip: IpAddr, intf: &str) -> Option<Arc<Station>> {
        self.stations.remove(&station_key(ip, intf))
    }

    pub fn all(&self) -> Arc<Vec<Arc<Station>>> {
        self.stations.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Station>>>> {
        self.stations.subscribe()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Networks ─────────────────────────────────────────────────────────

/// Networks keyed by SSID. SSIDs are unique.
pub struct NetworkRegistry {
    networks: EntityCollection<Network>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self {
            networks: EntityCollection::new(),
        }
    }

    /// Create a network; fails if the SSID is taken.
    pub fn create(&self, ssid: &str) -> Result<Arc<Network>, CoreError> {
        let network = Arc::new(Network::new(ssid));
        self.networks
            .insert_if_absent(ssid.to_owned(), network.id(), Arc::clone(&network))
            .map_err(|_| CoreError::DuplicateSsid {
                ssid: ssid.to_owned(),
            })?;
        debug!(%ssid, "network created");
        Ok(network)
    }

    pub fn get_or_create(&self, ssid: &str) -> Arc<Network> {
        let network = Arc::new(Network::new(ssid));
        match self
            .networks
            .insert_if_absent(ssid.to_owned(), network.id(), Arc::clone(&network))
        {
            Ok(()) => {
                debug!(%ssid, "network created");
                network
            }
            Err(existing) => existing,
        }
    }

    pub fn get(&self, ssid: &str) -> Option<Arc<Network>> {
        self.networks.get_by_key(ssid)
    }

    pub fn get_by_id(&self, id: &EntityId) -> Option<Arc<Network>> {
        self.networks.get_by_id(id)
    }

    /// Rename `from` to `to` and retarget every member VAP.
    ///
    /// Fails without changing anything if `to` is already in use.
    pub fn rename(&self, from: &str, to: &str) -> Result<Arc<Network>, CoreError> {
        let network = self.get(from).ok_or_else(|| CoreError::NetworkNotFound {
            ssid: from.to_owned(),
        })?;
        if from == to {
            return Ok(network);
        }
        if to.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "SSID must not be empty".into(),
            });
        }
        self.networks
            .insert_if_absent(to.to_owned(), network.id(), Arc::clone(&network))
            .map_err(|_| CoreError::DuplicateSsid { ssid: to.to_owned() })?;
        self.networks.remove(from);
        network.retarget(to);
        debug!(%from, %to, "network renamed");
        Ok(network)
    }

    /// Remove a network, detaching its member VAPs.
    pub fn remove(&self, ssid: &str) -> Option<Arc<Network>> {
        let network = self.networks.remove(ssid)?;
        for vap in network.vaps() {
            network.deassociate_vap(&vap);
        }
        Some(network)
    }

    pub fn all(&self) -> Arc<Vec<Arc<Network>>> {
        self.networks.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Network>>>> {
        self.networks.subscribe()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── BSSID index ──────────────────────────────────────────────────────

/// BSSID → VAP routing table for association events.
#[derive(Default)]
pub struct VapIndex {
    vaps: DashMap<MacAddress, Weak<Vap>>,
}

impl VapIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, vap: &Arc<Vap>) {
        self.vaps.insert(vap.mac().clone(), Arc::downgrade(vap));
    }

    /// Remove the entry for `vap`, unless it was replaced by another VAP.
    pub fn remove(&self, vap: &Arc<Vap>) {
        self.vaps
            .remove_if(vap.mac(), |_, current| current.ptr_eq(&Arc::downgrade(vap)));
    }

    pub fn get(&self, mac: &MacAddress) -> Option<Arc<Vap>> {
        self.vaps.get(mac).and_then(|r| r.value().upgrade())
    }

    pub fn len(&self) -> usize {
        self.vaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaps.is_empty()
    }
}

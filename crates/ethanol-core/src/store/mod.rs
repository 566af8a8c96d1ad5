// ── Fleet store ──
//
// The registries a controller owns, plus the create-if-absent flows that
// build APs and stations from a device's answers. Handlers and the
// `Controller` facade reach every entity through a shared `Fleet`.

pub(crate) mod collection;
pub mod registry;

pub use registry::{ApRegistry, ApReservation, NetworkRegistry, StationRegistry, VapIndex};

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use ethanol_proto::DeviceClient;
use ethanol_proto::codec::schema::LinkInfo;
use tracing::{debug, info, warn};

use crate::association::AssociationTable;
use crate::error::CoreError;
use crate::model::{Ap, DeviceLink, MacAddress, Station, Vap};

/// Every registry the controller maintains.
#[derive(Default)]
pub struct Fleet {
    pub aps: ApRegistry,
    pub stations: StationRegistry,
    pub networks: NetworkRegistry,
    pub vaps: VapIndex,
    pub associations: AssociationTable,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    // ── APs ──────────────────────────────────────────────────────────

    /// Build and register the AP at `addr` unless its IP is known.
    ///
    /// Returns `Ok(None)` when no new AP was created: the IP is already
    /// registered, or another hello for it is being processed.
    pub async fn add_ap(
        &self,
        client: DeviceClient,
        addr: SocketAddr,
    ) -> Result<Option<Arc<Ap>>, CoreError> {
        let ip = addr.ip();
        let Some(reservation) = self.aps.reserve(ip) else {
            debug!(%ip, "AP already known, nothing created");
            return Ok(None);
        };

        let ap = Arc::new(Ap::discover(client, addr, &self.networks).await?);
        for vap in ap.vaps() {
            self.vaps.insert(vap);
        }
        if self.aps.insert(reservation, Arc::clone(&ap)).is_err() {
            // Unreachable while the reservation is held; undo the index.
            self.discard_ap(&ap);
            return Ok(None);
        }
        info!(%ip, id = %ap.id(), "AP registered");
        Ok(Some(ap))
    }

    /// Unregister the AP at `ip` and tear down its VAPs.
    pub fn remove_ap(&self, ip: IpAddr) -> Option<Arc<Ap>> {
        let ap = self.aps.remove(ip)?;
        self.discard_ap(&ap);
        info!(%ip, id = %ap.id(), "AP removed");
        Some(ap)
    }

    fn discard_ap(&self, ap: &Ap) {
        for vap in ap.vaps() {
            self.vaps.remove(vap);
            self.associations.forget_bssid(vap.mac());
        }
        ap.teardown(&self.networks);
        for network in self.networks.all().iter() {
            network.prune();
        }
    }

    /// Find a VAP by BSSID by scanning every AP.
    pub fn find_vap_by_mac(&self, mac: &MacAddress) -> Option<Arc<Vap>> {
        self.aps
            .all()
            .iter()
            .find_map(|ap| ap.vap_by_mac(mac).cloned())
    }

    // ── Stations ─────────────────────────────────────────────────────

    /// Create one station per wireless interface reported at `addr`.
    ///
    /// Interfaces already registered are skipped. A station whose BSSID
    /// matches no VAP is registered unmanaged.
    pub async fn add_stations(
        &self,
        client: DeviceClient,
        addr: SocketAddr,
    ) -> Result<Vec<Arc<Station>>, CoreError> {
        let ip = addr.ip();
        let probe = DeviceLink::new(client.clone(), addr, "", MacAddress::default());
        let interfaces = client.get_interfaces(addr, probe.next_id()).await?;

        let mut created = Vec::new();
        for intf in interfaces.into_iter().filter(|i| i.is_wifi) {
            if self.stations.contains(ip, &intf.intf_name) {
                debug!(%ip, intf = %intf.intf_name, "station already known");
                continue;
            }
            let link = DeviceLink::new(
                client.clone(),
                addr,
                intf.intf_name.clone(),
                MacAddress::new(&intf.mac),
            );
            let info = link_info(&link).await?;
            let station = Arc::new(Station::new(link, &info));
            if self.stations.insert(Arc::clone(&station)).is_err() {
                continue;
            }

            match station.bssid().and_then(|bssid| self.resolve_vap(&bssid)) {
                Some(vap) => station.attach(&vap),
                None => warn!(
                    %ip,
                    intf = %station.intf_name(),
                    bssid = ?station.bssid(),
                    "station is not connected to a managed VAP"
                ),
            }
            info!(%ip, intf = %station.intf_name(), mac = %station.mac(), "station registered");
            created.push(station);
        }
        Ok(created)
    }

    fn resolve_vap(&self, bssid: &MacAddress) -> Option<Arc<Vap>> {
        self.vaps.get(bssid).or_else(|| self.find_vap_by_mac(bssid))
    }

    /// Remove every station registered for `ip`.
    pub fn remove_stations(&self, ip: IpAddr) -> Vec<Arc<Station>> {
        let mut removed = Vec::new();
        for station in self.stations.for_ip(ip) {
            if let Some(station) = self.stations.remove(ip, station.intf_name()) {
                station.detach();
                removed.push(station);
            }
        }
        removed
    }
}

async fn link_info(link: &DeviceLink) -> Result<LinkInfo, CoreError> {
    Ok(link
        .client()
        .get_link_info(link.addr(), link.next_id(), link.intf_name())
        .await?)
}

// ── Controller facade ──
//
// Owns the fleet, the outbound client, the handoff coordinator, and the
// event channel. Protocol handlers and library callers go through the
// same `ControllerInner` methods, so every mutation emits its event once.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use ethanol_proto::DeviceClient;
use ethanol_proto::server::{Dispatcher, Server};
use ethanol_proto::transport::server_acceptor;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::association::{AssociationEvent, AssociationPolicy};
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::event::FleetEvent;
use crate::handlers;
use crate::handoff::{HandoffCoordinator, HandoffOutcome};
use crate::model::{Ap, MacAddress, ManagementFrame, Network, Station, Vap};
use crate::store::Fleet;

const EVENT_CHANNEL_SIZE: usize = 256;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    pub(crate) config: ControllerConfig,
    pub(crate) fleet: Fleet,
    pub(crate) client: DeviceClient,
    pub(crate) handoffs: HandoffCoordinator,
    events: broadcast::Sender<FleetEvent>,
    cancel: CancellationToken,
}

impl Controller {
    /// Build a controller whose outbound calls use TLS per `config`.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let client = DeviceClient::new(&config.transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Build a controller around an existing client.
    pub fn with_client(config: ControllerConfig, client: DeviceClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let handoffs = HandoffCoordinator::new(config.handoff_timeout);
        Self {
            inner: Arc::new(ControllerInner {
                config,
                fleet: Fleet::new(),
                client,
                handoffs,
                events,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn fleet(&self) -> &Fleet {
        &self.inner.fleet
    }

    pub fn client(&self) -> &DeviceClient {
        &self.inner.client
    }

    /// Follow fleet events.
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.inner.events.subscribe()
    }

    // ── Serving ──────────────────────────────────────────────────────

    /// Dispatch table wired to this controller.
    pub fn dispatcher(&self) -> Dispatcher {
        handlers::dispatcher(&self.inner)
    }

    /// Bind the TLS listener from the configured identity.
    pub async fn bind(&self) -> Result<Server, CoreError> {
        let identity = self
            .inner
            .config
            .identity
            .as_ref()
            .ok_or_else(|| CoreError::Config {
                message: "no server certificate configured".into(),
            })?;
        let acceptor = server_acceptor(&identity.cert, identity.key_path())?;
        let transport = &self.inner.config.transport;
        let server = Server::bind(self.inner.config.listen, acceptor, Arc::new(self.dispatcher()))
            .await?
            .with_timeouts(transport.handshake_timeout, transport.read_timeout);
        Ok(server)
    }

    /// Accept device connections until [`shutdown`](Self::shutdown).
    pub async fn serve(&self) -> Result<(), CoreError> {
        let server = self.bind().await?;
        info!(addr = ?server.local_addr().ok(), "controller serving");
        server.run(self.inner.cancel.child_token()).await?;
        Ok(())
    }

    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── APs ──────────────────────────────────────────────────────────

    /// Notification from the network controller that `ip` connected.
    pub fn connection_up(&self, ip: IpAddr) {
        self.inner.fleet.aps.preregister(ip);
    }

    /// Create the AP at `addr` if its IP is new.
    pub async fn add_ap(&self, addr: SocketAddr) -> Result<Option<Arc<Ap>>, CoreError> {
        self.inner.register_ap(addr).await
    }

    pub fn remove_ap(&self, ip: IpAddr) -> Option<Arc<Ap>> {
        self.inner.remove_ap(ip)
    }

    pub fn ap(&self, ip: IpAddr) -> Option<Arc<Ap>> {
        self.inner.fleet.aps.get(ip)
    }

    pub fn aps(&self) -> Arc<Vec<Arc<Ap>>> {
        self.inner.fleet.aps.all()
    }

    /// VAP with BSSID `mac`, searched across every AP.
    pub fn vap(&self, mac: &MacAddress) -> Option<Arc<Vap>> {
        self.inner.fleet.find_vap_by_mac(mac)
    }

    // ── Stations ─────────────────────────────────────────────────────

    /// Create stations for every new wireless interface at `addr`.
    pub async fn add_stations(&self, addr: SocketAddr) -> Result<Vec<Arc<Station>>, CoreError> {
        self.inner.register_stations(addr).await
    }

    pub fn remove_station(&self, ip: IpAddr, intf: &str) -> Option<Arc<Station>> {
        let station = self.inner.fleet.stations.remove(ip, intf)?;
        station.detach();
        self.inner.emit(FleetEvent::StationRemoved {
            id: station.id(),
            addr: station.addr(),
            intf_name: station.intf_name().to_owned(),
        });
        Some(station)
    }

    pub fn station(&self, ip: IpAddr, intf: &str) -> Option<Arc<Station>> {
        self.inner.fleet.stations.get(ip, intf)
    }

    pub fn stations(&self) -> Arc<Vec<Arc<Station>>> {
        self.inner.fleet.stations.all()
    }

    // ── Networks ─────────────────────────────────────────────────────

    pub fn create_network(&self, ssid: &str) -> Result<Arc<Network>, CoreError> {
        self.inner.fleet.networks.create(ssid)
    }

    pub fn rename_network(&self, from: &str, to: &str) -> Result<Arc<Network>, CoreError> {
        self.inner.fleet.networks.rename(from, to)
    }

    pub fn remove_network(&self, ssid: &str) -> Result<Arc<Network>, CoreError> {
        self.inner
            .fleet
            .networks
            .remove(ssid)
            .ok_or_else(|| CoreError::NetworkNotFound {
                ssid: ssid.to_owned(),
            })
    }

    pub fn network(&self, ssid: &str) -> Option<Arc<Network>> {
        self.inner.fleet.networks.get(ssid)
    }

    pub fn networks(&self) -> Arc<Vec<Arc<Network>>> {
        self.inner.fleet.networks.all()
    }

    /// Move the VAP `bssid` to the network for `ssid`.
    pub fn set_vap_ssid(&self, bssid: &MacAddress, ssid: Option<&str>) -> Result<(), CoreError> {
        let vap = self.require_vap(bssid)?;
        vap.set_ssid(&self.inner.fleet.networks, ssid);
        Ok(())
    }

    pub fn set_vap_policy(
        &self,
        bssid: &MacAddress,
        policy: Arc<dyn AssociationPolicy>,
    ) -> Result<(), CoreError> {
        self.require_vap(bssid)?.set_policy(policy);
        Ok(())
    }

    /// Hand a management frame to the listeners of VAP `bssid`.
    pub fn deliver_management(
        &self,
        bssid: &MacAddress,
        frame: ManagementFrame,
    ) -> Result<usize, CoreError> {
        Ok(self.require_vap(bssid)?.deliver_management(frame))
    }

    fn require_vap(&self, bssid: &MacAddress) -> Result<Arc<Vap>, CoreError> {
        self.vap(bssid).ok_or_else(|| CoreError::VapNotFound { mac: bssid.clone() })
    }

    // ── Handoff ──────────────────────────────────────────────────────

    /// Move `station` to the VAP `target` within its network.
    pub async fn handoff(
        &self,
        station: &Arc<Station>,
        target: &MacAddress,
    ) -> Result<HandoffOutcome, CoreError> {
        let vap = self.require_vap(target)?;
        let outcome = self
            .inner
            .handoffs
            .handoff(&self.inner.fleet, station, &vap)
            .await?;
        self.inner.emit(FleetEvent::HandoffCompleted {
            station: outcome.station.clone(),
            from: outcome.from.clone(),
            to: outcome.to.clone(),
        });
        Ok(outcome)
    }
}

// ── Shared operations ────────────────────────────────────────────────

impl ControllerInner {
    pub(crate) fn emit(&self, event: FleetEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) async fn register_ap(&self, addr: SocketAddr) -> Result<Option<Arc<Ap>>, CoreError> {
        let ip = addr.ip();
        if self.config.require_preregistration && !self.fleet.aps.is_preregistered(ip) {
            return Err(CoreError::NotPreregistered { ip: ip.to_string() });
        }
        let created = self.fleet.add_ap(self.client.clone(), addr).await?;
        if let Some(ap) = &created {
            self.emit(FleetEvent::ApConnected { id: ap.id(), addr });
        }
        Ok(created)
    }

    pub(crate) fn remove_ap(&self, ip: IpAddr) -> Option<Arc<Ap>> {
        let ap = self.fleet.remove_ap(ip)?;
        self.emit(FleetEvent::ApRemoved {
            id: ap.id(),
            addr: ap.addr(),
        });
        Some(ap)
    }

    pub(crate) async fn register_stations(
        &self,
        addr: SocketAddr,
    ) -> Result<Vec<Arc<Station>>, CoreError> {
        let created = self.fleet.add_stations(self.client.clone(), addr).await?;
        for station in &created {
            self.emit(FleetEvent::StationConnected {
                id: station.id(),
                addr: station.addr(),
                intf_name: station.intf_name().to_owned(),
                mac: station.mac().clone(),
                bssid: station.bssid(),
            });
        }
        Ok(created)
    }

    pub(crate) fn remove_stations(&self, ip: IpAddr) {
        for station in self.fleet.remove_stations(ip) {
            self.emit(FleetEvent::StationRemoved {
                id: station.id(),
                addr: station.addr(),
                intf_name: station.intf_name().to_owned(),
            });
        }
    }

    /// Decide one association event and record its outcome.
    ///
    /// Returns `None` when no VAP claims the BSSID; the AP then keeps its
    /// own default and the event is allowed.
    pub(crate) fn process_association(
        &self,
        event: AssociationEvent,
        station: &MacAddress,
        bssid: &MacAddress,
    ) -> Option<bool> {
        let Some(vap) = self.fleet.vaps.get(bssid) else {
            debug!(%station, %bssid, %event, "no VAP for BSSID, allowing");
            return None;
        };
        let allowed = vap.decide(event, station);
        match self.fleet.associations.apply(station, bssid, event, allowed) {
            Ok(transition) => {
                if transition.changed() {
                    self.follow_transition(&vap, station, event);
                    self.emit(FleetEvent::AssociationChanged(transition));
                }
            }
            Err(err) => warn!(error = %err, "association event out of order"),
        }
        Some(allowed)
    }

    fn follow_transition(&self, vap: &Arc<Vap>, station: &MacAddress, event: AssociationEvent) {
        let known = self.fleet.stations.find_by_mac(station);
        match event {
            AssociationEvent::Associating | AssociationEvent::Reassociating => {
                if !self.handoffs.acknowledge(station, vap.mac()) {
                    if let Some(known) = known {
                        known.attach(vap);
                    }
                }
            }
            AssociationEvent::Disassociating | AssociationEvent::Disconnecting => {
                match known.filter(|s| s.vap().is_some_and(|v| Arc::ptr_eq(&v, vap))) {
                    Some(known) => known.detach(),
                    None => {
                        vap.unregister_station(station);
                    }
                }
            }
            AssociationEvent::Connecting | AssociationEvent::Authenticating => {}
        }
    }
}

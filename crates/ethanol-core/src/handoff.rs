// ── Handoff coordination ──
//
// Moving a station between two VAPs of one network: the target VAP
// pre-admits the station, the station is told to roam, and the move is
// committed only once the station (or the target AP) confirms it. A
// handoff that is not confirmed in time is rolled back at the target and
// the source association is left alone. There is no automatic retry.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{MacAddress, Station, Vap};
use crate::store::Fleet;

/// Default time a station has to confirm a transition.
pub const DEFAULT_HANDOFF_TIMEOUT: Duration = Duration::from_secs(5);

struct PendingHandoff {
    target: MacAddress,
    ack: oneshot::Sender<()>,
}

/// Result of a committed handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffOutcome {
    pub station: MacAddress,
    pub from: Option<MacAddress>,
    pub to: MacAddress,
}

/// In-flight handoffs, one per station.
pub struct HandoffCoordinator {
    pending: DashMap<MacAddress, PendingHandoff>,
    timeout: Duration,
}

impl HandoffCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_pending(&self, station: &MacAddress) -> bool {
        self.pending.contains_key(station)
    }

    /// Confirm that `station` now sits at `bssid`.
    ///
    /// Returns `true` when this completed a pending handoff to `bssid`.
    pub fn acknowledge(&self, station: &MacAddress, bssid: &MacAddress) -> bool {
        let Some((_, pending)) = self
            .pending
            .remove_if(station, |_, pending| &pending.target == bssid)
        else {
            return false;
        };
        debug!(%station, %bssid, "handoff acknowledged");
        pending.ack.send(()).is_ok()
    }

    /// Move `station` to `target`.
    pub async fn handoff(
        &self,
        fleet: &Fleet,
        station: &Arc<Station>,
        target: &Arc<Vap>,
    ) -> Result<HandoffOutcome, CoreError> {
        let mac = station.mac().clone();
        let source = station.vap();
        check_same_network(fleet, source.as_ref(), target)?;

        if !target.reserve(&mac) {
            return Err(CoreError::HandoffRejected {
                station: mac,
                target: target.mac().clone(),
            });
        }

        let (ack, confirmed) = oneshot::channel();
        match self.pending.entry(mac.clone()) {
            Entry::Occupied(_) => {
                target.release(&mac);
                return Err(CoreError::HandoffInvalid {
                    reason: format!("a handoff of {mac} is already in progress"),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingHandoff {
                    target: target.mac().clone(),
                    ack,
                });
            }
        }

        info!(station = %mac, from = ?source.as_ref().map(|v| v.mac()), to = %target.mac(), "handoff started");
        if let Err(err) = station.trigger_transition(target.mac()).await {
            self.abandon(&mac, target);
            return Err(err);
        }

        match tokio::time::timeout(self.timeout, confirmed).await {
            Ok(Ok(())) => Ok(self.commit(fleet, station, source.as_ref(), target)),
            Ok(Err(_)) => {
                target.release(&mac);
                Err(CoreError::HandoffInvalid {
                    reason: format!("handoff of {mac} was cancelled"),
                })
            }
            Err(_) => {
                self.abandon(&mac, target);
                warn!(station = %mac, target = %target.mac(), "handoff not confirmed in time");
                Err(CoreError::HandoffTimeout {
                    station: mac,
                    target: target.mac().clone(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Drop a pending handoff and its reservation.
    fn abandon(&self, station: &MacAddress, target: &Vap) {
        self.pending
            .remove_if(station, |_, pending| &pending.target == target.mac());
        target.release(station);
    }

    fn commit(
        &self,
        fleet: &Fleet,
        station: &Arc<Station>,
        source: Option<&Arc<Vap>>,
        target: &Arc<Vap>,
    ) -> HandoffOutcome {
        let mac = station.mac().clone();
        let from = source.map(|vap| vap.mac().clone()).or_else(|| station.bssid());
        target.release(&mac);
        fleet
            .associations
            .move_station(&mac, from.as_ref(), target.mac());
        if source.is_none() && from.is_some() {
            warn!(station = %mac, from = ?from, "source VAP is gone; committing without cleanup");
        }
        station.attach(target);
        info!(station = %mac, to = %target.mac(), "handoff completed");
        HandoffOutcome {
            station: mac,
            from,
            to: target.mac().clone(),
        }
    }
}

impl Default for HandoffCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_HANDOFF_TIMEOUT)
    }
}

/// Source and target must belong to one network.
fn check_same_network(
    fleet: &Fleet,
    source: Option<&Arc<Vap>>,
    target: &Arc<Vap>,
) -> Result<(), CoreError> {
    let Some(ssid) = target.ssid() else {
        return Err(CoreError::SsidRequired {
            mac: target.mac().clone(),
        });
    };
    let network = fleet
        .networks
        .get(&ssid)
        .ok_or_else(|| CoreError::NetworkNotFound { ssid: ssid.clone() })?;
    if !network.contains(target) {
        return Err(CoreError::HandoffInvalid {
            reason: format!("VAP {} is not part of network {ssid:?}", target.mac()),
        });
    }
    if let Some(source) = source {
        if Arc::ptr_eq(source, target) {
            return Err(CoreError::HandoffInvalid {
                reason: format!("station is already attached to {}", target.mac()),
            });
        }
        if !network.contains(source) {
            return Err(CoreError::HandoffInvalid {
                reason: format!(
                    "source VAP {} and target {} are in different networks",
                    source.mac(),
                    target.mac()
                ),
            });
        }
    }
    Ok(())
}

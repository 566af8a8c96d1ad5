// ── Fleet events ──
//
// Everything the controller learns from devices is also published on a
// broadcast channel so consumers can follow the fleet without polling.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::association::Transition;
use crate::model::{EntityId, MacAddress};

/// Something that happened in the fleet.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FleetEvent {
    ApConnected {
        id: EntityId,
        addr: SocketAddr,
    },
    ApRemoved {
        id: EntityId,
        addr: SocketAddr,
    },
    StationConnected {
        id: EntityId,
        addr: SocketAddr,
        intf_name: String,
        mac: MacAddress,
        bssid: Option<MacAddress>,
    },
    StationRemoved {
        id: EntityId,
        addr: SocketAddr,
        intf_name: String,
    },
    AssociationChanged(Transition),
    HandoffCompleted {
        station: MacAddress,
        from: Option<MacAddress>,
        to: MacAddress,
    },
    MetricReceived {
        peer: SocketAddr,
        mac: MacAddress,
        metric: u64,
        value: f32,
        at: DateTime<Utc>,
    },
    SnrThresholdReached {
        peer: SocketAddr,
        station: MacAddress,
        bssid: MacAddress,
        intf_name: String,
        snr: i64,
    },
}

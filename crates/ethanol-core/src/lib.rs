//! Device model and association control for the Ethanol wireless controller.
//!
//! This crate sits between `ethanol-proto` and the `ethanol` binary:
//!
//! - **[`Controller`]** — Facade that owns the fleet, serves the protocol
//!   listener, and exposes AP, station, network, and handoff operations.
//!   Cheap to clone; every clone shares one fleet.
//!
//! - **[`Fleet`]** — The registries: APs by IP, stations by (IP, interface),
//!   networks by SSID, and the BSSID index that routes association events.
//!   Each registry guards itself, so handlers on concurrent connections can
//!   mutate the fleet without a global lock.
//!
//! - **Domain model** ([`model`]) — `Ap` owns its `Radio`s and `Vap`s;
//!   `Network` groups VAPs by SSID; `Station` points back at its VAP. Radios,
//!   VAPs, and stations talk to their device through a shared
//!   [`DeviceLink`](model::DeviceLink).
//!
//! - **Association** ([`association`], [`handoff`]) — Per (station, BSSID)
//!   state machine driven by AP events and decided by each VAP's
//!   [`AssociationPolicy`], plus the coordinator that moves a station
//!   between VAPs of one network.

pub mod association;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
mod handlers;
pub mod handoff;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use association::{
    AllowAll, AssociationEvent, AssociationPolicy, AssociationState, AssociationTable, Transition,
};
pub use config::{ControllerConfig, ServerIdentity};
pub use controller::Controller;
pub use error::CoreError;
pub use event::FleetEvent;
pub use handoff::{DEFAULT_HANDOFF_TIMEOUT, HandoffCoordinator, HandoffOutcome};
pub use store::Fleet;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Ap, ApSummary, DeviceLink, EntityId, MacAddress, ManagementFrame, Network, NetworkSummary,
    Radio, RadioSummary, Station, StationSummary, Vap, VapSummary,
};

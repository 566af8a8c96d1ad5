//! Wire protocol and transport for the Ethanol wireless control plane.
//!
//! Ethanol controllers manage access points and stations by exchanging
//! small binary messages over short-lived TLS connections: one request,
//! at most one reply, one connection. This crate provides:
//!
//! - **[`codec`]** — the message catalog, per-type payload schemas, and
//!   [`encode`](codec::encode) / [`decode`](codec::decode).
//! - **[`DeviceClient`]** — opens a connection per call through a
//!   [`Connector`](transport::Connector) and exposes one typed helper per
//!   catalog operation.
//! - **[`server`]** — a TLS accept loop that routes requests through a
//!   [`Dispatcher`](server::Dispatcher) keyed by message type.
//! - **[`transport`]** — framing, rustls configuration, and timeouts.
//!
//! Higher layers (`ethanol-core`) build the device model on top of this.

pub mod client;
pub mod codec;
pub mod error;
pub mod server;
pub mod transport;

pub use client::{CallMode, CounterKind, DeviceClient, PingOutcome};
pub use codec::{Message, MessageType, Payload, Schema};
pub use error::{Error, ErrorCode};
pub use transport::{TlsMode, TransportConfig};

// Shared transport configuration for the per-request TLS connections.
//
// Client and server both build their rustls configs through this module,
// and every stream the client uses is produced by a `Connector`.

mod connector;
mod frame;
mod tls;

pub use connector::{Connector, DeviceStream, TlsConnector};
pub use frame::{read_frame, write_frame};
pub use tls::{load_server_config, server_acceptor};

use std::path::PathBuf;
use std::time::Duration;

/// Default control port for AP-facing traffic.
pub const AP_PORT: u16 = 22222;

/// Default control port for station-facing traffic.
pub const STATION_PORT: u16 = AP_PORT + 1;

/// Certificate verification applied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Trust only certificates chaining to the PEM file at the given path.
    ///
    /// Pointing this at the controller's own certificate pins it.
    CustomCa(PathBuf),
    /// Accept any certificate (devices ship self-signed ones).
    #[default]
    DangerAcceptInvalid,
}

/// Timeouts and trust settings for outbound calls.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            connect_timeout: Duration::from_secs(3),
            handshake_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(5),
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

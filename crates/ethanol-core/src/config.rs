// ── Controller configuration ──
//
// Runtime settings handed to `Controller::new`. File and environment
// loading lives in ethanol-config, which builds this struct.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ethanol_proto::TransportConfig;
use ethanol_proto::transport::AP_PORT;

use crate::handoff::DEFAULT_HANDOFF_TIMEOUT;

/// Certificate and private key presented by the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub cert: PathBuf,
    /// Falls back to `cert` when the key shares the certificate's file.
    pub key: Option<PathBuf>,
}

impl ServerIdentity {
    pub fn key_path(&self) -> &Path {
        self.key.as_deref().unwrap_or(&self.cert)
    }
}

/// Configuration for a controller instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Address the protocol listener binds.
    pub listen: SocketAddr,
    /// Outbound call settings (TLS trust, timeouts).
    pub transport: TransportConfig,
    /// Listener identity; required only for `serve`.
    pub identity: Option<ServerIdentity>,
    /// How long a station has to confirm a handoff.
    pub handoff_timeout: Duration,
    /// Reject AP hellos from IPs the network controller never reported.
    pub require_preregistration: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, AP_PORT)),
            transport: TransportConfig::default(),
            identity: None,
            handoff_timeout: DEFAULT_HANDOFF_TIMEOUT,
            require_preregistration: false,
        }
    }
}

// ── Connection establishment ──
//
// `DeviceClient` never opens sockets itself; it asks a `Connector` for a
// fresh byte stream per call. Production uses TLS over TCP, tests plug in
// in-memory duplex pipes.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::{TransportConfig, millis, tls};
use crate::error::Error;

/// A bidirectional stream to one device.
pub trait DeviceStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DeviceStream for T {}

/// Opens one stream per request.
pub trait Connector: Send + Sync + fmt::Debug {
    fn connect(&self, addr: SocketAddr) -> BoxFuture<'_, Result<Box<dyn DeviceStream>, Error>>;
}

/// TLS-over-TCP connector with connect and handshake deadlines.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConnector")
            .field("connect_timeout", &self.connect_timeout)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish_non_exhaustive()
    }
}

impl TlsConnector {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client_config(
            tls::client_config(&config.tls)?,
            config,
        ))
    }

    pub fn with_client_config(client: Arc<ClientConfig>, config: &TransportConfig) -> Self {
        Self {
            inner: tokio_rustls::TlsConnector::from(client),
            connect_timeout: config.connect_timeout,
            handshake_timeout: config.handshake_timeout,
        }
    }

    async fn open(&self, addr: SocketAddr) -> Result<Box<dyn DeviceStream>, Error> {
        let tcp = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Timeout {
                operation: "TCP connect",
                timeout_ms: millis(self.connect_timeout),
            })?
            .map_err(|source| Error::ConnectionFailure { addr, source })?;
        tcp.set_nodelay(true)?;

        let server_name = ServerName::IpAddress(addr.ip().into());
        let stream = timeout(self.handshake_timeout, self.inner.connect(server_name, tcp))
            .await
            .map_err(|_| Error::Timeout {
                operation: "TLS handshake",
                timeout_ms: millis(self.handshake_timeout),
            })?
            .map_err(|e| Error::Tls(format!("handshake with {addr} failed: {e}")))?;

        debug!(%addr, "TLS session established");
        Ok(Box::new(stream))
    }
}

impl Connector for TlsConnector {
    fn connect(&self, addr: SocketAddr) -> BoxFuture<'_, Result<Box<dyn DeviceStream>, Error>> {
        Box::pin(self.open(addr))
    }
}

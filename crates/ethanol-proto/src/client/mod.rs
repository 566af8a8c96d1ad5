// Request/response client for Ethanol devices.
//
// Every call opens its own connection, writes one request, optionally
// reads one reply, and closes. Typed helpers for each catalog operation
// live in the submodules and all funnel through `DeviceClient::call`.

mod device;
mod radio;
mod station;
mod stats;
mod system;
mod vap;

pub use device::CounterKind;
pub use system::PingOutcome;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::codec::{self, Message, MessageType, Payload};
use crate::error::{Error, ErrorCode};
use crate::transport::{
    Connector, TlsConnector, TransportConfig, millis, read_frame, write_frame,
};

/// Whether the caller waits for a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    AwaitReply,
    /// Write the request and close; the device sends nothing back.
    FireAndForget,
}

/// Client for the per-request device protocol.
///
/// Cheap to clone; the connector is shared.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    connector: Arc<dyn Connector>,
    read_timeout: Duration,
}

impl DeviceClient {
    /// Build a client that connects over TLS.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let connector = TlsConnector::new(config)?;
        Ok(Self::with_connector(Arc::new(connector), config.read_timeout))
    }

    /// Build a client over an arbitrary connector (tests use in-memory pipes).
    pub fn with_connector(connector: Arc<dyn Connector>, read_timeout: Duration) -> Self {
        Self {
            connector,
            read_timeout,
        }
    }

    /// Send one request over a fresh connection.
    ///
    /// `Ok(None)` is returned only in fire-and-forget mode. An ERR reply
    /// becomes `Err(Error::Remote)`.
    pub async fn call(
        &self,
        addr: SocketAddr,
        request: &Message,
        mode: CallMode,
    ) -> Result<Option<Message>, Error> {
        let frame = codec::encode(request)?;
        let mut stream = self.connector.connect(addr).await?;
        trace!(
            %addr,
            message_type = %request.message_type,
            id = request.id,
            bytes = frame.len(),
            "sending request"
        );
        write_frame(&mut stream, &frame)
            .await
            .map_err(|e| reset_to_failure(addr, e))?;

        if mode == CallMode::FireAndForget {
            // Peer may already have closed; the request was delivered.
            let _ = stream.shutdown().await;
            return Ok(None);
        }

        let reply = timeout(self.read_timeout, read_frame(&mut stream))
            .await
            .map_err(|_| Error::Timeout {
                operation: "reply read",
                timeout_ms: millis(self.read_timeout),
            })?
            .map_err(|e| reset_to_failure(addr, e))?;
        let _ = stream.shutdown().await;

        let Some(reply) = reply else {
            return Err(Error::EmptyResponse { addr });
        };
        let reply = codec::decode(&reply)?;
        if let Payload::Error(report) = &reply.payload {
            let code = ErrorCode::from_wire(report.error_type);
            warn!(%addr, id = reply.id, %code, request = %request.message_type, "device replied with error");
            return Err(Error::Remote { code, id: reply.id });
        }
        debug!(%addr, message_type = %reply.message_type, id = reply.id, "reply received");
        Ok(Some(reply))
    }

    /// Send a request and require a reply.
    pub(crate) async fn request(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        payload: Payload,
    ) -> Result<Message, Error> {
        let request = Message::new(message_type, id, payload);
        self.call(addr, &request, CallMode::AwaitReply)
            .await?
            .ok_or(Error::EmptyResponse { addr })
    }

    /// Send a request without waiting for a reply.
    pub(crate) async fn send(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        payload: Payload,
    ) -> Result<(), Error> {
        let request = Message::new(message_type, id, payload);
        self.call(addr, &request, CallMode::FireAndForget)
            .await
            .map(|_| ())
    }
}

/// Map an I/O error on an established stream to a connection failure.
fn reset_to_failure(addr: SocketAddr, err: Error) -> Error {
    match err {
        Error::Io(source) => Error::ConnectionFailure { addr, source },
        other => other,
    }
}

/// Unwrap the expected payload variant of a reply or report the missing field.
macro_rules! expect_payload {
    ($reply:expr, $variant:ident, $field:literal) => {
        match $reply {
            $crate::codec::Message {
                payload: $crate::codec::Payload::$variant(inner),
                ..
            } => inner,
            other => {
                return Err($crate::error::Error::FieldNotFound {
                    message_type: other.message_type,
                    field: $field,
                });
            }
        }
    };
}

pub(crate) use expect_payload;

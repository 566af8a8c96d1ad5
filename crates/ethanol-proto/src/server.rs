// ── Request server ──
//
// Accepts TLS connections, reads one request per connection, routes it
// through a dispatch table keyed by message type, and writes back the
// handler's reply (if any). Failures are isolated per connection and
// answered with ERR messages wherever a reply is still possible.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::codec::{self, Message, MessageType, PROTOCOL_VERSION, RawHeader};
use crate::error::{Error, ErrorCode};
use crate::transport::{millis, read_frame, write_frame};

// ── Handlers ─────────────────────────────────────────────────────────

/// Processes one decoded request.
///
/// `Ok(None)` means nothing is written back.
pub trait Handler: Send + Sync {
    fn handle(
        &self,
        peer: SocketAddr,
        message: Message,
    ) -> BoxFuture<'_, Result<Option<Message>, Error>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(SocketAddr, Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Message>, Error>> + Send + 'static,
{
    fn handle(
        &self,
        peer: SocketAddr,
        message: Message,
    ) -> BoxFuture<'_, Result<Option<Message>, Error>> {
        Box::pin(self(peer, message))
    }
}

/// Dispatch table from message type to handler.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<MessageType, Arc<dyn Handler>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort();
        f.debug_struct("Dispatcher").field("handles", &types).finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `message_type` to `handler`, replacing any previous route.
    pub fn register(&mut self, message_type: MessageType, handler: Arc<dyn Handler>) -> &mut Self {
        self.handlers.insert(message_type, handler);
        self
    }

    /// Route several types to one shared handler.
    pub fn register_all(
        &mut self,
        types: impl IntoIterator<Item = MessageType>,
        handler: &Arc<dyn Handler>,
    ) -> &mut Self {
        for message_type in types {
            self.handlers.insert(message_type, Arc::clone(handler));
        }
        self
    }

    pub fn handles(&self, message_type: MessageType) -> bool {
        self.handlers.contains_key(&message_type)
    }

    /// Turn one request frame into the reply to write, if any.
    pub async fn dispatch(&self, peer: SocketAddr, frame: &[u8]) -> Option<Message> {
        let raw = match RawHeader::read(frame) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%peer, error = %err, "undecodable header");
                return Some(Message::error(0, ErrorCode::Unknown));
            }
        };
        let Ok(message_type) = MessageType::from_tag(raw.tag) else {
            warn!(%peer, tag = raw.tag, id = raw.id, "message without known type");
            return Some(Message::error(raw.id, ErrorCode::MessageWithoutType));
        };
        if raw.version != PROTOCOL_VERSION {
            warn!(%peer, version = %raw.version, %message_type, "protocol version mismatch");
            return Some(Message::error(raw.id, ErrorCode::VersionMismatch));
        }
        let Some(handler) = self.handlers.get(&message_type) else {
            debug!(%peer, %message_type, "no handler registered");
            return Some(Message::error(raw.id, ErrorCode::ProcessNotImplemented));
        };

        let message = match codec::decode(frame) {
            Ok(message) => message,
            Err(err) => {
                warn!(%peer, %message_type, id = raw.id, error = %err, "failed to decode request");
                return Some(Message::error(raw.id, err.code()));
            }
        };

        trace!(%peer, %message_type, id = raw.id, "dispatching");
        match handler.handle(peer, message).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%peer, %message_type, id = raw.id, error = %err, "handler failed");
                Some(Message::error(raw.id, err.code()))
            }
        }
    }
}

// ── Connections ──────────────────────────────────────────────────────

/// Serve exactly one request on an established stream.
pub async fn serve_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    dispatcher: &Dispatcher,
    read_timeout: Duration,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = timeout(read_timeout, read_frame(&mut stream))
        .await
        .map_err(|_| Error::Timeout {
            operation: "request read",
            timeout_ms: millis(read_timeout),
        })??;
    let Some(frame) = frame else {
        trace!(%peer, "peer closed without a request");
        return Ok(());
    };

    if let Some(reply) = dispatcher.dispatch(peer, &frame).await {
        let bytes = codec::encode(&reply)?;
        write_frame(&mut stream, &bytes).await?;
    }
    // The client may have hung up after a fire-and-forget write.
    let _ = stream.shutdown().await;
    Ok(())
}

/// TLS listener driving a `Dispatcher`.
pub struct Server {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    dispatcher: Arc<Dispatcher>,
    handshake_timeout: Duration,
    read_timeout: Duration,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Server {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        acceptor: TlsAcceptor,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            acceptor,
            dispatcher,
            handshake_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_timeouts(mut self, handshake: Duration, read: Duration) -> Self {
        self.handshake_timeout = handshake;
        self.read_timeout = read;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `cancel` fires, then wait for in-flight
    /// connections to finish.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), Error> {
        info!(addr = ?self.listener.local_addr().ok(), "listening");
        let mut tasks = JoinSet::new();

        loop {
            let accepted = tokio::select! {
                () = cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };
            while tasks.try_join_next().is_some() {}

            let (tcp, peer) = match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            };

            let acceptor = self.acceptor.clone();
            let dispatcher = Arc::clone(&self.dispatcher);
            let handshake_timeout = self.handshake_timeout;
            let read_timeout = self.read_timeout;
            tasks.spawn(async move {
                let stream = match timeout(handshake_timeout, acceptor.accept(tcp)).await {
                    Ok(Ok(stream)) => stream,
                    Ok(Err(err)) => {
                        warn!(%peer, error = %err, "TLS handshake failed");
                        return;
                    }
                    Err(_) => {
                        warn!(%peer, "TLS handshake timed out");
                        return;
                    }
                };
                if let Err(err) = serve_connection(stream, peer, &dispatcher, read_timeout).await {
                    warn!(%peer, error = %err, "connection failed");
                }
            });
        }

        info!(in_flight = tasks.len(), "shutting down listener");
        while tasks.join_next().await.is_some() {}
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::schema::{Ping, PingData, Pong};
    use crate::codec::{Payload, decode, encode};

    fn peer() -> SocketAddr {
        "10.0.0.5:40000".parse().unwrap()
    }

    fn ping(id: i32) -> Vec<u8> {
        encode(&Message::new(
            MessageType::Ping,
            id,
            Payload::Ping(Ping {
                data: PingData::pattern(8),
            }),
        ))
        .unwrap()
        .to_vec()
    }

    fn pong_dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            MessageType::Ping,
            Arc::new(|_peer: SocketAddr, msg: Message| async move {
                Ok::<_, Error>(Some(Message::new(
                    MessageType::Pong,
                    msg.id,
                    Payload::Pong(Pong {
                        rtt: 0.0,
                        verify_data: true,
                    }),
                )))
            }),
        );
        dispatcher
    }

    fn error_code(reply: Option<Message>) -> (i32, i32) {
        match reply.unwrap() {
            Message {
                id,
                payload: Payload::Error(report),
                ..
            } => (id, report.error_type),
            other => panic!("expected ERR, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn routes_to_registered_handler() {
        let reply = pong_dispatcher().dispatch(peer(), &ping(9)).await.unwrap();
        assert_eq!(reply.message_type, MessageType::Pong);
        assert_eq!(reply.id, 9);
    }

    #[tokio::test]
    async fn unknown_tag_gets_message_without_type() {
        let mut frame = ping(4);
        frame[..4].copy_from_slice(&999_i32.to_le_bytes());
        let reply = pong_dispatcher().dispatch(peer(), &frame).await;
        assert_eq!(error_code(reply), (4, ErrorCode::MessageWithoutType.as_wire()));
    }

    #[tokio::test]
    async fn missing_handler_gets_not_implemented() {
        let frame = encode(&Message::error(6, ErrorCode::Unknown)).unwrap();
        let reply = pong_dispatcher().dispatch(peer(), &frame).await;
        assert_eq!(
            error_code(reply),
            (6, ErrorCode::ProcessNotImplemented.as_wire())
        );
    }

    #[tokio::test]
    async fn wrong_version_gets_version_mismatch() {
        let mut frame = ping(2);
        frame[16] = b'9';
        let reply = pong_dispatcher().dispatch(peer(), &frame).await;
        assert_eq!(error_code(reply), (2, ErrorCode::VersionMismatch.as_wire()));
    }

    #[tokio::test]
    async fn handler_error_is_mapped_to_code() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            MessageType::Ping,
            Arc::new(|_peer: SocketAddr, _msg: Message| async move {
                Err::<Option<Message>, _>(Error::InterfaceNotFound {
                    interface: "wlan9".into(),
                })
            }),
        );
        let reply = dispatcher.dispatch(peer(), &ping(3)).await;
        assert_eq!(error_code(reply), (3, ErrorCode::InterfaceNotFound.as_wire()));
    }

    #[tokio::test]
    async fn none_reply_writes_nothing() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            MessageType::Ping,
            Arc::new(|_peer: SocketAddr, _msg: Message| async move { Ok::<Option<Message>, Error>(None) }),
        );
        let (client, server) = tokio::io::duplex(1024);
        let (mut read_half, mut write_half) = tokio::io::split(client);
        write_frame(&mut write_half, &ping(1)).await.unwrap();
        serve_connection(server, peer(), &dispatcher, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(read_frame(&mut read_half).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn connection_round_trip_over_duplex() {
        let dispatcher = pong_dispatcher();
        let (mut client, server) = tokio::io::duplex(1024);
        write_frame(&mut client, &ping(12)).await.unwrap();
        serve_connection(server, peer(), &dispatcher, Duration::from_secs(1))
            .await
            .unwrap();
        let reply = decode(&read_frame(&mut client).await.unwrap().unwrap()).unwrap();
        assert_eq!(reply.id, 12);
        assert_eq!(reply.message_type, MessageType::Pong);
    }
}

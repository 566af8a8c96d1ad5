// ── Protocol handlers ──
//
// Inbound messages from APs and stations, routed by the dispatch table
// the controller builds. Failures that the device should learn about are
// answered with an ERR message; notifications get no reply.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use ethanol_proto::codec::schema::{Association, DeviceKind, Pong};
use ethanol_proto::server::{Dispatcher, Handler};
use ethanol_proto::transport::{AP_PORT, STATION_PORT};
use ethanol_proto::{Error, Message, MessageType, Payload};
use tracing::{debug, info, warn};

use crate::association::AssociationEvent;
use crate::controller::ControllerInner;
use crate::error::CoreError;
use crate::event::FleetEvent;
use crate::model::MacAddress;

type HandlerResult = Result<Option<Message>, Error>;

/// Build the dispatch table for `inner`.
pub(crate) fn dispatcher(inner: &Arc<ControllerInner>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(MessageType::Hello, handler(inner, hello))
        .register(MessageType::Bye, handler(inner, bye))
        .register(MessageType::Ping, handler(inner, ping))
        .register(MessageType::ChangedAp, handler(inner, changed_ap))
        .register(MessageType::SnrThresholdReached, handler(inner, snr_threshold_reached))
        .register(MessageType::MetricReceived, handler(inner, metric_received))
        .register_all(
            [
                MessageType::UserConnecting,
                MessageType::Authorization,
                MessageType::Association,
                MessageType::Reassociation,
                MessageType::Disassociation,
                MessageType::UserDisconnecting,
            ],
            &handler(inner, association),
        );
    dispatcher
}

fn handler<F, Fut>(inner: &Arc<ControllerInner>, f: F) -> Arc<dyn Handler>
where
    F: Fn(Arc<ControllerInner>, SocketAddr, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let inner = Arc::clone(inner);
    Arc::new(move |peer: SocketAddr, msg: Message| f(Arc::clone(&inner), peer, msg))
}

fn missing(message_type: MessageType, field: &'static str) -> Error {
    Error::FieldNotFound {
        message_type,
        field,
    }
}

fn error_reply(id: i32, err: &CoreError) -> Option<Message> {
    Some(Message::error(id, err.wire_code()))
}

/// Where the device accepts requests: its IP plus the port it announced.
fn device_addr(peer: SocketAddr, tcp_port: i32, kind: Option<DeviceKind>) -> SocketAddr {
    let default = match kind {
        Some(DeviceKind::Station) => STATION_PORT,
        _ => AP_PORT,
    };
    let port = u16::try_from(tcp_port)
        .ok()
        .filter(|p| *p != 0)
        .unwrap_or(default);
    SocketAddr::new(peer.ip(), port)
}

// ── Session ──────────────────────────────────────────────────────────

/// Register the sender and echo its hello.
async fn hello(inner: Arc<ControllerInner>, peer: SocketAddr, msg: Message) -> HandlerResult {
    let Payload::Hello(hello) = &msg.payload else {
        return Err(missing(msg.message_type, "device_type"));
    };
    let kind = hello.device_kind();
    let addr = device_addr(peer, hello.tcp_port, kind);
    info!(%peer, %addr, ?kind, "hello");

    let outcome = match kind {
        Some(DeviceKind::AccessPoint) => inner.register_ap(addr).await.map(|_| ()),
        Some(DeviceKind::Station) => inner.register_stations(addr).await.map(|_| ()),
        _ => Ok(()),
    };
    match outcome {
        Ok(()) => Ok(Some(msg)),
        Err(err) => {
            warn!(%peer, error = %err, "hello rejected");
            Ok(error_reply(msg.id, &err))
        }
    }
}

/// Forget everything registered for the sender's IP.
async fn bye(inner: Arc<ControllerInner>, peer: SocketAddr, _msg: Message) -> HandlerResult {
    let ip = peer.ip();
    inner.remove_ap(ip);
    inner.remove_stations(ip);
    info!(%peer, "bye");
    Ok(None)
}

async fn ping(_inner: Arc<ControllerInner>, peer: SocketAddr, msg: Message) -> HandlerResult {
    let Payload::Ping(ping) = &msg.payload else {
        return Err(missing(msg.message_type, "data"));
    };
    let verify_data = ping.data.matches_pattern();
    debug!(%peer, id = msg.id, bytes = ping.data.0.len(), verify_data, "ping");
    Ok(Some(Message::new(
        MessageType::Pong,
        msg.id,
        Payload::Pong(Pong {
            rtt: 0.0,
            verify_data,
        }),
    )))
}

// ── Association ──────────────────────────────────────────────────────

/// Answer one lifecycle event with the VAP policy's decision.
async fn association(inner: Arc<ControllerInner>, peer: SocketAddr, msg: Message) -> HandlerResult {
    let Some(event) = AssociationEvent::from_message_type(msg.message_type) else {
        return Err(missing(msg.message_type, "mac_sta"));
    };
    let Payload::Association(request) = msg.payload else {
        return Err(missing(msg.message_type, "mac_sta"));
    };
    let station = MacAddress::new(&request.mac_sta);
    let bssid = MacAddress::new(&request.mac_ap);
    let decision = inner.process_association(event, &station, &bssid);
    let allowed = decision.unwrap_or(true);
    // 0 tells the AP to apply its default, which accepts.
    let response = match decision {
        Some(allowed) if event.reports_response() => i32::from(allowed),
        _ => 0,
    };
    debug!(%peer, %station, %bssid, %event, allowed, "association event");
    Ok(Some(Message::new(
        msg.message_type,
        msg.id,
        Payload::Association(Association {
            allowed,
            response,
            ..request
        }),
    )))
}

/// A station reports the AP it is now connected to.
async fn changed_ap(inner: Arc<ControllerInner>, peer: SocketAddr, msg: Message) -> HandlerResult {
    let Payload::ChangedAp(changed) = &msg.payload else {
        return Err(missing(msg.message_type, "current_ap"));
    };
    let Some(station) = inner.fleet.stations.get(peer.ip(), &changed.intf_name) else {
        debug!(%peer, intf = %changed.intf_name, "changed AP from unknown station");
        return Ok(None);
    };
    let bssid = MacAddress::new(&changed.current_ap);
    if !inner.handoffs.acknowledge(station.mac(), &bssid) {
        debug!(station = %station.mac(), %bssid, status = changed.status, "unsolicited AP change");
    }
    Ok(None)
}

// ── Notifications ────────────────────────────────────────────────────

async fn snr_threshold_reached(
    inner: Arc<ControllerInner>,
    peer: SocketAddr,
    msg: Message,
) -> HandlerResult {
    let Payload::SnrThresholdReached(report) = msg.payload else {
        return Err(missing(msg.message_type, "snr"));
    };
    info!(%peer, station = %report.mac_sta, snr = report.snr, "SNR threshold reached");
    inner.emit(FleetEvent::SnrThresholdReached {
        peer,
        station: MacAddress::new(&report.mac_sta),
        bssid: MacAddress::new(&report.mac_ap),
        intf_name: report.intf_name,
        snr: report.snr,
    });
    Ok(None)
}

async fn metric_received(
    inner: Arc<ControllerInner>,
    peer: SocketAddr,
    msg: Message,
) -> HandlerResult {
    let Payload::MetricReport(report) = msg.payload else {
        return Err(missing(msg.message_type, "metric"));
    };
    debug!(%peer, metric = report.metric, value = report.value, "metric received");
    inner.emit(FleetEvent::MetricReceived {
        peer,
        mac: MacAddress::new(&report.mac),
        metric: report.metric,
        value: report.value,
        at: Utc::now(),
    });
    Ok(None)
}

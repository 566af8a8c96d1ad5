#![allow(clippy::unwrap_used, dead_code)]

// Fake APs and stations served over in-memory pipes, routed by address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ethanol_core::{Controller, ControllerConfig};
use ethanol_proto::codec::schema::{
    ApSsids, Association, Bye, ChangedAp, Hello, InterfaceEntry, Interfaces, LinkInfo, RadioWlan,
    RadioWlans, SsidInfo,
};
use ethanol_proto::codec::{self, MAX_MESSAGE_SIZE};
use ethanol_proto::server::{Dispatcher, Handler, serve_connection};
use ethanol_proto::transport::{Connector, DeviceStream};
use ethanol_proto::{DeviceClient, Error, Message, MessageType, Payload};
use futures_util::future::BoxFuture;
use tokio::sync::Notify;

pub const SSID: &str = "ethanol";
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Routes each connection to the fake device registered at its address.
#[derive(Debug, Default)]
pub struct FakeDevices {
    devices: Mutex<HashMap<SocketAddr, Arc<Dispatcher>>>,
}

impl FakeDevices {
    pub fn add(&self, addr: SocketAddr, dispatcher: Dispatcher) {
        self.devices
            .lock()
            .unwrap()
            .insert(addr, Arc::new(dispatcher));
    }
}

impl Connector for FakeDevices {
    fn connect(&self, addr: SocketAddr) -> BoxFuture<'_, Result<Box<dyn DeviceStream>, Error>> {
        let device = self.devices.lock().unwrap().get(&addr).cloned();
        Box::pin(async move {
            let Some(dispatcher) = device else {
                return Err(Error::ConnectionFailure {
                    addr,
                    source: std::io::ErrorKind::ConnectionRefused.into(),
                });
            };
            let (client, server) = tokio::io::duplex(MAX_MESSAGE_SIZE);
            tokio::spawn(async move {
                let _ = serve_connection(server, addr, &dispatcher, READ_TIMEOUT).await;
            });
            Ok(Box::new(client) as Box<dyn DeviceStream>)
        })
    }
}

/// A controller whose outbound calls reach `devices`.
pub fn controller(devices: &Arc<FakeDevices>, config: ControllerConfig) -> Controller {
    let connector: Arc<dyn Connector> = Arc::clone(devices) as Arc<dyn Connector>;
    Controller::with_client(config, DeviceClient::with_connector(connector, READ_TIMEOUT))
}

pub fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

// ── Fake AP ──────────────────────────────────────────────────────────

/// An AP with one radio `wlan0` at `bssid` broadcasting `ssid`.
pub fn fake_ap(bssid: &str, ssid: &str) -> Dispatcher {
    let wlans = vec![RadioWlan {
        intf_name: "wlan0".into(),
        mac: bssid.into(),
        wiphy: 0,
    }];
    let ssids = vec![SsidInfo {
        intf_name: "wlan0".into(),
        ssid: ssid.into(),
        channel: 6,
        frequency: 2437,
    }];

    let mut dispatcher = Dispatcher::new();
    let radio_wlans: Arc<dyn Handler> = Arc::new(move |_peer: SocketAddr, msg: Message| {
        let wlans = wlans.clone();
        async move {
            Ok::<_, Error>(Some(Message::new(
                msg.message_type,
                msg.id,
                Payload::RadioWlans(RadioWlans {
                    wlans,
                    ..RadioWlans::default()
                }),
            )))
        }
    });
    let ap_ssids: Arc<dyn Handler> = Arc::new(move |_peer: SocketAddr, msg: Message| {
        let ssids = ssids.clone();
        async move {
            Ok::<_, Error>(Some(Message::new(
                msg.message_type,
                msg.id,
                Payload::ApSsids(ApSsids {
                    ssids,
                    ..ApSsids::default()
                }),
            )))
        }
    });
    dispatcher
        .register(MessageType::GetRadioWlans, radio_wlans)
        .register(MessageType::GetApSsid, ap_ssids);
    dispatcher
}

// ── Fake station ─────────────────────────────────────────────────────

/// Transition requests a fake station received.
#[derive(Debug, Default)]
pub struct Roaming {
    pub targets: Mutex<Vec<String>>,
    pub triggered: Notify,
    pub count: AtomicUsize,
}

impl Roaming {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// A station with wireless `wlan0` at `mac`, connected to `bssid`.
pub fn fake_station(mac: &str, bssid: &str, roaming: &Arc<Roaming>) -> Dispatcher {
    let interfaces = vec![
        InterfaceEntry {
            ifindex: 2,
            intf_name: "eth0".into(),
            intf_type: 1,
            mac: "de:ad:be:ef:00:01".into(),
            is_wifi: false,
        },
        InterfaceEntry {
            ifindex: 3,
            intf_name: "wlan0".into(),
            intf_type: 1,
            mac: mac.into(),
            is_wifi: true,
        },
    ];
    let bssid = bssid.to_owned();

    let mut dispatcher = Dispatcher::new();
    let all_interfaces: Arc<dyn Handler> = Arc::new(move |_peer: SocketAddr, msg: Message| {
        let interfaces = interfaces.clone();
        async move {
            Ok::<_, Error>(Some(Message::new(
                msg.message_type,
                msg.id,
                Payload::Interfaces(Interfaces {
                    interfaces,
                    ..Interfaces::default()
                }),
            )))
        }
    });
    let link_info: Arc<dyn Handler> = Arc::new(move |_peer: SocketAddr, msg: Message| {
        let bssid = bssid.clone();
        async move {
            let Payload::LinkInfo(req) = msg.payload else {
                return Ok(None);
            };
            Ok::<_, Error>(Some(Message::new(
                msg.message_type,
                msg.id,
                Payload::LinkInfo(LinkInfo {
                    mac: bssid,
                    ssid: SSID.into(),
                    frequency: 2437,
                    ..req
                }),
            )))
        }
    });
    let recorder = Arc::clone(roaming);
    let transition: Arc<dyn Handler> = Arc::new(move |_peer: SocketAddr, msg: Message| {
        if let Payload::TriggerTransition(req) = &msg.payload {
            recorder.targets.lock().unwrap().push(req.mac_new_ap.clone());
            recorder.count.fetch_add(1, Ordering::SeqCst);
            recorder.triggered.notify_one();
        }
        async { Ok::<Option<Message>, Error>(None) }
    });
    dispatcher
        .register(MessageType::GetAllInterfaces, all_interfaces)
        .register(MessageType::GetLinkInfo, link_info)
        .register(MessageType::TriggerTransition, transition);
    dispatcher
}

// ── Inbound frames ───────────────────────────────────────────────────

pub fn hello(device_type: i32, tcp_port: i32) -> Vec<u8> {
    let msg = Message::new(
        MessageType::Hello,
        1,
        Payload::Hello(Hello {
            device_type,
            tcp_port,
            rtt: 0.0,
        }),
    );
    codec::encode(&msg).unwrap().to_vec()
}

pub fn association(message_type: MessageType, bssid: &str, station: &str) -> Vec<u8> {
    let msg = Message::new(
        message_type,
        7,
        Payload::Association(Association {
            mac_ap: bssid.into(),
            mac_sta: station.into(),
            allowed: false,
            response: 0,
        }),
    );
    codec::encode(&msg).unwrap().to_vec()
}

pub fn changed_ap(intf: &str, current_ap: &str) -> Vec<u8> {
    let msg = Message::new(
        MessageType::ChangedAp,
        9,
        Payload::ChangedAp(ChangedAp {
            intf_name: intf.into(),
            current_ap: current_ap.into(),
            status: 0,
        }),
    );
    codec::encode(&msg).unwrap().to_vec()
}

pub fn bye() -> Vec<u8> {
    let msg = Message::new(MessageType::Bye, 2, Payload::Bye(Bye { tcp_port: 22222 }));
    codec::encode(&msg).unwrap().to_vec()
}

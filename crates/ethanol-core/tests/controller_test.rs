#![allow(clippy::unwrap_used)]

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeDevices, Roaming, SSID, addr, association, bye, changed_ap, fake_ap, fake_station, hello};
use ethanol_core::{
    AssociationPolicy, AssociationState, ControllerConfig, CoreError, FleetEvent, MacAddress, Vap,
};
use ethanol_proto::{MessageType, Payload};
use pretty_assertions::assert_eq;

const AP1: &str = "02:00:00:00:00:01";
const AP2: &str = "02:00:00:00:00:02";
const STA: &str = "aa:bb:cc:00:00:01";

fn peer(ip: &str) -> SocketAddr {
    addr(&format!("{ip}:40000"))
}

/// Two APs sharing one SSID and a station attached to the first.
fn two_ap_fleet() -> (Arc<FakeDevices>, Arc<Roaming>) {
    let devices = Arc::new(FakeDevices::default());
    let roaming = Arc::new(Roaming::default());
    devices.add(addr("10.0.0.1:22222"), fake_ap(AP1, SSID));
    devices.add(addr("10.0.0.2:22222"), fake_ap(AP2, SSID));
    devices.add(addr("10.0.0.50:22223"), fake_station(STA, AP1, &roaming));
    (devices, roaming)
}

struct DenyHandoff;

impl AssociationPolicy for DenyHandoff {
    fn admit_handoff(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        false
    }
}

struct DenyAssociation;

impl AssociationPolicy for DenyAssociation {
    fn user_associating(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        false
    }
}

// ── Registration ─────────────────────────────────────────────────────

#[tokio::test]
async fn hello_creates_one_ap_per_ip() {
    let (devices, _) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    let dispatcher = controller.dispatcher();
    let mut events = controller.subscribe();

    let reply = dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();
    assert_eq!(reply.message_type, MessageType::Hello);
    assert_eq!(controller.aps().len(), 1);

    // A repeated hello from the same IP creates nothing new.
    dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();
    assert_eq!(controller.aps().len(), 1);

    let ap = controller.ap(addr("10.0.0.1:0").ip()).unwrap();
    assert_eq!(ap.vaps().len(), 1);
    assert_eq!(ap.vaps()[0].ssid().as_deref(), Some(SSID));
    assert!(matches!(events.try_recv().unwrap(), FleetEvent::ApConnected { .. }));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn concurrent_hellos_create_a_single_ap() {
    let (devices, _) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    let dispatcher = Arc::new(controller.dispatcher());

    let mut tasks = Vec::new();
    for port in 40000..40008 {
        let dispatcher = Arc::clone(&dispatcher);
        tasks.push(tokio::spawn(async move {
            dispatcher
                .dispatch(addr(&format!("10.0.0.1:{port}")), &hello(1, 22222))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(controller.aps().len(), 1);
    assert_eq!(controller.network(SSID).unwrap().vaps().len(), 1);
}

#[tokio::test]
async fn vaps_are_found_by_bssid_across_aps() {
    let (devices, _) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    controller.add_ap(addr("10.0.0.1:22222")).await.unwrap();
    controller.add_ap(addr("10.0.0.2:22222")).await.unwrap();

    let vap = controller.vap(&MacAddress::new("02-00-00-00-00-02")).unwrap();
    assert_eq!(vap.mac().as_str(), AP2);
    assert!(controller.vap(&MacAddress::new("02:00:00:00:00:09")).is_none());

    let network = controller.network(SSID).unwrap();
    assert_eq!(network.vaps().len(), 2);
}

#[tokio::test]
async fn unreachable_ap_is_not_registered() {
    let devices = Arc::new(FakeDevices::default());
    let controller = common::controller(&devices, ControllerConfig::default());

    let err = controller.add_ap(addr("10.0.0.9:22222")).await.unwrap_err();
    assert!(matches!(err, CoreError::DeviceUnreachable { .. }));
    assert!(controller.aps().is_empty());

    // The failed attempt must not block a later one.
    devices.add(addr("10.0.0.9:22222"), fake_ap(AP1, SSID));
    assert!(controller.add_ap(addr("10.0.0.9:22222")).await.unwrap().is_some());
}

#[tokio::test]
async fn station_hello_resolves_its_vap() {
    let (devices, _) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    let dispatcher = controller.dispatcher();
    dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();
    dispatcher.dispatch(peer("10.0.0.50"), &hello(2, 22223)).await.unwrap();

    let stations = controller.stations();
    assert_eq!(stations.len(), 1, "only the wireless interface becomes a station");
    let station = controller.station(addr("10.0.0.50:0").ip(), "wlan0").unwrap();
    assert_eq!(station.mac().as_str(), STA);
    assert_eq!(station.vap().unwrap().mac().as_str(), AP1);
    assert!(station.vap().unwrap().has_station(station.mac()));
}

#[tokio::test]
async fn bye_forgets_the_ap() {
    let (devices, _) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    let dispatcher = controller.dispatcher();
    dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();

    assert!(dispatcher.dispatch(peer("10.0.0.1"), &bye()).await.is_none());
    assert!(controller.aps().is_empty());
    assert!(controller.vap(&MacAddress::new(AP1)).is_none());
    assert!(controller.network(SSID).unwrap().vaps().is_empty());
}

#[tokio::test]
async fn preregistration_gates_ap_hellos() {
    let (devices, _) = two_ap_fleet();
    let config = ControllerConfig {
        require_preregistration: true,
        ..ControllerConfig::default()
    };
    let controller = common::controller(&devices, config);
    let dispatcher = controller.dispatcher();

    let reply = dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();
    assert_eq!(reply.message_type, MessageType::Error);
    assert!(controller.aps().is_empty());

    controller.connection_up(addr("10.0.0.1:0").ip());
    let reply = dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();
    assert_eq!(reply.message_type, MessageType::Hello);
    assert_eq!(controller.aps().len(), 1);
}

// ── Association ──────────────────────────────────────────────────────

#[tokio::test]
async fn association_events_follow_the_vap_policy() {
    let (devices, _) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    let dispatcher = controller.dispatcher();
    dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();
    let other = "aa:bb:cc:00:00:99";

    let reply = dispatcher
        .dispatch(peer("10.0.0.1"), &association(MessageType::Authorization, AP1, other))
        .await
        .unwrap();
    let Payload::Association(auth) = reply.payload else {
        panic!("expected an association reply");
    };
    assert!(auth.allowed);
    assert_eq!(auth.response, 1);

    controller
        .set_vap_policy(&MacAddress::new(AP1), Arc::new(DenyAssociation))
        .unwrap();
    let reply = dispatcher
        .dispatch(peer("10.0.0.1"), &association(MessageType::Association, AP1, other))
        .await
        .unwrap();
    let Payload::Association(assoc) = reply.payload else {
        panic!("expected an association reply");
    };
    assert!(!assoc.allowed);
    assert_eq!(assoc.response, 0);
    assert_eq!(
        controller
            .fleet()
            .associations
            .state(&MacAddress::new(other), &MacAddress::new(AP1)),
        AssociationState::Authenticating
    );
}

#[tokio::test]
async fn events_for_unknown_bssids_are_allowed() {
    let devices = Arc::new(FakeDevices::default());
    let controller = common::controller(&devices, ControllerConfig::default());
    let reply = controller
        .dispatcher()
        .dispatch(
            peer("10.0.0.7"),
            &association(MessageType::UserConnecting, "02:00:00:00:00:77", STA),
        )
        .await
        .unwrap();
    let Payload::Association(connecting) = reply.payload else {
        panic!("expected an association reply");
    };
    assert!(connecting.allowed);
    assert_eq!(connecting.response, 0);

    for message_type in [
        MessageType::Authorization,
        MessageType::Association,
        MessageType::Reassociation,
        MessageType::Disassociation,
    ] {
        let reply = controller
            .dispatcher()
            .dispatch(
                peer("10.0.0.7"),
                &association(message_type, "02:00:00:00:00:77", STA),
            )
            .await
            .unwrap();
        let Payload::Association(event) = reply.payload else {
            panic!("expected an association reply");
        };
        assert!(event.allowed, "{message_type}");
        assert_eq!(event.response, 0, "{message_type} keeps the AP default");
    }
    assert!(controller.fleet().associations.is_empty());
}

// ── Handoff ──────────────────────────────────────────────────────────

async fn registered(controller: &ethanol_core::Controller) {
    let dispatcher = controller.dispatcher();
    dispatcher.dispatch(peer("10.0.0.1"), &hello(1, 22222)).await.unwrap();
    dispatcher.dispatch(peer("10.0.0.2"), &hello(1, 22222)).await.unwrap();
    dispatcher.dispatch(peer("10.0.0.50"), &hello(2, 22223)).await.unwrap();
}

#[tokio::test]
async fn handoff_completes_when_the_station_confirms() {
    let (devices, roaming) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    registered(&controller).await;
    let station = controller.station(addr("10.0.0.50:0").ip(), "wlan0").unwrap();

    let task = {
        let controller = controller.clone();
        let station = Arc::clone(&station);
        tokio::spawn(async move { controller.handoff(&station, &MacAddress::new(AP2)).await })
    };
    roaming.triggered.notified().await;
    assert_eq!(*roaming.targets.lock().unwrap(), vec![AP2.to_owned()]);

    controller
        .dispatcher()
        .dispatch(peer("10.0.0.50"), &changed_ap("wlan0", AP2))
        .await;
    let outcome = task.await.unwrap().unwrap();

    assert_eq!(outcome.from, Some(MacAddress::new(AP1)));
    assert_eq!(outcome.to, MacAddress::new(AP2));
    assert_eq!(station.vap().unwrap().mac().as_str(), AP2);
    let source = controller.vap(&MacAddress::new(AP1)).unwrap();
    let target = controller.vap(&MacAddress::new(AP2)).unwrap();
    assert!(!source.has_station(station.mac()));
    assert!(target.has_station(station.mac()));
    assert!(!target.is_reserved(station.mac()));
    assert_eq!(
        controller.fleet().associations.state(station.mac(), target.mac()),
        AssociationState::Associated
    );
}

#[tokio::test]
async fn unconfirmed_handoff_times_out_and_rolls_back() {
    let (devices, roaming) = two_ap_fleet();
    let config = ControllerConfig {
        handoff_timeout: Duration::from_millis(100),
        ..ControllerConfig::default()
    };
    let controller = common::controller(&devices, config);
    registered(&controller).await;
    let station = controller.station(addr("10.0.0.50:0").ip(), "wlan0").unwrap();

    let err = controller
        .handoff(&station, &MacAddress::new(AP2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::HandoffTimeout { .. }));
    assert_eq!(station.vap().unwrap().mac().as_str(), AP1);
    let target = controller.vap(&MacAddress::new(AP2)).unwrap();
    assert!(!target.is_reserved(station.mac()));

    // The request did go out; the station just never confirmed.
    roaming.triggered.notified().await;
    assert_eq!(roaming.count(), 1);
}

#[tokio::test]
async fn target_that_refuses_admission_rejects_the_handoff() {
    let (devices, roaming) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    registered(&controller).await;
    let station = controller.station(addr("10.0.0.50:0").ip(), "wlan0").unwrap();
    controller
        .set_vap_policy(&MacAddress::new(AP2), Arc::new(DenyHandoff))
        .unwrap();

    let err = controller
        .handoff(&station, &MacAddress::new(AP2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::HandoffRejected { .. }));
    assert_eq!(roaming.count(), 0);
    assert_eq!(station.vap().unwrap().mac().as_str(), AP1);
}

#[tokio::test]
async fn handoff_across_networks_is_invalid() {
    let (devices, roaming) = two_ap_fleet();
    let controller = common::controller(&devices, ControllerConfig::default());
    registered(&controller).await;
    let station = controller.station(addr("10.0.0.50:0").ip(), "wlan0").unwrap();
    controller
        .set_vap_ssid(&MacAddress::new(AP2), Some("guest"))
        .unwrap();

    let err = controller
        .handoff(&station, &MacAddress::new(AP2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::HandoffInvalid { .. }));
    assert_eq!(roaming.count(), 0);
}

#![allow(clippy::unwrap_used)]

// Round trip and header-first decoding for every catalog entry.

use ethanol_proto::codec::schema::{
    Acs, ApInRange, ApSsids, ApsInRange, Association, AssociationEvents, Band, Bitrate,
    BroadcastSsid, Bye, ChangedAp, ChannelFrequency, ChannelInfo, ChannelSurvey, Counter,
    CurrentChannel, Empty, ErrorReport, Frequency, Hello, HostapdConf, InterfaceEntry,
    InterfaceFlag, InterfaceInt, InterfaceLong, InterfaceSetting, Interfaces, LinkInfo,
    MEAN_STATISTICS_FIELDS, MeanAlpha, MeanCounters, MeanInterface, MeanStatistics, MeanTime,
    MetricConfig, MetricReport, Ping, PingData, Pong, PowerSave, RadioWlan, RadioWlans,
    RtsThreshold, SnrSetting, SnrThresholdReached, SsidInfo, StaCounters, StaStatistics,
    StationAddr, StationFlag, StationValue, Statistics, TosRule, TriggerTransition, TxBitrate,
    TxBitrates, Uptime, ValidChannels, WlanEntry, WlanInfo, event_mask,
};
use ethanol_proto::codec::{
    HEADER_FIXED_LEN, MAX_MESSAGE_SIZE, Message, MessageType, PROTOCOL_VERSION, Payload, Schema,
    decode, decode_header, encode,
};
use pretty_assertions::assert_eq;
use strum::IntoEnumIterator;

fn relay() -> StationAddr {
    StationAddr::new("192.168.1.20", 22223)
}

/// A payload exercising every field of the schema, including empty strings.
#[allow(clippy::too_many_lines)]
fn sample(schema: Schema) -> Payload {
    match schema {
        Schema::Hello => Payload::Hello(Hello {
            device_type: 1,
            tcp_port: 22222,
            rtt: 1.5,
        }),
        Schema::Bye => Payload::Bye(Bye { tcp_port: 22222 }),
        Schema::Error => Payload::Error(ErrorReport { error_type: 4 }),
        Schema::Ping => Payload::Ping(Ping {
            data: PingData::pattern(64),
        }),
        Schema::Pong => Payload::Pong(Pong {
            rtt: 0.25,
            verify_data: true,
        }),
        Schema::Interfaces => Payload::Interfaces(Interfaces {
            station: relay(),
            interfaces: vec![
                InterfaceEntry {
                    ifindex: 2,
                    intf_name: "eth0".into(),
                    intf_type: 1,
                    mac: "00:16:3e:00:00:01".into(),
                    is_wifi: false,
                },
                InterfaceEntry {
                    ifindex: 3,
                    intf_name: "wlan0".into(),
                    intf_type: 801,
                    mac: String::new(),
                    is_wifi: true,
                },
            ],
        }),
        Schema::ApsInRange => Payload::ApsInRange(ApsInRange {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            aps: vec![ApInRange {
                intf_name: "wlan0".into(),
                mac: "a0:b1:c2:d3:e4:f5".into(),
                ssid: "lab".into(),
                status: 1,
                frequency: 5180,
                channel: 36,
                signal: -61.0,
                power_constraint: 3,
                tx_power: 20,
                link_margin: 12,
                age: 400,
                is_dbm: true,
            }],
        }),
        Schema::AssociationEvents => Payload::AssociationEvents(AssociationEvents {
            mac_sta: String::new(),
            events: event_mask::ALL,
            action: true,
        }),
        Schema::Association => Payload::Association(Association {
            mac_ap: "00:11:22:33:44:55".into(),
            mac_sta: "66:77:88:99:aa:bb".into(),
            allowed: true,
            response: 17,
        }),
        Schema::ApSsids => Payload::ApSsids(ApSsids {
            station: StationAddr::local(),
            ssids: vec![
                SsidInfo {
                    intf_name: "wlan0".into(),
                    ssid: "ethanol".into(),
                    channel: 6,
                    frequency: 2437,
                },
                SsidInfo {
                    intf_name: "wlan1".into(),
                    ssid: "ethanol-5g".into(),
                    channel: 36,
                    frequency: 5180,
                },
            ],
        }),
        Schema::BroadcastSsid => Payload::BroadcastSsid(BroadcastSsid {
            intf_name: "wlan0".into(),
            ssid: "ethanol".into(),
            enabled: true,
        }),
        Schema::InterfaceFlag => Payload::InterfaceFlag(InterfaceFlag {
            intf_name: "wlan0".into(),
            enabled: true,
        }),
        Schema::InterfaceInt => Payload::InterfaceInt(InterfaceInt {
            intf_name: "wlan0".into(),
            value: 100,
        }),
        Schema::InterfaceLong => Payload::InterfaceLong(InterfaceLong {
            intf_name: "wlan0".into(),
            value: 800,
        }),
        Schema::RtsThreshold => Payload::RtsThreshold(RtsThreshold {
            intf_name: "wlan0".into(),
            value: 2347,
        }),
        Schema::HostapdConf => Payload::HostapdConf(HostapdConf {
            intf_name: String::new(),
            param: "wmm_enabled".into(),
            value: "1".into(),
        }),
        Schema::ValidChannels => Payload::ValidChannels(ValidChannels {
            intf_name: "wlan0".into(),
            channels: (1..=11)
                .map(|channel| ChannelFrequency {
                    frequency: 2407 + 5 * channel,
                    channel,
                })
                .collect(),
        }),
        Schema::CurrentChannel => Payload::CurrentChannel(CurrentChannel {
            intf_name: "wlan0".into(),
            station: relay(),
            channel: 6,
            frequency: 2437,
            autochannel: 0,
        }),
        Schema::Frequency => Payload::Frequency(Frequency {
            ssid: "ethanol".into(),
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            frequency: 2437,
        }),
        Schema::TxBitrates => Payload::TxBitrates(TxBitrates {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            bands: vec![
                Band {
                    intf_name: "wlan0".into(),
                    band: 0,
                    bitrates: vec![
                        Bitrate {
                            bitrate: 1.0,
                            is_short: false,
                        },
                        Bitrate {
                            bitrate: 5.5,
                            is_short: true,
                        },
                    ],
                },
                Band {
                    intf_name: "wlan0".into(),
                    band: 1,
                    bitrates: Vec::new(),
                },
            ],
        }),
        Schema::TxBitrate => Payload::TxBitrate(TxBitrate {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            mac_sta: "66:77:88:99:aa:bb".into(),
            bitrate: 65.0,
        }),
        Schema::PowerSave => Payload::PowerSave(PowerSave {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            value: 1,
        }),
        Schema::ChannelInfo => Payload::ChannelInfo(ChannelInfo {
            intf_name: "wlan0".into(),
            channel: 6,
            surveys: vec![ChannelSurvey {
                frequency: 2437,
                in_use: true,
                noise: -95,
                receive_time: 10,
                transmit_time: 20,
                active_time: 1000,
                busy_time: 300,
                channel_type: 1,
                extension_channel_busy_time: 0,
            }],
        }),
        Schema::WlanInfo => Payload::WlanInfo(WlanInfo {
            station: StationAddr::local(),
            wlans: vec![WlanEntry {
                ifindex: 3,
                intf_name: "wlan0".into(),
                wlan_index: 0,
                phy_index: 0,
                dev: 1,
                mac: "00:11:22:33:44:55".into(),
                ssid: "ethanol".into(),
                channel_type: 1,
                channel_width: 20,
                freq: 2437,
                freq1: 2437,
                freq2: 0,
                iftype: 3,
            }],
        }),
        Schema::RadioWlans => Payload::RadioWlans(RadioWlans {
            station: StationAddr::local(),
            wlans: vec![RadioWlan {
                intf_name: "wlan0".into(),
                mac: "00:11:22:33:44:55".into(),
                wiphy: 0,
            }],
        }),
        Schema::Acs => Payload::Acs(Acs {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            num_tests: 3,
            frequencies: vec![2412, 2437],
            factors: vec![500_000_000_000_000_000, 250_000_000_000_000_000],
        }),
        Schema::StationFlag => Payload::StationFlag(StationFlag {
            intf_name: "wlan0".into(),
            station: relay(),
            value: true,
        }),
        Schema::Counter => Payload::Counter(Counter {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            value: i64::MAX,
        }),
        Schema::StationValue => Payload::StationValue(StationValue {
            station: StationAddr::local(),
            value: 42,
        }),
        Schema::Uptime => Payload::Uptime(Uptime {
            uptime: 3600.5,
            idle: 1200.25,
        }),
        Schema::Statistics => Payload::Statistics(Statistics {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            rx_packets: 1,
            rx_bytes: 2,
            rx_dropped: 3,
            rx_errors: 4,
            tx_packets: 5,
            tx_bytes: 6,
            tx_dropped: 7,
            tx_errors: 8,
            timestamp: "2026-01-01 00:00:00".into(),
        }),
        Schema::InterfaceSetting => Payload::InterfaceSetting(InterfaceSetting {
            station: StationAddr::local(),
            intf_name: "wlan0".into(),
            value: 1500,
        }),
        Schema::LinkInfo => Payload::LinkInfo(LinkInfo {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            mac: "66:77:88:99:aa:bb".into(),
            ssid: "ethanol".into(),
            frequency: 2437,
        }),
        Schema::TriggerTransition => Payload::TriggerTransition(TriggerTransition {
            station: StationAddr::local(),
            mac_sta: "66:77:88:99:aa:bb".into(),
            intf_name: "wlan0".into(),
            mac_new_ap: "00:11:22:33:44:66".into(),
        }),
        Schema::SnrSetting => Payload::SnrSetting(SnrSetting {
            station: StationAddr::local(),
            intf_name: "wlan0".into(),
            value: 15,
        }),
        Schema::SnrThresholdReached => Payload::SnrThresholdReached(SnrThresholdReached {
            station: relay(),
            mac_sta: "66:77:88:99:aa:bb".into(),
            intf_name: "wlan0".into(),
            mac_ap: "00:11:22:33:44:55".into(),
            snr: 9,
        }),
        Schema::StaStatistics => Payload::StaStatistics(StaStatistics {
            intf_name: "wlan0".into(),
            station: StationAddr::local(),
            stations: vec![StaCounters {
                rx_bytes: 10,
                tx_bytes: 20,
                signal: -50,
                signal_avg: -52,
                beacon_signal_avg: -49,
                connected_time: 77,
                ..StaCounters::default()
            }],
            timestamp: "2026-01-01 00:00:01".into(),
        }),
        Schema::ChangedAp => Payload::ChangedAp(ChangedAp {
            intf_name: "wlan0".into(),
            current_ap: "00:11:22:33:44:66".into(),
            status: 0,
        }),
        Schema::MeanStatistics => Payload::MeanStatistics(MeanStatistics {
            station: StationAddr::local(),
            interfaces: vec![
                MeanCounters {
                    intf_name: "wlan0".into(),
                    values: std::array::from_fn(|i| f64::from(u32::try_from(i).unwrap())),
                },
                MeanCounters {
                    intf_name: "eth0".into(),
                    values: [0.5; MEAN_STATISTICS_FIELDS],
                },
            ],
        }),
        Schema::MeanInterface => Payload::MeanInterface(MeanInterface {
            station: StationAddr::local(),
            intf_name: "wlan0".into(),
        }),
        Schema::MeanAlpha => Payload::MeanAlpha(MeanAlpha {
            station: StationAddr::local(),
            alpha: 0.1,
        }),
        Schema::MeanTime => Payload::MeanTime(MeanTime {
            station: StationAddr::local(),
            msec: 1000,
        }),
        Schema::Empty => Payload::Empty(Empty {}),
        Schema::TosRule => Payload::TosRule(TosRule {
            rule_id: 4,
            intf_name: "wlan0".into(),
            proto: "udp".into(),
            sip: "10.0.0.1".into(),
            sport: String::new(),
            dip: "10.0.0.2".into(),
            dport: "5004".into(),
            wmm_class: 5,
        }),
        Schema::MetricConfig => Payload::MetricConfig(MetricConfig {
            enable: true,
            period: 100,
            metric: 3,
        }),
        Schema::MetricReport => Payload::MetricReport(MetricReport {
            mac: "00:11:22:33:44:55".into(),
            metric: 3,
            value: 0.75,
        }),
        Schema::Opaque => Payload::Opaque(vec![0xde, 0xad, 0xbe, 0xef]),
    }
}

#[test]
fn every_message_type_round_trips() {
    for (id, message_type) in (100..).zip(MessageType::iter()) {
        let msg = Message::new(message_type, id, sample(message_type.schema()));
        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg, "{message_type}");
    }
}

#[test]
fn every_header_decodes_alone() {
    for (id, message_type) in (0..).zip(MessageType::iter()) {
        let msg = Message::new(message_type, id, sample(message_type.schema()));
        let bytes = encode(&msg).unwrap();
        let header = decode_header(&bytes[..HEADER_FIXED_LEN + PROTOCOL_VERSION.len()]).unwrap();
        assert_eq!(header.message_type, message_type);
        assert_eq!(header.id, id);
        assert_eq!(header.version, PROTOCOL_VERSION);
        assert_eq!(usize::try_from(header.total_size).unwrap(), bytes.len());
    }
}

#[test]
fn default_payloads_round_trip() {
    // All-empty strings and arrays exercise the zero-length paths.
    let msg = Message::new(
        MessageType::GetApsInRange,
        1,
        Payload::ApsInRange(ApsInRange::default()),
    );
    assert_eq!(decode(&encode(&msg).unwrap()).unwrap(), msg);
}

#[test]
fn long_strings_round_trip() {
    let value = "x".repeat(MAX_MESSAGE_SIZE / 2);
    let msg = Message::new(
        MessageType::SetHostapdConf,
        2,
        Payload::HostapdConf(HostapdConf {
            intf_name: "wlan0".into(),
            param: "vendor_elements".into(),
            value,
        }),
    );
    assert_eq!(decode(&encode(&msg).unwrap()).unwrap(), msg);
}

#[test]
fn truncation_anywhere_in_payload_is_malformed() {
    let msg = Message::new(
        MessageType::GetStaStatistics,
        3,
        sample(Schema::StaStatistics),
    );
    let bytes = encode(&msg).unwrap();
    let header_len = HEADER_FIXED_LEN + PROTOCOL_VERSION.len();
    for cut in header_len..bytes.len() {
        let mut short = bytes[..cut].to_vec();
        short[header_len - 4..header_len].copy_from_slice(&0_i32.to_le_bytes());
        assert!(decode(&short).is_err(), "cut at {cut} decoded");
    }
}

#[test]
fn non_utf8_interface_name_is_rejected() {
    let msg = Message::new(
        MessageType::GetApFrameBurstEnabled,
        9,
        Payload::InterfaceFlag(InterfaceFlag {
            intf_name: "wlanX".into(),
            enabled: true,
        }),
    );
    let mut bytes = encode(&msg).unwrap().to_vec();
    let header_len = HEADER_FIXED_LEN + PROTOCOL_VERSION.len();
    // Last byte of "wlanX", after the 4-byte length.
    bytes[header_len + 4 + 4] = 0xff;
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, ethanol_proto::Error::Malformed { .. }), "{err:?}");
}

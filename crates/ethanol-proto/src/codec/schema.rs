// ── Payload schemas ──
//
// One struct per payload layout. Field order is wire order. Fields named
// `station` address a station behind the AP: when its IP is empty the AP
// answers for itself, otherwise it relays the request to the station.

use serde::Serialize;

use super::wire::{Reader, Wire, Writer, wire_struct};
use crate::error::Error;

/// Fixed-point scale applied to ACS factors on the wire.
pub const ACS_SCALE_FACTOR: f64 = 1e18;

/// Number of per-interface counters in a mean-statistics report.
pub const MEAN_STATISTICS_FIELDS: usize = 23;

// ── Shared fields ────────────────────────────────────────────────────

wire_struct! {
    /// Station relay address; an empty IP targets the AP itself.
    pub struct StationAddr {
        pub ip: String,
        pub port: i32,
    }
}

impl StationAddr {
    pub fn new(ip: impl Into<String>, port: i32) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// Address meaning "the device itself".
    pub fn local() -> Self {
        Self::default()
    }

    pub fn is_local(&self) -> bool {
        self.ip.is_empty()
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Role announced by the sender of a hello.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceKind {
    Controller,
    AccessPoint,
    Station,
}

impl DeviceKind {
    pub fn from_wire(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Controller),
            1 => Some(Self::AccessPoint),
            2 => Some(Self::Station),
            _ => None,
        }
    }

    pub fn as_wire(self) -> i32 {
        match self {
            Self::Controller => 0,
            Self::AccessPoint => 1,
            Self::Station => 2,
        }
    }
}

wire_struct! {
    pub struct Hello {
        pub device_type: i32,
        pub tcp_port: i32,
        pub rtt: f32,
    }
}

impl Hello {
    pub fn device_kind(&self) -> Option<DeviceKind> {
        DeviceKind::from_wire(self.device_type)
    }
}

wire_struct! {
    pub struct Bye {
        pub tcp_port: i32,
    }
}

wire_struct! {
    pub struct ErrorReport {
        pub error_type: i32,
    }
}

wire_struct! {
    /// Ping data is sent as a length-prefixed byte block.
    pub struct Ping {
        pub data: PingData,
    }
}

/// Raw ping bytes; shares the string length-prefix layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PingData(pub Vec<u8>);

impl Wire for PingData {
    fn put(&self, w: &mut Writer) -> Result<(), Error> {
        w.put_len(self.0.len(), "ping data")?;
        w.put_slice(&self.0);
        Ok(())
    }

    fn take(r: &mut Reader<'_>) -> Result<Self, Error> {
        let len = r.take_len("ping data")?;
        Ok(Self(r.take_bytes(len, "ping data")?.to_vec()))
    }
}

impl PingData {
    /// Deterministic test pattern: byte `i` is `(48 + i) % 128`.
    pub fn pattern(size: usize) -> Self {
        Self(
            (0..size)
                .map(|i| u8::try_from((48 + i) % 128).unwrap_or_default())
                .collect(),
        )
    }

    pub fn matches_pattern(&self) -> bool {
        *self == Self::pattern(self.0.len())
    }
}

wire_struct! {
    pub struct Pong {
        pub rtt: f32,
        pub verify_data: bool,
    }
}

// ── Interfaces ───────────────────────────────────────────────────────

wire_struct! {
    pub struct InterfaceEntry {
        pub ifindex: i64,
        pub intf_name: String,
        pub intf_type: u32,
        pub mac: String,
        pub is_wifi: bool,
    }
}

wire_struct! {
    pub struct Interfaces {
        pub station: StationAddr,
        pub interfaces: Vec<InterfaceEntry>,
    }
}

wire_struct! {
    pub struct RadioWlan {
        pub intf_name: String,
        pub mac: String,
        pub wiphy: u32,
    }
}

wire_struct! {
    pub struct RadioWlans {
        pub station: StationAddr,
        pub wlans: Vec<RadioWlan>,
    }
}

wire_struct! {
    pub struct WlanEntry {
        pub ifindex: i32,
        pub intf_name: String,
        pub wlan_index: u32,
        pub phy_index: u32,
        pub dev: u64,
        pub mac: String,
        pub ssid: String,
        pub channel_type: u32,
        pub channel_width: u32,
        pub freq: u32,
        pub freq1: u32,
        pub freq2: u32,
        pub iftype: i32,
    }
}

wire_struct! {
    pub struct WlanInfo {
        pub station: StationAddr,
        pub wlans: Vec<WlanEntry>,
    }
}

// ── Scanning ─────────────────────────────────────────────────────────

wire_struct! {
    pub struct ApInRange {
        pub intf_name: String,
        pub mac: String,
        pub ssid: String,
        pub status: i32,
        pub frequency: i64,
        pub channel: i32,
        pub signal: f32,
        pub power_constraint: i32,
        pub tx_power: i32,
        pub link_margin: i32,
        pub age: i32,
        pub is_dbm: bool,
    }
}

wire_struct! {
    pub struct ApsInRange {
        pub intf_name: String,
        pub station: StationAddr,
        pub aps: Vec<ApInRange>,
    }
}

// ── Association ──────────────────────────────────────────────────────

/// Bit positions used by `AssociationEvents::events`.
pub mod event_mask {
    pub const ASSOCIATION: u64 = 1 << 0;
    pub const DISASSOCIATION: u64 = 1 << 1;
    pub const REASSOCIATION: u64 = 1 << 2;
    pub const AUTHORIZATION: u64 = 1 << 3;
    pub const USER_DISCONNECTING: u64 = 1 << 4;
    pub const USER_CONNECTING: u64 = 1 << 5;
    pub const ALL: u64 = ASSOCIATION
        | DISASSOCIATION
        | REASSOCIATION
        | AUTHORIZATION
        | USER_DISCONNECTING
        | USER_CONNECTING;
}

wire_struct! {
    /// Subscribe (`action = true`) or unsubscribe to association events.
    pub struct AssociationEvents {
        pub mac_sta: String,
        pub events: u64,
        pub action: bool,
    }
}

wire_struct! {
    pub struct Association {
        pub mac_ap: String,
        pub mac_sta: String,
        pub allowed: bool,
        pub response: i32,
    }
}

// ── AP configuration ─────────────────────────────────────────────────

wire_struct! {
    pub struct SsidInfo {
        pub intf_name: String,
        pub ssid: String,
        pub channel: u32,
        pub frequency: u32,
    }
}

wire_struct! {
    pub struct ApSsids {
        pub station: StationAddr,
        pub ssids: Vec<SsidInfo>,
    }
}

wire_struct! {
    pub struct BroadcastSsid {
        pub intf_name: String,
        pub ssid: String,
        pub enabled: bool,
    }
}

wire_struct! {
    /// Frame burst and CTS protection.
    pub struct InterfaceFlag {
        pub intf_name: String,
        pub enabled: bool,
    }
}

wire_struct! {
    /// Preamble, DTIM interval, and beacon interval.
    pub struct InterfaceInt {
        pub intf_name: String,
        pub value: i32,
    }
}

wire_struct! {
    /// Guard interval.
    pub struct InterfaceLong {
        pub intf_name: String,
        pub value: i64,
    }
}

wire_struct! {
    pub struct RtsThreshold {
        pub intf_name: String,
        pub value: u32,
    }
}

wire_struct! {
    pub struct HostapdConf {
        pub intf_name: String,
        pub param: String,
        pub value: String,
    }
}

// ── Radio ────────────────────────────────────────────────────────────

wire_struct! {
    pub struct ChannelFrequency {
        pub frequency: u32,
        pub channel: u32,
    }
}

wire_struct! {
    pub struct ValidChannels {
        pub intf_name: String,
        pub channels: Vec<ChannelFrequency>,
    }
}

wire_struct! {
    pub struct CurrentChannel {
        pub intf_name: String,
        pub station: StationAddr,
        pub channel: i32,
        pub frequency: i32,
        pub autochannel: u32,
    }
}

wire_struct! {
    pub struct Frequency {
        pub ssid: String,
        pub intf_name: String,
        pub station: StationAddr,
        pub frequency: u32,
    }
}

wire_struct! {
    pub struct Bitrate {
        pub bitrate: f32,
        pub is_short: bool,
    }
}

wire_struct! {
    pub struct Band {
        pub intf_name: String,
        pub band: u32,
        pub bitrates: Vec<Bitrate>,
    }
}

wire_struct! {
    pub struct TxBitrates {
        pub intf_name: String,
        pub station: StationAddr,
        pub bands: Vec<Band>,
    }
}

wire_struct! {
    pub struct TxBitrate {
        pub intf_name: String,
        pub station: StationAddr,
        pub mac_sta: String,
        pub bitrate: f32,
    }
}

wire_struct! {
    pub struct PowerSave {
        pub intf_name: String,
        pub station: StationAddr,
        pub value: u32,
    }
}

wire_struct! {
    pub struct ChannelSurvey {
        pub frequency: u32,
        pub in_use: bool,
        pub noise: i64,
        pub receive_time: i64,
        pub transmit_time: i64,
        pub active_time: i64,
        pub busy_time: i64,
        pub channel_type: i64,
        pub extension_channel_busy_time: i64,
    }
}

wire_struct! {
    pub struct ChannelInfo {
        pub intf_name: String,
        pub channel: i32,
        pub surveys: Vec<ChannelSurvey>,
    }
}

/// Automatic channel selection scores.
///
/// `frequencies` and `factors` share one count on the wire. Factors are
/// fixed point with scale [`ACS_SCALE_FACTOR`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Acs {
    pub intf_name: String,
    pub station: StationAddr,
    pub num_tests: i32,
    pub frequencies: Vec<i32>,
    pub factors: Vec<i64>,
}

impl Acs {
    /// Factors converted back to floating point.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn scaled_factors(&self) -> Vec<f64> {
        self.factors
            .iter()
            .map(|&raw| raw as f64 / ACS_SCALE_FACTOR)
            .collect()
    }
}

impl Wire for Acs {
    fn put(&self, w: &mut Writer) -> Result<(), Error> {
        if self.frequencies.len() != self.factors.len() {
            return Err(Error::malformed(format!(
                "acs has {} frequencies but {} factors",
                self.frequencies.len(),
                self.factors.len()
            )));
        }
        self.intf_name.put(w)?;
        self.station.put(w)?;
        self.num_tests.put(w)?;
        w.put_len(self.frequencies.len(), "acs channel")?;
        for frequency in &self.frequencies {
            frequency.put(w)?;
        }
        for factor in &self.factors {
            factor.put(w)?;
        }
        Ok(())
    }

    fn take(r: &mut Reader<'_>) -> Result<Self, Error> {
        let intf_name = String::take(r)?;
        let station = StationAddr::take(r)?;
        let num_tests = i32::take(r)?;
        let count = r.take_count("acs channel")?;
        if count.saturating_mul(12) > r.remaining() {
            return Err(Error::malformed(format!(
                "acs count {count} exceeds remaining {} bytes",
                r.remaining()
            )));
        }
        let frequencies = (0..count)
            .map(|_| i32::take(r))
            .collect::<Result<Vec<_>, _>>()?;
        let factors = (0..count)
            .map(|_| i64::take(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            intf_name,
            station,
            num_tests,
            frequencies,
            factors,
        })
    }
}

// ── Per-device counters ──────────────────────────────────────────────

wire_struct! {
    /// 802.11e and fast-BSS-transition capability flags.
    pub struct StationFlag {
        pub intf_name: String,
        pub station: StationAddr,
        pub value: bool,
    }
}

wire_struct! {
    /// Byte/packet counters, TX power, and SNR.
    pub struct Counter {
        pub intf_name: String,
        pub station: StationAddr,
        pub value: i64,
    }
}

wire_struct! {
    /// CPU and memory usage.
    pub struct StationValue {
        pub station: StationAddr,
        pub value: i64,
    }
}

wire_struct! {
    pub struct Uptime {
        pub uptime: f64,
        pub idle: f64,
    }
}

wire_struct! {
    pub struct Statistics {
        pub intf_name: String,
        pub station: StationAddr,
        pub rx_packets: i64,
        pub rx_bytes: i64,
        pub rx_dropped: i64,
        pub rx_errors: i64,
        pub tx_packets: i64,
        pub tx_bytes: i64,
        pub tx_dropped: i64,
        pub tx_errors: i64,
        pub timestamp: String,
    }
}

wire_struct! {
    pub struct InterfaceSetting {
        pub station: StationAddr,
        pub intf_name: String,
        pub value: i32,
    }
}

// ── Station ──────────────────────────────────────────────────────────

wire_struct! {
    pub struct LinkInfo {
        pub intf_name: String,
        pub station: StationAddr,
        pub mac: String,
        pub ssid: String,
        pub frequency: i32,
    }
}

wire_struct! {
    pub struct TriggerTransition {
        pub station: StationAddr,
        pub mac_sta: String,
        pub intf_name: String,
        pub mac_new_ap: String,
    }
}

wire_struct! {
    /// SNR threshold or SNR polling interval.
    pub struct SnrSetting {
        pub station: StationAddr,
        pub intf_name: String,
        pub value: i64,
    }
}

wire_struct! {
    pub struct SnrThresholdReached {
        pub station: StationAddr,
        pub mac_sta: String,
        pub intf_name: String,
        pub mac_ap: String,
        pub snr: i64,
    }
}

wire_struct! {
    pub struct StaCounters {
        pub rx_bytes: i64,
        pub tx_bytes: i64,
        pub rx_packets: i64,
        pub rx_duration: i64,
        pub tx_packets: i64,
        pub tx_retries: i64,
        pub tx_failed: i64,
        pub beacon_loss: i64,
        pub beacon_rx: i64,
        pub rx_drop_misc: i64,
        pub signal: i32,
        pub signal_avg: i32,
        pub beacon_signal_avg: i32,
        pub time_offset: i64,
        pub connected_time: i64,
    }
}

wire_struct! {
    pub struct StaStatistics {
        pub intf_name: String,
        pub station: StationAddr,
        pub stations: Vec<StaCounters>,
        pub timestamp: String,
    }
}

wire_struct! {
    pub struct ChangedAp {
        pub intf_name: String,
        pub current_ap: String,
        pub status: i32,
    }
}

// ── Mean statistics ──────────────────────────────────────────────────

/// EWMA-smoothed counters for one interface, in wire order:
/// collisions, multicast, rx bytes/compressed/crc/dropped/errors/fifo/
/// frame/length/missed/over/packets, tx aborted/bytes/carrier/compressed/
/// dropped/errors/fifo/heartbeat/packets/window.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeanCounters {
    pub intf_name: String,
    pub values: [f64; MEAN_STATISTICS_FIELDS],
}

/// Interface names come first, then one counter block per interface,
/// both sized by a single count.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeanStatistics {
    pub station: StationAddr,
    pub interfaces: Vec<MeanCounters>,
}

impl Wire for MeanStatistics {
    fn put(&self, w: &mut Writer) -> Result<(), Error> {
        self.station.put(w)?;
        w.put_len(self.interfaces.len(), "mean statistics interface")?;
        for entry in &self.interfaces {
            entry.intf_name.put(w)?;
        }
        for entry in &self.interfaces {
            for value in entry.values {
                value.put(w)?;
            }
        }
        Ok(())
    }

    fn take(r: &mut Reader<'_>) -> Result<Self, Error> {
        let station = StationAddr::take(r)?;
        let count = r.take_count("mean statistics interface")?;
        if count > r.remaining() {
            return Err(Error::malformed(format!(
                "mean statistics count {count} exceeds remaining {} bytes",
                r.remaining()
            )));
        }
        let names = (0..count)
            .map(|_| String::take(r))
            .collect::<Result<Vec<_>, _>>()?;
        let mut interfaces = Vec::with_capacity(count);
        for intf_name in names {
            let mut values = [0.0; MEAN_STATISTICS_FIELDS];
            for value in &mut values {
                *value = f64::take(r)?;
            }
            interfaces.push(MeanCounters { intf_name, values });
        }
        Ok(Self {
            station,
            interfaces,
        })
    }
}

wire_struct! {
    pub struct MeanInterface {
        pub station: StationAddr,
        pub intf_name: String,
    }
}

wire_struct! {
    pub struct MeanAlpha {
        pub station: StationAddr,
        pub alpha: f64,
    }
}

wire_struct! {
    pub struct MeanTime {
        pub station: StationAddr,
        pub msec: i32,
    }
}

// ── QoS and metrics ──────────────────────────────────────────────────

wire_struct! {
    /// Header-only payload.
    pub struct Empty {}
}

wire_struct! {
    pub struct TosRule {
        pub rule_id: i32,
        pub intf_name: String,
        pub proto: String,
        pub sip: String,
        pub sport: String,
        pub dip: String,
        pub dport: String,
        pub wmm_class: i32,
    }
}

wire_struct! {
    pub struct MetricConfig {
        pub enable: bool,
        pub period: i32,
        pub metric: u64,
    }
}

wire_struct! {
    pub struct MetricReport {
        pub mac: String,
        pub metric: u64,
        pub value: f32,
    }
}

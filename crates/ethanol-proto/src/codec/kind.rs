// ── Message catalog ──
//
// Stable integer tag for every message type. Tags are positional and
// shared with device firmware, so entries are never reordered or removed.

use serde::Serialize;
use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

use super::payload::Schema;
use crate::error::Error;

/// Every message type understood on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumIter,
    FromRepr,
    IntoStaticStr,
)]
#[repr(i32)]
#[strum(serialize_all = "snake_case")]
pub enum MessageType {
    // ── Session ─────────────────────────────────────────────────────
    Hello = 0,
    Bye = 1,
    Error = 2,
    Ping = 3,
    Pong = 4,

    // ── Interfaces ──────────────────────────────────────────────────
    GetMac = 5,
    GetOneInterface = 6,
    GetAllInterfaces = 7,
    GetApInRange = 8,

    // ── Association lifecycle ───────────────────────────────────────
    EnableAssocEvents = 9,
    Association = 10,
    Disassociation = 11,
    Reassociation = 12,
    Authorization = 13,
    UserDisconnecting = 14,
    UserConnecting = 15,

    // ── Queues and beacons (AP side, no controller schema) ──────────
    QueueCreate = 16,
    QueueClear = 17,
    QueueDestroy = 18,
    QueueDestroyAll = 19,
    QueueConfig = 20,
    ShowPorts = 21,
    InformBeacon = 22,
    RequestBeacon = 23,

    // ── AP configuration ────────────────────────────────────────────
    GetPreamble = 24,
    SetPreamble = 25,
    GetQueueDiscipline = 26,
    SetQueueDiscipline = 27,
    GetSupportedInterface = 28,
    GetInterferenceMap = 29,
    GetApSsid = 30,
    GetApBroadcastSsid = 31,
    SetApBroadcastSsid = 32,
    GetApCac = 33,
    SetApCac = 34,
    GetApFrameBurstEnabled = 35,
    SetApFrameBurstEnabled = 36,
    GetApGuardInterval = 37,
    SetApGuardInterval = 38,
    GetApDtimInterval = 39,
    SetApDtimInterval = 40,
    GetApCtsProtectionEnabled = 41,
    SetApCtsProtectionEnabled = 42,
    GetApRtsThreshold = 43,
    SetApRtsThreshold = 44,
    SetApSsid = 45,
    GetApEnabled = 46,
    SetApEnabled = 47,

    // ── VAP and management frames ───────────────────────────────────
    VapCreate = 48,
    SetConfSsidRadio = 49,
    DisconnectUser = 50,
    DeauthenticateUser = 51,
    ProgramProbeRequest = 52,
    ProbeReceived = 53,
    MgmtFrameRegister = 54,
    MgmtFrameUnregister = 55,
    MgmtFrame = 56,
    RequestBeginAssociation = 57,
    RequestStationReassociate = 58,

    // ── Radio ───────────────────────────────────────────────────────
    GetRoutes = 59,
    GetValidChannels = 60,
    SetCurrentChannel = 61,
    GetCurrentChannel = 62,
    GetFrequency = 63,
    SetFrequency = 64,
    GetBeaconInterval = 65,
    SetBeaconInterval = 66,
    GetTxBitrates = 67,
    SetTxBitrates = 68,
    GetTxBitrate = 69,
    GetPowerSaveMode = 70,
    SetPowerSaveMode = 71,
    GetFragmentationThreshold = 72,
    SetFragmentationThreshold = 73,
    GetChannelBandwidth = 74,
    SetChannelBandwidth = 75,
    GetChannelInfo = 76,
    WlanInfo = 77,
    GetRadioWlans = 78,
    GetRadioLinkStatistics = 79,

    // ── Per-device counters and queries ─────────────────────────────
    GetIpv4Address = 80,
    SetIpv4Address = 81,
    GetIpv6Address = 82,
    SetIpv6Address = 83,
    Get80211eEnabled = 84,
    GetFastBssTransitionCompatible = 85,
    GetBytesReceived = 86,
    GetBytesSent = 87,
    GetBytesLost = 88,
    GetPacketsReceived = 89,
    GetPacketsSent = 90,
    GetPacketsLost = 91,
    GetJitter = 92,
    GetDelay = 93,
    GetTxPower = 94,
    SetTxPower = 95,
    GetSnr = 96,
    GetQuality = 97,
    GetUptime = 98,
    GetRetries = 99,
    GetFailed = 100,
    GetApsInRange = 101,
    GetBeaconInfo = 102,
    GetNoiseInfo = 103,
    GetLinkMeasurement = 104,
    GetStatistics = 105,
    GetLocation = 106,

    // ── Station control ─────────────────────────────────────────────
    TriggerTransition = 107,
    GetCpu = 108,
    GetMemory = 109,
    Scan = 110,
    GetLinkInfo = 111,
    SetSnrThreshold = 112,
    SetSnrInterval = 113,
    GetAcs = 114,
    SnrThresholdReached = 115,
    GetStaStatistics = 116,

    // ── Mean statistics ─────────────────────────────────────────────
    MeanStaStatisticsGet = 117,
    MeanStaStatisticsSetInterface = 118,
    MeanStaStatisticsRemoveInterface = 119,
    MeanStaStatisticsSetAlpha = 120,
    MeanStaStatisticsSetTime = 121,

    // ── Notifications, QoS, and tuning ──────────────────────────────
    ChangedAp = 122,
    TosCleanAll = 123,
    TosAdd = 124,
    TosReplace = 125,
    SetMtu = 126,
    SetTxQueueLen = 127,
    GetHostapdConf = 128,
    SetHostapdConf = 129,
    SetMetric = 130,
    MetricReceived = 131,
}

impl MessageType {
    /// Resolve a raw header tag.
    pub fn from_tag(tag: i32) -> Result<Self, Error> {
        Self::from_repr(tag).ok_or(Error::UnknownType { tag })
    }

    pub fn tag(self) -> i32 {
        self as i32
    }

    /// The payload layout carried after the header.
    ///
    /// Get/set pairs share one layout. Types the controller never encodes
    /// or decodes itself carry their payload verbatim.
    #[allow(clippy::match_same_arms)]
    pub fn schema(self) -> Schema {
        match self {
            Self::Hello => Schema::Hello,
            Self::Bye => Schema::Bye,
            Self::Error => Schema::Error,
            Self::Ping => Schema::Ping,
            Self::Pong => Schema::Pong,
            Self::GetOneInterface | Self::GetAllInterfaces => Schema::Interfaces,
            Self::GetApInRange | Self::GetApsInRange => Schema::ApsInRange,
            Self::EnableAssocEvents => Schema::AssociationEvents,
            Self::Association
            | Self::Disassociation
            | Self::Reassociation
            | Self::Authorization
            | Self::UserDisconnecting
            | Self::UserConnecting => Schema::Association,
            Self::GetPreamble
            | Self::SetPreamble
            | Self::GetApDtimInterval
            | Self::SetApDtimInterval
            | Self::GetBeaconInterval
            | Self::SetBeaconInterval => Schema::InterfaceInt,
            Self::GetApSsid => Schema::ApSsids,
            Self::GetApBroadcastSsid | Self::SetApBroadcastSsid => Schema::BroadcastSsid,
            Self::GetApFrameBurstEnabled
            | Self::SetApFrameBurstEnabled
            | Self::GetApCtsProtectionEnabled
            | Self::SetApCtsProtectionEnabled => Schema::InterfaceFlag,
            Self::GetApGuardInterval | Self::SetApGuardInterval => Schema::InterfaceLong,
            Self::GetApRtsThreshold | Self::SetApRtsThreshold => Schema::RtsThreshold,
            Self::GetValidChannels => Schema::ValidChannels,
            Self::GetCurrentChannel | Self::SetCurrentChannel => Schema::CurrentChannel,
            Self::GetFrequency | Self::SetFrequency => Schema::Frequency,
            Self::GetTxBitrates | Self::SetTxBitrates => Schema::TxBitrates,
            Self::GetTxBitrate => Schema::TxBitrate,
            Self::GetPowerSaveMode | Self::SetPowerSaveMode => Schema::PowerSave,
            Self::GetChannelInfo => Schema::ChannelInfo,
            Self::WlanInfo => Schema::WlanInfo,
            Self::GetRadioWlans => Schema::RadioWlans,
            Self::Get80211eEnabled | Self::GetFastBssTransitionCompatible => Schema::StationFlag,
            Self::GetBytesReceived
            | Self::GetBytesSent
            | Self::GetBytesLost
            | Self::GetPacketsReceived
            | Self::GetPacketsSent
            | Self::GetPacketsLost
            | Self::GetTxPower
            | Self::SetTxPower
            | Self::GetSnr => Schema::Counter,
            Self::GetUptime => Schema::Uptime,
            Self::GetStatistics => Schema::Statistics,
            Self::TriggerTransition => Schema::TriggerTransition,
            Self::GetCpu | Self::GetMemory => Schema::StationValue,
            Self::GetLinkInfo => Schema::LinkInfo,
            Self::SetSnrThreshold | Self::SetSnrInterval => Schema::SnrSetting,
            Self::GetAcs => Schema::Acs,
            Self::SnrThresholdReached => Schema::SnrThresholdReached,
            Self::GetStaStatistics => Schema::StaStatistics,
            Self::MeanStaStatisticsGet => Schema::MeanStatistics,
            Self::MeanStaStatisticsSetInterface | Self::MeanStaStatisticsRemoveInterface => {
                Schema::MeanInterface
            }
            Self::MeanStaStatisticsSetAlpha => Schema::MeanAlpha,
            Self::MeanStaStatisticsSetTime => Schema::MeanTime,
            Self::ChangedAp => Schema::ChangedAp,
            Self::TosCleanAll => Schema::Empty,
            Self::TosAdd | Self::TosReplace => Schema::TosRule,
            Self::SetMtu | Self::SetTxQueueLen => Schema::InterfaceSetting,
            Self::GetHostapdConf | Self::SetHostapdConf => Schema::HostapdConf,
            Self::SetMetric => Schema::MetricConfig,
            Self::MetricReceived => Schema::MetricReport,
            _ => Schema::Opaque,
        }
    }

    /// Returns `true` for the six association lifecycle notifications.
    pub fn is_association_event(self) -> bool {
        self.schema() == Schema::Association
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tags_are_dense_and_positional() {
        for (index, kind) in MessageType::iter().enumerate() {
            assert_eq!(usize::try_from(kind.tag()).unwrap(), index);
        }
        assert_eq!(MessageType::iter().count(), 132);
    }

    #[test]
    fn known_tags_match_device_firmware() {
        assert_eq!(MessageType::GetApSsid.tag(), 30);
        assert_eq!(MessageType::GetValidChannels.tag(), 60);
        assert_eq!(MessageType::GetAcs.tag(), 114);
        assert_eq!(MessageType::MetricReceived.tag(), 131);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = MessageType::from_tag(132).unwrap_err();
        assert!(matches!(err, Error::UnknownType { tag: 132 }));
        assert!(MessageType::from_tag(-1).is_err());
    }

    #[test]
    fn get_and_set_share_schema() {
        assert_eq!(
            MessageType::GetCurrentChannel.schema(),
            MessageType::SetCurrentChannel.schema()
        );
        assert_eq!(
            MessageType::GetApCtsProtectionEnabled.schema(),
            Schema::InterfaceFlag
        );
    }

    #[test]
    fn association_events_are_classified() {
        assert!(MessageType::UserConnecting.is_association_event());
        assert!(!MessageType::EnableAssocEvents.is_association_event());
    }
}

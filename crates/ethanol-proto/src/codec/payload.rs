// ── Payload sum type ──
//
// `Payload` is the tagged union of all schemas. `Schema` is its
// discriminant, and `MessageType::schema()` is the table mapping each
// wire tag to exactly one layout.

use serde::Serialize;
use strum::EnumDiscriminants;

use super::schema::{
    Acs, ApSsids, ApsInRange, Association, AssociationEvents, BroadcastSsid, Bye, ChangedAp,
    ChannelInfo, Counter, CurrentChannel, Empty, ErrorReport, Frequency, Hello, HostapdConf,
    InterfaceFlag, InterfaceInt, InterfaceLong, InterfaceSetting, Interfaces, LinkInfo,
    MeanAlpha, MeanInterface, MeanStatistics, MeanTime, MetricConfig, MetricReport, Ping, Pong,
    PowerSave, RadioWlans, RtsThreshold, SnrSetting, SnrThresholdReached, StaStatistics,
    StationFlag, StationValue, Statistics, TosRule, TriggerTransition, TxBitrate, TxBitrates,
    Uptime, ValidChannels, WlanInfo,
};
use super::wire::{Reader, Wire, Writer};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, EnumDiscriminants)]
#[strum_discriminants(name(Schema), derive(Hash, Serialize, strum::Display))]
#[serde(tag = "schema", content = "fields", rename_all = "snake_case")]
pub enum Payload {
    Hello(Hello),
    Bye(Bye),
    Error(ErrorReport),
    Ping(Ping),
    Pong(Pong),
    Interfaces(Interfaces),
    ApsInRange(ApsInRange),
    AssociationEvents(AssociationEvents),
    Association(Association),
    ApSsids(ApSsids),
    BroadcastSsid(BroadcastSsid),
    InterfaceFlag(InterfaceFlag),
    InterfaceInt(InterfaceInt),
    InterfaceLong(InterfaceLong),
    RtsThreshold(RtsThreshold),
    HostapdConf(HostapdConf),
    ValidChannels(ValidChannels),
    CurrentChannel(CurrentChannel),
    Frequency(Frequency),
    TxBitrates(TxBitrates),
    TxBitrate(TxBitrate),
    PowerSave(PowerSave),
    ChannelInfo(ChannelInfo),
    WlanInfo(WlanInfo),
    RadioWlans(RadioWlans),
    Acs(Acs),
    StationFlag(StationFlag),
    Counter(Counter),
    StationValue(StationValue),
    Uptime(Uptime),
    Statistics(Statistics),
    InterfaceSetting(InterfaceSetting),
    LinkInfo(LinkInfo),
    TriggerTransition(TriggerTransition),
    SnrSetting(SnrSetting),
    SnrThresholdReached(SnrThresholdReached),
    StaStatistics(StaStatistics),
    ChangedAp(ChangedAp),
    MeanStatistics(MeanStatistics),
    MeanInterface(MeanInterface),
    MeanAlpha(MeanAlpha),
    MeanTime(MeanTime),
    Empty(Empty),
    TosRule(TosRule),
    MetricConfig(MetricConfig),
    MetricReport(MetricReport),
    /// Payload of a catalog entry with no controller-side layout.
    Opaque(Vec<u8>),
}

macro_rules! dispatch {
    ($($variant:ident),* $(,)?) => {
        impl Payload {
            pub fn schema(&self) -> Schema {
                Schema::from(self)
            }

            pub(crate) fn put(&self, w: &mut Writer) -> Result<(), Error> {
                match self {
                    $( Self::$variant(inner) => inner.put(w), )*
                    Self::Opaque(raw) => {
                        w.put_slice(raw);
                        Ok(())
                    }
                }
            }

            pub(crate) fn take(schema: Schema, r: &mut Reader<'_>) -> Result<Self, Error> {
                Ok(match schema {
                    $( Schema::$variant => Self::$variant(Wire::take(r)?), )*
                    Schema::Opaque => Self::Opaque(r.rest().to_vec()),
                })
            }
        }
    };
}

dispatch! {
    Hello,
    Bye,
    Error,
    Ping,
    Pong,
    Interfaces,
    ApsInRange,
    AssociationEvents,
    Association,
    ApSsids,
    BroadcastSsid,
    InterfaceFlag,
    InterfaceInt,
    InterfaceLong,
    RtsThreshold,
    HostapdConf,
    ValidChannels,
    CurrentChannel,
    Frequency,
    TxBitrates,
    TxBitrate,
    PowerSave,
    ChannelInfo,
    WlanInfo,
    RadioWlans,
    Acs,
    StationFlag,
    Counter,
    StationValue,
    Uptime,
    Statistics,
    InterfaceSetting,
    LinkInfo,
    TriggerTransition,
    SnrSetting,
    SnrThresholdReached,
    StaStatistics,
    ChangedAp,
    MeanStatistics,
    MeanInterface,
    MeanAlpha,
    MeanTime,
    Empty,
    TosRule,
    MetricConfig,
    MetricReport,
}

// ── Queries shared by APs and stations ──

use std::net::SocketAddr;

use serde::Serialize;
use strum::{Display, EnumIter};

use super::{DeviceClient, expect_payload};
use crate::codec::schema::{
    ApInRange, ApsInRange, Counter, InterfaceEntry, Interfaces, StationAddr, StationFlag,
    Statistics, TxBitrate,
};
use crate::codec::{MessageType, Payload};
use crate::error::Error;

/// Traffic counters readable with one `i64` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CounterKind {
    BytesReceived,
    BytesSent,
    BytesLost,
    PacketsReceived,
    PacketsSent,
    PacketsLost,
}

impl CounterKind {
    pub fn message_type(self) -> MessageType {
        match self {
            Self::BytesReceived => MessageType::GetBytesReceived,
            Self::BytesSent => MessageType::GetBytesSent,
            Self::BytesLost => MessageType::GetBytesLost,
            Self::PacketsReceived => MessageType::GetPacketsReceived,
            Self::PacketsSent => MessageType::GetPacketsSent,
            Self::PacketsLost => MessageType::GetPacketsLost,
        }
    }
}

fn counter(intf: &str, value: i64) -> Counter {
    Counter {
        intf_name: intf.to_owned(),
        station: StationAddr::local(),
        value,
    }
}

impl DeviceClient {
    async fn flag(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        intf: &str,
    ) -> Result<bool, Error> {
        let payload = Payload::StationFlag(StationFlag {
            intf_name: intf.to_owned(),
            ..StationFlag::default()
        });
        let reply = self.request(addr, message_type, id, payload).await?;
        Ok(expect_payload!(reply, StationFlag, "value").value)
    }

    async fn read_counter(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        intf: &str,
    ) -> Result<i64, Error> {
        let payload = Payload::Counter(counter(intf, 0));
        let reply = self.request(addr, message_type, id, payload).await?;
        Ok(expect_payload!(reply, Counter, "value").value)
    }

    pub async fn get_80211e_enabled(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<bool, Error> {
        self.flag(addr, MessageType::Get80211eEnabled, id, intf).await
    }

    pub async fn get_fast_bss_transition_compatible(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<bool, Error> {
        self.flag(addr, MessageType::GetFastBssTransitionCompatible, id, intf)
            .await
    }

    pub async fn get_counter(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        kind: CounterKind,
    ) -> Result<i64, Error> {
        self.read_counter(addr, kind.message_type(), id, intf).await
    }

    pub async fn get_snr(&self, addr: SocketAddr, id: i32, intf: &str) -> Result<i64, Error> {
        self.read_counter(addr, MessageType::GetSnr, id, intf).await
    }

    pub async fn get_tx_power(&self, addr: SocketAddr, id: i32, intf: &str) -> Result<i64, Error> {
        self.read_counter(addr, MessageType::GetTxPower, id, intf).await
    }

    pub async fn set_tx_power(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        dbm: i64,
    ) -> Result<(), Error> {
        self.send(addr, MessageType::SetTxPower, id, Payload::Counter(counter(intf, dbm)))
            .await
    }

    pub async fn get_statistics(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<Statistics, Error> {
        let payload = Payload::Statistics(Statistics {
            intf_name: intf.to_owned(),
            ..Statistics::default()
        });
        let reply = self
            .request(addr, MessageType::GetStatistics, id, payload)
            .await?;
        Ok(expect_payload!(reply, Statistics, "statistics"))
    }

    /// TX bitrate towards one associated station, in Mbit/s.
    pub async fn get_tx_bitrate(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        mac_sta: &str,
    ) -> Result<f32, Error> {
        let payload = Payload::TxBitrate(TxBitrate {
            intf_name: intf.to_owned(),
            station: StationAddr::local(),
            mac_sta: mac_sta.to_owned(),
            bitrate: 0.0,
        });
        let reply = self
            .request(addr, MessageType::GetTxBitrate, id, payload)
            .await?;
        Ok(expect_payload!(reply, TxBitrate, "bitrate").bitrate)
    }

    pub async fn get_aps_in_range(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<Vec<ApInRange>, Error> {
        let payload = Payload::ApsInRange(ApsInRange {
            intf_name: intf.to_owned(),
            ..ApsInRange::default()
        });
        let reply = self
            .request(addr, MessageType::GetApsInRange, id, payload)
            .await?;
        Ok(expect_payload!(reply, ApsInRange, "aps").aps)
    }

    /// Every network interface of the device.
    pub async fn get_interfaces(
        &self,
        addr: SocketAddr,
        id: i32,
    ) -> Result<Vec<InterfaceEntry>, Error> {
        let payload = Payload::Interfaces(Interfaces::default());
        let reply = self
            .request(addr, MessageType::GetAllInterfaces, id, payload)
            .await?;
        Ok(expect_payload!(reply, Interfaces, "interfaces").interfaces)
    }

    /// One interface by name; `InterfaceNotFound` if the device omits it.
    pub async fn get_one_interface(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<InterfaceEntry, Error> {
        let payload = Payload::Interfaces(Interfaces {
            station: StationAddr::local(),
            interfaces: vec![InterfaceEntry {
                intf_name: intf.to_owned(),
                ..InterfaceEntry::default()
            }],
        });
        let reply = self
            .request(addr, MessageType::GetOneInterface, id, payload)
            .await?;
        expect_payload!(reply, Interfaces, "interfaces")
            .interfaces
            .into_iter()
            .find(|entry| entry.intf_name == intf)
            .ok_or_else(|| Error::InterfaceNotFound {
                interface: intf.to_owned(),
            })
    }
}

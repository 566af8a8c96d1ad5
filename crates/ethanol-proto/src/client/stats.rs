// ── Mean (EWMA) traffic statistics ──

use std::net::SocketAddr;

use super::{DeviceClient, expect_payload};
use crate::codec::schema::{
    MeanAlpha, MeanCounters, MeanInterface, MeanStatistics, MeanTime, StationAddr,
};
use crate::codec::{MessageType, Payload};
use crate::error::Error;

impl DeviceClient {
    /// Smoothed counters for every interface the device is collecting on.
    pub async fn get_mean_statistics(
        &self,
        addr: SocketAddr,
        id: i32,
    ) -> Result<Vec<MeanCounters>, Error> {
        let payload = Payload::MeanStatistics(MeanStatistics::default());
        let reply = self
            .request(addr, MessageType::MeanStaStatisticsGet, id, payload)
            .await?;
        Ok(expect_payload!(reply, MeanStatistics, "interfaces").interfaces)
    }

    async fn mean_interface(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        intf: &str,
    ) -> Result<(), Error> {
        let payload = Payload::MeanInterface(MeanInterface {
            station: StationAddr::local(),
            intf_name: intf.to_owned(),
        });
        self.send(addr, message_type, id, payload).await
    }

    /// Start collecting statistics on `intf`.
    pub async fn add_mean_interface(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<(), Error> {
        self.mean_interface(addr, MessageType::MeanStaStatisticsSetInterface, id, intf)
            .await
    }

    /// Stop collecting statistics on `intf`.
    pub async fn remove_mean_interface(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<(), Error> {
        self.mean_interface(addr, MessageType::MeanStaStatisticsRemoveInterface, id, intf)
            .await
    }

    pub async fn set_mean_alpha(&self, addr: SocketAddr, id: i32, alpha: f64) -> Result<(), Error> {
        let payload = Payload::MeanAlpha(MeanAlpha {
            station: StationAddr::local(),
            alpha,
        });
        self.send(addr, MessageType::MeanStaStatisticsSetAlpha, id, payload)
            .await
    }

    /// Collection period in milliseconds; -1 disables collection.
    pub async fn set_mean_time(&self, addr: SocketAddr, id: i32, msec: i32) -> Result<(), Error> {
        let payload = Payload::MeanTime(MeanTime {
            station: StationAddr::local(),
            msec,
        });
        self.send(addr, MessageType::MeanStaStatisticsSetTime, id, payload)
            .await
    }
}

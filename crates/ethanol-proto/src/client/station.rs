// ── Station operations ──

use std::net::SocketAddr;

use super::{DeviceClient, expect_payload};
use crate::codec::schema::{
    ChangedAp, LinkInfo, SnrSetting, StaCounters, StaStatistics, StationAddr, TriggerTransition,
};
use crate::codec::{MessageType, Payload};
use crate::error::Error;

impl DeviceClient {
    /// MAC, SSID, and frequency of the station's current link.
    pub async fn get_link_info(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<LinkInfo, Error> {
        let payload = Payload::LinkInfo(LinkInfo {
            intf_name: intf.to_owned(),
            ..LinkInfo::default()
        });
        let reply = self
            .request(addr, MessageType::GetLinkInfo, id, payload)
            .await?;
        Ok(expect_payload!(reply, LinkInfo, "mac"))
    }

    pub async fn get_sta_statistics(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<Vec<StaCounters>, Error> {
        let payload = Payload::StaStatistics(StaStatistics {
            intf_name: intf.to_owned(),
            ..StaStatistics::default()
        });
        let reply = self
            .request(addr, MessageType::GetStaStatistics, id, payload)
            .await?;
        Ok(expect_payload!(reply, StaStatistics, "stations").stations)
    }

    /// Instruct a station to roam to the AP with BSSID `mac_new_ap`.
    pub async fn trigger_transition(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        mac_sta: &str,
        mac_new_ap: &str,
    ) -> Result<(), Error> {
        let payload = Payload::TriggerTransition(TriggerTransition {
            station: StationAddr::local(),
            mac_sta: mac_sta.to_owned(),
            intf_name: intf.to_owned(),
            mac_new_ap: mac_new_ap.to_owned(),
        });
        self.send(addr, MessageType::TriggerTransition, id, payload)
            .await
    }

    async fn snr_setting(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        intf: &str,
        value: i64,
    ) -> Result<(), Error> {
        let payload = Payload::SnrSetting(SnrSetting {
            station: StationAddr::local(),
            intf_name: intf.to_owned(),
            value,
        });
        self.send(addr, message_type, id, payload).await
    }

    /// SNR below which the station notifies the controller.
    pub async fn set_snr_threshold(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        threshold: i64,
    ) -> Result<(), Error> {
        self.snr_setting(addr, MessageType::SetSnrThreshold, id, intf, threshold)
            .await
    }

    /// Interval in milliseconds between SNR checks on the station.
    pub async fn set_snr_interval(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        msec: i64,
    ) -> Result<(), Error> {
        self.snr_setting(addr, MessageType::SetSnrInterval, id, intf, msec)
            .await
    }

    /// Report the outcome of an AP change to a peer.
    pub async fn notify_changed_ap(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        current_ap: &str,
        status: i32,
    ) -> Result<(), Error> {
        let payload = Payload::ChangedAp(ChangedAp {
            intf_name: intf.to_owned(),
            current_ap: current_ap.to_owned(),
            status,
        });
        self.send(addr, MessageType::ChangedAp, id, payload).await
    }
}

// ── Virtual AP (per-SSID) operations ──

use std::net::SocketAddr;

use super::{DeviceClient, expect_payload};
use crate::codec::schema::{
    ApSsids, AssociationEvents, BroadcastSsid, InterfaceFlag, InterfaceInt, InterfaceLong,
    RtsThreshold, SsidInfo,
};
use crate::codec::{MessageType, Payload};
use crate::error::Error;

fn flag(intf: &str, enabled: bool) -> Payload {
    Payload::InterfaceFlag(InterfaceFlag {
        intf_name: intf.to_owned(),
        enabled,
    })
}

impl DeviceClient {
    /// SSIDs configured on the AP, one entry per interface.
    pub async fn get_ap_ssids(&self, addr: SocketAddr, id: i32) -> Result<Vec<SsidInfo>, Error> {
        let reply = self
            .request(addr, MessageType::GetApSsid, id, Payload::ApSsids(ApSsids::default()))
            .await?;
        Ok(expect_payload!(reply, ApSsids, "ssids").ssids)
    }

    pub async fn get_broadcast_ssid(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        ssid: &str,
    ) -> Result<bool, Error> {
        let payload = Payload::BroadcastSsid(BroadcastSsid {
            intf_name: intf.to_owned(),
            ssid: ssid.to_owned(),
            enabled: false,
        });
        let reply = self
            .request(addr, MessageType::GetApBroadcastSsid, id, payload)
            .await?;
        Ok(expect_payload!(reply, BroadcastSsid, "enabled").enabled)
    }

    pub async fn set_broadcast_ssid(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        ssid: &str,
        enabled: bool,
    ) -> Result<(), Error> {
        let payload = Payload::BroadcastSsid(BroadcastSsid {
            intf_name: intf.to_owned(),
            ssid: ssid.to_owned(),
            enabled,
        });
        self.send(addr, MessageType::SetApBroadcastSsid, id, payload)
            .await
    }

    async fn get_flag(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        intf: &str,
    ) -> Result<bool, Error> {
        let reply = self.request(addr, message_type, id, flag(intf, false)).await?;
        Ok(expect_payload!(reply, InterfaceFlag, "enabled").enabled)
    }

    pub async fn get_frame_burst(&self, addr: SocketAddr, id: i32, intf: &str) -> Result<bool, Error> {
        self.get_flag(addr, MessageType::GetApFrameBurstEnabled, id, intf)
            .await
    }

    pub async fn set_frame_burst(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        enabled: bool,
    ) -> Result<(), Error> {
        self.send(addr, MessageType::SetApFrameBurstEnabled, id, flag(intf, enabled))
            .await
    }

    pub async fn get_cts_protection(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<bool, Error> {
        self.get_flag(addr, MessageType::GetApCtsProtectionEnabled, id, intf)
            .await
    }

    pub async fn set_cts_protection(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        enabled: bool,
    ) -> Result<(), Error> {
        self.send(
            addr,
            MessageType::SetApCtsProtectionEnabled,
            id,
            flag(intf, enabled),
        )
        .await
    }

    pub async fn get_guard_interval(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<i64, Error> {
        let payload = Payload::InterfaceLong(InterfaceLong {
            intf_name: intf.to_owned(),
            value: 0,
        });
        let reply = self
            .request(addr, MessageType::GetApGuardInterval, id, payload)
            .await?;
        Ok(expect_payload!(reply, InterfaceLong, "value").value)
    }

    pub async fn set_guard_interval(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        nanos: i64,
    ) -> Result<(), Error> {
        let payload = Payload::InterfaceLong(InterfaceLong {
            intf_name: intf.to_owned(),
            value: nanos,
        });
        self.send(addr, MessageType::SetApGuardInterval, id, payload)
            .await
    }

    pub async fn get_dtim_interval(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<i32, Error> {
        let payload = Payload::InterfaceInt(InterfaceInt {
            intf_name: intf.to_owned(),
            value: 0,
        });
        let reply = self
            .request(addr, MessageType::GetApDtimInterval, id, payload)
            .await?;
        Ok(expect_payload!(reply, InterfaceInt, "value").value)
    }

    pub async fn set_dtim_interval(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        interval: i32,
    ) -> Result<(), Error> {
        let payload = Payload::InterfaceInt(InterfaceInt {
            intf_name: intf.to_owned(),
            value: interval,
        });
        self.send(addr, MessageType::SetApDtimInterval, id, payload)
            .await
    }

    /// RTS threshold in bytes; 0 means RTS/CTS is not used.
    pub async fn get_rts_threshold(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<u32, Error> {
        let payload = Payload::RtsThreshold(RtsThreshold {
            intf_name: intf.to_owned(),
            value: 0,
        });
        let reply = self
            .request(addr, MessageType::GetApRtsThreshold, id, payload)
            .await?;
        Ok(expect_payload!(reply, RtsThreshold, "value").value)
    }

    pub async fn set_rts_threshold(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        threshold: u32,
    ) -> Result<(), Error> {
        let payload = Payload::RtsThreshold(RtsThreshold {
            intf_name: intf.to_owned(),
            value: threshold,
        });
        self.send(addr, MessageType::SetApRtsThreshold, id, payload)
            .await
    }

    /// Ask the AP to report (or stop reporting) association events.
    ///
    /// An empty `mac_sta` subscribes for every station.
    pub async fn enable_assoc_events(
        &self,
        addr: SocketAddr,
        id: i32,
        mac_sta: &str,
        events: u64,
        enable: bool,
    ) -> Result<(), Error> {
        let payload = Payload::AssociationEvents(AssociationEvents {
            mac_sta: mac_sta.to_owned(),
            events,
            action: enable,
        });
        self.send(addr, MessageType::EnableAssocEvents, id, payload)
            .await
    }
}

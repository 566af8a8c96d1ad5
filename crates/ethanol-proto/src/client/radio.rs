// ── Radio (physical interface) operations ──

use std::net::SocketAddr;

use super::{DeviceClient, expect_payload};
use crate::codec::schema::{
    Acs, Band, ChannelFrequency, ChannelInfo, CurrentChannel, Frequency, InterfaceInt, PowerSave,
    RadioWlan, RadioWlans, StationAddr, TxBitrates, ValidChannels, WlanEntry, WlanInfo,
};
use crate::codec::{MessageType, Payload};
use crate::error::Error;

fn interface_int(intf: &str, value: i32) -> Payload {
    Payload::InterfaceInt(InterfaceInt {
        intf_name: intf.to_owned(),
        value,
    })
}

impl DeviceClient {
    pub async fn get_valid_channels(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<Vec<ChannelFrequency>, Error> {
        let payload = Payload::ValidChannels(ValidChannels {
            intf_name: intf.to_owned(),
            channels: Vec::new(),
        });
        let reply = self
            .request(addr, MessageType::GetValidChannels, id, payload)
            .await?;
        Ok(expect_payload!(reply, ValidChannels, "channels").channels)
    }

    pub async fn get_current_channel(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<CurrentChannel, Error> {
        let payload = Payload::CurrentChannel(CurrentChannel {
            intf_name: intf.to_owned(),
            ..CurrentChannel::default()
        });
        let reply = self
            .request(addr, MessageType::GetCurrentChannel, id, payload)
            .await?;
        Ok(expect_payload!(reply, CurrentChannel, "channel"))
    }

    pub async fn set_current_channel(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        channel: i32,
    ) -> Result<(), Error> {
        let payload = Payload::CurrentChannel(CurrentChannel {
            intf_name: intf.to_owned(),
            channel,
            ..CurrentChannel::default()
        });
        self.send(addr, MessageType::SetCurrentChannel, id, payload)
            .await
    }

    pub async fn get_frequency(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<u32, Error> {
        let payload = Payload::Frequency(Frequency {
            intf_name: intf.to_owned(),
            ..Frequency::default()
        });
        let reply = self
            .request(addr, MessageType::GetFrequency, id, payload)
            .await?;
        Ok(expect_payload!(reply, Frequency, "frequency").frequency)
    }

    pub async fn set_frequency(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        frequency: u32,
    ) -> Result<(), Error> {
        let payload = Payload::Frequency(Frequency {
            intf_name: intf.to_owned(),
            frequency,
            ..Frequency::default()
        });
        self.send(addr, MessageType::SetFrequency, id, payload).await
    }

    pub async fn get_tx_bitrates(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<Vec<Band>, Error> {
        let payload = Payload::TxBitrates(TxBitrates {
            intf_name: intf.to_owned(),
            ..TxBitrates::default()
        });
        let reply = self
            .request(addr, MessageType::GetTxBitrates, id, payload)
            .await?;
        Ok(expect_payload!(reply, TxBitrates, "bands").bands)
    }

    pub async fn set_tx_bitrates(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        bands: Vec<Band>,
    ) -> Result<(), Error> {
        let payload = Payload::TxBitrates(TxBitrates {
            intf_name: intf.to_owned(),
            station: StationAddr::local(),
            bands,
        });
        self.send(addr, MessageType::SetTxBitrates, id, payload).await
    }

    pub async fn get_power_save_mode(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<bool, Error> {
        let payload = Payload::PowerSave(PowerSave {
            intf_name: intf.to_owned(),
            ..PowerSave::default()
        });
        let reply = self
            .request(addr, MessageType::GetPowerSaveMode, id, payload)
            .await?;
        Ok(expect_payload!(reply, PowerSave, "value").value != 0)
    }

    pub async fn set_power_save_mode(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        enabled: bool,
    ) -> Result<(), Error> {
        let payload = Payload::PowerSave(PowerSave {
            intf_name: intf.to_owned(),
            station: StationAddr::local(),
            value: u32::from(enabled),
        });
        self.send(addr, MessageType::SetPowerSaveMode, id, payload)
            .await
    }

    pub async fn get_channel_info(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        channel: i32,
    ) -> Result<ChannelInfo, Error> {
        let payload = Payload::ChannelInfo(ChannelInfo {
            intf_name: intf.to_owned(),
            channel,
            surveys: Vec::new(),
        });
        let reply = self
            .request(addr, MessageType::GetChannelInfo, id, payload)
            .await?;
        Ok(expect_payload!(reply, ChannelInfo, "surveys"))
    }

    pub async fn get_wlan_info(&self, addr: SocketAddr, id: i32) -> Result<Vec<WlanEntry>, Error> {
        let payload = Payload::WlanInfo(WlanInfo::default());
        let reply = self.request(addr, MessageType::WlanInfo, id, payload).await?;
        Ok(expect_payload!(reply, WlanInfo, "wlans").wlans)
    }

    pub async fn get_radio_wlans(
        &self,
        addr: SocketAddr,
        id: i32,
    ) -> Result<Vec<RadioWlan>, Error> {
        let payload = Payload::RadioWlans(RadioWlans::default());
        let reply = self
            .request(addr, MessageType::GetRadioWlans, id, payload)
            .await?;
        Ok(expect_payload!(reply, RadioWlans, "wlans").wlans)
    }

    /// Returns `true` when the short 802.11b preamble is in use.
    pub async fn get_preamble(&self, addr: SocketAddr, id: i32, intf: &str) -> Result<bool, Error> {
        let reply = self
            .request(addr, MessageType::GetPreamble, id, interface_int(intf, 0))
            .await?;
        Ok(expect_payload!(reply, InterfaceInt, "value").value != 0)
    }

    pub async fn set_preamble(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        short: bool,
    ) -> Result<(), Error> {
        self.send(
            addr,
            MessageType::SetPreamble,
            id,
            interface_int(intf, i32::from(short)),
        )
        .await
    }

    pub async fn get_beacon_interval(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
    ) -> Result<i32, Error> {
        let reply = self
            .request(addr, MessageType::GetBeaconInterval, id, interface_int(intf, 0))
            .await?;
        Ok(expect_payload!(reply, InterfaceInt, "value").value)
    }

    pub async fn set_beacon_interval(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        interval: i32,
    ) -> Result<(), Error> {
        self.send(
            addr,
            MessageType::SetBeaconInterval,
            id,
            interface_int(intf, interval),
        )
        .await
    }

    /// Automatic channel selection scores, one per frequency.
    ///
    /// Fewer than one test is raised to one.
    pub async fn get_acs(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        num_tests: i32,
    ) -> Result<Acs, Error> {
        let payload = Payload::Acs(Acs {
            intf_name: intf.to_owned(),
            station: StationAddr::local(),
            num_tests: num_tests.max(1),
            frequencies: Vec::new(),
            factors: Vec::new(),
        });
        let reply = self.request(addr, MessageType::GetAcs, id, payload).await?;
        Ok(expect_payload!(reply, Acs, "factors"))
    }
}

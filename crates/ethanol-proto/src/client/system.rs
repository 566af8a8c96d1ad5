// ── Session, host, and QoS operations ──

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::{DeviceClient, expect_payload};
use crate::codec::schema::{
    Bye, DeviceKind, Empty, Hello, HostapdConf, InterfaceSetting, MetricConfig, Ping, PingData,
    StationAddr, StationValue, TosRule, Uptime,
};
use crate::codec::{MessageType, Payload};
use crate::error::Error;

/// Result of one ping exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PingOutcome {
    pub id: i32,
    /// Wall-clock time from connect to reply, measured locally.
    pub rtt: Duration,
    /// Whether the peer saw the payload intact.
    pub verified: bool,
}

/// Highest WMM access class a TOS rule may select.
const MAX_WMM_CLASS: i32 = 7;

fn validate_tos(rule: &TosRule) -> Result<(), Error> {
    if rule.rule_id < 1 && rule.rule_id != -1 {
        return Err(Error::invalid_request(format!(
            "TOS rule id {} must be positive or -1",
            rule.rule_id
        )));
    }
    if rule.intf_name.is_empty() || rule.proto.is_empty() {
        return Err(Error::invalid_request(
            "TOS rule needs an interface and a protocol",
        ));
    }
    if !(0..=MAX_WMM_CLASS).contains(&rule.wmm_class) {
        return Err(Error::invalid_request(format!(
            "WMM class {} outside 0..={MAX_WMM_CLASS}",
            rule.wmm_class
        )));
    }
    Ok(())
}

impl DeviceClient {
    /// Announce ourselves to a peer and read back its hello.
    pub async fn hello(
        &self,
        addr: SocketAddr,
        id: i32,
        kind: DeviceKind,
        tcp_port: u16,
    ) -> Result<Hello, Error> {
        let payload = Payload::Hello(Hello {
            device_type: kind.as_wire(),
            tcp_port: i32::from(tcp_port),
            rtt: 0.0,
        });
        let reply = self.request(addr, MessageType::Hello, id, payload).await?;
        Ok(expect_payload!(reply, Hello, "device_type"))
    }

    /// Tell a peer we are leaving.
    pub async fn bye(&self, addr: SocketAddr, id: i32, tcp_port: u16) -> Result<(), Error> {
        let payload = Payload::Bye(Bye {
            tcp_port: i32::from(tcp_port),
        });
        self.send(addr, MessageType::Bye, id, payload).await
    }

    /// Send `count` pings carrying `size` pattern bytes each.
    ///
    /// Failed attempts are skipped, matching the best-effort nature of
    /// the probe; the ids of consecutive pings increase by one.
    pub async fn ping(
        &self,
        addr: SocketAddr,
        first_id: i32,
        count: u32,
        size: usize,
    ) -> Result<Vec<PingOutcome>, Error> {
        let mut outcomes = Vec::new();
        let mut last_err = None;
        let mut id = first_id;
        for _ in 0..count {
            let payload = Payload::Ping(Ping {
                data: PingData::pattern(size),
            });
            let started = Instant::now();
            match self.request(addr, MessageType::Ping, id, payload).await {
                Ok(reply) => {
                    let rtt = started.elapsed();
                    let pong = expect_payload!(reply, Pong, "verify_data");
                    outcomes.push(PingOutcome {
                        id,
                        rtt,
                        verified: pong.verify_data,
                    });
                }
                Err(err) => {
                    tracing::debug!(%addr, id, error = %err, "ping failed");
                    last_err = Some(err);
                }
            }
            id = id.wrapping_add(1);
        }
        match (outcomes.is_empty(), last_err) {
            (true, Some(err)) => Err(err),
            _ => Ok(outcomes),
        }
    }

    pub async fn get_uptime(&self, addr: SocketAddr, id: i32) -> Result<Uptime, Error> {
        let reply = self
            .request(addr, MessageType::GetUptime, id, Payload::Uptime(Uptime::default()))
            .await?;
        Ok(expect_payload!(reply, Uptime, "uptime"))
    }

    async fn station_value(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
    ) -> Result<i64, Error> {
        let payload = Payload::StationValue(StationValue::default());
        let reply = self.request(addr, message_type, id, payload).await?;
        Ok(expect_payload!(reply, StationValue, "value").value)
    }

    /// CPU usage in percent.
    pub async fn get_cpu(&self, addr: SocketAddr, id: i32) -> Result<i64, Error> {
        self.station_value(addr, MessageType::GetCpu, id).await
    }

    /// Memory usage in percent.
    pub async fn get_memory(&self, addr: SocketAddr, id: i32) -> Result<i64, Error> {
        self.station_value(addr, MessageType::GetMemory, id).await
    }

    /// Read one parameter from the AP's hostapd configuration.
    pub async fn get_hostapd_conf(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        param: &str,
    ) -> Result<String, Error> {
        let payload = Payload::HostapdConf(HostapdConf {
            intf_name: intf.to_owned(),
            param: param.to_owned(),
            value: String::new(),
        });
        let reply = self
            .request(addr, MessageType::GetHostapdConf, id, payload)
            .await?;
        Ok(expect_payload!(reply, HostapdConf, "value").value)
    }

    pub async fn set_hostapd_conf(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        param: &str,
        value: &str,
    ) -> Result<(), Error> {
        let payload = Payload::HostapdConf(HostapdConf {
            intf_name: intf.to_owned(),
            param: param.to_owned(),
            value: value.to_owned(),
        });
        self.send(addr, MessageType::SetHostapdConf, id, payload)
            .await
    }

    /// Drop every TOS classification rule on the AP.
    pub async fn tos_clean_all(&self, addr: SocketAddr, id: i32) -> Result<(), Error> {
        self.send(addr, MessageType::TosCleanAll, id, Payload::Empty(Empty {}))
            .await
    }

    /// Append a TOS rule; the AP assigns the rule id.
    pub async fn tos_add(&self, addr: SocketAddr, id: i32, mut rule: TosRule) -> Result<(), Error> {
        rule.rule_id = -1;
        validate_tos(&rule)?;
        self.send(addr, MessageType::TosAdd, id, Payload::TosRule(rule))
            .await
    }

    pub async fn tos_replace(&self, addr: SocketAddr, id: i32, rule: TosRule) -> Result<(), Error> {
        validate_tos(&rule)?;
        self.send(addr, MessageType::TosReplace, id, Payload::TosRule(rule))
            .await
    }

    async fn interface_setting(
        &self,
        addr: SocketAddr,
        message_type: MessageType,
        id: i32,
        intf: &str,
        value: i32,
    ) -> Result<(), Error> {
        let payload = Payload::InterfaceSetting(InterfaceSetting {
            station: StationAddr::local(),
            intf_name: intf.to_owned(),
            value,
        });
        self.send(addr, message_type, id, payload).await
    }

    pub async fn set_mtu(&self, addr: SocketAddr, id: i32, intf: &str, mtu: i32) -> Result<(), Error> {
        self.interface_setting(addr, MessageType::SetMtu, id, intf, mtu)
            .await
    }

    pub async fn set_txqueuelen(
        &self,
        addr: SocketAddr,
        id: i32,
        intf: &str,
        qlen: i32,
    ) -> Result<(), Error> {
        self.interface_setting(addr, MessageType::SetTxQueueLen, id, intf, qlen)
            .await
    }

    /// Ask a device to report `metric` every `period` milliseconds.
    ///
    /// Metric 0 is reserved and rejected.
    pub async fn set_metric(
        &self,
        addr: SocketAddr,
        id: i32,
        metric: u64,
        enable: bool,
        period: i32,
    ) -> Result<(), Error> {
        if metric == 0 {
            return Err(Error::invalid_request("metric 0 is reserved"));
        }
        let payload = Payload::MetricConfig(MetricConfig {
            enable,
            period,
            metric,
        });
        self.send(addr, MessageType::SetMetric, id, payload).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rule() -> TosRule {
        TosRule {
            rule_id: -1,
            intf_name: "wlan0".into(),
            proto: "udp".into(),
            wmm_class: 3,
            ..TosRule::default()
        }
    }

    #[test]
    fn tos_rule_accepts_append_marker() {
        assert!(validate_tos(&rule()).is_ok());
    }

    #[test]
    fn tos_rule_rejects_zero_id() {
        let rule = TosRule { rule_id: 0, ..rule() };
        assert!(matches!(validate_tos(&rule), Err(Error::InvalidRequest { .. })));
    }

    #[test]
    fn tos_rule_rejects_wmm_class_out_of_range() {
        let rule = TosRule { wmm_class: 8, ..rule() };
        assert!(validate_tos(&rule).is_err());
    }

    #[test]
    fn tos_rule_requires_protocol() {
        let rule = TosRule {
            proto: String::new(),
            ..rule()
        };
        assert!(validate_tos(&rule).is_err());
    }
}

// ── Domain model ──
//
// Entities the controller tracks: APs own radios and VAPs, networks group
// VAPs by SSID, stations point back at the VAP they are attached to.

pub mod ap;
pub mod entity_id;
pub mod link;
pub mod network;
pub mod radio;
pub mod station;
pub mod vap;

pub use ap::{Ap, ApSummary, StatisticsSettings};
pub use entity_id::{EntityId, MacAddress};
pub use link::DeviceLink;
pub use network::{Network, NetworkSummary};
pub use radio::{Radio, RadioSummary};
pub use station::{Station, StationSummary};
pub use vap::{ManagementFrame, Vap, VapState, VapSummary};

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use ethanol_proto::transport::{Connector, DeviceStream};
    use ethanol_proto::{DeviceClient, Error};
    use futures_util::future::BoxFuture;

    use super::{DeviceLink, EntityId, MacAddress, Radio};

    /// Refuses every connection; for tests that never reach a device.
    #[derive(Debug)]
    struct Offline;

    impl Connector for Offline {
        fn connect(&self, addr: SocketAddr) -> BoxFuture<'_, Result<Box<dyn DeviceStream>, Error>> {
            Box::pin(async move {
                Err(Error::ConnectionFailure {
                    addr,
                    source: io::Error::from(io::ErrorKind::ConnectionRefused),
                })
            })
        }
    }

    pub(crate) fn offline_client() -> DeviceClient {
        DeviceClient::with_connector(Arc::new(Offline), Duration::from_millis(50))
    }

    pub(crate) fn link(intf: &str, mac: &str) -> DeviceLink {
        let addr: SocketAddr = ([192, 168, 1, 10], 22222).into();
        DeviceLink::new(offline_client(), addr, intf, MacAddress::new(mac))
    }

    pub(crate) fn radio(intf: &str) -> Arc<Radio> {
        Arc::new(Radio::new(
            EntityId::new(),
            0,
            link(intf, "00:11:22:33:44:00"),
        ))
    }
}

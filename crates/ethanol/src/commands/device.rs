//! One-off device queries: ping, radios, SSIDs, interfaces, station link.

use ethanol_config::Config;
use ethanol_proto::codec::schema::{InterfaceEntry, LinkInfo, RadioWlan, SsidInfo};
use ethanol_proto::transport::{AP_PORT, STATION_PORT};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{DeviceArgs, GlobalOpts, InterfaceArgs, PingArgs};
use crate::commands::util::{client, resolve_device};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct PingReport {
    id: i32,
    rtt_ms: f64,
    verified: bool,
}

#[derive(Tabled)]
struct PingRow {
    #[tabled(rename = "ID")]
    id: i32,
    #[tabled(rename = "RTT (ms)")]
    rtt: String,
    #[tabled(rename = "Verified")]
    verified: bool,
}

impl From<&PingReport> for PingRow {
    fn from(p: &PingReport) -> Self {
        Self {
            id: p.id,
            rtt: format!("{:.3}", p.rtt_ms),
            verified: p.verified,
        }
    }
}

#[derive(Tabled)]
struct RadioRow {
    #[tabled(rename = "Interface")]
    intf: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "PHY")]
    wiphy: u32,
}

impl From<&RadioWlan> for RadioRow {
    fn from(w: &RadioWlan) -> Self {
        Self {
            intf: w.intf_name.clone(),
            mac: w.mac.clone(),
            wiphy: w.wiphy,
        }
    }
}

#[derive(Tabled)]
struct SsidRow {
    #[tabled(rename = "Interface")]
    intf: String,
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "Channel")]
    channel: u32,
    #[tabled(rename = "Freq (MHz)")]
    frequency: u32,
}

impl From<&SsidInfo> for SsidRow {
    fn from(s: &SsidInfo) -> Self {
        Self {
            intf: s.intf_name.clone(),
            ssid: s.ssid.clone(),
            channel: s.channel,
            frequency: s.frequency,
        }
    }
}

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Index")]
    ifindex: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Wireless")]
    wifi: bool,
}

impl From<&InterfaceEntry> for InterfaceRow {
    fn from(i: &InterfaceEntry) -> Self {
        Self {
            ifindex: i.ifindex,
            name: i.intf_name.clone(),
            mac: i.mac.clone(),
            wifi: i.is_wifi,
        }
    }
}

fn link_detail(l: &LinkInfo) -> String {
    [
        format!("Interface:  {}", l.intf_name),
        format!("BSSID:      {}", l.mac),
        format!("SSID:       {}", l.ssid),
        format!("Frequency:  {} MHz", l.frequency),
    ]
    .join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn ping(args: PingArgs, settings: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    if args.count == 0 {
        return Err(CliError::Validation {
            field: "count".into(),
            reason: "at least one probe is required".into(),
        });
    }
    let addr = resolve_device(&args.device, AP_PORT).await?;
    let outcomes = client(settings)?
        .ping(addr, 1, args.count, args.size)
        .await?;
    let reports: Vec<PingReport> = outcomes
        .iter()
        .map(|o| PingReport {
            id: o.id,
            rtt_ms: o.rtt.as_secs_f64() * 1000.0,
            verified: o.verified,
        })
        .collect();
    let out = output::render_list(&global.output, &reports, |p| PingRow::from(p), |p| {
        format!("{:.3}", p.rtt_ms)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn radios(args: DeviceArgs, settings: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let addr = resolve_device(&args.device, AP_PORT).await?;
    let wlans = client(settings)?.get_radio_wlans(addr, 1).await?;
    let out = output::render_list(&global.output, &wlans, |w| RadioRow::from(w), |w| {
        w.intf_name.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn ssids(args: DeviceArgs, settings: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let addr = resolve_device(&args.device, AP_PORT).await?;
    let ssids = client(settings)?.get_ap_ssids(addr, 1).await?;
    let out = output::render_list(&global.output, &ssids, |s| SsidRow::from(s), |s| s.ssid.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn interfaces(
    args: DeviceArgs,
    settings: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let addr = resolve_device(&args.device, AP_PORT).await?;
    let interfaces = client(settings)?.get_interfaces(addr, 1).await?;
    let out = output::render_list(&global.output, &interfaces, |i| InterfaceRow::from(i), |i| {
        i.intf_name.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn link(args: InterfaceArgs, settings: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let addr = resolve_device(&args.device, STATION_PORT).await?;
    let info = client(settings)?.get_link_info(addr, 1, &args.intf).await?;
    let out = output::render_single(&global.output, &info, link_detail, |l| l.mac.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

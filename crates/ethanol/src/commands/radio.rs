//! Radio commands: channel get/set and automatic channel selection.

use ethanol_config::Config;
use ethanol_proto::codec::schema::CurrentChannel;
use ethanol_proto::transport::AP_PORT;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{AcsArgs, ChannelArgs, ChannelCommand, GlobalOpts};
use crate::commands::util::{client, resolve_device};
use crate::error::CliError;
use crate::output;

// ── Rows ────────────────────────────────────────────────────────────

fn channel_detail(c: &CurrentChannel) -> String {
    let mode = if c.autochannel == 0 { "manual" } else { "auto" };
    [
        format!("Interface:  {}", c.intf_name),
        format!("Channel:    {}", c.channel),
        format!("Frequency:  {} MHz", c.frequency),
        format!("Selection:  {mode}"),
    ]
    .join("\n")
}

#[derive(Serialize)]
struct AcsScore {
    frequency: i32,
    factor: f64,
}

#[derive(Tabled)]
struct AcsRow {
    #[tabled(rename = "Freq (MHz)")]
    frequency: i32,
    #[tabled(rename = "Interference factor")]
    factor: String,
}

impl From<&AcsScore> for AcsRow {
    fn from(s: &AcsScore) -> Self {
        Self {
            frequency: s.frequency,
            factor: format!("{:.4}", s.factor),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn channel(args: ChannelArgs, settings: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let client = client(settings)?;
    match args.command {
        ChannelCommand::Get(target) => {
            let addr = resolve_device(&target.device, AP_PORT).await?;
            let current = client.get_current_channel(addr, 1, &target.intf).await?;
            let out = output::render_single(&global.output, &current, channel_detail, |c| {
                c.channel.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ChannelCommand::Set { target, channel } => {
            if channel <= 0 {
                return Err(CliError::Validation {
                    field: "channel".into(),
                    reason: format!("{channel} is not a channel number"),
                });
            }
            let addr = resolve_device(&target.device, AP_PORT).await?;
            client
                .set_current_channel(addr, 1, &target.intf, channel)
                .await?;
            if !global.quiet {
                eprintln!("{}: channel set to {channel}", target.intf);
            }
            Ok(())
        }
    }
}

pub async fn acs(args: AcsArgs, settings: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let addr = resolve_device(&args.target.device, AP_PORT).await?;
    let result = client(settings)?
        .get_acs(addr, 1, &args.target.intf, args.tests)
        .await?;
    let scores: Vec<AcsScore> = result
        .frequencies
        .iter()
        .zip(result.scaled_factors())
        .map(|(&frequency, factor)| AcsScore { frequency, factor })
        .collect();
    let out = output::render_list(&global.output, &scores, |s| AcsRow::from(s), |s| {
        s.frequency.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

//! Clap derive structures for the `ethanol` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ethanol -- controller and device client for Ethanol access points
#[derive(Debug, Parser)]
#[command(
    name = "ethanol",
    version,
    about = "Run the Ethanol wireless controller or query its access points",
    long_about = "Runs the controller that Ethanol APs and stations register with, \
        and talks directly to a device for one-off queries and commands.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "ETHANOL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept any device certificate
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Reply timeout in milliseconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Accept AP and station connections until interrupted
    Serve(ServeArgs),

    /// Measure round-trip time to a device
    Ping(PingArgs),

    /// List the wireless interfaces of an AP's radios
    Radios(DeviceArgs),

    /// List the SSIDs an AP broadcasts
    Ssids(DeviceArgs),

    /// List a device's network interfaces
    #[command(alias = "intf")]
    Interfaces(DeviceArgs),

    /// Show the link of a station interface
    Link(InterfaceArgs),

    /// Read or change a radio's channel
    #[command(alias = "ch")]
    Channel(ChannelArgs),

    /// Run automatic channel selection on a radio
    Acs(AcsArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Serve ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides the config file)
    #[arg(long, short = 'l')]
    pub listen: Option<SocketAddr>,

    /// Listener certificate (PEM)
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Listener private key (PEM); read from --cert when omitted
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Only accept APs the network controller announced
    #[arg(long)]
    pub require_preregistration: bool,

    /// Print fleet events to stdout as they happen
    #[arg(long)]
    pub events: bool,
}

// ── Device queries ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Device address, `host` or `host:port`
    pub device: String,
}

#[derive(Debug, Args)]
pub struct InterfaceArgs {
    /// Device address, `host` or `host:port`
    pub device: String,

    /// Interface name
    pub intf: String,
}

#[derive(Debug, Args)]
pub struct PingArgs {
    /// Device address, `host` or `host:port`
    pub device: String,

    /// Number of probes
    #[arg(long, short = 'c', default_value = "4")]
    pub count: u32,

    /// Payload size in bytes
    #[arg(long, short = 's', default_value = "64")]
    pub size: usize,
}

#[derive(Debug, Args)]
pub struct ChannelArgs {
    #[command(subcommand)]
    pub command: ChannelCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChannelCommand {
    /// Show the current channel
    Get(InterfaceArgs),

    /// Switch to another channel
    Set {
        #[command(flatten)]
        target: InterfaceArgs,

        /// Channel number
        channel: i32,
    },
}

#[derive(Debug, Args)]
pub struct AcsArgs {
    #[command(flatten)]
    pub target: InterfaceArgs,

    /// Number of measurement rounds (0 lets the AP decide)
    #[arg(long, short = 'n', default_value = "0")]
    pub tests: i32,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

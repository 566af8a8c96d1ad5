//! Command dispatch: bridges CLI args -> controller or device calls -> output.

pub mod config_cmd;
pub mod device;
pub mod radio;
pub mod serve;
pub mod util;

use ethanol_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that needs resolved settings.
pub async fn dispatch(cmd: Command, settings: Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Serve(args) => serve::handle(args, settings, global).await,
        Command::Ping(args) => device::ping(args, &settings, global).await,
        Command::Radios(args) => device::radios(args, &settings, global).await,
        Command::Ssids(args) => device::ssids(args, &settings, global).await,
        Command::Interfaces(args) => device::interfaces(args, &settings, global).await,
        Command::Link(args) => device::link(args, &settings, global).await,
        Command::Channel(args) => radio::channel(args, &settings, global).await,
        Command::Acs(args) => radio::acs(args, &settings, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command does not need device settings".into(),
        }),
    }
}

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ethanol_config::Config;

use crate::cli::{Cli, Command, GlobalOpts, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, &cli.global.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: &LogFormat) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands work on the file itself
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "ethanol", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let settings = load_settings(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, settings, &cli.global).await
        }
    }
}

/// Config file + environment, then the global flag overrides.
fn load_settings(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(ethanol_config::config_path);
    let mut cfg = ethanol_config::load_config_from(&path)?;
    if global.insecure {
        cfg.tls.insecure = true;
        cfg.tls.ca_cert = None;
    }
    if let Some(ms) = global.timeout {
        cfg.timeouts.read_ms = ms;
    }
    Ok(cfg)
}

//! `ethanol serve`: run the controller until Ctrl-C.

use ethanol_config::Config;
use ethanol_core::{Controller, FleetEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cli::{GlobalOpts, ServeArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ServeArgs, mut settings: Config, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(listen) = args.listen {
        settings.listen = listen;
    }
    if args.cert.is_some() {
        settings.tls.cert = args.cert;
    }
    if args.key.is_some() {
        settings.tls.key = args.key;
    }
    settings.require_preregistration |= args.require_preregistration;

    let cert = settings.cert_path();
    if !cert.is_file() {
        return Err(CliError::NoCertificate {
            path: cert.display().to_string(),
        });
    }

    let controller = Controller::new(settings.to_controller_config()?)?;
    spawn_event_sink(&controller, args.events && !global.quiet);

    let stopper = controller.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            stopper.shutdown();
        }
    });

    info!(listen = %settings.listen, "starting controller");
    controller.serve().await?;
    Ok(())
}

/// Log every fleet event; with `print`, also write it to stdout as a JSON line.
fn spawn_event_sink(controller: &Controller, print: bool) {
    let mut events = controller.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    log_event(&event);
                    if print {
                        match output::render_json(&event, true) {
                            Ok(line) => output::print_output(&line, false),
                            Err(err) => warn!(error = %err, "unprintable event"),
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn log_event(event: &FleetEvent) {
    match event {
        FleetEvent::ApConnected { id, addr } => info!(%id, %addr, "AP connected"),
        FleetEvent::ApRemoved { id, addr } => info!(%id, %addr, "AP removed"),
        FleetEvent::StationConnected {
            addr, intf_name, mac, ..
        } => info!(%addr, intf = %intf_name, %mac, "station connected"),
        FleetEvent::StationRemoved { addr, intf_name, .. } => {
            info!(%addr, intf = %intf_name, "station removed");
        }
        FleetEvent::HandoffCompleted { station, to, .. } => {
            info!(%station, %to, "handoff completed");
        }
        other => tracing::debug!(event = ?other, "fleet event"),
    }
}

// Connects to the first Crazyflie found, flies the take off, hover, advance and land sequence and disconnects.
//
// The sequence is open-loop: the setpoints are fixed and sent at a fixed pace, nothing is measured. Fly it in an
// open space with nothing around.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crazyflie_hover::events::{ConnectionEvent, ConnectionEvents};
use crazyflie_hover::flight::{FlightPlan, PhaseKind};
use crazyflie_hover::runner::FlightWorker;
use crazyflie_hover::scan::{format_address, parse_address, scan};
use crazyflie_hover::Crazyflie;
use crazyflie_link::LinkContext;

#[derive(Debug, Parser)]
#[command(version, about = "Fly a Crazyflie through a scripted take off, hover and landing")]
struct Args {
    /// Link URI to connect to, for example radio://0/80/2M/E7E7E7E7E7. Scans when not set.
    #[arg(long)]
    uri: Option<String>,

    /// Radio address to scan for, as 10 hex digits
    #[arg(long, default_value = "E7E7E7E7E7", value_parser = address_arg)]
    address: [u8; 5],

    /// Time between two setpoints, in milliseconds
    #[arg(long, default_value_t = 100)]
    period_ms: u64,

    /// Land straight after hovering, without moving forward
    #[arg(long)]
    no_advance: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let context = LinkContext::new();

    let uri = match args.uri {
        Some(uri) => uri,
        None => {
            println!("Scanning interfaces for Crazyflies...");
            let available = scan(&context, args.address)
                .await
                .with_context(|| format!("scanning for address {}", format_address(&args.address)))?;

            println!("Crazyflies found:");
            for uri in &available {
                println!("{}", uri);
            }

            match available.into_iter().next() {
                Some(uri) => uri,
                None => {
                    println!("No Crazyflies found, cannot run example");
                    return Ok(());
                }
            }
        }
    };

    let mut plan = FlightPlan::hover_demo(Duration::from_millis(args.period_ms));
    if args.no_advance {
        plan = plan.without(PhaseKind::Advance);
    }

    let events = ConnectionEvents::new();
    let printer = tokio::spawn(print_events(events.subscribe()));

    println!("Connecting to {}", uri);
    let flight = match Crazyflie::connect_with_events(&context, &uri, &events).await {
        Ok(cf) => {
            // Fly from a separate task, the connection task is not to be blocked
            let report = FlightWorker::start(Arc::new(cf), plan).join().await?;
            Some(report)
        }
        // Already reported by the event printer
        Err(_) => None,
    };

    printer.await?;

    if let Some(report) = flight {
        match &report.aborted {
            None => println!("Flight complete, {} setpoints sent", report.sent),
            Some((phase, e)) => println!(
                "Flight aborted during {} after {} setpoints: {}",
                phase, report.sent, e
            ),
        }
    }

    Ok(())
}

fn address_arg(text: &str) -> Result<[u8; 5], String> {
    parse_address(text).map_err(|e| e.to_string())
}

// Prints the lifecycle messages until the connection is over
async fn print_events(events: flume::Receiver<ConnectionEvent>) {
    while let Ok(event) = events.recv_async().await {
        match event {
            ConnectionEvent::Connected { .. } => log::info!("{}", event),
            ConnectionEvent::ConnectionLost { .. } => println!("{}", event),
            ConnectionEvent::ConnectionFailed { .. } | ConnectionEvent::Disconnected { .. } => {
                println!("{}", event);
                return;
            }
        }
    }
}

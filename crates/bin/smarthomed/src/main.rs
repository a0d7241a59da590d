//! # smarthomed: smart home daemon
//!
//! Composition root that wires the system adapters into the device registry
//! and runs a scripted household session.
//!
//! ## Responsibilities
//! - Load configuration (`smarthome.toml`, env vars)
//! - Initialise `tracing` with the configured filter
//! - Construct the event bus and print every published event
//! - Construct the `SmartHome` service with the system clock and tokio pacer
//! - Run the session, then drain the event stream
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;
mod session;

use smarthome_adapter_system::{SystemClock, TokioPacer};
use smarthome_app::event_bus::InProcessEventBus;
use smarthome_app::services::smart_home::SmartHome;
use smarthome_domain::time::format_timestamp;

use crate::config::Config;
use crate::session::Residents;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .with_target(false)
        .compact()
        .init();

    // Event bus
    let event_bus = InProcessEventBus::new(config.events.capacity);
    let mut events = event_bus.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            println!("[{}] {event}", format_timestamp(event.timestamp));
        }
    });

    // Services
    let mut home = SmartHome::new(SystemClock, TokioPacer, event_bus)
        .with_default_step(config.ramp_step()?);

    let residents = Residents::new()?;
    session::run(&mut home, &residents).await?;

    // closes the bus so the printer drains and stops
    drop(home);
    printer.await?;

    Ok(())
}

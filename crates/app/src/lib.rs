//! # smarthome-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Clock`: wall-clock and local time
//!   - `Pacer`: waits between thermostat ramp steps
//!   - `EventPublisher`: fan-out of domain events
//! - Define the **driving/inbound** use-case struct:
//!   - `SmartHome`: the device registry: add, remove, list, find, clear and
//!     name-based `control_device`, all routed through the access guard
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Log one line per state change and publish it
//!
//! ## Dependency rule
//! Depends on `smarthome-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod services;

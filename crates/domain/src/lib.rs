//! # smarthome-domain
//!
//! Pure domain model for the smarthome hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Roles** and **Users** (who is asking)
//! - Define **Device kinds** and their **Operation** tables (what may be asked,
//!   and by whom)
//! - Enforce access rules through the [`access::AccessGuard`]
//! - Define **Devices** (lights, thermostats, cameras, clocks) and their state
//!   machines, including name-based dispatch
//! - Define **Events** (state-change records)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates.
//! Waiting, wall-clock reads and publishing are expressed as traits in the
//! `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod access;
pub mod device;
pub mod event;
pub mod kind;
pub mod operation;
pub mod role;

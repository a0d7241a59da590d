//! # smarthome-adapter-system
//!
//! Real-world implementations of the time ports:
//!
//! | Port | Adapter | Backed by |
//! |------|---------|-----------|
//! | [`Clock`] | [`SystemClock`] | `chrono::Utc` / `chrono::Local` |
//! | [`Pacer`] | [`TokioPacer`] | `tokio::time::sleep` |
//!
//! ## Dependency rule
//!
//! Depends on `smarthome-app` (port traits) and `smarthome-domain` only.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Utc};

use smarthome_app::ports::{Clock, Pacer};
use smarthome_domain::time::Timestamp;

/// Reads the host's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Waits on the tokio timer. Dropping the returned future cancels the wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

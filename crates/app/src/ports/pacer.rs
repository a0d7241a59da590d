//! Pacer port: the wait between two thermostat ramp steps.

use std::future::Future;
use std::time::Duration;

/// Suspends the ramp between steps.
///
/// Real adapters sleep; tests record the requested pauses and return
/// immediately. Dropping the returned future cancels the ramp at that point.
pub trait Pacer {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

impl<T: Pacer + Send + Sync> Pacer for std::sync::Arc<T> {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        (**self).pause(duration)
    }
}

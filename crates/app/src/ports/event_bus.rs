//! Event bus port: where the registry sends each state change.

use std::future::Future;

use smarthome_domain::error::HomeError;
use smarthome_domain::event::Event;

/// Receives every event the registry emits, in emission order.
pub trait EventPublisher {
    /// Hand `event` to the current subscribers. Returns how many got it.
    ///
    /// Having no subscribers is not an error.
    fn publish(&self, event: Event) -> impl Future<Output = Result<usize, HomeError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<usize, HomeError>> + Send {
        (**self).publish(event)
    }
}

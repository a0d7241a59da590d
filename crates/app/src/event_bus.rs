//! In-process event bus backed by a tokio broadcast channel.
//!
//! Subscribers read through an [`EventStream`], which skips over events lost
//! to a full channel and reports the gap instead of failing.

use std::future::Future;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use smarthome_domain::error::HomeError;
use smarthome_domain::event::Event;

use crate::ports::EventPublisher;

/// Fans every published [`Event`] out to all live [`EventStream`]s.
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// `capacity` events may be buffered per slow subscriber before the
    /// oldest are dropped for it.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Stream of the events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<usize, HomeError>> + Send {
        // only fails without receivers
        let delivered = self.sender.send(event).unwrap_or(0);
        async move { Ok(delivered) }
    }
}

/// One subscriber's view of the bus.
///
/// Ends once the bus is dropped and every buffered event has been read.
pub struct EventStream {
    receiver: broadcast::Receiver<Event>,
    missed: u64,
}

impl EventStream {
    /// Wait for the next event. `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => self.record_gap(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered event, without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => self.record_gap(skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Events this subscriber lost because it fell behind.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn record_gap(&mut self, skipped: u64) {
        self.missed += skipped;
        tracing::warn!(skipped, total = self.missed, "event subscriber fell behind");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smarthome_domain::event::{DeviceEvent, EventPayload};
    use smarthome_domain::id::DeviceId;
    use smarthome_domain::time::now;

    fn powered_on() -> Event {
        Event::new(
            Some(DeviceId::new("L1").unwrap()),
            "Hall light",
            EventPayload::Device(DeviceEvent::PoweredOn),
            now(),
        )
    }

    #[tokio::test]
    async fn should_deliver_event_to_every_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = Event::new(None, "home", EventPayload::RegistryCleared { count: 0 }, now());
        let event_id = event.id;

        assert_eq!(bus.publish(event).await.unwrap(), 2);
        assert_eq!(first.next().await.unwrap().id, event_id);
        assert_eq!(second.next().await.unwrap().id, event_id);
    }

    #[tokio::test]
    async fn should_report_zero_deliveries_without_subscribers() {
        let bus = InProcessEventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(powered_on()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(powered_on()).await.unwrap();

        let mut stream = bus.subscribe();
        let later = powered_on();
        let later_id = later.id;
        bus.publish(later).await.unwrap();

        assert_eq!(stream.next().await.unwrap().id, later_id);
        assert!(stream.try_next().is_none());
    }

    #[tokio::test]
    async fn should_skip_lost_events_and_count_them() {
        let bus = InProcessEventBus::new(2);
        let mut stream = bus.subscribe();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let event = powered_on();
            ids.push(event.id);
            bus.publish(event).await.unwrap();
        }

        assert_eq!(stream.try_next().unwrap().id, ids[3]);
        assert_eq!(stream.try_next().unwrap().id, ids[4]);
        assert!(stream.try_next().is_none());
        assert_eq!(stream.missed(), 3);
    }

    #[tokio::test]
    async fn should_end_stream_when_bus_dropped() {
        let bus = InProcessEventBus::new(4);
        let mut stream = bus.subscribe();
        bus.publish(powered_on()).await.unwrap();
        drop(bus);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }
}

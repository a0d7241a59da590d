//! Clock port: where "now" comes from.

use chrono::NaiveDateTime;
use smarthome_domain::time::Timestamp;

/// Source of the current time.
///
/// Camera recordings are stamped with [`now`](Self::now); clock displays
/// show [`local_now`](Self::local_now).
pub trait Clock {
    fn now(&self) -> Timestamp;

    /// Local wall time. Defaults to UTC.
    fn local_now(&self) -> NaiveDateTime {
        self.now().naive_utc()
    }
}

impl<T: Clock> Clock for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn local_now(&self) -> NaiveDateTime {
        (**self).local_now()
    }
}

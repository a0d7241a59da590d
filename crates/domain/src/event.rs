//! Event: an immutable record of something that happened.
//!
//! Device methods return the [`DeviceEvent`]s their call produced; a call
//! that changes nothing returns none. The application layer wraps each one
//! in an [`Event`] envelope, logs it as a single line and publishes it.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, EventId, RecordingId};
use crate::time::{Timestamp, format_timestamp};

/// State change of a single device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    PoweredOn,
    PoweredOff,
    BrightnessChanged {
        brightness: u8,
    },
    TargetTemperatureSet {
        target: f64,
    },
    CurrentTemperatureSet {
        current: f64,
    },
    RampStep {
        current: f64,
        target: f64,
    },
    RecordingStarted {
        at: Timestamp,
    },
    RecordingStopped {
        id: RecordingId,
        start: Timestamp,
        end: Timestamp,
    },
    RecordingRemoved {
        id: RecordingId,
    },
    ClockFormatChanged {
        twelve_hour: bool,
    },
    Renamed {
        from: String,
        to: String,
    },
}

impl std::fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PoweredOn => f.write_str("turned on"),
            Self::PoweredOff => f.write_str("turned off"),
            Self::BrightnessChanged { brightness } => {
                write!(f, "brightness set to {brightness}%")
            }
            Self::TargetTemperatureSet { target } => {
                write!(f, "target temperature set to {target:.1}\u{b0}C")
            }
            Self::CurrentTemperatureSet { current } => {
                write!(f, "current temperature set to {current:.1}\u{b0}C")
            }
            Self::RampStep { current, target } => {
                write!(f, "temperature now {current:.1}\u{b0}C (target {target:.1}\u{b0}C)")
            }
            Self::RecordingStarted { at } => {
                write!(f, "recording started at {}", format_timestamp(*at))
            }
            Self::RecordingStopped { id, start, end } => write!(
                f,
                "recording {id} saved: {} -- {}",
                format_timestamp(*start),
                format_timestamp(*end)
            ),
            Self::RecordingRemoved { id } => write!(f, "recording {id} removed"),
            Self::ClockFormatChanged { twelve_hour: true } => f.write_str("switched to 12-hour format"),
            Self::ClockFormatChanged { twelve_hour: false } => {
                f.write_str("switched to 24-hour format")
            }
            Self::Renamed { from, to } => write!(f, "renamed from {from} to {to}"),
        }
    }
}

/// What an [`Event`] reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    Device(DeviceEvent),
    DeviceAdded,
    DeviceRemoved,
    RegistryCleared { count: usize },
}

/// Envelope for one published change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Device the event concerns, if any.
    pub device_id: Option<DeviceId>,
    /// Display name of the source (device name, or the hub itself).
    pub subject: String,
    pub payload: EventPayload,
    pub timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(
        device_id: Option<DeviceId>,
        subject: impl Into<String>,
        payload: EventPayload,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: EventId::new(),
            device_id,
            subject: subject.into(),
            payload,
            timestamp,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            EventPayload::Device(event) => write!(f, "{} {event}", self.subject),
            EventPayload::DeviceAdded => write!(f, "{} added", self.subject),
            EventPayload::DeviceRemoved => write!(f, "{} removed", self.subject),
            EventPayload::RegistryCleared { count } => {
                write!(f, "{} cleared ({count} devices)", self.subject)
            }
        }
    }
}

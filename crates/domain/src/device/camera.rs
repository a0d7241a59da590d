//! Camera: records clips into an in-memory index.
//!
//! At most one recording is active at a time. Stopping it stores a
//! [`Recording`] under the next sequence number; numbers are never reused,
//! even after a recording is removed.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{HomeError, IllegalStateError, NotFoundError};
use crate::event::DeviceEvent;
use crate::id::RecordingId;
use crate::kind::DeviceKind;
use crate::operation::{ADMINS, EVERYONE, Operation, OperationSpec};
use crate::role::User;
use crate::time::{Timestamp, format_timestamp};

use super::{DeviceInfo, Invocation, Outcome, authorize, unsupported};

pub const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new(Operation::TurnOn, ADMINS),
    OperationSpec::new(Operation::TurnOff, ADMINS),
    OperationSpec::new(Operation::Status, EVERYONE),
    OperationSpec::new(Operation::StartRecording, ADMINS),
    OperationSpec::new(Operation::StopRecording, ADMINS),
    OperationSpec::new(Operation::Recordings, ADMINS),
    OperationSpec::new(Operation::RemoveRecording, ADMINS),
    OperationSpec::new(Operation::Rename, ADMINS),
];

/// Bounds of a finished recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recording {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl std::fmt::Display for Recording {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -- {}",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Camera {
    #[serde(flatten)]
    info: DeviceInfo,
    on: bool,
    recording_since: Option<Timestamp>,
    memory: BTreeMap<RecordingId, Recording>,
    next_id: RecordingId,
}

impl Camera {
    pub const KIND: DeviceKind = DeviceKind::Camera;

    /// Create a camera that is off with an empty memory.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank id or name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, HomeError> {
        Ok(Self {
            info: DeviceInfo::new(id, name)?,
            on: false,
            recording_since: None,
            memory: BTreeMap::new(),
            next_id: RecordingId::FIRST,
        })
    }

    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording_since.is_some()
    }

    #[must_use]
    pub fn recordings(&self) -> &BTreeMap<RecordingId, Recording> {
        &self.memory
    }

    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn turn_on(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::TurnOn)?;
        if self.on {
            return Ok(Vec::new());
        }
        self.on = true;
        Ok(vec![DeviceEvent::PoweredOn])
    }

    /// Power off. An active recording is stored first, ending at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn turn_off_at(&mut self, user: &User, at: Timestamp) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::TurnOff)?;
        if !self.on {
            return Ok(Vec::new());
        }
        let mut events = Vec::new();
        if let Some(start) = self.recording_since.take() {
            events.push(self.store(start, at));
        }
        self.on = false;
        events.push(DeviceEvent::PoweredOff);
        Ok(events)
    }

    /// Power off, closing any active recording now.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn turn_off(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        self.turn_off_at(user, crate::time::now())
    }

    /// # Errors
    ///
    /// - [`HomeError::PermissionDenied`] when `user` may not.
    /// - [`IllegalStateError::PoweredOff`] when off.
    /// - [`IllegalStateError::AlreadyRecording`] when a recording is active.
    pub fn start_recording(&mut self, user: &User, at: Timestamp) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::StartRecording)?;
        if !self.on {
            return Err(IllegalStateError::PoweredOff.into());
        }
        if self.recording_since.is_some() {
            return Err(IllegalStateError::AlreadyRecording.into());
        }
        self.recording_since = Some(at);
        Ok(vec![DeviceEvent::RecordingStarted { at }])
    }

    /// Close the active recording at `at` and store it.
    ///
    /// # Errors
    ///
    /// - [`HomeError::PermissionDenied`] when `user` may not.
    /// - [`IllegalStateError::PoweredOff`] when off.
    /// - [`IllegalStateError::NotRecording`] when nothing is being recorded.
    pub fn stop_recording(&mut self, user: &User, at: Timestamp) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::StopRecording)?;
        if !self.on {
            return Err(IllegalStateError::PoweredOff.into());
        }
        let start = self
            .recording_since
            .take()
            .ok_or(IllegalStateError::NotRecording)?;
        Ok(vec![self.store(start, at)])
    }

    fn store(&mut self, start: Timestamp, end: Timestamp) -> DeviceEvent {
        let id = self.next_id;
        self.memory.insert(id, Recording { start, end });
        self.next_id = id.next();
        DeviceEvent::RecordingStopped { id, start, end }
    }

    /// Delete a stored recording.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not, or
    /// [`HomeError::NotFound`] when no recording has that id.
    pub fn remove_recording(&mut self, user: &User, id: &str) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::RemoveRecording)?;
        let not_found = || NotFoundError {
            entity: "Recording",
            id: id.to_string(),
        };
        let key: RecordingId = id.parse().map_err(|_| not_found())?;
        self.memory.remove(&key).ok_or_else(not_found)?;
        Ok(vec![DeviceEvent::RecordingRemoved { id: key }])
    }

    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] or a validation error.
    pub fn rename(&mut self, user: &User, name: impl Into<String>) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::Rename)?;
        self.info.rename(name.into())
    }

    fn memory_as_json(&self) -> Value {
        let entries: Map<String, Value> = self
            .memory
            .iter()
            .map(|(id, rec)| (id.to_string(), Value::String(rec.to_string())))
            .collect();
        Value::Object(entries)
    }

    pub(super) fn invoke(
        &mut self,
        user: &User,
        operation: Operation,
        invocation: &Invocation<'_>,
    ) -> Result<Outcome, HomeError> {
        let now = invocation.now;
        match operation {
            Operation::TurnOn => self.turn_on(user).map(Outcome::changed),
            Operation::TurnOff => self.turn_off_at(user, now).map(Outcome::changed),
            Operation::Status => Ok(Outcome::reply(self.on)),
            Operation::StartRecording => self.start_recording(user, now).map(Outcome::changed),
            Operation::StopRecording => self.stop_recording(user, now).map(Outcome::changed),
            Operation::Recordings => Ok(Outcome::reply(self.memory_as_json())),
            Operation::RemoveRecording => {
                let id = invocation.args.required_key("id", 0)?;
                self.remove_recording(user, &id).map(Outcome::changed)
            }
            Operation::Rename => {
                let name = invocation.args.required_str("name", 0)?;
                self.rename(user, name).map(Outcome::changed)
            }
            other => Err(unsupported(Self::KIND, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DenialReason;
    use crate::role::Role;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn admin() -> User {
        User::new("root", Role::Admin).unwrap()
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap()
    }

    fn powered() -> Camera {
        let mut camera = Camera::new("C1", "Porch").unwrap();
        camera.turn_on(&admin()).unwrap();
        camera
    }

    fn record(camera: &mut Camera, start: Timestamp, secs: i64) {
        camera.start_recording(&admin(), start).unwrap();
        camera
            .stop_recording(&admin(), start + Duration::seconds(secs))
            .unwrap();
    }

    #[test]
    fn should_refuse_recording_while_off() {
        let mut camera = Camera::new("C1", "Porch").unwrap();
        assert!(matches!(
            camera.start_recording(&admin(), t0()),
            Err(HomeError::IllegalState(IllegalStateError::PoweredOff))
        ));
    }

    #[test]
    fn should_refuse_stop_before_start() {
        let mut camera = powered();
        assert!(matches!(
            camera.stop_recording(&admin(), t0()),
            Err(HomeError::IllegalState(IllegalStateError::NotRecording))
        ));
    }

    #[test]
    fn should_refuse_second_concurrent_recording() {
        let mut camera = powered();
        camera.start_recording(&admin(), t0()).unwrap();
        assert!(matches!(
            camera.start_recording(&admin(), t0()),
            Err(HomeError::IllegalState(IllegalStateError::AlreadyRecording))
        ));
    }

    #[test]
    fn should_store_formatted_range_when_stopped() {
        let mut camera = powered();
        record(&mut camera, t0(), 95);
        assert!(!camera.is_recording());
        let stored = camera.recordings().values().next().unwrap();
        assert_eq!(
            stored.to_string(),
            "2024-06-01 18:30:00 -- 2024-06-01 18:31:35"
        );
    }

    #[test]
    fn should_number_recordings_sequentially_without_reuse() {
        let mut camera = powered();
        record(&mut camera, t0(), 1);
        record(&mut camera, t0(), 2);
        camera.remove_recording(&admin(), "2").unwrap();
        record(&mut camera, t0(), 3);

        let ids: Vec<u64> = camera.recordings().keys().map(|id| id.get()).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn should_return_not_found_for_unknown_recording() {
        let mut camera = powered();
        for id in ["1", "abc", ""] {
            assert!(matches!(
                camera.remove_recording(&admin(), id),
                Err(HomeError::NotFound(NotFoundError { entity: "Recording", .. }))
            ));
        }
    }

    #[test]
    fn should_transition_once_when_turned_on_twice() {
        let mut camera = Camera::new("C1", "Porch").unwrap();
        assert_eq!(camera.turn_on(&admin()).unwrap(), [DeviceEvent::PoweredOn]);
        assert!(camera.turn_on(&admin()).unwrap().is_empty());
    }

    #[test]
    fn should_store_active_recording_when_turned_off() {
        let mut camera = powered();
        camera.start_recording(&admin(), t0()).unwrap();
        let events = camera
            .turn_off_at(&admin(), t0() + Duration::seconds(10))
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], DeviceEvent::PoweredOff);
        assert_eq!(camera.recordings().len(), 1);
        assert!(!camera.is_recording());
    }

    #[test]
    fn should_deny_user_recording() {
        let mut camera = powered();
        let member = User::new("bob", Role::User).unwrap();
        assert!(matches!(
            camera.start_recording(&member, t0()),
            Err(HomeError::PermissionDenied(_))
        ));
    }

    #[test]
    fn should_deny_user_every_camera_operation_for_missing_rights() {
        let member = User::new("bob", Role::User).unwrap();
        let mut camera = Camera::new("C1", "Porch").unwrap();
        let denials = [
            camera.turn_on(&member).unwrap_err(),
            camera.turn_off(&member).unwrap_err(),
            camera.start_recording(&member, t0()).unwrap_err(),
            camera.stop_recording(&member, t0()).unwrap_err(),
            camera.remove_recording(&member, "1").unwrap_err(),
        ];
        for err in denials {
            let HomeError::PermissionDenied(denied) = err else {
                panic!("expected a denial, got {err:?}");
            };
            assert_eq!(denied.reason, DenialReason::NoAccessRights);
        }
        assert!(!camera.is_on());
    }

    #[test]
    fn should_list_recordings_keyed_by_string_id() {
        let mut camera = powered();
        record(&mut camera, t0(), 5);
        let args = Value::Null;
        let Outcome::Done { reply, .. } = camera
            .invoke(&admin(), Operation::Recordings, &Invocation::new(&args, t0()))
            .unwrap()
        else {
            panic!("expected a reply");
        };
        assert_eq!(
            reply,
            json!({"1": "2024-06-01 18:30:00 -- 2024-06-01 18:30:05"})
        );
    }

    #[test]
    fn should_use_invocation_time_for_recording_bounds() {
        let mut camera = powered();
        let args = Value::Null;
        camera
            .invoke(&admin(), Operation::StartRecording, &Invocation::new(&args, t0()))
            .unwrap();
        let later = t0() + Duration::minutes(2);
        camera
            .invoke(&admin(), Operation::StopRecording, &Invocation::new(&args, later))
            .unwrap();
        let stored = camera.recordings().values().next().unwrap();
        assert_eq!(stored.start, t0());
        assert_eq!(stored.end, later);
    }
}

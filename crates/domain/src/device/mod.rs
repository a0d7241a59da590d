//! Devices: the controllable things registered in a hub.
//!
//! Each variant owns its state and enforces its own invariants:
//!
//! | Variant | States | Kind-specific operations |
//! |---------|--------|--------------------------|
//! | [`Light`] | off, on(brightness) | `set_brightness` |
//! | [`Thermostat`] | off, on, on+target | `set_target_temp`, `start` (ramp) |
//! | [`Camera`] | off, idle, recording | `start_recording`, `stop_recording`, `remove_recording` |
//! | [`Clock`] | off, on | `toggle_format`, `current_time`, `current_datetime` |
//!
//! Every mutating method takes the acting [`User`] and checks it against the
//! variant's operation table before touching any state. Mutations return the
//! [`DeviceEvent`]s they produced; an idempotent repeat returns none.

pub mod camera;
pub mod clock;
mod dispatch;
pub mod light;
pub mod thermostat;

pub use camera::{Camera, Recording};
pub use clock::Clock;
pub use dispatch::{Args, Invocation, Outcome};
pub use light::Light;
pub use thermostat::{Ramp, RampStep, Thermostat};

use serde::Serialize;

use crate::access::AccessGuard;
use crate::error::{HomeError, UnknownOperationError, ValidationError};
use crate::event::DeviceEvent;
use crate::id::DeviceId;
use crate::kind::DeviceKind;
use crate::operation::{self, Operation};
use crate::role::User;

/// Identity shared by every variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    id: DeviceId,
    name: String,
}

impl DeviceInfo {
    /// Validate and pair an id name with a display name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] or [`ValidationError::EmptyName`]
    /// for blank input.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, HomeError> {
        let id = DeviceId::new(id)?;
        let name = validate_name(name.into())?;
        Ok(Self { id, name })
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: String) -> Result<Vec<DeviceEvent>, HomeError> {
        let name = validate_name(name)?;
        if name == self.name {
            return Ok(Vec::new());
        }
        let from = std::mem::replace(&mut self.name, name);
        Ok(vec![DeviceEvent::Renamed {
            from,
            to: self.name.clone(),
        }])
    }
}

fn validate_name(name: String) -> Result<String, HomeError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    Ok(name)
}

/// Reject `value` unless it lies in `[min, max]`.
pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

fn authorize(user: &User, kind: DeviceKind, operation: Operation) -> Result<(), HomeError> {
    AccessGuard::authorize(user, kind, operation)?;
    Ok(())
}

fn unsupported(kind: DeviceKind, operation: Operation) -> HomeError {
    UnknownOperationError::new(kind, operation).into()
}

/// Any registered device.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Device {
    Light(Light),
    Thermostat(Thermostat),
    Camera(Camera),
    Clock(Clock),
}

impl Device {
    fn info(&self) -> &DeviceInfo {
        match self {
            Self::Light(d) => d.info(),
            Self::Thermostat(d) => d.info(),
            Self::Camera(d) => d.info(),
            Self::Clock(d) => d.info(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        self.info().id()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.info().name()
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Light(_) => Light::KIND,
            Self::Thermostat(_) => Thermostat::KIND,
            Self::Camera(_) => Camera::KIND,
            Self::Clock(_) => Clock::KIND,
        }
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        match self {
            Self::Light(d) => d.is_on(),
            Self::Thermostat(d) => d.is_on(),
            Self::Camera(d) => d.is_on(),
            Self::Clock(d) => d.is_on(),
        }
    }

    /// Power on with the variant's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not do so.
    pub fn turn_on(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        match self {
            Self::Light(d) => d.turn_on(user),
            Self::Thermostat(d) => d.turn_on(user),
            Self::Camera(d) => d.turn_on(user),
            Self::Clock(d) => d.turn_on(user),
        }
    }

    /// Power off.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not do so.
    pub fn turn_off(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        match self {
            Self::Light(d) => d.turn_off(user),
            Self::Thermostat(d) => d.turn_off(user),
            Self::Camera(d) => d.turn_off(user),
            Self::Clock(d) => d.turn_off(user),
        }
    }

    /// Invoke the operation called `name`.
    ///
    /// The name is resolved against this device's operation table, then the
    /// user is checked against the entry's roles, then arguments are read.
    ///
    /// # Errors
    ///
    /// - [`HomeError::UnknownOperation`] if the kind exposes no such name.
    /// - Whatever the resolved operation returns (permission, validation,
    ///   illegal state, not found).
    pub fn invoke(
        &mut self,
        user: &User,
        name: &str,
        invocation: &Invocation<'_>,
    ) -> Result<Outcome, HomeError> {
        let kind = self.kind();
        let operation = Operation::from_name(name)
            .filter(|op| operation::spec(kind, *op).is_some())
            .ok_or_else(|| UnknownOperationError {
                kind,
                operation: name.to_string(),
            })?;
        // roles are checked before any argument is read
        authorize(user, kind, operation)?;

        match self {
            Self::Light(d) => d.invoke(user, operation, invocation),
            Self::Thermostat(d) => d.invoke(user, operation, invocation),
            Self::Camera(d) => d.invoke(user, operation, invocation),
            Self::Clock(d) => d.invoke(user, operation, invocation),
        }
    }

    #[must_use]
    pub fn as_thermostat_mut(&mut self) -> Option<&mut Thermostat> {
        match self {
            Self::Thermostat(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Light> for Device {
    fn from(d: Light) -> Self {
        Self::Light(d)
    }
}

impl From<Thermostat> for Device {
    fn from(d: Thermostat) -> Self {
        Self::Thermostat(d)
    }
}

impl From<Camera> for Device {
    fn from(d: Camera) -> Self {
        Self::Camera(d)
    }
}

impl From<Clock> for Device {
    fn from(d: Clock) -> Self {
        Self::Clock(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IllegalStateError;
    use crate::role::Role;
    use chrono::{TimeZone, Utc};

    fn user(role: Role) -> User {
        User::new("tester", role).unwrap()
    }

    fn invocation(args: &serde_json::Value) -> Invocation<'_> {
        Invocation::new(args, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn should_reject_info_when_name_is_blank() {
        assert!(matches!(
            DeviceInfo::new("L1", "  "),
            Err(HomeError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_info_when_id_is_blank() {
        assert!(matches!(
            DeviceInfo::new("", "Lamp"),
            Err(HomeError::Validation(ValidationError::EmptyId))
        ));
    }

    #[test]
    fn should_report_kind_of_each_variant() {
        let devices: Vec<Device> = vec![
            Light::new("L1", "Lamp").unwrap().into(),
            Thermostat::new("T1", "Heating", 20.0).unwrap().into(),
            Camera::new("C1", "Porch").unwrap().into(),
            Clock::new("K1", "Kitchen clock").unwrap().into(),
        ];
        let kinds: Vec<_> = devices.iter().map(Device::kind).collect();
        assert_eq!(
            kinds,
            [
                DeviceKind::Light,
                DeviceKind::Thermostat,
                DeviceKind::Camera,
                DeviceKind::Clock
            ]
        );
    }

    #[test]
    fn should_return_unknown_operation_when_name_not_declared_for_kind() {
        let mut device: Device = Thermostat::new("T1", "Heating", 20.0).unwrap().into();
        let args = serde_json::Value::Null;
        let err = device
            .invoke(&user(Role::Admin), "set_brightness", &invocation(&args))
            .unwrap_err();
        assert!(matches!(
            err,
            HomeError::UnknownOperation(UnknownOperationError { kind: DeviceKind::Thermostat, .. })
        ));
    }

    #[test]
    fn should_return_unknown_operation_when_name_is_gibberish() {
        let mut device: Device = Light::new("L1", "Lamp").unwrap().into();
        let args = serde_json::Value::Null;
        let err = device
            .invoke(&user(Role::Guest), "explode", &invocation(&args))
            .unwrap_err();
        assert!(matches!(err, HomeError::UnknownOperation(_)));
    }

    #[test]
    fn should_dispatch_turn_on_through_table() {
        let mut device: Device = Camera::new("C1", "Porch").unwrap().into();
        let args = serde_json::Value::Null;
        device
            .invoke(&user(Role::Admin), "turn_on", &invocation(&args))
            .unwrap();
        assert!(device.is_on());
    }

    #[test]
    fn should_not_mutate_when_dispatch_is_denied() {
        let mut device: Device = Camera::new("C1", "Porch").unwrap().into();
        let args = serde_json::Value::Null;
        let err = device
            .invoke(&user(Role::User), "turn_on", &invocation(&args))
            .unwrap_err();
        assert!(matches!(err, HomeError::PermissionDenied(_)));
        assert!(!device.is_on());
    }

    #[test]
    fn should_rename_when_admin() {
        let mut device: Device = Clock::new("K1", "Clock").unwrap().into();
        let args = serde_json::json!({"name": "Hall clock"});
        device
            .invoke(&user(Role::Admin), "rename", &invocation(&args))
            .unwrap();
        assert_eq!(device.name(), "Hall clock");
    }

    #[test]
    fn should_reject_rename_when_blank() {
        let mut device: Device = Clock::new("K1", "Clock").unwrap().into();
        let args = serde_json::json!("   ");
        let err = device
            .invoke(&user(Role::Admin), "rename", &invocation(&args))
            .unwrap_err();
        assert!(matches!(err, HomeError::Validation(ValidationError::EmptyName)));
        assert_eq!(device.name(), "Clock");
    }

    #[test]
    fn should_expose_thermostat_for_ramps_only() {
        let mut light: Device = Light::new("L1", "Lamp").unwrap().into();
        assert!(light.as_thermostat_mut().is_none());
        let mut heating: Device = Thermostat::new("T1", "Heating", 20.0).unwrap().into();
        assert!(heating.as_thermostat_mut().is_some());
    }

    #[test]
    fn should_fail_clock_reads_while_off() {
        let mut device: Device = Clock::new("K1", "Clock").unwrap().into();
        let args = serde_json::Value::Null;
        let err = device
            .invoke(&user(Role::Admin), "current_time", &invocation(&args))
            .unwrap_err();
        assert!(matches!(
            err,
            HomeError::IllegalState(IllegalStateError::PoweredOff)
        ));
    }

    #[test]
    fn should_serialize_with_kind_tag() {
        let device: Device = Light::new("L1", "Lamp").unwrap().into();
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["kind"], "light");
        assert_eq!(json["id"], "L1");
        assert_eq!(json["name"], "Lamp");
    }
}

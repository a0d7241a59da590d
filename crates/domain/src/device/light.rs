//! Light: a dimmable lamp.
//!
//! Power and brightness are independent: turning the light off keeps the
//! last brightness, and [`Light::is_on`] reads the power flag only.

use serde::Serialize;
use serde_json::Value;

use crate::error::{HomeError, ValidationError};
use crate::event::DeviceEvent;
use crate::kind::DeviceKind;
use crate::operation::{ADMINS, EVERYONE, MEMBERS, Operation, OperationSpec};
use crate::role::User;

use super::{DeviceInfo, Invocation, Outcome, authorize, check_range, unsupported};

/// Brightness applied by a plain `turn_on`.
pub const DEFAULT_LEVEL: u8 = 50;

pub const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new(Operation::TurnOn, EVERYONE),
    OperationSpec::new(Operation::TurnOff, EVERYONE),
    OperationSpec::new(Operation::Status, EVERYONE),
    OperationSpec::new(Operation::Brightness, EVERYONE),
    OperationSpec::new(Operation::SetBrightness, MEMBERS),
    OperationSpec::new(Operation::Rename, ADMINS),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Light {
    #[serde(flatten)]
    info: DeviceInfo,
    on: bool,
    brightness: u8,
}

impl Light {
    pub const KIND: DeviceKind = DeviceKind::Light;

    /// Create a light that is off at zero brightness.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank id or name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, HomeError> {
        Ok(Self {
            info: DeviceInfo::new(id, name)?,
            on: false,
            brightness: 0,
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
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Turn on at [`DEFAULT_LEVEL`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn turn_on(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        self.turn_on_at(user, DEFAULT_LEVEL)
    }

    /// Turn on at `level` percent.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not, or
    /// [`HomeError::Validation`] when `level` exceeds 100.
    pub fn turn_on_at(&mut self, user: &User, level: u8) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::TurnOn)?;
        check_range("level", f64::from(level), 0.0, 100.0)?;

        let mut events = Vec::new();
        if !self.on {
            self.on = true;
            events.push(DeviceEvent::PoweredOn);
        }
        if self.brightness != level {
            self.brightness = level;
            events.push(DeviceEvent::BrightnessChanged { brightness: level });
        }
        Ok(events)
    }

    /// Turn off, keeping the current brightness.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn turn_off(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::TurnOff)?;
        if !self.on {
            return Ok(Vec::new());
        }
        self.on = false;
        Ok(vec![DeviceEvent::PoweredOff])
    }

    /// Set brightness without changing power.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not, or
    /// [`HomeError::Validation`] when `value` exceeds 100. The previous
    /// brightness is kept on error.
    pub fn set_brightness(&mut self, user: &User, value: u8) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::SetBrightness)?;
        check_range("brightness", f64::from(value), 0.0, 100.0)?;
        if self.brightness == value {
            return Ok(Vec::new());
        }
        self.brightness = value;
        Ok(vec![DeviceEvent::BrightnessChanged { brightness: value }])
    }

    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] or a validation error.
    pub fn rename(&mut self, user: &User, name: impl Into<String>) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::Rename)?;
        self.info.rename(name.into())
    }

    pub(super) fn invoke(
        &mut self,
        user: &User,
        operation: Operation,
        invocation: &Invocation<'_>,
    ) -> Result<Outcome, HomeError> {
        let args = invocation.args;
        match operation {
            Operation::TurnOn => {
                let level = args.percent("level", 0)?.unwrap_or(DEFAULT_LEVEL);
                self.turn_on_at(user, level).map(Outcome::changed)
            }
            Operation::TurnOff => self.turn_off(user).map(Outcome::changed),
            Operation::SetBrightness => {
                let value = args
                    .percent("value", 0)?
                    .ok_or(ValidationError::MissingArgument { name: "value" })?;
                self.set_brightness(user, value).map(Outcome::changed)
            }
            Operation::Status => Ok(Outcome::reply(self.on)),
            Operation::Brightness => Ok(Outcome::reply(Value::from(self.brightness))),
            Operation::Rename => {
                let name = args.required_str("name", 0)?;
                self.rename(user, name).map(Outcome::changed)
            }
            other => Err(unsupported(Self::KIND, other)),
        }
    }
}

//! Thermostat: holds a current and a target temperature and ramps one
//! toward the other.
//!
//! A ramp is split in two halves. [`Thermostat::begin_ramp`] checks access
//! and preconditions and hands back a [`Ramp`]; the caller then waits
//! [`RampStep::pause`] before each [`Thermostat::advance`] and finally calls
//! [`Thermostat::finish_ramp`]. The domain never sleeps, so the pacing can
//! be real time, accelerated, or skipped entirely in tests.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::{HomeError, IllegalStateError, ValidationError};
use crate::event::DeviceEvent;
use crate::kind::DeviceKind;
use crate::operation::{ADMINS, EVERYONE, MEMBERS, Operation, OperationSpec};
use crate::role::User;

use super::{DeviceInfo, Invocation, Outcome, authorize, check_range, unsupported};

pub const MIN_TEMP: f64 = 5.0;
pub const MAX_TEMP: f64 = 30.0;

/// Distance below which the ramp counts as converged.
pub const EPSILON: f64 = 1e-6;

pub const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new(Operation::TurnOn, MEMBERS),
    OperationSpec::new(Operation::TurnOff, MEMBERS),
    OperationSpec::new(Operation::Status, EVERYONE),
    OperationSpec::new(Operation::CurrentTemp, EVERYONE),
    OperationSpec::new(Operation::TargetTemp, EVERYONE),
    OperationSpec::new(Operation::SetTargetTemp, MEMBERS),
    OperationSpec::new(Operation::SetCurrentTemp, MEMBERS),
    OperationSpec::new(Operation::Start, MEMBERS),
    OperationSpec::new(Operation::Rename, ADMINS),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thermostat {
    #[serde(flatten)]
    info: DeviceInfo,
    on: bool,
    current: f64,
    target: Option<f64>,
}

impl Thermostat {
    pub const KIND: DeviceKind = DeviceKind::Thermostat;

    /// Create a thermostat that is off, reading `current`, with no target.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank id or name, or when `current`
    /// lies outside `[5, 30]`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        current: f64,
    ) -> Result<Self, HomeError> {
        let info = DeviceInfo::new(id, name)?;
        check_range("current", current, MIN_TEMP, MAX_TEMP)?;
        Ok(Self {
            info,
            on: false,
            current,
            target: None,
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
    pub fn current(&self) -> f64 {
        self.current
    }

    #[must_use]
    pub fn target(&self) -> Option<f64> {
        self.target
    }

    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn turn_on(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::TurnOn)?;
        Ok(self.power_on())
    }

    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn turn_off(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::TurnOff)?;
        Ok(self.power_off())
    }

    fn power_on(&mut self) -> Vec<DeviceEvent> {
        if self.on {
            return Vec::new();
        }
        self.on = true;
        vec![DeviceEvent::PoweredOn]
    }

    fn power_off(&mut self) -> Vec<DeviceEvent> {
        if !self.on {
            return Vec::new();
        }
        self.on = false;
        vec![DeviceEvent::PoweredOff]
    }

    /// Set the target and power on.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not, or
    /// [`HomeError::Validation`] when `target` lies outside `[5, 30]`.
    pub fn set_target_temp(&mut self, user: &User, target: f64) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::SetTargetTemp)?;
        check_range("target", target, MIN_TEMP, MAX_TEMP)?;
        self.target = Some(target);
        let mut events = vec![DeviceEvent::TargetTemperatureSet { target }];
        events.extend(self.power_on());
        Ok(events)
    }

    /// Overwrite the measured temperature.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not, or
    /// [`HomeError::Validation`] when `current` lies outside `[5, 30]`.
    pub fn set_current_temp(&mut self, user: &User, current: f64) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::SetCurrentTemp)?;
        check_range("current", current, MIN_TEMP, MAX_TEMP)?;
        self.current = current;
        Ok(vec![DeviceEvent::CurrentTemperatureSet { current }])
    }

    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] or a validation error.
    pub fn rename(&mut self, user: &User, name: impl Into<String>) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::Rename)?;
        self.info.rename(name.into())
    }

    /// Authorize a ramp from the current temperature to the target.
    ///
    /// # Errors
    ///
    /// - [`HomeError::PermissionDenied`] when `user` may not start.
    /// - [`IllegalStateError::PoweredOff`] when off.
    /// - [`IllegalStateError::TargetNotSet`] when no target is set.
    pub fn begin_ramp(&self, user: &User, step: RampStep) -> Result<Ramp, HomeError> {
        authorize(user, Self::KIND, Operation::Start)?;
        if !self.on {
            return Err(IllegalStateError::PoweredOff.into());
        }
        let target = self.target.ok_or(IllegalStateError::TargetNotSet)?;
        Ok(Ramp {
            current: self.current,
            target,
            step,
        })
    }

    /// Move one step along `ramp`. Returns `None` once converged.
    pub fn advance(&mut self, ramp: &mut Ramp) -> Option<DeviceEvent> {
        let next = ramp.next()?;
        self.current = next;
        Some(DeviceEvent::RampStep {
            current: next,
            target: ramp.target,
        })
    }

    /// Consume a ramp and power off.
    pub fn finish_ramp(&mut self, _ramp: Ramp) -> Vec<DeviceEvent> {
        self.power_off()
    }

    pub(super) fn invoke(
        &mut self,
        user: &User,
        operation: Operation,
        invocation: &Invocation<'_>,
    ) -> Result<Outcome, HomeError> {
        let args = invocation.args;
        match operation {
            Operation::TurnOn => self.turn_on(user).map(Outcome::changed),
            Operation::TurnOff => self.turn_off(user).map(Outcome::changed),
            Operation::Status => Ok(Outcome::reply(self.on)),
            Operation::CurrentTemp => Ok(Outcome::reply(self.current)),
            Operation::TargetTemp => Ok(Outcome::reply(self.target.map_or(Value::Null, Value::from))),
            Operation::SetTargetTemp => {
                let target = args.required_number("value", 0)?;
                self.set_target_temp(user, target).map(Outcome::changed)
            }
            Operation::SetCurrentTemp => {
                let current = args.required_number("value", 0)?;
                self.set_current_temp(user, current).map(Outcome::changed)
            }
            Operation::Start => {
                let default = invocation.default_step;
                let seconds = args
                    .number("step_seconds", 0)?
                    .unwrap_or(default.pause.as_secs_f64());
                let degrees = args.number("step_degrees", 1)?.unwrap_or(default.degrees);
                let step = RampStep::new(seconds, degrees)?;
                self.begin_ramp(user, step).map(Outcome::Ramp)
            }
            Operation::Rename => {
                let name = args.required_str("name", 0)?;
                self.rename(user, name).map(Outcome::changed)
            }
            other => Err(unsupported(Self::KIND, other)),
        }
    }
}

/// Pacing of a ramp: wait `pause`, then move up to `degrees`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampStep {
    pub pause: Duration,
    pub degrees: f64,
}

impl Default for RampStep {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(1),
            degrees: 0.5,
        }
    }
}

impl RampStep {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidStep`] unless `seconds` is a
    /// non-negative duration that fits a [`Duration`] and `degrees` a finite
    /// step of at least [`EPSILON`].
    pub fn new(seconds: f64, degrees: f64) -> Result<Self, HomeError> {
        let degrees_ok = degrees.is_finite() && degrees >= EPSILON;
        let pause = Duration::try_from_secs_f64(seconds)
            .ok()
            .filter(|_| degrees_ok)
            .ok_or(ValidationError::InvalidStep)?;
        Ok(Self { pause, degrees })
    }
}

/// Successive temperatures from a start value to a target.
///
/// Each step moves by at most [`RampStep::degrees`] and is clamped so it
/// never passes the target, which rules out oscillating around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ramp {
    current: f64,
    target: f64,
    step: RampStep,
}

impl Ramp {
    #[must_use]
    pub fn pause(&self) -> Duration {
        self.step.pause
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        (self.current - self.target).abs() <= EPSILON
    }
}

impl Iterator for Ramp {
    type Item = f64;

    #[allow(clippy::float_cmp)]
    fn next(&mut self) -> Option<f64> {
        if self.is_done() {
            return None;
        }
        let next = if self.current < self.target {
            (self.current + self.step.degrees).min(self.target)
        } else {
            (self.current - self.step.degrees).max(self.target)
        };
        // a step lost to rounding would never converge
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}

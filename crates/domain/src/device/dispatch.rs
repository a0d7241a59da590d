//! Name-based invocation: arguments, context and results.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::{HomeError, ValidationError};
use crate::event::DeviceEvent;
use crate::time::Timestamp;

use super::thermostat::{Ramp, RampStep};

/// Arguments of a call.
///
/// Accepts `null` (no arguments), a bare scalar (the first positional
/// argument), an array (positional) or an object (named).
#[derive(Debug, Clone, Copy)]
pub struct Args<'a>(&'a Value);

impl<'a> Args<'a> {
    #[must_use]
    pub fn new(value: &'a Value) -> Self {
        Self(value)
    }

    fn lookup(&self, name: &str, index: usize) -> Option<&'a Value> {
        let found = match self.0 {
            Value::Null => None,
            Value::Object(map) => map.get(name),
            Value::Array(items) => items.get(index),
            scalar => (index == 0).then_some(scalar),
        };
        found.filter(|v| !v.is_null())
    }

    /// Optional floating-point argument.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedArgument`] when present but not a number.
    pub fn number(&self, name: &'static str, index: usize) -> Result<Option<f64>, HomeError> {
        self.lookup(name, index)
            .map(|v| {
                v.as_f64().ok_or(ValidationError::MalformedArgument {
                    name,
                    expected: "a number",
                })
            })
            .transpose()
            .map_err(Into::into)
    }

    /// Required floating-point argument.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingArgument`] or
    /// [`ValidationError::MalformedArgument`].
    pub fn required_number(&self, name: &'static str, index: usize) -> Result<f64, HomeError> {
        self.number(name, index)?
            .ok_or_else(|| ValidationError::MissingArgument { name }.into())
    }

    /// Optional percentage (`0..=100`). Integral floats such as `80.0` count
    /// as integers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedArgument`] for non-integers and
    /// [`ValidationError::OutOfRange`] outside `0..=100`.
    pub fn percent(&self, name: &'static str, index: usize) -> Result<Option<u8>, HomeError> {
        let Some(value) = self.lookup(name, index) else {
            return Ok(None);
        };
        let raw = value
            .as_f64()
            .filter(|v| v.fract() == 0.0)
            .ok_or(ValidationError::MalformedArgument {
                name,
                expected: "an integer",
            })?;
        if !(0.0..=100.0).contains(&raw) {
            return Err(ValidationError::OutOfRange {
                field: name,
                min: 0.0,
                max: 100.0,
                value: raw,
            }
            .into());
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = raw as u8;
        Ok(Some(percent))
    }

    /// Required string argument.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingArgument`] or
    /// [`ValidationError::MalformedArgument`].
    pub fn required_str(&self, name: &'static str, index: usize) -> Result<&'a str, HomeError> {
        let value = self
            .lookup(name, index)
            .ok_or(ValidationError::MissingArgument { name })?;
        value.as_str().ok_or_else(|| {
            ValidationError::MalformedArgument {
                name,
                expected: "a string",
            }
            .into()
        })
    }

    /// Required identifier given either as a string or a non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingArgument`] or
    /// [`ValidationError::MalformedArgument`].
    pub fn required_key(&self, name: &'static str, index: usize) -> Result<String, HomeError> {
        let value = self
            .lookup(name, index)
            .ok_or(ValidationError::MissingArgument { name })?;
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) if n.is_u64() => Ok(n.to_string()),
            _ => Err(ValidationError::MalformedArgument {
                name,
                expected: "a string or integer id",
            }
            .into()),
        }
    }
}

/// Everything a handler may need besides the acting user.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub args: Args<'a>,
    /// Wall-clock time of the call.
    pub now: Timestamp,
    /// Local time shown by clock displays.
    pub local_now: NaiveDateTime,
    /// Ramp pacing used when a `start` call omits it.
    pub default_step: RampStep,
}

impl<'a> Invocation<'a> {
    /// Build an invocation at `now`, showing UTC on clocks and using the
    /// default ramp step.
    #[must_use]
    pub fn new(args: &'a Value, now: Timestamp) -> Self {
        Self {
            args: Args::new(args),
            now,
            local_now: now.naive_utc(),
            default_step: RampStep::default(),
        }
    }

    #[must_use]
    pub fn with_local_now(mut self, local_now: NaiveDateTime) -> Self {
        self.local_now = local_now;
        self
    }

    #[must_use]
    pub fn with_default_step(mut self, step: RampStep) -> Self {
        self.default_step = step;
        self
    }
}

/// Result of a dispatched call.
#[derive(Debug)]
pub enum Outcome {
    /// The call completed; `reply` is `null` for operations without a value.
    Done {
        reply: Value,
        events: Vec<DeviceEvent>,
    },
    /// A thermostat ramp was authorized and must now be driven step by step.
    Ramp(Ramp),
}

impl Outcome {
    pub(crate) fn changed(events: Vec<DeviceEvent>) -> Self {
        Self::Done {
            reply: Value::Null,
            events,
        }
    }

    pub(crate) fn reply(reply: impl Into<Value>) -> Self {
        Self::Done {
            reply: reply.into(),
            events: Vec::new(),
        }
    }
}

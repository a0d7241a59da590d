//! Common error types used across the workspace.
//!
//! Every failure a caller can observe is one of the [`HomeError`] variants.
//! Each variant wraps a typed source error so callers can match on the
//! precise cause without parsing messages.

use crate::access::PermissionDenied;
use crate::kind::DeviceKind;
use crate::operation::Operation;

/// Top-level error returned by every fallible domain and application call.
#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    #[error("permission denied: {0}")]
    PermissionDenied(#[from] PermissionDenied),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("duplicate key: {0}")]
    DuplicateKey(#[from] DuplicateKeyError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("illegal state: {0}")]
    IllegalState(#[from] IllegalStateError),

    #[error("unknown operation: {0}")]
    UnknownOperation(#[from] UnknownOperationError),
}

/// A field or argument failed validation. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("id must not be empty")]
    EmptyId,

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("missing argument `{name}`")]
    MissingArgument { name: &'static str },

    #[error("argument `{name}` must be {expected}")]
    MalformedArgument {
        name: &'static str,
        expected: &'static str,
    },

    #[error("ramp step must be positive and finite")]
    InvalidStep,
}

/// Registering an id that is already present.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` already exists")]
pub struct DuplicateKeyError {
    pub entity: &'static str,
    pub id: String,
}

/// Lookup by id that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// The device is not in a state that permits the operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalStateError {
    #[error("device is off")]
    PoweredOff,

    #[error("target temperature is not set")]
    TargetNotSet,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording is in progress")]
    NotRecording,

    #[error("expected a {expected} device")]
    KindMismatch { expected: DeviceKind },
}

/// Name-based dispatch to a capability the target does not expose.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} does not support `{operation}`")]
pub struct UnknownOperationError {
    pub kind: DeviceKind,
    pub operation: String,
}

impl UnknownOperationError {
    pub(crate) fn new(kind: DeviceKind, operation: Operation) -> Self {
        Self {
            kind,
            operation: operation.as_str().to_string(),
        }
    }
}

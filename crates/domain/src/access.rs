//! [`AccessGuard`]: decides whether a user may invoke an operation on a
//! device kind.
//!
//! Rules are evaluated in this exact order, first match wins:
//!
//! 1. `Admin` is always allowed.
//! 2. A role outside the operation's declared `allowed_roles` is denied.
//! 3. `Guest` may only turn lights on or off.
//! 4. `User` may add devices to the registry and control lights and
//!    thermostats.
//!
//! The guard is stateless. The declared role set comes from the operation
//! table of the target kind (see [`crate::operation`]), so every operation
//! states its own roles and the carve-outs above narrow them further.

use serde::Serialize;

use crate::kind::DeviceKind;
use crate::operation::{self, Operation};
use crate::role::{Role, User};

/// Why a check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NoAccessRights,
    GuestLightsOnly,
    UserCannotControl,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAccessRights => f.write_str("role has no access rights"),
            Self::GuestLightsOnly => f.write_str("guests may only turn lights on/off"),
            Self::UserCannotControl => f.write_str("user cannot control this device"),
        }
    }
}

/// A denied `(role, kind, operation)` triple.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{role} may not `{operation}` on {kind}: {reason}")]
pub struct PermissionDenied {
    pub role: Role,
    pub kind: DeviceKind,
    pub operation: Operation,
    pub reason: DenialReason,
}

/// Stateless rule evaluator.
pub struct AccessGuard;

impl AccessGuard {
    /// Check `user` against the rules for `operation` on `kind`, given the
    /// roles the operation declares.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] naming the first rule that rejected.
    pub fn check(
        user: &User,
        kind: DeviceKind,
        operation: Operation,
        allowed_roles: &[Role],
    ) -> Result<(), PermissionDenied> {
        Self::evaluate(user.role(), kind, operation, allowed_roles)
    }

    fn evaluate(
        role: Role,
        kind: DeviceKind,
        operation: Operation,
        allowed_roles: &[Role],
    ) -> Result<(), PermissionDenied> {
        let deny = |reason| PermissionDenied {
            role,
            kind,
            operation,
            reason,
        };

        if role == Role::Admin {
            return Ok(());
        }
        if !allowed_roles.contains(&role) {
            return Err(deny(DenialReason::NoAccessRights));
        }
        match role {
            Role::Admin => Ok(()),
            Role::Guest => {
                let toggles_light = kind == DeviceKind::Light
                    && matches!(operation, Operation::TurnOn | Operation::TurnOff);
                if toggles_light {
                    Ok(())
                } else {
                    Err(deny(DenialReason::GuestLightsOnly))
                }
            }
            Role::User => {
                let adds_device =
                    kind == DeviceKind::SmartHome && operation == Operation::AddDevice;
                let controllable = matches!(kind, DeviceKind::Light | DeviceKind::Thermostat);
                if adds_device || controllable {
                    Ok(())
                } else {
                    Err(deny(DenialReason::UserCannotControl))
                }
            }
        }
    }

    /// Check `user` using the roles declared in `kind`'s operation table.
    ///
    /// An operation missing from the table has no declared roles, so only
    /// `Admin` passes; dispatch rejects such names before reaching here.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] when the rules reject the call.
    pub fn authorize(
        user: &User,
        kind: DeviceKind,
        operation: Operation,
    ) -> Result<(), PermissionDenied> {
        Self::evaluate(user.role(), kind, operation, declared_roles(kind, operation))
    }

    /// Pure predicate form of [`authorize`](Self::authorize).
    #[must_use]
    pub fn allowed(role: Role, kind: DeviceKind, operation: Operation) -> bool {
        Self::evaluate(role, kind, operation, declared_roles(kind, operation)).is_ok()
    }
}

fn declared_roles(kind: DeviceKind, operation: Operation) -> &'static [Role] {
    operation::spec(kind, operation).map_or(&[], |s| s.allowed_roles)
}

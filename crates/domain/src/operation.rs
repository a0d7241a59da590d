//! Operations: the named capabilities a caller can invoke, and the per-kind
//! tables that declare which roles may invoke them.
//!
//! Each device kind owns a static table of [`OperationSpec`]s. The table is
//! the single source for two things:
//!
//! - **dispatch**: a name that is absent from a kind's table is an unknown
//!   operation for that kind;
//! - **access**: the `allowed_roles` of the entry are what
//!   [`AccessGuard::check`](crate::access::AccessGuard::check) receives.

use serde::{Deserialize, Serialize};

use crate::device::{camera, clock, light, thermostat};
use crate::kind::DeviceKind;
use crate::role::Role;

/// A named capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // common to every device
    TurnOn,
    TurnOff,
    Status,
    Rename,

    // light
    SetBrightness,
    Brightness,

    // thermostat
    SetTargetTemp,
    SetCurrentTemp,
    CurrentTemp,
    TargetTemp,
    Start,

    // camera
    StartRecording,
    StopRecording,
    RemoveRecording,
    Recordings,

    // clock
    ToggleFormat,
    CurrentTime,
    CurrentDatetime,

    // registry
    AddDevice,
    RemoveDevice,
    ListDevices,
    FindDevice,
    Clear,
}

impl Operation {
    pub const ALL: [Self; 23] = [
        Self::TurnOn,
        Self::TurnOff,
        Self::Status,
        Self::Rename,
        Self::SetBrightness,
        Self::Brightness,
        Self::SetTargetTemp,
        Self::SetCurrentTemp,
        Self::CurrentTemp,
        Self::TargetTemp,
        Self::Start,
        Self::StartRecording,
        Self::StopRecording,
        Self::RemoveRecording,
        Self::Recordings,
        Self::ToggleFormat,
        Self::CurrentTime,
        Self::CurrentDatetime,
        Self::AddDevice,
        Self::RemoveDevice,
        Self::ListDevices,
        Self::FindDevice,
        Self::Clear,
    ];

    /// Wire name, e.g. `"set_brightness"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::Status => "status",
            Self::Rename => "rename",
            Self::SetBrightness => "set_brightness",
            Self::Brightness => "brightness",
            Self::SetTargetTemp => "set_target_temp",
            Self::SetCurrentTemp => "set_current_temp",
            Self::CurrentTemp => "current_temp",
            Self::TargetTemp => "target_temp",
            Self::Start => "start",
            Self::StartRecording => "start_recording",
            Self::StopRecording => "stop_recording",
            Self::RemoveRecording => "remove_recording",
            Self::Recordings => "recordings",
            Self::ToggleFormat => "toggle_format",
            Self::CurrentTime => "current_time",
            Self::CurrentDatetime => "current_datetime",
            Self::AddDevice => "add_device",
            Self::RemoveDevice => "remove_device",
            Self::ListDevices => "list_devices",
            Self::FindDevice => "find_device",
            Self::Clear => "clear",
        }
    }

    /// Resolve a wire name. Returns `None` for names no kind exposes.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a kind's operation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation: Operation,
    pub allowed_roles: &'static [Role],
}

impl OperationSpec {
    pub(crate) const fn new(operation: Operation, allowed_roles: &'static [Role]) -> Self {
        Self {
            operation,
            allowed_roles,
        }
    }
}

pub(crate) const EVERYONE: &[Role] = &[Role::Admin, Role::User, Role::Guest];
pub(crate) const MEMBERS: &[Role] = &[Role::Admin, Role::User];
pub(crate) const ADMINS: &[Role] = &[Role::Admin];

/// Registry-level operations.
pub const SMART_HOME_OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new(Operation::AddDevice, MEMBERS),
    OperationSpec::new(Operation::RemoveDevice, ADMINS),
    OperationSpec::new(Operation::ListDevices, ADMINS),
    OperationSpec::new(Operation::FindDevice, ADMINS),
    OperationSpec::new(Operation::Clear, ADMINS),
];

/// The operation table declared for `kind`.
#[must_use]
pub fn table(kind: DeviceKind) -> &'static [OperationSpec] {
    match kind {
        DeviceKind::Light => light::OPERATIONS,
        DeviceKind::Thermostat => thermostat::OPERATIONS,
        DeviceKind::Camera => camera::OPERATIONS,
        DeviceKind::Clock => clock::OPERATIONS,
        DeviceKind::SmartHome => SMART_HOME_OPERATIONS,
    }
}

/// Look up the entry for `operation` in `kind`'s table.
#[must_use]
pub fn spec(kind: DeviceKind, operation: Operation) -> Option<&'static OperationSpec> {
    table(kind).iter().find(|s| s.operation == operation)
}

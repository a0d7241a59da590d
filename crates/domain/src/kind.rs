//! Device kinds: the closed set of capability tags used as rule-table keys.

use serde::{Deserialize, Serialize};

/// Which device variant (or the registry itself) an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Light,
    Thermostat,
    Camera,
    Clock,
    /// The registry, for permission purposes.
    SmartHome,
}

impl DeviceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Light,
        Self::Thermostat,
        Self::Camera,
        Self::Clock,
        Self::SmartHome,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Thermostat => "thermostat",
            Self::Camera => "camera",
            Self::Clock => "clock",
            Self::SmartHome => "smart_home",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

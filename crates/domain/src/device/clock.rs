//! Clock: displays the local time in a 24-hour or 12-hour format.
//!
//! Reading the time requires the clock to be on. Switching the format does
//! not: the format is a stored preference that applies on the next read.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{HomeError, IllegalStateError};
use crate::event::DeviceEvent;
use crate::kind::DeviceKind;
use crate::operation::{ADMINS, EVERYONE, Operation, OperationSpec};
use crate::role::User;

use super::{DeviceInfo, Invocation, Outcome, authorize, unsupported};

const TIME_24H: &str = "%H:%M:%S";
const TIME_12H: &str = "%I:%M:%S %p";
const DATE: &str = "%Y/%m/%d";

pub const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new(Operation::TurnOn, ADMINS),
    OperationSpec::new(Operation::TurnOff, ADMINS),
    OperationSpec::new(Operation::Status, EVERYONE),
    OperationSpec::new(Operation::ToggleFormat, ADMINS),
    OperationSpec::new(Operation::CurrentTime, EVERYONE),
    OperationSpec::new(Operation::CurrentDatetime, EVERYONE),
    OperationSpec::new(Operation::Rename, ADMINS),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clock {
    #[serde(flatten)]
    info: DeviceInfo,
    on: bool,
    twelve_hour: bool,
}

impl Clock {
    pub const KIND: DeviceKind = DeviceKind::Clock;

    /// Create a clock that is off and shows 24-hour time.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank id or name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, HomeError> {
        Ok(Self {
            info: DeviceInfo::new(id, name)?,
            on: false,
            twelve_hour: false,
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
    pub fn is_twelve_hour(&self) -> bool {
        self.twelve_hour
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

    /// Flip between 12-hour and 24-hour display.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] when `user` may not.
    pub fn toggle_format(&mut self, user: &User) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::ToggleFormat)?;
        self.twelve_hour = !self.twelve_hour;
        Ok(vec![DeviceEvent::ClockFormatChanged {
            twelve_hour: self.twelve_hour,
        }])
    }

    /// `HH:MM:SS`, or `hh:mm:ss AM|PM` in 12-hour mode.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalStateError::PoweredOff`] when off.
    pub fn current_time(&self, at: NaiveDateTime) -> Result<String, HomeError> {
        self.ensure_on()?;
        Ok(at.format(self.time_format()).to_string())
    }

    /// `YYYY/MM/DD, <time>` using the current time format.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalStateError::PoweredOff`] when off.
    pub fn current_datetime(&self, at: NaiveDateTime) -> Result<String, HomeError> {
        self.ensure_on()?;
        Ok(format!(
            "{}, {}",
            at.format(DATE),
            at.format(self.time_format())
        ))
    }

    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] or a validation error.
    pub fn rename(&mut self, user: &User, name: impl Into<String>) -> Result<Vec<DeviceEvent>, HomeError> {
        authorize(user, Self::KIND, Operation::Rename)?;
        self.info.rename(name.into())
    }

    fn time_format(&self) -> &'static str {
        if self.twelve_hour { TIME_12H } else { TIME_24H }
    }

    fn ensure_on(&self) -> Result<(), IllegalStateError> {
        if self.on {
            Ok(())
        } else {
            Err(IllegalStateError::PoweredOff)
        }
    }

    pub(super) fn invoke(
        &mut self,
        user: &User,
        operation: Operation,
        invocation: &Invocation<'_>,
    ) -> Result<Outcome, HomeError> {
        match operation {
            Operation::TurnOn => self.turn_on(user).map(Outcome::changed),
            Operation::TurnOff => self.turn_off(user).map(Outcome::changed),
            Operation::Status => Ok(Outcome::reply(self.on)),
            Operation::ToggleFormat => self.toggle_format(user).map(Outcome::changed),
            Operation::CurrentTime => self.current_time(invocation.local_now).map(Outcome::reply),
            Operation::CurrentDatetime => self
                .current_datetime(invocation.local_now)
                .map(Outcome::reply),
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
    use chrono::NaiveDate;

    fn admin() -> User {
        User::new("root", Role::Admin).unwrap()
    }

    fn evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(21, 7, 3)
            .unwrap()
    }

    fn running() -> Clock {
        let mut clock = Clock::new("K1", "Kitchen").unwrap();
        clock.turn_on(&admin()).unwrap();
        clock
    }

    #[test]
    fn should_fail_reads_when_off() {
        let clock = Clock::new("K1", "Kitchen").unwrap();
        assert!(matches!(
            clock.current_time(evening()),
            Err(HomeError::IllegalState(IllegalStateError::PoweredOff))
        ));
        assert!(clock.current_datetime(evening()).is_err());
    }

    #[test]
    fn should_show_24_hour_time_by_default() {
        let clock = running();
        assert_eq!(clock.current_time(evening()).unwrap(), "21:07:03");
        assert_eq!(
            clock.current_datetime(evening()).unwrap(),
            "2024/02/29, 21:07:03"
        );
    }

    #[test]
    fn should_show_12_hour_time_after_toggle() {
        let mut clock = running();
        clock.toggle_format(&admin()).unwrap();
        assert_eq!(clock.current_time(evening()).unwrap(), "09:07:03 PM");
        assert_eq!(
            clock.current_datetime(evening()).unwrap(),
            "2024/02/29, 09:07:03 PM"
        );
    }

    #[test]
    fn should_toggle_format_while_off() {
        let mut clock = Clock::new("K1", "Kitchen").unwrap();
        let events = clock.toggle_format(&admin()).unwrap();
        assert!(clock.is_twelve_hour());
        assert_eq!(events, [DeviceEvent::ClockFormatChanged { twelve_hour: true }]);
        clock.toggle_format(&admin()).unwrap();
        assert!(!clock.is_twelve_hour());
    }

    #[test]
    fn should_transition_once_when_turned_on_twice() {
        let mut clock = Clock::new("K1", "Kitchen").unwrap();
        assert_eq!(clock.turn_on(&admin()).unwrap().len(), 1);
        assert!(clock.turn_on(&admin()).unwrap().is_empty());
    }

    #[test]
    fn should_deny_user_toggling_format() {
        let mut clock = running();
        let member = User::new("bob", Role::User).unwrap();
        assert!(matches!(
            clock.toggle_format(&member),
            Err(HomeError::PermissionDenied(_))
        ));
        assert!(!clock.is_twelve_hour());
    }

    #[test]
    fn should_deny_user_switching_clock_for_missing_rights() {
        let member = User::new("bob", Role::User).unwrap();
        let mut clock = Clock::new("K1", "Kitchen").unwrap();
        for err in [
            clock.turn_on(&member).unwrap_err(),
            clock.toggle_format(&member).unwrap_err(),
        ] {
            let HomeError::PermissionDenied(denied) = err else {
                panic!("expected a denial, got {err:?}");
            };
            assert_eq!(denied.reason, DenialReason::NoAccessRights);
        }
        assert!(!clock.is_on());
    }

    #[test]
    fn should_read_local_time_from_invocation() {
        let mut clock = running();
        let args = serde_json::Value::Null;
        let invocation =
            Invocation::new(&args, chrono::Utc::now()).with_local_now(evening());
        let Outcome::Done { reply, .. } = clock
            .invoke(&admin(), Operation::CurrentTime, &invocation)
            .unwrap()
        else {
            panic!("expected a reply");
        };
        assert_eq!(reply, "21:07:03");
    }
}

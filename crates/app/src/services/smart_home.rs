//! Smart home service: the device registry and its access-checked façade.
//!
//! Registry operations are checked against the `smart_home` operation table.
//! [`SmartHome::control_device`] is not gated here: it resolves the device
//! and hands the call to the device's own table, which checks the user
//! before anything runs.
//!
//! Every state change is logged as one line and published through the
//! [`EventPublisher`] port. Publishing is an observation only; a failed
//! publish never fails the call.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde_json::Value;

use smarthome_domain::access::AccessGuard;
use smarthome_domain::device::{Device, Invocation, Outcome, Ramp, RampStep, Thermostat};
use smarthome_domain::error::{DuplicateKeyError, HomeError, IllegalStateError, NotFoundError};
use smarthome_domain::event::{DeviceEvent, Event, EventPayload};
use smarthome_domain::id::DeviceId;
use smarthome_domain::kind::DeviceKind;
use smarthome_domain::operation::Operation;
use smarthome_domain::role::User;

use crate::ports::{Clock, EventPublisher, Pacer};

/// Subject used for registry-level events.
pub const HUB_SUBJECT: &str = "smart home";

/// Owns the registered devices, keyed by id name.
///
/// Mutating calls take `&mut self`, so lookup and mutation of the map form
/// one critical section for as long as the borrow lasts; a caller sharing
/// the service across tasks wraps it in a mutex.
pub struct SmartHome<C, P, E> {
    devices: BTreeMap<DeviceId, Device>,
    clock: C,
    pacer: P,
    publisher: E,
    default_step: RampStep,
}

impl<C, P, E> SmartHome<C, P, E>
where
    C: Clock,
    P: Pacer,
    E: EventPublisher,
{
    /// Create an empty registry.
    pub fn new(clock: C, pacer: P, publisher: E) -> Self {
        Self {
            devices: BTreeMap::new(),
            clock,
            pacer,
            publisher,
            default_step: RampStep::default(),
        }
    }

    /// Ramp pacing used when a `start` call omits it.
    #[must_use]
    pub fn with_default_step(mut self, step: RampStep) -> Self {
        self.default_step = step;
        self
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Register `device` under its id name.
    ///
    /// # Errors
    ///
    /// - [`HomeError::PermissionDenied`] unless `user` is an admin or user.
    /// - [`HomeError::DuplicateKey`] when the id name is taken.
    #[tracing::instrument(skip(self, user, device), fields(user = %user.name(), device_id = %device.id()))]
    pub async fn add_device(&mut self, user: &User, device: Device) -> Result<(), HomeError> {
        authorize(user, Operation::AddDevice)?;
        let id = device.id().clone();
        let subject = device.name().to_string();
        match self.devices.entry(id.clone()) {
            Entry::Occupied(_) => {
                return Err(DuplicateKeyError {
                    entity: "Device",
                    id: id.to_string(),
                }
                .into());
            }
            Entry::Vacant(slot) => {
                slot.insert(device);
            }
        }
        self.emit(Event::new(
            Some(id),
            subject,
            EventPayload::DeviceAdded,
            self.clock.now(),
        ))
        .await;
        Ok(())
    }

    /// Unregister the device with id name `id`, handing it back to the caller.
    ///
    /// The device's own state is left untouched.
    ///
    /// # Errors
    ///
    /// - [`HomeError::PermissionDenied`] unless `user` is an admin.
    /// - [`HomeError::NotFound`] when no device has that id name.
    #[tracing::instrument(skip(self, user), fields(user = %user.name()))]
    pub async fn remove_device(&mut self, user: &User, id: &str) -> Result<Device, HomeError> {
        authorize(user, Operation::RemoveDevice)?;
        let device = self.devices.remove(id).ok_or_else(|| not_found(id))?;
        self.emit(Event::new(
            Some(device.id().clone()),
            device.name(),
            EventPayload::DeviceRemoved,
            self.clock.now(),
        ))
        .await;
        Ok(device)
    }

    /// Snapshot of every registered device.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] unless `user` is an admin.
    pub fn list_devices(&self, user: &User) -> Result<BTreeMap<DeviceId, Device>, HomeError> {
        authorize(user, Operation::ListDevices)?;
        Ok(self.devices.clone())
    }

    /// Look up a device by id name.
    ///
    /// # Errors
    ///
    /// - [`HomeError::PermissionDenied`] unless `user` is an admin.
    /// - [`HomeError::NotFound`] when no device has that id name.
    pub fn find_device(&self, user: &User, id: &str) -> Result<&Device, HomeError> {
        authorize(user, Operation::FindDevice)?;
        self.devices.get(id).ok_or_else(|| not_found(id))
    }

    /// Unregister every device. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`HomeError::PermissionDenied`] unless `user` is an admin.
    #[tracing::instrument(skip(self, user), fields(user = %user.name()))]
    pub async fn clear(&mut self, user: &User) -> Result<usize, HomeError> {
        authorize(user, Operation::Clear)?;
        let count = self.devices.len();
        self.devices.clear();
        self.emit(Event::new(
            None,
            HUB_SUBJECT,
            EventPayload::RegistryCleared { count },
            self.clock.now(),
        ))
        .await;
        Ok(count)
    }

    /// Invoke the operation named `operation` on the device `id`.
    ///
    /// Returns the operation's reply, `null` for operations without one.
    /// A thermostat `start` runs its whole ramp before returning, pausing
    /// through the [`Pacer`] before every step.
    ///
    /// # Errors
    ///
    /// - [`HomeError::NotFound`] when no device has that id name.
    /// - [`HomeError::UnknownOperation`] when the device has no such operation.
    /// - Whatever the operation itself returns.
    #[tracing::instrument(skip(self, user, args), fields(user = %user.name()))]
    pub async fn control_device(
        &mut self,
        user: &User,
        id: &str,
        operation: &str,
        args: Value,
    ) -> Result<Value, HomeError> {
        let invocation = Invocation::new(&args, self.clock.now())
            .with_local_now(self.clock.local_now())
            .with_default_step(self.default_step);

        let device = self.devices.get_mut(id).ok_or_else(|| not_found(id))?;
        let outcome = device
            .invoke(user, operation, &invocation)
            .inspect_err(log_denial)?;
        let device_id = device.id().clone();
        let subject = device.name().to_string();

        match outcome {
            Outcome::Done { reply, events } => {
                self.emit_device_events(&device_id, &subject, events).await;
                Ok(reply)
            }
            Outcome::Ramp(ramp) => {
                self.run_ramp(&device_id, ramp).await?;
                Ok(Value::Null)
            }
        }
    }

    async fn run_ramp(&mut self, id: &DeviceId, mut ramp: Ramp) -> Result<(), HomeError> {
        let pause = ramp.pause();
        tracing::debug!(device_id = %id, target = ramp.target(), ?pause, "ramp started");
        while !ramp.is_done() {
            self.pacer.pause(pause).await;
            let thermostat = self.thermostat_mut(id)?;
            let Some(step) = thermostat.advance(&mut ramp) else {
                break;
            };
            let subject = thermostat.info().name().to_string();
            self.emit_device_events(id, &subject, vec![step]).await;
        }
        let thermostat = self.thermostat_mut(id)?;
        let events = thermostat.finish_ramp(ramp);
        let subject = thermostat.info().name().to_string();
        self.emit_device_events(id, &subject, events).await;
        Ok(())
    }

    fn thermostat_mut(&mut self, id: &DeviceId) -> Result<&mut Thermostat, HomeError> {
        let device = self.devices.get_mut(id).ok_or_else(|| not_found(id.as_str()))?;
        device.as_thermostat_mut().ok_or_else(|| {
            IllegalStateError::KindMismatch {
                expected: Thermostat::KIND,
            }
            .into()
        })
    }

    async fn emit_device_events(&self, id: &DeviceId, subject: &str, events: Vec<DeviceEvent>) {
        let at = self.clock.now();
        for event in events {
            self.emit(Event::new(
                Some(id.clone()),
                subject,
                EventPayload::Device(event),
                at,
            ))
            .await;
        }
    }

    async fn emit(&self, event: Event) {
        tracing::info!(event_id = %event.id, "{event}");
        match self.publisher.publish(event).await {
            Ok(delivered) => tracing::trace!(delivered, "event published"),
            Err(err) => tracing::warn!(error = %err, "failed to publish event"),
        }
    }
}

fn authorize(user: &User, operation: Operation) -> Result<(), HomeError> {
    AccessGuard::authorize(user, DeviceKind::SmartHome, operation)
        .map_err(HomeError::from)
        .inspect_err(log_denial)
}

fn log_denial(err: &HomeError) {
    if let HomeError::PermissionDenied(denied) = err {
        tracing::warn!(
            role = %denied.role,
            kind = %denied.kind,
            operation = %denied.operation,
            "{}",
            denied.reason
        );
    }
}

fn not_found(id: &str) -> HomeError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}

//! Scripted household session.
//!
//! Three residents share one home: an admin who installs everything, a
//! regular user and a guest. The script walks every device kind and lets
//! each role hit the limits of what it may do. Expected refusals are logged
//! and the session carries on; anything else aborts it.

use serde_json::{Value, json};

use smarthome_app::ports::{Clock, EventPublisher, Pacer};
use smarthome_app::services::smart_home::SmartHome;
use smarthome_domain::device::{Camera, Clock as WallClock, Light, Thermostat};
use smarthome_domain::error::HomeError;
use smarthome_domain::role::{Role, User};

pub struct Residents {
    pub admin: User,
    pub user: User,
    pub guest: User,
}

impl Residents {
    /// # Errors
    ///
    /// Fails only on a blank name.
    pub fn new() -> Result<Self, HomeError> {
        Ok(Self {
            admin: User::new("alice", Role::Admin)?,
            user: User::new("bob", Role::User)?,
            guest: User::new("carol", Role::Guest)?,
        })
    }
}

/// Run the whole session against `home`.
///
/// # Errors
///
/// Returns the first error that is not an access or state refusal.
pub async fn run<C, P, E>(home: &mut SmartHome<C, P, E>, people: &Residents) -> Result<(), HomeError>
where
    C: Clock,
    P: Pacer,
    E: EventPublisher,
{
    let Residents { admin, user, guest } = people;

    home.add_device(admin, Light::new("living_light", "Living room light")?.into())
        .await?;
    home.add_device(admin, Thermostat::new("hall_thermo", "Hall thermostat", 20.0)?.into())
        .await?;
    home.add_device(admin, Camera::new("porch_cam", "Porch camera")?.into())
        .await?;
    home.add_device(admin, WallClock::new("kitchen_clock", "Kitchen clock")?.into())
        .await?;
    home.add_device(user, Light::new("desk_lamp", "Desk lamp")?.into())
        .await?;
    attempt(home, guest, "living_light", "turn_on", Value::Null).await?;
    attempt(home, guest, "living_light", "set_brightness", json!(80)).await?;
    attempt(home, user, "living_light", "set_brightness", json!(80)).await?;
    attempt(home, user, "living_light", "turn_on", Value::Null).await?;
    attempt(home, guest, "living_light", "turn_off", Value::Null).await?;

    attempt(home, user, "hall_thermo", "set_target_temp", json!(22.0)).await?;
    attempt(home, user, "hall_thermo", "start", Value::Null).await?;
    attempt(home, user, "hall_thermo", "current_temp", Value::Null).await?;

    attempt(home, user, "porch_cam", "turn_on", Value::Null).await?;
    for operation in ["turn_on", "start_recording", "stop_recording", "recordings"] {
        attempt(home, admin, "porch_cam", operation, Value::Null).await?;
    }
    attempt(home, admin, "porch_cam", "remove_recording", json!(1)).await?;

    attempt(home, admin, "kitchen_clock", "current_time", Value::Null).await?;
    for operation in ["turn_on", "current_time", "toggle_format", "current_datetime"] {
        attempt(home, admin, "kitchen_clock", operation, Value::Null).await?;
    }

    attempt(home, admin, "desk_lamp", "rename", json!({"name": "Study lamp"})).await?;
    attempt(home, admin, "desk_lamp", "dim", Value::Null).await?;

    if let Err(err) = home.list_devices(user) {
        tracing::info!(user = %user.name(), "list refused: {err}");
    }
    for (id, device) in home.list_devices(admin)? {
        tracing::info!(%id, kind = %device.kind(), on = device.is_on(), "{}", device.name());
    }

    home.remove_device(admin, "desk_lamp").await?;
    home.clear(admin).await?;
    Ok(())
}

/// Invoke one operation, logging its reply or its refusal.
async fn attempt<C, P, E>(
    home: &mut SmartHome<C, P, E>,
    user: &User,
    id: &str,
    operation: &str,
    args: Value,
) -> Result<(), HomeError>
where
    C: Clock,
    P: Pacer,
    E: EventPublisher,
{
    match home.control_device(user, id, operation, args).await {
        Ok(Value::Null) => Ok(()),
        Ok(reply) => {
            tracing::info!(user = %user.name(), %id, %operation, "{reply}");
            Ok(())
        }
        Err(
            err @ (HomeError::PermissionDenied(_)
            | HomeError::IllegalState(_)
            | HomeError::UnknownOperation(_)),
        ) => {
            tracing::info!(user = %user.name(), %id, %operation, "refused: {err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

//! Vehicle battery state updates for Coulomb
//!
//! Applies delivered energy to a vehicle's state of charge, enforcing
//! capacity bounds. Maximum capacity and battery condition are externally
//! set attributes and are never touched here.

use crate::error::{CoulombError, Result};
use crate::registry::Vehicle;

/// Outcome of a battery state update at session closure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryUpdate {
    /// The vehicle's charge level after the update (kWh)
    pub new_capacity_kwh: f64,

    /// Energy attributed to the session for billing (kWh)
    pub energy_delivered_kwh: f64,
}

/// Apply a time-estimated energy delivery to the vehicle's charge level
///
/// The result is clamped into `[0, battery_capacity_kwh]`.
pub fn apply_charge(vehicle: &Vehicle, energy_delivered_kwh: f64) -> BatteryUpdate {
    let new_capacity = (vehicle.current_battery_capacity_kwh + energy_delivered_kwh)
        .clamp(0.0, vehicle.battery_capacity_kwh);

    BatteryUpdate {
        new_capacity_kwh: new_capacity,
        energy_delivered_kwh,
    }
}

/// Adopt a battery level observed by the caller instead of a time estimate
///
/// The observed level must lie within `[0, battery_capacity_kwh]`. Billable
/// energy is the observed gain over the previous level; a reported drop
/// bills as zero.
pub fn apply_observed_level(vehicle: &Vehicle, observed_level_kwh: f64) -> Result<BatteryUpdate> {
    if !(0.0..=vehicle.battery_capacity_kwh).contains(&observed_level_kwh) {
        return Err(CoulombError::invalid_argument(
            "observed_level_kwh".to_string(),
            format!(
                "must be between 0 and {} kWh",
                vehicle.battery_capacity_kwh
            ),
        ));
    }

    Ok(BatteryUpdate {
        new_capacity_kwh: observed_level_kwh,
        energy_delivered_kwh: (observed_level_kwh - vehicle.current_battery_capacity_kwh).max(0.0),
    })
}

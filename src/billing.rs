//! Billing calculations for Coulomb
//!
//! Pure functions converting elapsed charging time and vehicle/port
//! parameters into energy delivered and monetary cost.

/// Effective charge rate in kW: the vehicle and the port each cap it
pub fn effective_charge_rate_kw(vehicle_max_kw: f64, port_max_kw: f64) -> f64 {
    vehicle_max_kw.min(port_max_kw)
}

/// Energy delivered over a charging interval, in kWh
///
/// The raw time-based estimate is capped at the battery's remaining
/// capacity so a session never charges past full. Negative elapsed time
/// and negative remaining capacity are treated as zero.
pub fn energy_delivered_kwh(
    elapsed_hours: f64,
    vehicle_max_kw: f64,
    port_max_kw: f64,
    remaining_capacity_kwh: f64,
) -> f64 {
    let rate = effective_charge_rate_kw(vehicle_max_kw, port_max_kw);
    let raw = elapsed_hours.max(0.0) * rate;
    raw.min(remaining_capacity_kwh.max(0.0))
}

/// Cost of a session given delivered energy and the configured tariff
pub fn session_cost(energy_kwh: f64, cost_per_kwh: f64) -> f64 {
    (energy_kwh * cost_per_kwh).max(0.0)
}

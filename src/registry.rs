//! Vehicle and port registry collaborators for Coulomb
//!
//! The session engine reads vehicles and ports through these narrow trait
//! interfaces and writes nothing except the vehicle's current battery
//! capacity during session closure. In-memory implementations are provided
//! for tests and embedders without a backing registry service.

use crate::error::{CoulombError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An electric vehicle and the battery state relevant to charging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique vehicle identifier
    pub id: i64,

    /// Owner's user ID
    pub user_id: String,

    /// Vehicle's license plate
    pub license_plate: String,

    /// Vehicle manufacturer
    pub brand: String,

    /// Maximum battery capacity (kWh)
    pub battery_capacity_kwh: f64,

    /// Current charge level (kWh); written only during session closure
    pub current_battery_capacity_kwh: f64,

    /// Maximum charge rate the vehicle accepts (kW)
    pub max_charge_rate_kw: f64,

    /// Battery health, externally assessed; never derived from charge cycles
    pub battery_condition: f64,
}

/// A physical charging point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique port identifier
    pub id: i64,

    /// Parent station ID
    pub station_id: i64,

    /// Maximum power the port can deliver (kW)
    pub max_power_kw: f64,

    /// Operational status reported by the port collaborator
    pub status: String,
}

/// Vehicle registry collaborator
#[async_trait::async_trait]
pub trait VehicleRegistry: Send + Sync {
    /// Look up a vehicle by ID without an ownership check
    async fn get(&self, vehicle_id: i64) -> Result<Vehicle>;

    /// Look up a vehicle by ID, requiring it to belong to the given user.
    /// A vehicle owned by someone else is indistinguishable from a missing
    /// one.
    async fn find_for_owner(&self, vehicle_id: i64, user_id: &str) -> Result<Vehicle>;

    /// Write the vehicle's current battery capacity (kWh)
    async fn set_current_capacity(&self, vehicle_id: i64, capacity_kwh: f64) -> Result<()>;
}

/// Port registry collaborator
#[async_trait::async_trait]
pub trait PortRegistry: Send + Sync {
    /// Look up a port by ID
    async fn get(&self, port_id: i64) -> Result<Port>;
}

/// In-memory vehicle registry
#[derive(Default)]
pub struct MemoryVehicleRegistry {
    vehicles: Arc<RwLock<HashMap<i64, Vehicle>>>,
}

impl MemoryVehicleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a vehicle
    pub async fn insert(&self, vehicle: Vehicle) {
        self.vehicles.write().await.insert(vehicle.id, vehicle);
    }
}

#[async_trait::async_trait]
impl VehicleRegistry for MemoryVehicleRegistry {
    async fn get(&self, vehicle_id: i64) -> Result<Vehicle> {
        self.vehicles
            .read()
            .await
            .get(&vehicle_id)
            .cloned()
            .ok_or_else(|| CoulombError::not_found(format!("vehicle {}", vehicle_id)))
    }

    async fn find_for_owner(&self, vehicle_id: i64, user_id: &str) -> Result<Vehicle> {
        self.vehicles
            .read()
            .await
            .get(&vehicle_id)
            .filter(|v| v.user_id == user_id)
            .cloned()
            .ok_or_else(|| CoulombError::not_found(format!("vehicle {}", vehicle_id)))
    }

    async fn set_current_capacity(&self, vehicle_id: i64, capacity_kwh: f64) -> Result<()> {
        let mut vehicles = self.vehicles.write().await;
        let vehicle = vehicles
            .get_mut(&vehicle_id)
            .ok_or_else(|| CoulombError::not_found(format!("vehicle {}", vehicle_id)))?;
        vehicle.current_battery_capacity_kwh = capacity_kwh;
        Ok(())
    }
}

/// In-memory port registry
#[derive(Default)]
pub struct MemoryPortRegistry {
    ports: Arc<RwLock<HashMap<i64, Port>>>,
}

impl MemoryPortRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a port
    pub async fn insert(&self, port: Port) {
        self.ports.write().await.insert(port.id, port);
    }
}

#[async_trait::async_trait]
impl PortRegistry for MemoryPortRegistry {
    async fn get(&self, port_id: i64) -> Result<Port> {
        self.ports
            .read()
            .await
            .get(&port_id)
            .cloned()
            .ok_or_else(|| CoulombError::not_found(format!("port {}", port_id)))
    }
}

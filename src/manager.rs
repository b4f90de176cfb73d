//! Charging session lifecycle management for Coulomb
//!
//! This module owns session state transitions: starting a session against
//! a vehicle and a port, and closing it through the one idempotent closure
//! routine shared by explicit stop requests and firing timeouts.

use crate::battery;
use crate::billing;
use crate::config::{ChargingConfig, Config, PricingConfig};
use crate::error::{CoulombError, Result};
use crate::logging::get_logger;
use crate::registry::{PortRegistry, VehicleRegistry};
use crate::scheduler::TimeoutScheduler;
use crate::session::{ChargingSession, SessionClosure, SessionId, StartSessionRequest, StopMode};
use crate::store::{CasOutcome, SessionStore};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Session manager orchestrating the charging session lifecycle
///
/// Cheap to clone; all state is shared behind `Arc`s so scheduled timeout
/// tasks can run the closure routine on their own handle.
#[derive(Clone)]
pub struct ChargingSessionManager {
    sessions: Arc<dyn SessionStore>,
    vehicles: Arc<dyn VehicleRegistry>,
    ports: Arc<dyn PortRegistry>,
    scheduler: TimeoutScheduler,
    pricing: PricingConfig,
    charging: ChargingConfig,

    /// Serializes the closure routine per session id
    closure_locks: Arc<Mutex<HashMap<SessionId, Arc<Mutex<()>>>>>,

    logger: crate::logging::StructuredLogger,
}

impl ChargingSessionManager {
    /// Create a new session manager over the given collaborators
    pub fn new(
        config: &Config,
        sessions: Arc<dyn SessionStore>,
        vehicles: Arc<dyn VehicleRegistry>,
        ports: Arc<dyn PortRegistry>,
    ) -> Self {
        Self {
            sessions,
            vehicles,
            ports,
            scheduler: TimeoutScheduler::new(),
            pricing: config.pricing.clone(),
            charging: config.charging.clone(),
            closure_locks: Arc::new(Mutex::new(HashMap::new())),
            logger: get_logger("session"),
        }
    }

    /// Start a charging session for a vehicle on a port.
    ///
    /// The vehicle must belong to the caller and must not already have a
    /// session in progress. A timeout is scheduled to force-close the
    /// session after the requested duration; the battery state is not
    /// touched until closure.
    pub async fn start_session(
        &self,
        user_id: &str,
        request: StartSessionRequest,
    ) -> Result<ChargingSession> {
        if request.duration_minutes == 0 {
            return Err(CoulombError::invalid_argument(
                "duration_minutes",
                "must be a positive integer",
            ));
        }
        if request.duration_minutes > self.charging.max_session_minutes {
            return Err(CoulombError::invalid_argument(
                "duration_minutes".to_string(),
                format!("must be at most {}", self.charging.max_session_minutes),
            ));
        }

        let vehicle = self
            .vehicles
            .find_for_owner(request.vehicle_id, user_id)
            .await?;
        let port = self.ports.get(request.port_id).await?;

        let session = ChargingSession::new(user_id, vehicle.id, port.id, Utc::now());
        let session = self.sessions.create(session).await?;

        let fire_at = session.start_time + Duration::minutes(i64::from(request.duration_minutes));
        let manager = self.clone();
        let session_id = session.id;
        self.scheduler.schedule(session_id, fire_at, async move {
            if let Err(e) = manager
                .close_session(session_id, fire_at, StopMode::Elapsed)
                .await
            {
                manager
                    .logger
                    .warn(&format!("Timeout closure of session {} failed: {}", session_id, e));
            }
        });

        self.logger.info(&format!(
            "Started session {} for vehicle {} on port {} ({} min)",
            session.id, session.vehicle_id, session.port_id, request.duration_minutes
        ));

        Ok(session)
    }

    /// Stop a charging session explicitly.
    ///
    /// The session must exist, belong to the caller, and be in progress;
    /// closed or foreign sessions read as missing. The pending timeout is
    /// cancelled best-effort; if it fires first, closure idempotence makes
    /// this call adopt the timeout's result.
    pub async fn stop_session(
        &self,
        user_id: &str,
        session_id: SessionId,
        mode: StopMode,
    ) -> Result<ChargingSession> {
        let session = self.sessions.get(session_id).await?;
        if session.user_id != user_id || session.status.is_terminal() {
            return Err(CoulombError::not_found(format!("session {}", session_id)));
        }

        // Reject a bad observed level before tearing down the timeout, so a
        // failed stop leaves the session's forced closure intact
        if let StopMode::ObservedLevel(level) = mode {
            let vehicle = self.vehicles.get(session.vehicle_id).await?;
            battery::apply_observed_level(&vehicle, level)?;
        }

        self.scheduler.cancel(session_id);
        self.close_session(session_id, Utc::now(), mode).await
    }

    /// Read a session by ID; foreign sessions read as missing
    pub async fn get_session(
        &self,
        user_id: &str,
        session_id: SessionId,
    ) -> Result<ChargingSession> {
        let session = self.sessions.get(session_id).await?;
        if session.user_id != user_id {
            return Err(CoulombError::not_found(format!("session {}", session_id)));
        }
        Ok(session)
    }

    /// All sessions started by a user, oldest first
    pub async fn list_sessions_for_user(&self, user_id: &str) -> Result<Vec<ChargingSession>> {
        self.sessions.list_for_user(user_id).await
    }

    /// Non-terminal sessions currently occupying a port
    pub async fn list_active_sessions_for_port(
        &self,
        port_id: i64,
    ) -> Result<Vec<ChargingSession>> {
        self.sessions.list_active_for_port(port_id).await
    }

    /// Whether a port has a session in progress (the port collaborator's
    /// deletion guard)
    pub async fn port_has_active_session(&self, port_id: i64) -> Result<bool> {
        Ok(!self.sessions.list_active_for_port(port_id).await?.is_empty())
    }

    /// The shared closure routine.
    ///
    /// Serialized per session id; re-checks the status under the lock and
    /// silently adopts an already-final session, which is what resolves
    /// the stop-vs-timeout race to exactly one closure effect. Status,
    /// end time, energy and cost commit through the store's
    /// compare-and-swap write; the vehicle's battery level is written only
    /// by the committing caller.
    async fn close_session(
        &self,
        session_id: SessionId,
        end_time: DateTime<Utc>,
        mode: StopMode,
    ) -> Result<ChargingSession> {
        let lock = self.closure_lock(session_id).await;
        let _guard = lock.lock().await;

        let session = self.sessions.get(session_id).await?;
        if session.status.is_terminal() {
            return Ok(session);
        }

        let vehicle = self.vehicles.get(session.vehicle_id).await?;
        let update = match mode {
            StopMode::Elapsed => {
                let port = self.ports.get(session.port_id).await?;
                let elapsed_hours =
                    (end_time - session.start_time).num_milliseconds() as f64 / 3_600_000.0;
                let remaining =
                    vehicle.battery_capacity_kwh - vehicle.current_battery_capacity_kwh;
                let energy = billing::energy_delivered_kwh(
                    elapsed_hours,
                    vehicle.max_charge_rate_kw,
                    port.max_power_kw,
                    remaining,
                );
                battery::apply_charge(&vehicle, energy)
            }
            StopMode::ObservedLevel(level) => battery::apply_observed_level(&vehicle, level)?,
        };

        let closure = SessionClosure {
            end_time,
            energy_delivered_kwh: update.energy_delivered_kwh,
            total_cost: billing::session_cost(update.energy_delivered_kwh, self.pricing.cost_per_kwh),
        };

        let finalized = match self
            .sessions
            .complete_if_in_progress(session_id, closure)
            .await?
        {
            CasOutcome::Committed(finalized) => {
                self.vehicles
                    .set_current_capacity(vehicle.id, update.new_capacity_kwh)
                    .await?;
                self.logger.info(&format!(
                    "Closed session {}: delivered {:.3} kWh, cost {:.2} {}",
                    finalized.id,
                    finalized.energy_delivered_kwh,
                    finalized.total_cost,
                    self.pricing.currency_symbol
                ));
                finalized
            }
            // Another closure won the race; its result stands
            CasOutcome::Lost(winner) => winner,
        };

        self.forget_closure_lock(session_id).await;
        Ok(finalized)
    }

    async fn closure_lock(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.closure_locks.lock().await;
        Arc::clone(locks.entry(session_id).or_default())
    }

    async fn forget_closure_lock(&self, session_id: SessionId) {
        self.closure_locks.lock().await.remove(&session_id);
    }
}

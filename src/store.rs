//! Session persistence collaborator for Coulomb
//!
//! Durable storage for session records behind a narrow trait. The closure
//! write is a compare-and-swap: the new status and final fields are only
//! written if the session is still in progress, which is what makes the
//! stop-vs-timeout race resolve to exactly one closure effect.

use crate::error::{CoulombError, Result};
use crate::session::{ChargingSession, SessionClosure, SessionId, SessionStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of the compare-and-swap closure write
#[derive(Debug, Clone)]
pub enum CasOutcome {
    /// This caller transitioned the session; the final record is returned
    Committed(ChargingSession),

    /// Another closure already transitioned the session; the winning
    /// record is returned so the caller can adopt it
    Lost(ChargingSession),
}

/// Session store collaborator
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new in-progress session.
    ///
    /// Fails with `Conflict` when the vehicle already has a non-terminal
    /// session; the check and the insert are atomic.
    async fn create(&self, session: ChargingSession) -> Result<ChargingSession>;

    /// Read a session by ID
    async fn get(&self, session_id: SessionId) -> Result<ChargingSession>;

    /// All sessions started by a user, oldest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChargingSession>>;

    /// The vehicle's non-terminal session, if any
    async fn find_active_for_vehicle(&self, vehicle_id: i64) -> Result<Option<ChargingSession>>;

    /// Non-terminal sessions currently occupying a port
    async fn list_active_for_port(&self, port_id: i64) -> Result<Vec<ChargingSession>>;

    /// Transition a session to completed, writing end time, energy and cost
    /// as one unit, only if it is still in progress
    async fn complete_if_in_progress(
        &self,
        session_id: SessionId,
        closure: SessionClosure,
    ) -> Result<CasOutcome>;
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, ChargingSession>>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: ChargingSession) -> Result<ChargingSession> {
        let mut sessions = self.sessions.write().await;

        // Uniqueness guard: the check and the insert share the write lock
        let already_active = sessions
            .values()
            .any(|s| s.vehicle_id == session.vehicle_id && !s.status.is_terminal());
        if already_active {
            return Err(CoulombError::conflict(format!(
                "vehicle {} already has a session in progress",
                session.vehicle_id
            )));
        }

        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: SessionId) -> Result<ChargingSession> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(|| CoulombError::not_found(format!("session {}", session_id)))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChargingSession>> {
        let sessions = self.sessions.read().await;
        let mut result: Vec<ChargingSession> = sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by_key(|s| s.start_time);
        Ok(result)
    }

    async fn find_active_for_vehicle(&self, vehicle_id: i64) -> Result<Option<ChargingSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .find(|s| s.vehicle_id == vehicle_id && !s.status.is_terminal())
            .cloned())
    }

    async fn list_active_for_port(&self, port_id: i64) -> Result<Vec<ChargingSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.port_id == port_id && !s.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn complete_if_in_progress(
        &self,
        session_id: SessionId,
        closure: SessionClosure,
    ) -> Result<CasOutcome> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| CoulombError::not_found(format!("session {}", session_id)))?;

        if session.status.is_terminal() {
            return Ok(CasOutcome::Lost(session.clone()));
        }

        session.status = SessionStatus::Completed;
        session.end_time = Some(closure.end_time);
        session.energy_delivered_kwh = closure.energy_delivered_kwh;
        session.total_cost = closure.total_cost;

        Ok(CasOutcome::Committed(session.clone()))
    }
}

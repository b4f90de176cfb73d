//! Charging session entities for Coulomb
//!
//! This module defines the charging session record, its lifecycle states,
//! and the request shapes used to start and stop a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a charging session
pub type SessionId = Uuid;

/// One charging event from start to completion, billed once at closure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingSession {
    /// Unique session ID
    pub id: SessionId,

    /// User who started the session
    pub user_id: String,

    /// Vehicle being charged
    pub vehicle_id: i64,

    /// Port being used
    pub port_id: i64,

    /// Start time of the session
    pub start_time: DateTime<Utc>,

    /// End time of the session; present exactly when the status is terminal
    pub end_time: Option<DateTime<Utc>>,

    /// Total energy delivered in this session (kWh), set once at closure
    pub energy_delivered_kwh: f64,

    /// Session cost, set once at closure
    pub total_cost: f64,

    /// Session status
    pub status: SessionStatus,

    /// Payment status; settlement is handled by the payment collaborator
    pub payment_status: PaymentStatus,
}

/// Session status enumeration
///
/// `Completed` is terminal; a session never returns to `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Session is currently active
    InProgress,

    /// Session completed (stopped explicitly or by timeout)
    Completed,
}

impl SessionStatus {
    /// Whether this status is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

/// Payment status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Payment not yet settled
    Pending,

    /// Payment settled by the payment collaborator
    Paid,
}

impl ChargingSession {
    /// Create a new in-progress session starting now
    pub fn new(user_id: &str, vehicle_id: i64, port_id: i64, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            vehicle_id,
            port_id,
            start_time,
            end_time: None,
            energy_delivered_kwh: 0.0,
            total_cost: 0.0,
            status: SessionStatus::InProgress,
            payment_status: PaymentStatus::Pending,
        }
    }

    /// Session duration in whole minutes, available once the session ended
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds() / 60)
    }
}

/// Request to start a charging session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    /// Vehicle to charge; must belong to the requesting user
    pub vehicle_id: i64,

    /// Port to charge at
    pub port_id: i64,

    /// Requested charging duration in minutes; the timeout fires after this
    pub duration_minutes: u32,
}

/// How a session closure derives the final battery state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StopMode {
    /// Estimate delivered energy from elapsed wall-clock time
    Elapsed,

    /// Trust a battery level reported by the caller (kWh)
    ObservedLevel(f64),
}

/// Values written to a session by the closure routine, as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClosure {
    /// End time of the session
    pub end_time: DateTime<Utc>,

    /// Energy delivered over the session (kWh)
    pub energy_delivered_kwh: f64,

    /// Cost billed for the session
    pub total_cost: f64,
}

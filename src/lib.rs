//! # Coulomb - Charging Session & Billing Engine
//!
//! A Rust implementation of the charging session core of an EV charging
//! network: starting sessions against a vehicle and a charging port,
//! tracking elapsed charging time, computing energy delivered and cost,
//! and closing sessions either by an explicit stop request or by an
//! elapsed-time timeout.
//!
//! ## Features
//!
//! - **Session Lifecycle**: IN_PROGRESS to COMPLETED transitions with an
//!   idempotent, per-session-serialized closure routine
//! - **Billing**: energy and cost derived from the effective charge rate
//!   (vehicle and port each cap it) and a configured tariff
//! - **Battery Tracking**: state-of-charge updates bounded by capacity,
//!   from elapsed-time estimates or caller-observed levels
//! - **Timeouts**: single-shot cancellable forced closures racing safely
//!   against explicit stops
//! - **Configuration**: YAML-based configuration with validation
//!
//! ## Architecture
//!
//! The crate follows a modular architecture with clear separation of concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `error`: Crate-wide error taxonomy
//! - `session`: Session entities and request shapes
//! - `billing`: Pure billing calculations
//! - `battery`: Vehicle battery state updates
//! - `registry`: Vehicle and port collaborator interfaces
//! - `store`: Session persistence interface with compare-and-swap closure
//! - `scheduler`: Deferred forced-closure timeouts
//! - `manager`: Session lifecycle orchestration

pub mod battery;
pub mod billing;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{CoulombError, Result};
pub use manager::ChargingSessionManager;
pub use session::{ChargingSession, SessionStatus, StartSessionRequest, StopMode};

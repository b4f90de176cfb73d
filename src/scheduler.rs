//! Timeout scheduling for Coulomb
//!
//! Single-shot, cancellable deferred actions keyed by session id. Each
//! scheduled timeout runs on its own tokio task and races freely against
//! explicit stop requests; correctness rests on the closure routine being
//! idempotent, not on cancellation winning.

use crate::logging::get_logger;
use crate::session::SessionId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Scheduler for forced session closures
#[derive(Clone)]
pub struct TimeoutScheduler {
    tasks: Arc<Mutex<HashMap<SessionId, JoinHandle<()>>>>,
    logger: crate::logging::StructuredLogger,
}

impl TimeoutScheduler {
    /// Create a new scheduler with no pending timeouts
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            logger: get_logger("scheduler"),
        }
    }

    /// Register an action to run once the wall clock reaches `fire_at`.
    ///
    /// A previously scheduled timeout for the same session is replaced
    /// (and cancelled if still pending).
    pub fn schedule<F>(&self, session_id: SessionId, fire_at: DateTime<Utc>, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tasks = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            let delay = (fire_at - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(delay).await;

            // Drop our own entry first so a late cancel is a no-op
            if let Ok(mut guard) = tasks.lock() {
                guard.remove(&session_id);
            }

            action.await;
        });

        if let Ok(mut guard) = self.tasks.lock()
            && let Some(previous) = guard.insert(session_id, handle)
        {
            previous.abort();
        }

        self.logger.debug(&format!(
            "Scheduled timeout for session {} at {}",
            session_id, fire_at
        ));
    }

    /// Prevent a not-yet-fired timeout from running.
    ///
    /// Cancelling an already-fired or already-cancelled timeout is a no-op.
    pub fn cancel(&self, session_id: SessionId) {
        if let Ok(mut guard) = self.tasks.lock()
            && let Some(handle) = guard.remove(&session_id)
        {
            handle.abort();
            self.logger
                .debug(&format!("Cancelled timeout for session {}", session_id));
        }
    }

    /// Whether a timeout is still pending for the session
    pub fn is_scheduled(&self, session_id: SessionId) -> bool {
        self.tasks
            .lock()
            .map(|guard| guard.contains_key(&session_id))
            .unwrap_or(false)
    }
}

impl Default for TimeoutScheduler {
    fn default() -> Self {
        Self::new()
    }
}

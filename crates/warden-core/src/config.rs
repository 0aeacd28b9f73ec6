//! Configuration for the service controller
//!
//! Two bundles travel with every start request: `ExecutionOptions` sizes the
//! execution pools owned by the controller, and `SessionManagerOptions` is an
//! opaque value bundle forwarded untouched to the session-manager factory.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Execution Options
// ----------------------------------------------------------------------------

/// Sizing of the two execution pools created for each start cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Worker threads in the session pool
    pub session_threads: usize,
    /// Worker threads in the session-manager pool
    pub manager_threads: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            session_threads: 4, // Session I/O dominates, give it the wider pool
            manager_threads: 1, // Accept/bookkeeping path is serialized anyway
        }
    }
}

impl ExecutionOptions {
    /// Create options with explicit pool sizes
    pub fn new(session_threads: usize, manager_threads: usize) -> Self {
        Self {
            session_threads,
            manager_threads,
        }
    }

    /// Create the canonical small sizing used by the test suites
    pub fn testing() -> Self {
        Self {
            session_threads: 2,
            manager_threads: 1,
        }
    }

    /// Builder method for the session pool size
    pub fn with_session_threads(mut self, threads: usize) -> Self {
        self.session_threads = threads;
        self
    }

    /// Builder method for the session-manager pool size
    pub fn with_manager_threads(mut self, threads: usize) -> Self {
        self.manager_threads = threads;
        self
    }

    /// Validate the pool sizing
    pub fn validate(&self) -> Result<(), String> {
        if self.session_threads == 0 {
            return Err("Session thread count cannot be zero".into());
        }
        if self.manager_threads == 0 {
            return Err("Session-manager thread count cannot be zero".into());
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Session Manager Options
// ----------------------------------------------------------------------------

/// Options forwarded to the session-manager factory at each start cycle.
///
/// The controller never interprets these fields; they exist for the session
/// manager implementation behind the boundary trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionManagerOptions {
    /// Upper bound on concurrently active sessions
    pub max_sessions: usize,
    /// Stopped sessions kept around for reuse instead of reallocation
    pub recycled_sessions: usize,
    /// Backlog hint for the listening side
    pub listen_backlog: usize,
    /// Drop sessions that stay idle longer than this, if set
    pub inactivity_timeout: Option<Duration>,
}

impl Default for SessionManagerOptions {
    fn default() -> Self {
        Self {
            max_sessions: 1000,   // Plenty for a single listener
            recycled_sessions: 0, // Reuse disabled unless asked for
            listen_backlog: 6,
            inactivity_timeout: None,
        }
    }
}

impl SessionManagerOptions {
    /// Create small limits for the test suites
    pub fn testing() -> Self {
        Self {
            max_sessions: 8,
            recycled_sessions: 0,
            listen_backlog: 2,
            inactivity_timeout: None,
        }
    }

    /// Builder method for the session limit
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Builder method for the recycled-session count
    pub fn with_recycled_sessions(mut self, recycled_sessions: usize) -> Self {
        self.recycled_sessions = recycled_sessions;
        self
    }

    /// Builder method for the inactivity timeout
    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = Some(timeout);
        self
    }

    /// Validate the option bundle
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sessions == 0 {
            return Err("Max session count cannot be zero".into());
        }
        if self.recycled_sessions > self.max_sessions {
            return Err("Recycled session count cannot exceed max session count".into());
        }
        Ok(())
    }
}

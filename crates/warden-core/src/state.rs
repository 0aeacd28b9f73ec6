//! Service lifecycle state
//!
//! The controller moves through four externally visible states. Transitions
//! are driven only by consumer requests and servant completion signals, and
//! every transition is serialized by the controller driver task.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally visible lifecycle state of the service
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    /// No servant exists; the only state that accepts a start request
    #[default]
    Stopped,
    /// A servant exists and its session manager start is in flight
    Starting,
    /// The session manager is running and being waited on
    Started,
    /// A stop request is in flight at the session manager
    Stopping,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Stopped => write!(f, "stopped"),
            ServiceState::Starting => write!(f, "starting"),
            ServiceState::Started => write!(f, "started"),
            ServiceState::Stopping => write!(f, "stopping"),
        }
    }
}

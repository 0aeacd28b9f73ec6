//! Error types for the warden service controller
//!
//! This module contains the error vocabulary shared by the controller, the
//! session-manager boundary and the async-operation pattern. Completion
//! results travel as values of these types; panics are reserved for the
//! out-of-band worker-panic path.

use serde::{Deserialize, Serialize};

use crate::state::ServiceState;

// ----------------------------------------------------------------------------
// Service Error Type
// ----------------------------------------------------------------------------

/// Errors reported through completion events and request submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ServiceError {
    /// The request is not legal in the controller's current state
    #[error("Operation is not permitted in the {state} state")]
    InvalidState { state: ServiceState },

    /// The request was preempted by a later stop or terminate
    #[error("Operation aborted by a subsequent stop or terminate")]
    Aborted,

    /// An option bundle failed validation
    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    /// Building the execution pools failed
    #[error("Execution resource setup failed: {reason}")]
    ResourceFailure { reason: String },

    /// Opaque fault reported by the session manager
    #[error("Session manager error: {reason}")]
    Manager { reason: String },

    /// The controller driver task is gone and cannot accept requests
    #[error("Service controller is no longer running")]
    ChannelClosed,
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl ServiceError {
    /// Create an invalid-state error for the given state
    pub fn invalid_state(state: ServiceState) -> Self {
        ServiceError::InvalidState { state }
    }

    /// Create a configuration error with a reason
    pub fn config_error<R: Into<String>>(reason: R) -> Self {
        ServiceError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a resource-failure error with a reason
    pub fn resource_failure<R: Into<String>>(reason: R) -> Self {
        ServiceError::ResourceFailure {
            reason: reason.into(),
        }
    }

    /// Create a session-manager error with a reason
    pub fn manager<R: Into<String>>(reason: R) -> Self {
        ServiceError::Manager {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Slot Occupancy Error
// ----------------------------------------------------------------------------

/// A completion handler was already stored in the slot.
///
/// Storing a second handler while one is pending violates the at-most-one
/// outstanding handler contract and is always a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("A completion handler is already pending")]
pub struct SlotOccupied;

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Result payload of every lifecycle completion and boundary callback
pub type Completion = ServiceResult<()>;

//! Consumer-facing lifecycle events
//!
//! All events a consumer can observe flow through a single ordered channel:
//! the controller driver is the only sender, so delivery order is exactly
//! emission order. The channel is unbounded because completion events carry
//! exactly-once guarantees and must never be lost to backpressure.

use serde::{Deserialize, Serialize};

use crate::errors::Completion;

// ----------------------------------------------------------------------------
// Service Events: Controller → Consumer
// ----------------------------------------------------------------------------

/// Events emitted by the service controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceEvent {
    /// A start request finished; exactly one per start request
    StartCompleted(Completion),
    /// A stop request finished; exactly one per stop request
    StopCompleted(Completion),
    /// The session manager's work ended while the service was started,
    /// or was aborted by a stop/terminate
    WorkCompleted(Completion),
    /// A panic escaped a worker task on one of the pools
    WorkerPanicked,
}

// ----------------------------------------------------------------------------
// Channel Types and Creation
// ----------------------------------------------------------------------------

pub type ServiceEventSender = tokio::sync::mpsc::UnboundedSender<ServiceEvent>;
pub type ServiceEventReceiver = tokio::sync::mpsc::UnboundedReceiver<ServiceEvent>;

/// Create the ordered event channel (Controller → Consumer)
pub fn create_service_event_channel() -> (ServiceEventSender, ServiceEventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

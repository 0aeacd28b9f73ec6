//! Warden Core
//!
//! Foundational types for the warden service lifecycle controller: the error
//! and event vocabulary, configuration bundles, the panic-watched execution
//! context, and the strand / handler-slot / async-operation pattern that the
//! runtime engine and session managers are built from.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod manager;
pub mod operation;
pub mod slot;
pub mod state;
pub mod strand;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::{ExecutionOptions, SessionManagerOptions};
pub use context::{PanicHook, WorkContext};
pub use errors::{Completion, ServiceError, ServiceResult, SlotOccupied};
pub use events::{
    create_service_event_channel, ServiceEvent, ServiceEventReceiver, ServiceEventSender,
};
pub use manager::{CompletionHandler, SessionManager, SessionManagerFactory};
pub use operation::{AsyncOperation, AsyncOperationExt, OperationCore};
pub use slot::HandlerSlot;
pub use state::ServiceState;
pub use strand::Strand;

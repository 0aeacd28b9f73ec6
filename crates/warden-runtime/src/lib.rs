//! Warden Runtime Engine
//!
//! This crate contains the execution engine for the warden service
//! controller, including:
//! - `ServiceController`: the public handle plus its driver task
//! - `Servant`: one start cycle's pools and session manager
//! - `ExecutionResources`: the paired session / session-manager pools
//!
//! This is the "engine" of warden - it drives the lifecycle state machine
//! while `warden-core` provides the stable API definitions.

pub mod controller;
pub mod execution;
pub mod servant;

pub use controller::ServiceController;
pub use execution::ExecutionResources;
pub use servant::{
    create_servant_signal_channel, Servant, ServantSignal, ServantSignalReceiver,
    ServantSignalSender,
};

// Re-export core types for convenience
pub use warden_core::{
    create_service_event_channel, Completion, CompletionHandler, ExecutionOptions, ServiceError,
    ServiceEvent, ServiceEventReceiver, ServiceEventSender, ServiceResult, ServiceState,
    SessionManager, SessionManagerFactory, SessionManagerOptions, WorkContext,
};

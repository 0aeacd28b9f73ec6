//! Warden Harness - Deterministic Lifecycle Testing
//!
//! Test doubles and assertion helpers for exercising the warden runtime
//! without real listeners or sessions.
//!
//! # Overview
//!
//! - **Scripted session managers**: each start cycle follows a
//!   [`SessionScript`] describing how its start, wait and stop phases behave
//! - **ScriptHandle**: completes deferred phases from the test at exactly the
//!   moment the scenario calls for
//! - **EventRecorder**: timeout-guarded, ordered assertions over the
//!   controller's event channel
//! - **Tracing setup**: one-call subscriber installation for test output
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use warden_core::{ExecutionOptions, ServiceEvent, SessionManagerOptions};
//! use warden_harness::{init_test_tracing, EventRecorder, ScriptedFactory};
//! use warden_runtime::ServiceController;
//!
//! #[tokio::test]
//! async fn test_start_cycle() {
//!     init_test_tracing();
//!
//!     let factory = ScriptedFactory::new();
//!     let (controller, events) = ServiceController::spawn(factory.clone());
//!     let mut recorder = EventRecorder::new(events);
//!
//!     controller
//!         .async_start(ExecutionOptions::testing(), SessionManagerOptions::testing())
//!         .unwrap();
//!     assert_eq!(recorder.next().await, ServiceEvent::StartCompleted(Ok(())));
//! }
//! ```

pub mod recorder;
pub mod scripted;
pub mod trace;

pub use recorder::EventRecorder;
pub use scripted::{
    PhaseScript, ScriptHandle, ScriptedFactory, ScriptedSessionManager, SessionScript,
};
pub use trace::init_test_tracing;

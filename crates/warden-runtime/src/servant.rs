//! Per-cycle servant
//!
//! A `Servant` is everything one start cycle owns: the paired execution
//! pools and exactly one factory-built session manager. Completion callbacks
//! handed to the manager send `ServantSignal`s into the cycle's channel; the
//! controller holds the receiving end and drops it when the servant is
//! destroyed, so completions from a dead cycle have nowhere to land.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use warden_core::{
    Completion, ExecutionOptions, ServiceError, SessionManager, SessionManagerFactory,
    SessionManagerOptions,
};

use crate::execution::ExecutionResources;

// ----------------------------------------------------------------------------
// Servant Signals: Servant → Controller
// ----------------------------------------------------------------------------

/// Completion traffic flowing from one servant to the controller driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServantSignal {
    /// The session manager finished its start request
    StartCompleted(Completion),
    /// The session manager finished its stop request
    StopCompleted(Completion),
    /// The session manager's work ended on its own
    WaitCompleted(Completion),
    /// A panic escaped a task on one of the cycle's pools
    WorkerPanicked,
}

pub type ServantSignalSender = mpsc::UnboundedSender<ServantSignal>;
pub type ServantSignalReceiver = mpsc::UnboundedReceiver<ServantSignal>;

/// Create the per-cycle signal channel (Servant → Controller)
pub fn create_servant_signal_channel() -> (ServantSignalSender, ServantSignalReceiver) {
    mpsc::unbounded_channel()
}

// ----------------------------------------------------------------------------
// Servant
// ----------------------------------------------------------------------------

/// One start cycle's execution pools plus its session manager
pub struct Servant {
    // Declaration order: release the manager handle before the pools join
    session_manager: Arc<dyn SessionManager>,
    resources: ExecutionResources,
    signals: ServantSignalSender,
}

impl Servant {
    /// Build the pools and one fresh session manager for a new cycle.
    ///
    /// Returns the servant together with the receiving end of its signal
    /// channel. Worker panics arrive there as [`ServantSignal::WorkerPanicked`].
    pub fn new(
        exec_options: ExecutionOptions,
        manager_options: &SessionManagerOptions,
        factory: &dyn SessionManagerFactory,
    ) -> Result<(Self, ServantSignalReceiver), ServiceError> {
        manager_options
            .validate()
            .map_err(ServiceError::config_error)?;

        let (signals, receiver) = create_servant_signal_channel();
        let panic_signals = signals.clone();
        let hook = Arc::new(move || {
            let _ = panic_signals.send(ServantSignal::WorkerPanicked);
        });

        let resources = ExecutionResources::new(exec_options, hook)?;
        let session_manager = factory.build(
            resources.manager_context(),
            resources.session_context(),
            manager_options,
        );
        debug!("Servant created for a new start cycle");

        Ok((
            Self {
                session_manager,
                resources,
                signals,
            },
            receiver,
        ))
    }

    /// Ask the session manager to start; the outcome arrives as
    /// [`ServantSignal::StartCompleted`]
    pub fn start(&self) {
        let signals = self.signals.clone();
        self.session_manager.async_start(Box::new(move |result| {
            let _ = signals.send(ServantSignal::StartCompleted(result));
        }));
    }

    /// Ask the session manager to stop; the outcome arrives as
    /// [`ServantSignal::StopCompleted`]
    pub fn stop(&self) {
        let signals = self.signals.clone();
        self.session_manager.async_stop(Box::new(move |result| {
            let _ = signals.send(ServantSignal::StopCompleted(result));
        }));
    }

    /// Watch for the session manager's work ending; the outcome arrives as
    /// [`ServantSignal::WaitCompleted`]
    pub fn wait(&self) {
        let signals = self.signals.clone();
        self.session_manager.async_wait(Box::new(move |result| {
            let _ = signals.send(ServantSignal::WaitCompleted(result));
        }));
    }

    /// The pools this cycle runs on
    pub fn resources(&self) -> &ExecutionResources {
        &self.resources
    }
}

impl fmt::Debug for Servant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Servant")
            .field("resources", &self.resources)
            .finish()
    }
}

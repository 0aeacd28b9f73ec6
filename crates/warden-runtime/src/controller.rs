//! Service lifecycle controller
//!
//! The controller is split into a cloneable public handle and a driver task
//! that owns every piece of mutable state. All requests and all servant
//! completion signals funnel into the driver's select loop, so state
//! transitions are serialized and consumer events leave through one ordered
//! channel, exactly once per accepted or rejected request.
//!
//! State is also published through a `watch` channel, updated before the
//! corresponding event is emitted: an observer that has received an event
//! always reads the post-transition state.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use warden_core::{
    create_service_event_channel, Completion, ExecutionOptions, ServiceError, ServiceEvent,
    ServiceEventReceiver, ServiceEventSender, ServiceResult, ServiceState, SessionManagerFactory,
    SessionManagerOptions,
};

use crate::servant::{Servant, ServantSignal, ServantSignalReceiver};

// ----------------------------------------------------------------------------
// Requests: Consumer → Driver
// ----------------------------------------------------------------------------

#[derive(Debug)]
enum ServiceRequest {
    Start {
        exec: ExecutionOptions,
        manager: SessionManagerOptions,
    },
    Stop,
    Terminate,
}

// ----------------------------------------------------------------------------
// Public Handle
// ----------------------------------------------------------------------------

/// Cloneable handle to the service controller.
///
/// Requests never block and may be submitted from any thread; outcomes are
/// reported through the event channel returned by [`ServiceController::spawn`].
#[derive(Debug, Clone)]
pub struct ServiceController {
    requests: mpsc::UnboundedSender<ServiceRequest>,
    state: watch::Receiver<ServiceState>,
}

impl ServiceController {
    /// Spawn the controller driver and hand back the handle plus the ordered
    /// event channel. Must be called from within a tokio runtime.
    ///
    /// The driver runs until every clone of the handle has been dropped,
    /// then tears down any live servant without emitting further events.
    pub fn spawn<F>(factory: F) -> (Self, ServiceEventReceiver)
    where
        F: SessionManagerFactory,
    {
        let (events_tx, events_rx) = create_service_event_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ServiceState::Stopped);

        let mut task = ControllerTask::new(Arc::new(factory), events_tx, state_tx, requests_rx);
        tokio::spawn(async move { task.run().await });

        (
            Self {
                requests: requests_tx,
                state: state_rx,
            },
            events_rx,
        )
    }

    /// Request a start. Accepted only in the stopped state; the outcome
    /// arrives as exactly one [`ServiceEvent::StartCompleted`]
    pub fn async_start(
        &self,
        exec: ExecutionOptions,
        manager: SessionManagerOptions,
    ) -> ServiceResult<()> {
        self.send(ServiceRequest::Start { exec, manager })
    }

    /// Request a stop. Preempts an in-flight start; the outcome arrives as
    /// exactly one [`ServiceEvent::StopCompleted`]
    pub fn async_stop(&self) -> ServiceResult<()> {
        self.send(ServiceRequest::Stop)
    }

    /// Hard reset: destroy the servant without a session-manager round-trip,
    /// emit the aborted event matching the current state, end up stopped.
    /// Idempotent from the stopped state.
    pub fn terminate(&self) -> ServiceResult<()> {
        self.send(ServiceRequest::Terminate)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// A watch receiver for observing state transitions
    pub fn watch_state(&self) -> watch::Receiver<ServiceState> {
        self.state.clone()
    }

    fn send(&self, request: ServiceRequest) -> ServiceResult<()> {
        self.requests
            .send(request)
            .map_err(|_| ServiceError::ChannelClosed)
    }
}

// ----------------------------------------------------------------------------
// Driver Task
// ----------------------------------------------------------------------------

/// The driver owning the state machine; one instance per controller
struct ControllerTask {
    state: ServiceState,
    factory: Arc<dyn SessionManagerFactory>,
    servant: Option<Servant>,
    signals: Option<ServantSignalReceiver>,
    events: ServiceEventSender,
    published_state: watch::Sender<ServiceState>,
    requests: mpsc::UnboundedReceiver<ServiceRequest>,
    running: bool,
}

impl ControllerTask {
    fn new(
        factory: Arc<dyn SessionManagerFactory>,
        events: ServiceEventSender,
        published_state: watch::Sender<ServiceState>,
        requests: mpsc::UnboundedReceiver<ServiceRequest>,
    ) -> Self {
        Self {
            state: ServiceState::Stopped,
            factory,
            servant: None,
            signals: None,
            events,
            published_state,
            requests,
            running: true,
        }
    }

    async fn run(&mut self) {
        info!("Service controller started");
        while self.running {
            tokio::select! {
                request = self.requests.recv() => {
                    match request {
                        Some(request) => self.handle_request(request).await,
                        None => {
                            debug!("Request channel closed, controller winding down");
                            self.running = false;
                        }
                    }
                }
                Some(signal) = recv_signal(&mut self.signals) => {
                    self.handle_signal(signal).await;
                }
            }
        }
        // Final cleanup happens without consumer events; the receivers that
        // would see them are gone along with the handles
        self.destroy_servant().await;
        info!("Service controller stopped");
    }

    async fn handle_request(&mut self, request: ServiceRequest) {
        match request {
            ServiceRequest::Start { exec, manager } => self.handle_start(exec, manager),
            ServiceRequest::Stop => self.handle_stop(),
            ServiceRequest::Terminate => self.handle_terminate().await,
        }
    }

    fn handle_start(&mut self, exec: ExecutionOptions, manager: SessionManagerOptions) {
        if self.state != ServiceState::Stopped {
            warn!("Start rejected in the {} state", self.state);
            self.emit(ServiceEvent::StartCompleted(Err(
                ServiceError::invalid_state(self.state),
            )));
            return;
        }

        match Servant::new(exec, &manager, self.factory.as_ref()) {
            Ok((servant, signals)) => {
                servant.start();
                self.servant = Some(servant);
                self.signals = Some(signals);
                self.transition(ServiceState::Starting);
            }
            Err(error) => {
                warn!("Start failed while building the servant: {}", error);
                self.emit(ServiceEvent::StartCompleted(Err(error)));
            }
        }
    }

    fn handle_stop(&mut self) {
        match self.state {
            ServiceState::Stopped | ServiceState::Stopping => {
                warn!("Stop rejected in the {} state", self.state);
                self.emit(ServiceEvent::StopCompleted(Err(
                    ServiceError::invalid_state(self.state),
                )));
                return;
            }
            // Preempt the request in flight; its real completion will be
            // discarded by the state guard once it arrives
            ServiceState::Starting => {
                self.emit(ServiceEvent::StartCompleted(Err(ServiceError::Aborted)));
            }
            // The background wait is preempted. Emitted even when the
            // cycle's work completion has already been delivered
            ServiceState::Started => {
                self.emit(ServiceEvent::WorkCompleted(Err(ServiceError::Aborted)));
            }
        }

        match &self.servant {
            Some(servant) => servant.stop(),
            None => error!("No servant while {}, lifecycle invariant broken", self.state),
        }
        self.transition(ServiceState::Stopping);
    }

    async fn handle_terminate(&mut self) {
        let previous = self.state;
        info!("Terminating service from the {} state", previous);
        self.destroy_servant().await;
        self.transition(ServiceState::Stopped);
        match previous {
            ServiceState::Starting => {
                self.emit(ServiceEvent::StartCompleted(Err(ServiceError::Aborted)));
            }
            ServiceState::Started => {
                self.emit(ServiceEvent::WorkCompleted(Err(ServiceError::Aborted)));
            }
            ServiceState::Stopping => {
                self.emit(ServiceEvent::StopCompleted(Err(ServiceError::Aborted)));
            }
            ServiceState::Stopped => {}
        }
    }

    async fn handle_signal(&mut self, signal: ServantSignal) {
        match signal {
            ServantSignal::StartCompleted(result) => self.on_start_completed(result).await,
            ServantSignal::StopCompleted(result) => self.on_stop_completed(result).await,
            ServantSignal::WaitCompleted(result) => self.on_wait_completed(result),
            ServantSignal::WorkerPanicked => self.on_worker_panicked(),
        }
    }

    async fn on_start_completed(&mut self, result: Completion) {
        if self.state != ServiceState::Starting {
            warn!("Stale start completion ignored in the {} state", self.state);
            return;
        }
        match result {
            Ok(()) => {
                match &self.servant {
                    Some(servant) => servant.wait(),
                    None => error!("No servant while starting, lifecycle invariant broken"),
                }
                self.transition(ServiceState::Started);
                self.emit(ServiceEvent::StartCompleted(Ok(())));
            }
            Err(error) => {
                warn!("Session manager failed to start: {}", error);
                self.destroy_servant().await;
                self.transition(ServiceState::Stopped);
                self.emit(ServiceEvent::StartCompleted(Err(error)));
            }
        }
    }

    async fn on_stop_completed(&mut self, result: Completion) {
        if self.state != ServiceState::Stopping {
            warn!("Stale stop completion ignored in the {} state", self.state);
            return;
        }
        self.destroy_servant().await;
        self.transition(ServiceState::Stopped);
        self.emit(ServiceEvent::StopCompleted(result));
    }

    fn on_wait_completed(&mut self, result: Completion) {
        if self.state != ServiceState::Started {
            warn!("Stale work completion ignored in the {} state", self.state);
            return;
        }
        // The service stays started; reacting to the end of work is the
        // consumer's decision
        self.emit(ServiceEvent::WorkCompleted(result));
    }

    fn on_worker_panicked(&mut self) {
        if self.state == ServiceState::Stopped {
            debug!("Worker panic notice suppressed in the stopped state");
            return;
        }
        error!("Worker panic reported in the {} state", self.state);
        self.emit(ServiceEvent::WorkerPanicked);
    }

    /// Drop the signal receiver, then run the blocking pool teardown off the
    /// driver thread and wait for it. Ordering is preserved: nothing else is
    /// processed until every worker thread has been joined.
    async fn destroy_servant(&mut self) {
        self.signals = None;
        if let Some(servant) = self.servant.take() {
            debug!("Destroying servant; joining pool threads");
            let teardown = tokio::task::spawn_blocking(move || drop(servant));
            if let Err(error) = teardown.await {
                error!("Servant teardown task failed: {}", error);
            }
        }
    }

    fn transition(&mut self, next: ServiceState) {
        if self.state != next {
            info!("Service state {} -> {}", self.state, next);
            self.state = next;
            self.published_state.send_replace(next);
        }
    }

    fn emit(&self, event: ServiceEvent) {
        debug!("Emitting {:?}", event);
        if self.events.send(event).is_err() {
            debug!("Event dropped, consumer receiver is gone");
        }
    }
}

async fn recv_signal(signals: &mut Option<ServantSignalReceiver>) -> Option<ServantSignal> {
    match signals {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

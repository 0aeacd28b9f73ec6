//! Scripted session managers
//!
//! A `ScriptedSessionManager` implements the session manager contract with
//! three scripted phases instead of sockets. Each phase is its own async
//! operation on the manager context, so scripted cycles exercise the same
//! strand / slot / completion machinery a production manager would.
//!
//! Scripts are chosen per start cycle by a `ScriptedFactory`: queued scripts
//! are consumed in order, then cycles fall back to the factory's default.
//! Every built cycle leaves behind a `ScriptHandle` the test can use to
//! finish deferred phases and inspect call counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use warden_core::{
    AsyncOperation, AsyncOperationExt, Completion, CompletionHandler, OperationCore, ServiceError,
    SessionManager, SessionManagerFactory, SessionManagerOptions, WorkContext,
};

// ----------------------------------------------------------------------------
// Scripts
// ----------------------------------------------------------------------------

/// Behavior of one session manager phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseScript {
    /// Finish immediately with this result
    Complete(Completion),
    /// Park the handler until the test completes it through a [`ScriptHandle`]
    Deferred,
    /// Panic on the manager pool with this message
    Panic { message: String },
}

impl PhaseScript {
    /// Immediate success
    pub fn ok() -> Self {
        PhaseScript::Complete(Ok(()))
    }

    /// Immediate failure with `error`
    pub fn fail(error: ServiceError) -> Self {
        PhaseScript::Complete(Err(error))
    }

    /// Deliberate worker panic carrying `message`
    pub fn panic<M: Into<String>>(message: M) -> Self {
        PhaseScript::Panic {
            message: message.into(),
        }
    }
}

/// One start cycle's worth of phase behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionScript {
    /// Start request behavior
    pub start: PhaseScript,
    /// Wait notification behavior
    pub wait: PhaseScript,
    /// Stop request behavior
    pub stop: PhaseScript,
}

impl Default for SessionScript {
    fn default() -> Self {
        Self {
            start: PhaseScript::ok(),   // Starts cleanly
            wait: PhaseScript::Deferred, // Works until told otherwise
            stop: PhaseScript::ok(),    // Stops cleanly
        }
    }
}

impl SessionScript {
    /// Well behaved cycle whose start fails with `error`
    pub fn failing_start(error: ServiceError) -> Self {
        Self {
            start: PhaseScript::fail(error),
            ..Self::default()
        }
    }

    /// Cycle whose start parks until the test completes it
    pub fn hanging_start() -> Self {
        Self {
            start: PhaseScript::Deferred,
            ..Self::default()
        }
    }

    /// Cycle whose stop parks until the test completes it
    pub fn hanging_stop() -> Self {
        Self {
            stop: PhaseScript::Deferred,
            ..Self::default()
        }
    }

    /// Cycle whose start panics on the manager pool
    pub fn panicking_start<M: Into<String>>(message: M) -> Self {
        Self {
            start: PhaseScript::panic(message),
            ..Self::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Phase Operations
// ----------------------------------------------------------------------------

/// One scripted phase as an async operation on the manager context
struct PhaseOp {
    label: &'static str,
    script: PhaseScript,
    calls: AtomicUsize,
    core: OperationCore<Completion>,
}

impl PhaseOp {
    fn new(context: &WorkContext, label: &'static str, script: PhaseScript) -> Arc<Self> {
        Arc::new(Self {
            label,
            script,
            calls: AtomicUsize::new(0),
            core: OperationCore::new(context.clone()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AsyncOperation for PhaseOp {
    type Output = Completion;

    fn operation_core(&self) -> &OperationCore<Completion> {
        &self.core
    }

    fn attempt_step(&self) -> Option<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            PhaseScript::Complete(result) => Some(result.clone()),
            PhaseScript::Deferred => None,
            PhaseScript::Panic { message } => panic!("{}", message),
        }
    }
}

// ----------------------------------------------------------------------------
// Scripted Session Manager
// ----------------------------------------------------------------------------

/// Session manager whose three phases follow a [`SessionScript`]
pub struct ScriptedSessionManager {
    context: WorkContext,
    start_op: Arc<PhaseOp>,
    wait_op: Arc<PhaseOp>,
    stop_op: Arc<PhaseOp>,
}

impl ScriptedSessionManager {
    /// Build the manager's phase operations on `manager_context`
    pub fn new(manager_context: &WorkContext, script: SessionScript) -> Self {
        Self {
            context: manager_context.clone(),
            start_op: PhaseOp::new(manager_context, "start", script.start),
            wait_op: PhaseOp::new(manager_context, "wait", script.wait),
            stop_op: PhaseOp::new(manager_context, "stop", script.stop),
        }
    }

    /// Handle for completing deferred phases and reading call counts
    pub fn handle(&self) -> ScriptHandle {
        ScriptHandle {
            context: self.context.clone(),
            start_op: Arc::clone(&self.start_op),
            wait_op: Arc::clone(&self.wait_op),
            stop_op: Arc::clone(&self.stop_op),
        }
    }
}

impl SessionManager for ScriptedSessionManager {
    fn async_start(&self, handler: CompletionHandler) {
        self.start_op.async_run(handler);
    }

    fn async_stop(&self, handler: CompletionHandler) {
        self.stop_op.async_run(handler);
    }

    fn async_wait(&self, handler: CompletionHandler) {
        self.wait_op.async_run(handler);
    }
}

// ----------------------------------------------------------------------------
// Script Handle
// ----------------------------------------------------------------------------

/// Test-side handle to one cycle's phase operations.
///
/// Handles stay valid after the cycle is torn down; completions delivered to
/// a dead cycle go nowhere, which is exactly what late-completion tests
/// assert.
#[derive(Clone)]
pub struct ScriptHandle {
    context: WorkContext,
    start_op: Arc<PhaseOp>,
    wait_op: Arc<PhaseOp>,
    stop_op: Arc<PhaseOp>,
}

impl ScriptHandle {
    /// Context the cycle's phase operations run on. Lets tests park guard
    /// tasks on the manager pool while the cycle is alive.
    pub fn manager_context(&self) -> &WorkContext {
        &self.context
    }

    /// Complete a deferred start phase with `result`
    pub fn complete_start(&self, result: Completion) {
        self.start_op.complete_step(result);
    }

    /// Complete a deferred wait phase with `result`
    pub fn complete_wait(&self, result: Completion) {
        self.wait_op.complete_step(result);
    }

    /// Complete a deferred stop phase with `result`
    pub fn complete_stop(&self, result: Completion) {
        self.stop_op.complete_step(result);
    }

    /// Whether a start handler is parked
    pub fn start_pending(&self) -> bool {
        self.start_op.has_stored_handler()
    }

    /// Whether a wait handler is parked
    pub fn wait_pending(&self) -> bool {
        self.wait_op.has_stored_handler()
    }

    /// Whether a stop handler is parked
    pub fn stop_pending(&self) -> bool {
        self.stop_op.has_stored_handler()
    }

    /// Times the start phase has been attempted
    pub fn start_calls(&self) -> usize {
        self.start_op.calls()
    }

    /// Times the wait phase has been attempted
    pub fn wait_calls(&self) -> usize {
        self.wait_op.calls()
    }

    /// Times the stop phase has been attempted
    pub fn stop_calls(&self) -> usize {
        self.stop_op.calls()
    }

    /// Wait until the start handler is parked.
    ///
    /// # Panics
    ///
    /// Panics if no handler parks within two seconds.
    pub async fn until_start_pending(&self) {
        wait_for_parked(&self.start_op).await;
    }

    /// Wait until the wait handler is parked.
    ///
    /// # Panics
    ///
    /// Panics if no handler parks within two seconds.
    pub async fn until_wait_pending(&self) {
        wait_for_parked(&self.wait_op).await;
    }

    /// Wait until the stop handler is parked.
    ///
    /// # Panics
    ///
    /// Panics if no handler parks within two seconds.
    pub async fn until_stop_pending(&self) {
        wait_for_parked(&self.stop_op).await;
    }
}

async fn wait_for_parked(op: &Arc<PhaseOp>) {
    for _ in 0..400 {
        if op.has_stored_handler() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no {} handler parked within 2s", op.label);
}

// ----------------------------------------------------------------------------
// Scripted Factory
// ----------------------------------------------------------------------------

/// Factory that builds one [`ScriptedSessionManager`] per start cycle.
///
/// Clones share the script queue and handle list, so a test can hold one
/// clone and hand the other to the controller.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    inner: Arc<FactoryInner>,
}

#[derive(Default)]
struct FactoryInner {
    default_script: SessionScript,
    queued: Mutex<VecDeque<SessionScript>>,
    handles: Mutex<Vec<ScriptHandle>>,
}

impl ScriptedFactory {
    /// Factory whose cycles all run the default well behaved script
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose unqueued cycles run `default_script`
    pub fn with_default(default_script: SessionScript) -> Self {
        Self {
            inner: Arc::new(FactoryInner {
                default_script,
                queued: Mutex::new(VecDeque::new()),
                handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue a script for the next unserved start cycle
    pub fn queue_script(&self, script: SessionScript) {
        lock(&self.inner.queued).push_back(script);
    }

    /// Handle to the most recently built cycle, if any
    pub fn latest_handle(&self) -> Option<ScriptHandle> {
        lock(&self.inner.handles).last().cloned()
    }

    /// Number of session managers built so far
    pub fn cycles_built(&self) -> usize {
        lock(&self.inner.handles).len()
    }
}

impl SessionManagerFactory for ScriptedFactory {
    fn build(
        &self,
        manager_context: &WorkContext,
        _session_context: &WorkContext,
        _options: &SessionManagerOptions,
    ) -> Arc<dyn SessionManager> {
        let script = lock(&self.inner.queued)
            .pop_front()
            .unwrap_or_else(|| self.inner.default_script.clone());
        let cycle = lock(&self.inner.handles).len();
        debug!("Building scripted session manager for cycle {}", cycle);

        let manager = ScriptedSessionManager::new(manager_context, script);
        lock(&self.inner.handles).push(manager.handle());
        Arc::new(manager)
    }
}

// A poisoned lock only means a test thread panicked mid-script; the state
// itself stays usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    async fn phase_result(run: impl FnOnce(CompletionHandler)) -> Completion {
        let (result_sender, result_receiver) = oneshot::channel();
        run(Box::new(move |result| {
            let _ = result_sender.send(result);
        }));
        tokio::time::timeout(Duration::from_secs(2), result_receiver)
            .await
            .expect("no completion before timeout")
            .expect("completion handler dropped")
    }

    #[tokio::test]
    async fn test_default_script_completes_start_and_stop() {
        let factory = ScriptedFactory::new();
        let context = WorkContext::current();
        let manager = factory.build(&context, &context, &SessionManagerOptions::testing());

        assert_eq!(phase_result(|h| manager.async_start(h)).await, Ok(()));
        assert_eq!(phase_result(|h| manager.async_stop(h)).await, Ok(()));

        let handle = factory.latest_handle().unwrap();
        assert_eq!(handle.start_calls(), 1);
        assert_eq!(handle.stop_calls(), 1);
        assert_eq!(handle.wait_calls(), 0);
    }

    #[tokio::test]
    async fn test_deferred_phase_completes_through_handle() {
        let factory = ScriptedFactory::new();
        let context = WorkContext::current();
        let manager = factory.build(&context, &context, &SessionManagerOptions::testing());
        let handle = factory.latest_handle().unwrap();

        let (result_sender, result_receiver) = oneshot::channel();
        manager.async_wait(Box::new(move |result| {
            let _ = result_sender.send(result);
        }));
        handle.until_wait_pending().await;

        handle.complete_wait(Err(ServiceError::Aborted));
        let result = tokio::time::timeout(Duration::from_secs(2), result_receiver)
            .await
            .expect("no completion before timeout")
            .expect("completion handler dropped");
        assert_eq!(result, Err(ServiceError::Aborted));
        assert!(!handle.wait_pending());
    }

    #[tokio::test]
    async fn test_queued_scripts_consumed_in_order() {
        let factory = ScriptedFactory::new();
        factory.queue_script(SessionScript::failing_start(ServiceError::manager(
            "listen refused",
        )));
        let context = WorkContext::current();
        let options = SessionManagerOptions::testing();

        let first = factory.build(&context, &context, &options);
        assert!(matches!(
            phase_result(|h| first.async_start(h)).await,
            Err(ServiceError::Manager { .. })
        ));

        let second = factory.build(&context, &context, &options);
        assert_eq!(phase_result(|h| second.async_start(h)).await, Ok(()));
        assert_eq!(factory.cycles_built(), 2);
    }

    #[tokio::test]
    async fn test_panicking_phase_drops_the_handler() {
        let factory = ScriptedFactory::with_default(SessionScript::panicking_start("scripted"));
        let context = WorkContext::current();
        let manager = factory.build(&context, &context, &SessionManagerOptions::testing());

        let (result_sender, result_receiver) = oneshot::channel::<Completion>();
        manager.async_start(Box::new(move |result| {
            let _ = result_sender.send(result);
        }));

        // The panic unwinds through the strand job, dropping the handler
        let outcome = tokio::time::timeout(Duration::from_secs(2), result_receiver)
            .await
            .expect("handler neither dropped nor invoked");
        assert!(outcome.is_err());
        assert_eq!(factory.latest_handle().unwrap().start_calls(), 1);
    }
}

//! Session-manager boundary
//!
//! The controller drives the session-oriented worker subsystem through this
//! trait and never sees inside it. Each request registers exactly one
//! completion callback; callbacks may fire from any pool thread and are
//! delivered at most once per request.

use std::sync::Arc;

use crate::config::SessionManagerOptions;
use crate::context::WorkContext;
use crate::errors::Completion;

/// Completion callback handed across the boundary
pub type CompletionHandler = Box<dyn FnOnce(Completion) + Send + 'static>;

/// The worker subsystem managed by the service controller
pub trait SessionManager: Send + Sync + 'static {
    /// Begin starting the subsystem; `handler` fires once with the outcome
    fn async_start(&self, handler: CompletionHandler);

    /// Begin stopping the subsystem; `handler` fires once with the outcome
    fn async_stop(&self, handler: CompletionHandler);

    /// Watch for the subsystem's work ending on its own (fatal accept error,
    /// administrative shutdown); `handler` fires once when it does
    fn async_wait(&self, handler: CompletionHandler);
}

/// Builds one fresh session manager per start cycle.
///
/// Called with the two execution contexts of the cycle's servant and the
/// consumer's `SessionManagerOptions`, forwarded untouched.
pub trait SessionManagerFactory: Send + Sync + 'static {
    fn build(
        &self,
        manager_context: &WorkContext,
        session_context: &WorkContext,
        options: &SessionManagerOptions,
    ) -> Arc<dyn SessionManager>;
}

//! Attempt-now, complete-later operation scaffold
//!
//! The pattern: `async_run` hops onto the operation's strand and consults
//! `attempt_step`. If the step can finish immediately its result is handed to
//! the handler as a fresh task on the owning context; otherwise the handler
//! parks in the operation's slot until `complete_step` fires it from whatever
//! thread the real work finished on. Either way the handler is never invoked
//! inline on the caller's stack, and at most one handler is outstanding per
//! operation object.

use std::sync::Arc;

use tracing::error;

use crate::context::WorkContext;
use crate::slot::HandlerSlot;
use crate::strand::Strand;

// ----------------------------------------------------------------------------
// Operation Core
// ----------------------------------------------------------------------------

/// Shared machinery embedded by every async operation: the serializing
/// strand, the owning context and the pending-handler slot
pub struct OperationCore<R> {
    strand: Strand,
    context: WorkContext,
    slot: HandlerSlot<R>,
}

impl<R: Send + 'static> OperationCore<R> {
    /// Create the core on its owning context
    pub fn new(context: WorkContext) -> Self {
        let strand = Strand::new(&context);
        let slot = HandlerSlot::new(context.clone());
        Self {
            strand,
            context,
            slot,
        }
    }

    pub(crate) fn strand(&self) -> &Strand {
        &self.strand
    }

    pub(crate) fn slot(&self) -> &HandlerSlot<R> {
        &self.slot
    }

    // Immediate-path dispatch: a fresh task, never the current stack
    pub(crate) fn dispatch<H>(&self, handler: H, result: R)
    where
        H: FnOnce(R) + Send + 'static,
    {
        self.context.post(move || handler(result));
    }
}

// ----------------------------------------------------------------------------
// Async Operation Traits
// ----------------------------------------------------------------------------

/// An operation with one asynchronously completable step.
///
/// Implementors supply the step logic and embed an [`OperationCore`]; the
/// driving methods come from [`AsyncOperationExt`], which is implemented for
/// `Arc<O>` so in-flight callbacks keep the operation alive.
pub trait AsyncOperation: Send + Sync + 'static {
    /// Result payload delivered to completion handlers
    type Output: Send + 'static;

    /// Access the embedded pattern state
    fn operation_core(&self) -> &OperationCore<Self::Output>;

    /// Attempt the step. Runs on the operation's strand.
    ///
    /// `Some(result)` finishes the operation immediately; `None` leaves it
    /// in flight until [`AsyncOperationExt::complete_step`] is called.
    fn attempt_step(&self) -> Option<Self::Output>;
}

/// Driving methods for [`AsyncOperation`] implementors
pub trait AsyncOperationExt {
    type Output: Send + 'static;

    /// Begin the operation; `handler` is called exactly once with the result
    /// unless the operation object is torn down first
    fn async_run<H>(&self, handler: H)
    where
        H: FnOnce(Self::Output) + Send + 'static;

    /// Deliver the result of a deferred step; callable from any thread.
    /// A no-op when no handler is stored (stale completion).
    fn complete_step(&self, result: Self::Output);

    /// Whether a deferred handler is parked in the slot
    fn has_stored_handler(&self) -> bool;
}

impl<O: AsyncOperation> AsyncOperationExt for Arc<O> {
    type Output = O::Output;

    fn async_run<H>(&self, handler: H)
    where
        H: FnOnce(O::Output) + Send + 'static,
    {
        let operation = Arc::clone(self);
        self.operation_core().strand().post(move || {
            let core = operation.operation_core();
            match operation.attempt_step() {
                Some(result) => core.dispatch(handler, result),
                None => {
                    if core.slot().store(handler).is_err() {
                        // Caller bug: a second run while one is outstanding
                        error!("async_run called while a handler is pending, dropping the new handler");
                    }
                }
            }
        });
    }

    fn complete_step(&self, result: O::Output) {
        self.operation_core().slot().post(result);
    }

    fn has_stored_handler(&self) -> bool {
        self.operation_core().slot().has_pending()
    }
}

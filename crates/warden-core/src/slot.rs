//! Single-slot completion handler storage
//!
//! `HandlerSlot` holds at most one pending completion callback. Posting a
//! result never invokes the handler inline: the handler is handed to the
//! owning context as a fresh task, so the poster's stack unwinds first and
//! the handler observes the context's threads, not the poster's.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::context::WorkContext;
use crate::errors::SlotOccupied;

type StoredHandler<R> = Box<dyn FnOnce(R) + Send + 'static>;

/// At-most-one pending completion handler, generic over the result payload
pub struct HandlerSlot<R> {
    context: WorkContext,
    stored: Mutex<Option<StoredHandler<R>>>,
}

impl<R: Send + 'static> HandlerSlot<R> {
    /// Create an empty slot owned by `context`
    pub fn new(context: WorkContext) -> Self {
        Self {
            context,
            stored: Mutex::new(None),
        }
    }

    /// Whether a handler is currently stored
    pub fn has_pending(&self) -> bool {
        self.guard().is_some()
    }

    /// Store a handler to be fired by a later `post`.
    ///
    /// Fails with [`SlotOccupied`] if a handler is already pending; the
    /// offered handler is dropped without being invoked in that case.
    pub fn store<H>(&self, handler: H) -> Result<(), SlotOccupied>
    where
        H: FnOnce(R) + Send + 'static,
    {
        let mut stored = self.guard();
        if stored.is_some() {
            return Err(SlotOccupied);
        }
        *stored = Some(Box::new(handler));
        Ok(())
    }

    /// Fire the stored handler with `result` on the owning context.
    ///
    /// Clears the slot before scheduling. Posting to an empty slot is a
    /// silent no-op, which is what makes stale completions harmless.
    pub fn post(&self, result: R) {
        let handler = self.guard().take();
        match handler {
            Some(handler) => self.context.post(move || handler(result)),
            None => debug!("Completion posted to an empty handler slot, dropped"),
        }
    }

    // Lock with poison recovery; the critical section never runs user code,
    // so a poisoned lock still holds a coherent Option.
    fn guard(&self) -> MutexGuard<'_, Option<StoredHandler<R>>> {
        match self.stored.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<R> fmt::Debug for HandlerSlot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSlot").finish()
    }
}

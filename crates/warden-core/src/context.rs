//! Panic-watched execution context handle
//!
//! `WorkContext` wraps a tokio runtime handle together with an optional panic
//! hook. Every unit of work submitted through a context runs under
//! `catch_unwind`, so a panic escaping a worker task is logged and reported
//! through the hook instead of dying silently on a pool thread.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::error;

/// Hook invoked whenever a panic escapes a task submitted to the context
pub type PanicHook = Arc<dyn Fn() + Send + Sync + 'static>;

/// Cloneable handle to one execution context
#[derive(Clone)]
pub struct WorkContext {
    handle: Handle,
    hook: Option<PanicHook>,
}

impl WorkContext {
    /// Create a context without a panic hook
    pub fn new(handle: Handle) -> Self {
        Self { handle, hook: None }
    }

    /// Create a context that reports escaped panics through `hook`
    pub fn with_hook(handle: Handle, hook: PanicHook) -> Self {
        Self {
            handle,
            hook: Some(hook),
        }
    }

    /// Create a context for the runtime the caller is running on.
    ///
    /// Must be called from within a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// The underlying runtime handle
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub(crate) fn panic_hook(&self) -> Option<PanicHook> {
        self.hook.clone()
    }

    /// Spawn a future on the context, watched for panics
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let hook = self.hook.clone();
        self.handle.spawn(async move {
            if let Err(payload) = AssertUnwindSafe(future).catch_unwind().await {
                error!("Worker task panicked: {}", panic_message(payload.as_ref()));
                if let Some(hook) = hook {
                    hook();
                }
            }
        });
    }

    /// Run a closure as a task on the context, watched for panics
    pub fn post<J>(&self, job: J)
    where
        J: FnOnce() + Send + 'static,
    {
        self.spawn(async move { job() });
    }
}

impl fmt::Debug for WorkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkContext")
            .field("watched", &self.hook.is_some())
            .finish()
    }
}

/// Best-effort extraction of a printable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_runs_future() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let context = WorkContext::current();
        context.spawn(async move {
            let _ = tx.send(42u32);
        });
        let value = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("spawned future never ran")
            .expect("sender dropped");
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_panic_invokes_hook() {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook_fired = Arc::clone(&fired);
        let hook: PanicHook = Arc::new(move || {
            hook_fired.fetch_add(1, Ordering::SeqCst);
        });

        let context = WorkContext::with_hook(Handle::current(), hook);
        context.post(|| panic!("scripted failure"));

        for _ in 0..50 {
            if fired.load(Ordering::SeqCst) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("panic hook was never invoked");
    }

    #[tokio::test]
    async fn test_clean_job_does_not_fire_hook() {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook_fired = Arc::clone(&fired);
        let hook: PanicHook = Arc::new(move || {
            hook_fired.fetch_add(1, Ordering::SeqCst);
        });

        let (tx, rx) = tokio::sync::oneshot::channel();
        let context = WorkContext::with_hook(Handle::current(), hook);
        context.post(move || {
            let _ = tx.send(());
        });
        rx.await.expect("job never ran");
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

//! Paired execution pools
//!
//! Each start cycle gets two independent multi-thread runtimes: a session
//! pool for per-session work and a session-manager pool for accept and
//! bookkeeping work. Teardown is strictly joining: dropping
//! `ExecutionResources` shuts the manager pool down first, then the session
//! pool, and returns only after every worker thread has exited. In-flight
//! tasks are cancelled at their next await point and dropped, never migrated.

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use warden_core::{ExecutionOptions, PanicHook, ServiceError, WorkContext};

/// The two pools backing one start cycle
pub struct ExecutionResources {
    options: ExecutionOptions,
    session_context: WorkContext,
    manager_context: WorkContext,
    // Held only for ownership; declaration order is teardown order, the
    // manager pool joins first
    #[allow(dead_code)]
    manager_runtime: Runtime,
    #[allow(dead_code)]
    session_runtime: Runtime,
}

impl ExecutionResources {
    /// Build both pools; every task submitted through the returned contexts
    /// reports escaped panics through `hook`
    pub fn new(options: ExecutionOptions, hook: PanicHook) -> Result<Self, ServiceError> {
        options.validate().map_err(ServiceError::config_error)?;

        let manager_runtime = build_pool("warden-manager", options.manager_threads)?;
        let session_runtime = build_pool("warden-session", options.session_threads)?;
        let manager_context = WorkContext::with_hook(manager_runtime.handle().clone(), hook.clone());
        let session_context = WorkContext::with_hook(session_runtime.handle().clone(), hook);

        info!(
            "Execution pools ready: {} session thread(s), {} manager thread(s)",
            options.session_threads, options.manager_threads
        );
        Ok(Self {
            options,
            session_context,
            manager_context,
            manager_runtime,
            session_runtime,
        })
    }

    /// Context of the session pool
    pub fn session_context(&self) -> &WorkContext {
        &self.session_context
    }

    /// Context of the session-manager pool
    pub fn manager_context(&self) -> &WorkContext {
        &self.manager_context
    }

    /// The sizing this cycle was built with
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }
}

impl Drop for ExecutionResources {
    fn drop(&mut self) {
        debug!("Shutting down execution pools; joining worker threads");
        // Runtime fields drop after this body, blocking until joined
    }
}

impl std::fmt::Debug for ExecutionResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionResources")
            .field("options", &self.options)
            .finish()
    }
}

fn build_pool(name: &str, threads: usize) -> Result<Runtime, ServiceError> {
    Builder::new_multi_thread()
        .worker_threads(threads)
        .thread_name(name)
        .enable_all()
        .build()
        .map_err(|source| ServiceError::resource_failure(source.to_string()))
}

//! Serialized job execution
//!
//! A `Strand` runs posted closures strictly one at a time, in FIFO order, on
//! its owning context. It is the serialization primitive under the
//! async-operation pattern: posting never blocks, jobs may be posted from any
//! thread, and no two jobs ever run concurrently.

use std::fmt;
use std::panic::AssertUnwindSafe;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::context::{panic_message, WorkContext};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Serialized FIFO executor on one execution context
#[derive(Clone)]
pub struct Strand {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Strand {
    /// Create a strand draining on the given context.
    ///
    /// A panicking job is reported through the context's panic hook; the
    /// strand keeps draining afterwards. The drain task ends when every
    /// clone of the strand has been dropped and the queue is empty, or when
    /// the owning runtime shuts down.
    pub fn new(context: &WorkContext) -> Self {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        let hook = context.panic_hook();
        context.handle().spawn(async move {
            while let Some(job) = queue.recv().await {
                if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(job)) {
                    error!("Strand job panicked: {}", panic_message(payload.as_ref()));
                    if let Some(hook) = &hook {
                        hook();
                    }
                }
            }
        });
        Self { jobs }
    }

    /// Queue a job for serialized execution; callable from any thread
    pub fn post<J>(&self, job: J)
    where
        J: FnOnce() + Send + 'static,
    {
        if self.jobs.send(Box::new(job)).is_err() {
            // Owning runtime is gone; dropping the job mirrors pool teardown
            debug!("Strand job dropped, drain task is gone");
        }
    }
}

impl fmt::Debug for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strand").finish()
    }
}

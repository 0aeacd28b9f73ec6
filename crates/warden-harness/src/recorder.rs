//! Ordered event assertions
//!
//! Wraps the controller's event receiver so tests read events one at a time
//! under a timeout instead of hand-rolling `select!` blocks. Event order is
//! part of the controller's contract, so the recorder never reorders or
//! coalesces.

use std::time::Duration;

use warden_core::{ServiceEvent, ServiceEventReceiver};

/// Default patience for [`EventRecorder::next`]
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout-guarded reader over a service event channel
pub struct EventRecorder {
    events: ServiceEventReceiver,
    timeout: Duration,
}

impl EventRecorder {
    /// Recorder with the default two second patience
    pub fn new(events: ServiceEventReceiver) -> Self {
        Self::with_timeout(events, DEFAULT_EVENT_TIMEOUT)
    }

    /// Recorder that waits at most `timeout` per event
    pub fn with_timeout(events: ServiceEventReceiver, timeout: Duration) -> Self {
        Self { events, timeout }
    }

    /// Next event in emission order.
    ///
    /// # Panics
    ///
    /// Panics if no event arrives within the recorder's timeout or the
    /// channel closes first.
    pub async fn next(&mut self) -> ServiceEvent {
        match tokio::time::timeout(self.timeout, self.events.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => panic!("event channel closed while waiting for an event"),
            Err(_) => panic!("no service event within {:?}", self.timeout),
        }
    }

    /// Already-delivered event, if one is queued
    pub fn try_next(&mut self) -> Option<ServiceEvent> {
        self.events.try_recv().ok()
    }

    /// Assert that nothing is emitted for `window`.
    ///
    /// # Panics
    ///
    /// Panics if any event arrives inside the window.
    pub async fn expect_idle(&mut self, window: Duration) {
        match tokio::time::timeout(window, self.events.recv()).await {
            Ok(Some(event)) => panic!("expected no event, got {:?}", event),
            Ok(None) | Err(_) => {}
        }
    }
}

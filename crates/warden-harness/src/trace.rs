//! Test tracing setup

/// Install a DEBUG-level subscriber writing through the test capture.
///
/// Safe to call from every test; installs are attempted once and later
/// calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

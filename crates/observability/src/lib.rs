//! Logging setup for the salesdesk binaries.

/// Initialize process-wide logging.
///
/// Idempotent: later calls are no-ops, so tests and the server binary can
/// both call it unconditionally.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter, JSON output).
pub mod tracing;

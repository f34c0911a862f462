//! Fatal error taxonomy.
//!
//! Only failures that must reach the test author become `StubError`:
//! lifecycle handshake violations, incomplete scenarios at teardown,
//! colliding declarations, and listener launch problems. Mismatched,
//! exhausted, and unknown requests
//! are answered over HTTP (400/418/404) so the test can assert on them.

use thiserror::Error;

/// Errors surfaced by service and harness lifecycle operations.
#[derive(Debug, Error)]
pub enum StubError {
    /// The listener failed to acknowledge a start/stop transition, or
    /// acknowledged the wrong one.
    #[error("[{service}] handshake with mock server failed: {reason}")]
    Protocol { service: String, reason: String },

    /// A service was stopped while declared responses were still unconsumed.
    #[error("[{service}] scenario incomplete, unconsumed responses left: {remaining}")]
    IncompleteScenario { service: String, remaining: String },

    /// A declared response matcher uses an HTTP method the router cannot
    /// register.
    #[error("cannot route method '{0}'")]
    UnsupportedMethod(String),

    /// Two services riding the shared listener declared the same path.
    #[error("[shared server] path '{path}' is declared by both '{first}' and '{second}'")]
    DuplicateEndpoint {
        path: String,
        first: String,
        second: String,
    },

    /// The listener thread or its runtime could not be created.
    #[error("failed to launch mock server: {0}")]
    Spawn(#[from] std::io::Error),
}

//! Listener lifecycle.
//!
//! # Data Flow
//! ```text
//! service scenario (axum Router)
//!     → runtime.rs (dedicated thread + current-thread tokio runtime)
//!     → handshake.rs (single-slot started/stopped acknowledgements)
//!     → ports.rs (wrapping port cursor for dedicated listeners)
//! ```
//!
//! # Design Decisions
//! - The listener lives in its own execution context; the owning side never
//!   guesses readiness from spawn latency, it waits on the handshake slot
//! - Teardown is hard: the serve future is dropped, not drained, and
//!   in-flight callback tasks die with the runtime

pub mod handshake;
pub mod ports;
pub mod runtime;

pub use handshake::{HandshakeWait, ServerSignal};
pub use runtime::{MockServer, ServerHandle, DEFAULT_HANDSHAKE_TIMEOUT};

//! Observability subsystem.
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging throughout
//! - Level configurable via `RUST_LOG`; defaults keep the mock quiet unless
//!   a test opts in

pub mod logging;

pub use logging::init_logging;

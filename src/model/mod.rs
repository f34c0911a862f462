//! Declared request/response model.
//!
//! # Data Flow
//! ```text
//! test code
//!     → RequestSpec / ResponseSpec (builders, immutable once built)
//!     → Action (tagged union, ordering significant)
//!     → routing::group (run-length grouping)
//!     → routing::handler (per-endpoint replay state machine)
//! ```
//!
//! # Design Decisions
//! - A `ResponseSpec` embeds the `RequestSpec` it is valid for; one
//!   declaration carries both the reply and its matcher
//! - Specs are plain data, cheap to clone, shared freely across the
//!   listener thread boundary

pub mod action;
pub mod request;
pub mod response;

pub use action::Action;
pub use request::{OutboundRequest, RequestSpec};
pub use response::ResponseSpec;

//! Action sequencing and dispatch.
//!
//! # Responsibilities
//! - Group the declared action list into response groups
//! - Track per-endpoint consumption state (the replay cursor)
//! - Build the routable surface a listener serves
//!
//! # Design Decisions
//! - Grouping is a single explicit linear scan; requests bind to the
//!   preceding response, and requests before the first response form an
//!   initial group fired at listener startup
//! - Handlers for the same (method, path) merge by concatenating entries in
//!   declaration order; nothing is replaced or discarded
//! - The cursor advances inside one critical section together with the
//!   match check, so concurrent callers cannot double-consume an entry

pub mod group;
pub mod handler;
pub mod router;

pub use group::{group_actions, ResponseGroup};
pub use handler::{Dispatch, Handler};
pub use router::{unknown_endpoint, Scenario};

//! Structural request matching.
//!
//! # Responsibilities
//! - Compare an observed request against a declared expectation
//! - Report the first violated rule as a human-readable reason
//! - Resolve `{param}` path templates against observed path parameters
//!
//! # Design Decisions
//! - Rules run in a fixed precedence: method, path, body, headers, query;
//!   the first failure wins so test diagnostics name a single cause
//! - Undeclared parts of the expectation (empty body, no headers, no query)
//!   are wildcards
//! - Query strings compare as key -> set-of-values multimaps, order-blind

pub mod diff;
pub mod template;

pub use diff::{diff, Mismatch, ObservedRequest};

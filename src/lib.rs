//! Programmable HTTP test double.
//!
//! Declares ordered request/response scenarios, serves them from real
//! listeners, and fires outbound callback requests as side effects, so a
//! test can script multi-service interactions (A calls B calls C) without
//! real dependent services.
//!
//! ```no_run
//! use axum::http::StatusCode;
//! use httpstub::{Action, HttpMock, RequestSpec, ResponseSpec, ServiceConfig};
//!
//! let mut mock = HttpMock::new();
//! let billing = mock.new_service(
//!     ServiceConfig::named("billing")
//!         .env_var("BILLING_URL")
//!         .actions([Action::Response(
//!             ResponseSpec::for_request(RequestSpec::get("/invoice/{id}"))
//!                 .status(StatusCode::OK)
//!                 .json(&serde_json::json!({"total": 42})),
//!         )]),
//! );
//! mock.start().unwrap();
//! // ... exercise code under test against $BILLING_URL ...
//! mock.stop().unwrap(); // fails if declared responses were never consumed
//! # let _ = billing;
//! ```

pub mod callback;
pub mod error;
pub mod harness;
pub mod matching;
pub mod model;
pub mod observability;
pub mod routing;
pub mod server;
pub mod service;

pub use error::StubError;
pub use harness::HttpMock;
pub use model::{Action, OutboundRequest, RequestSpec, ResponseSpec};
pub use server::MockServer;
pub use service::{HttpService, LifecycleState, ServiceConfig};

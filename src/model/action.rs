//! Scenario actions.

use super::request::OutboundRequest;
use super::response::ResponseSpec;

/// One step of a declared scenario.
///
/// The variant is fixed at construction time; ordering within the declared
/// sequence is significant. A `Request` is a call the mock fires itself,
/// bound to the most recently declared `Response` (or run at startup when it
/// precedes every response).
#[derive(Debug, Clone)]
pub enum Action {
    Request(OutboundRequest),
    Response(ResponseSpec),
}

impl From<OutboundRequest> for Action {
    fn from(request: OutboundRequest) -> Self {
        Action::Request(request)
    }
}

impl From<ResponseSpec> for Action {
    fn from(response: ResponseSpec) -> Self {
        Action::Response(response)
    }
}

//! Linear-scan grouping of declared actions.

use crate::model::{Action, OutboundRequest, ResponseSpec};

/// One declared response plus the outbound requests bound to it.
///
/// A group with no response is the initial group: a pure aggregator of
/// outbound requests executed once, at listener startup.
#[derive(Debug, Clone, Default)]
pub struct ResponseGroup {
    response: Option<ResponseSpec>,
    requests: Vec<OutboundRequest>,
}

impl ResponseGroup {
    fn initial() -> Self {
        Self::default()
    }

    fn for_response(response: ResponseSpec) -> Self {
        Self {
            response: Some(response),
            requests: Vec::new(),
        }
    }

    pub fn response(&self) -> Option<&ResponseSpec> {
        self.response.as_ref()
    }

    pub fn requests(&self) -> &[OutboundRequest] {
        &self.requests
    }

    pub fn into_parts(self) -> (Option<ResponseSpec>, Vec<OutboundRequest>) {
        (self.response, self.requests)
    }
}

/// Partition the declared sequence into response groups.
///
/// Each `Response` action opens a new group; every `Request` action joins
/// the most recently opened group. Requests preceding the first response
/// land in a dedicated response-less initial group.
pub fn group_actions(actions: &[Action]) -> Vec<ResponseGroup> {
    let mut groups: Vec<ResponseGroup> = Vec::new();
    for action in actions {
        match action {
            Action::Response(response) => {
                groups.push(ResponseGroup::for_response(response.clone()));
            }
            Action::Request(request) => {
                if groups.is_empty() {
                    groups.push(ResponseGroup::initial());
                }
                if let Some(last) = groups.last_mut() {
                    last.requests.push(request.clone());
                }
            }
        }
    }
    groups
}

//! Per-endpoint replay state machine.

use std::sync::{Mutex, PoisonError};

use axum::http::Method;

use crate::matching::{diff, Mismatch, ObservedRequest};
use crate::model::{OutboundRequest, ResponseSpec};

/// One consumable (response, bound outbound requests) pair.
#[derive(Debug, Clone)]
struct Entry {
    response: ResponseSpec,
    callbacks: Vec<OutboundRequest>,
}

/// Outcome of dispatching one inbound request.
#[derive(Debug)]
pub enum Dispatch {
    /// The request matched the entry at the cursor; serve this response and
    /// then run these callbacks.
    Reply {
        response: ResponseSpec,
        callbacks: Vec<OutboundRequest>,
    },
    /// The request reached a known endpoint but violated the cursor entry's
    /// matcher. State is unchanged.
    Mismatch(Mismatch),
    /// Every declared entry was already consumed. State is unchanged.
    Exhausted,
}

/// Ordered response sequence for one (method, path) endpoint.
///
/// The cursor is monotonically non-decreasing and only moves inside the same
/// critical section as the match check, so callers on the listener thread
/// cannot double-consume an entry the owning side is still counting.
#[derive(Debug)]
pub struct Handler {
    method: Method,
    path: String,
    entries: Vec<Entry>,
    cursor: Mutex<usize>,
}

impl Handler {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            entries: Vec::new(),
            cursor: Mutex::new(0),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append one consumable entry. Batches declared separately for the same
    /// endpoint concatenate here in declaration order.
    pub fn push(&mut self, response: ResponseSpec, callbacks: Vec<OutboundRequest>) {
        self.entries.push(Entry {
            response,
            callbacks,
        });
    }

    /// Match `observed` against the entry at the cursor and, on success,
    /// consume it.
    pub fn dispatch(&self, observed: &ObservedRequest) -> Dispatch {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = self.entries.get(*cursor) else {
            return Dispatch::Exhausted;
        };
        if let Some(mismatch) = diff(entry.response.matcher(), observed) {
            return Dispatch::Mismatch(mismatch);
        }
        *cursor += 1;
        Dispatch::Reply {
            response: entry.response.clone(),
            callbacks: entry.callbacks.clone(),
        }
    }

    /// Number of declared entries not yet consumed.
    pub fn remaining(&self) -> usize {
        let cursor = *self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        self.entries.len().saturating_sub(cursor)
    }

    pub(crate) fn describe_remaining(&self) -> Option<String> {
        let remaining = self.remaining();
        if remaining == 0 {
            return None;
        }
        Some(format!(
            "{} {} ({} of {} unconsumed)",
            self.method,
            self.path,
            remaining,
            self.entries.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::HeaderMap;
    use crate::model::RequestSpec;

    fn observed(method: Method, path: &str, body: &'static [u8]) -> ObservedRequest {
        ObservedRequest {
            method,
            path: path.to_string(),
            query: None,
            path_params: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body),
        }
    }

    fn handler_with(bodies: &[&'static [u8]]) -> Handler {
        let mut handler = Handler::new(Method::POST, "/x");
        for body in bodies {
            handler.push(
                ResponseSpec::for_request(RequestSpec::post("/x").body(*body)),
                Vec::new(),
            );
        }
        handler
    }

    #[test]
    fn entries_are_consumed_in_declaration_order() {
        let handler = handler_with(&[b"one", b"two"]);
        assert_eq!(handler.remaining(), 2);

        match handler.dispatch(&observed(Method::POST, "/x", b"one")) {
            Dispatch::Reply { .. } => {}
            other => panic!("expected reply, got {other:?}"),
        }
        assert_eq!(handler.remaining(), 1);

        // second entry is now at the cursor; the first no longer matches
        match handler.dispatch(&observed(Method::POST, "/x", b"one")) {
            Dispatch::Mismatch(_) => {}
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert_eq!(handler.remaining(), 1);

        match handler.dispatch(&observed(Method::POST, "/x", b"two")) {
            Dispatch::Reply { .. } => {}
            other => panic!("expected reply, got {other:?}"),
        }
        assert_eq!(handler.remaining(), 0);
    }

    #[test]
    fn exhausted_handler_does_not_mutate_state() {
        let handler = handler_with(&[b"one"]);
        let _ = handler.dispatch(&observed(Method::POST, "/x", b"one"));
        for _ in 0..3 {
            match handler.dispatch(&observed(Method::POST, "/x", b"one")) {
                Dispatch::Exhausted => {}
                other => panic!("expected exhausted, got {other:?}"),
            }
        }
        assert_eq!(handler.remaining(), 0);
    }

    #[test]
    fn exhausted_dispatch_never_hands_out_callbacks() {
        let mut handler = Handler::new(Method::POST, "/x");
        handler.push(
            ResponseSpec::for_request(RequestSpec::post("/x").body(&b"one"[..])),
            vec![OutboundRequest::to(
                "http://127.0.0.1:29000",
                RequestSpec::post("/cb"),
            )],
        );

        match handler.dispatch(&observed(Method::POST, "/x", b"one")) {
            Dispatch::Reply { callbacks, .. } => assert_eq!(callbacks.len(), 1),
            other => panic!("expected reply, got {other:?}"),
        }

        // past the terminal cursor the entry's callbacks are unreachable
        match handler.dispatch(&observed(Method::POST, "/x", b"one")) {
            Dispatch::Exhausted => {}
            other => panic!("expected exhausted, got {other:?}"),
        }
    }

    #[test]
    fn mismatch_does_not_advance_the_cursor() {
        let handler = handler_with(&[b"one"]);
        match handler.dispatch(&observed(Method::POST, "/x", b"wrong")) {
            Dispatch::Mismatch(_) => {}
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert_eq!(handler.remaining(), 1);
        assert!(handler
            .describe_remaining()
            .is_some_and(|d| d.contains("POST /x")));
    }
}

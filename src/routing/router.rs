//! Scenario construction and the routable dispatch surface.
//!
//! # Responsibilities
//! - Turn a declared action list into per-endpoint handlers (merged, ordered)
//! - Expose the handlers as an axum `Router`
//! - Answer unknown endpoints with a structured 404
//!
//! # Design Decisions
//! - Handlers are built once, at service start, and shared with the listener
//!   thread via `Arc`; the owning side keeps the same `Arc`s to inspect
//!   consumption at teardown
//! - Body read and matching happen inline in the dispatch task; only the
//!   callback run is spawned, so the cursor's critical section stays small

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{RawPathParams, Request};
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use uuid::Uuid;

use crate::callback;
use crate::error::StubError;
use crate::matching::ObservedRequest;
use crate::model::response::json_error;
use crate::model::{Action, OutboundRequest};

use super::group::group_actions;
use super::handler::{Dispatch, Handler};

/// Upper bound on inbound body size; scripted test payloads are small.
const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// A service's declared actions compiled into routable, stateful form.
#[derive(Debug)]
pub struct Scenario {
    service: String,
    handlers: Vec<Arc<Handler>>,
    initial: Vec<OutboundRequest>,
}

impl Scenario {
    /// Compile `actions` into merged per-endpoint handlers plus the initial
    /// outbound batch.
    pub fn from_actions(service: &str, actions: &[Action]) -> Self {
        let mut handlers: Vec<Handler> = Vec::new();
        let mut initial: Vec<OutboundRequest> = Vec::new();

        for group in group_actions(actions) {
            let (response, requests) = group.into_parts();
            let Some(response) = response else {
                initial.extend(requests);
                continue;
            };
            let method = response.matcher().method().clone();
            let path = response.matcher().path().to_string();
            let existing = handlers
                .iter_mut()
                .find(|handler| handler.method() == &method && handler.path() == path);
            match existing {
                Some(handler) => handler.push(response, requests),
                None => {
                    let mut handler = Handler::new(method, path);
                    handler.push(response, requests);
                    handlers.push(handler);
                }
            }
        }

        Self {
            service: service.to_string(),
            handlers: handlers.into_iter().map(Arc::new).collect(),
            initial,
        }
    }

    /// Outbound requests to fire once, when the owning listener comes up.
    pub fn initial_requests(&self) -> Vec<OutboundRequest> {
        self.initial.clone()
    }

    /// Paths the compiled router registers, deduplicated. Routers for the
    /// same path cannot merge across scenarios, so sharing a listener
    /// requires these to be disjoint between services.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .handlers
            .iter()
            .map(|handler| handler.path().to_string())
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Build the dispatch table. Endpoints sharing a path chain onto one
    /// `MethodRouter`; unmatched methods on a known path fall through to the
    /// structured 404.
    pub fn router(&self) -> Result<Router, StubError> {
        let mut routes: HashMap<String, MethodRouter> = HashMap::new();
        for handler in &self.handlers {
            let filter = MethodFilter::try_from(handler.method().clone())
                .map_err(|_| StubError::UnsupportedMethod(handler.method().to_string()))?;

            let shared = handler.clone();
            let service = self.service.clone();
            let endpoint = on(filter, move |params: RawPathParams, request: Request| {
                let handler = shared.clone();
                let service = service.clone();
                async move { dispatch_request(service, handler, params, request).await }
            });

            let path = handler.path().to_string();
            let route = match routes.remove(&path) {
                Some(existing) => existing.merge(endpoint),
                None => endpoint,
            };
            routes.insert(path, route);
        }

        let mut router = Router::new();
        for (path, route) in routes {
            router = router.route(&path, route.fallback(unknown_endpoint));
        }
        Ok(router)
    }

    /// Descriptions of every handler with unconsumed entries.
    pub fn remaining(&self) -> Vec<String> {
        self.handlers
            .iter()
            .filter_map(|handler| handler.describe_remaining())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.handlers.iter().all(|handler| handler.remaining() == 0)
    }
}

async fn dispatch_request(
    service: String,
    handler: Arc<Handler>,
    params: RawPathParams,
    request: Request,
) -> Response {
    let request_id = Uuid::new_v4();
    let path_params: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                format!("failed to read request body: {err}"),
            )
        }
    };

    let observed = ObservedRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        path_params,
        headers: parts.headers,
        body: bytes,
    };

    tracing::debug!(
        %request_id,
        service = %service,
        method = %observed.method,
        path = %observed.path,
        "dispatching scripted request"
    );

    match handler.dispatch(&observed) {
        Dispatch::Reply {
            response,
            callbacks,
        } => {
            if !callbacks.is_empty() {
                tokio::spawn(callback::run_requests(callbacks));
            }
            response.to_http()
        }
        Dispatch::Mismatch(mismatch) => {
            tracing::debug!(%request_id, service = %service, %mismatch, "request mismatch");
            json_error(StatusCode::BAD_REQUEST, mismatch.to_string())
        }
        Dispatch::Exhausted => {
            tracing::debug!(%request_id, service = %service, "responses exhausted");
            json_error(
                StatusCode::IM_A_TEAPOT,
                format!(
                    "got an extra request for '{} {}', but no responses are left",
                    handler.method(),
                    handler.path()
                ),
            )
        }
    }
}

/// Fallback for requests no declared endpoint covers.
pub async fn unknown_endpoint(method: Method, uri: Uri) -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        format!("no handler registered for {} {}", method, uri.path()),
    )
}

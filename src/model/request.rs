//! Request declarations: expectation templates and outbound side effects.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::Method;
use serde::Serialize;

/// Template describing an HTTP request.
///
/// Used in two roles: embedded in a [`crate::model::ResponseSpec`] as the
/// matcher an incoming call must satisfy, or wrapped in an
/// [`OutboundRequest`] as a call the mock fires itself. The path may contain
/// `{param}` placeholders which are resolved against the observed request's
/// path parameters during matching.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Bytes,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Declare a header. When used as a matcher, declared headers are a
    /// required subset of the observed ones; none declared matches anything.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Declare a query parameter. Repeated names form a multimap.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Declare a raw body. As a matcher, a non-empty body must match
    /// byte-exactly; an empty one is a wildcard.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Declare a JSON body and the matching `content-type` header.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.headers
                    .push(("content-type".into(), "application/json".into()));
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize declared JSON body");
            }
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// A request the mock fires against another service as a side effect.
///
/// Carries the target service's base URL (resolved at declaration time) and
/// an optional delay honored before dispatch.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    spec: RequestSpec,
    target: String,
    delay: Duration,
}

impl OutboundRequest {
    pub fn to(target: impl Into<String>, spec: RequestSpec) -> Self {
        Self {
            spec,
            target: target.into(),
            delay: Duration::ZERO,
        }
    }

    /// Wait this long before dispatching the call.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn request_delay(&self) -> Duration {
        self.delay
    }
}

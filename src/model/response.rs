//! Response declarations and reply construction.

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::request::RequestSpec;

/// A declared reply plus the request it is valid for.
///
/// The embedded [`RequestSpec`] is never transmitted; it is the matcher an
/// incoming call must satisfy before this response is served.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
    matcher: RequestSpec,
}

impl ResponseSpec {
    pub fn for_request(matcher: RequestSpec) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: Bytes::new(),
            matcher,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

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

    pub fn matcher(&self) -> &RequestSpec {
        &self.matcher
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    /// Build the HTTP reply this declaration stands for.
    pub(crate) fn to_http(&self) -> Response {
        let mut builder = axum::http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        match builder.body(Body::from(self.body.clone())) {
            Ok(response) => response,
            Err(err) => json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("invalid response declaration: {err}"),
            ),
        }
    }
}

/// Structured `{"error": ...}` reply used for mismatch/exhaustion/404 paths.
pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_carries_status_headers_and_body() {
        let spec = ResponseSpec::for_request(RequestSpec::get("/x"))
            .status(StatusCode::CREATED)
            .header("x-marker", "yes")
            .body(&b"hello"[..]);
        let reply = spec.to_http();
        assert_eq!(reply.status(), StatusCode::CREATED);
        assert_eq!(reply.headers().get("x-marker").unwrap(), "yes");
    }

    #[test]
    fn json_error_carries_status() {
        let reply = json_error(StatusCode::NOT_FOUND, "nope");
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
    }
}

//! Outbound callback execution.
//!
//! # Responsibilities
//! - Fire bound outbound requests against their target services, in order
//! - Honor per-request delays before dispatch
//! - Swallow network failures so a failed callback never disturbs the
//!   inbound response that triggered it
//!
//! # Design Decisions
//! - One client per call, never reused; scenarios are short-lived and a
//!   shared pool would leak state between unrelated test runs
//! - Failures are logged at warn and the run continues with the next request

use std::time::Duration;

use crate::model::OutboundRequest;

const CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Run `requests` sequentially. Order within the batch is preserved; batches
/// belonging to different handlers run concurrently with no ordering
/// guarantee between them.
pub async fn run_requests(requests: Vec<OutboundRequest>) {
    for request in requests {
        run_one(&request).await;
    }
}

async fn run_one(request: &OutboundRequest) {
    let delay = request.request_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let spec = request.spec();
    let url = format!(
        "{}{}",
        request.target().trim_end_matches('/'),
        spec.path()
    );

    let client = match reqwest::Client::builder()
        .no_proxy()
        .timeout(CALL_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(%url, error = %err, "failed to build outbound client");
            return;
        }
    };

    let mut call = client.request(spec.method().clone(), &url);
    for (name, value) in spec.headers() {
        call = call.header(name, value);
    }
    if !spec.query_pairs().is_empty() {
        call = call.query(spec.query_pairs());
    }
    if !spec.body_bytes().is_empty() {
        call = call.body(spec.body_bytes().to_vec());
    }

    match call.send().await {
        Ok(response) => {
            tracing::trace!(%url, status = %response.status(), "outbound request delivered");
        }
        Err(err) => {
            tracing::warn!(%url, error = %err, "outbound request failed, continuing");
        }
    }
}

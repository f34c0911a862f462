//! Matching over the wire: mismatch diagnostics, templates, 404s.

use axum::http::StatusCode;
use httpstub::{Action, HttpMock, RequestSpec, ResponseSpec, ServiceConfig};
use serde_json::json;

mod common;

async fn error_text(response: reqwest::Response) -> String {
    response
        .json::<serde_json::Value>()
        .await
        .expect("error body")["error"]
        .as_str()
        .expect("error string")
        .to_string()
}

#[tokio::test]
async fn body_mismatch_is_400_and_does_not_consume_the_entry() {
    common::setup();
    let mut mock = HttpMock::new();
    let service = mock.new_service(
        ServiceConfig::named("bodies")
            .unique_url(true)
            .actions([Action::Response(
                ResponseSpec::for_request(
                    RequestSpec::post("/items").json(&json!({"name": "a"})),
                )
                .status(StatusCode::CREATED),
            )]),
    );
    mock.start().expect("start");

    let client = common::client();
    let url = format!("{}/items", service.url());

    let wrong = client
        .post(&url)
        .json(&json!({"name": "b"}))
        .send()
        .await
        .expect("wrong body");
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert!(error_text(wrong).await.contains("expected body"));

    // the mismatch did not advance the cursor
    let right = client
        .post(&url)
        .json(&json!({"name": "a"}))
        .send()
        .await
        .expect("right body");
    assert_eq!(right.status(), StatusCode::CREATED);

    mock.stop().expect("scenario complete");
}

#[tokio::test]
async fn missing_declared_header_is_400() {
    common::setup();
    let mut mock = HttpMock::new();
    let service = mock.new_service(
        ServiceConfig::named("headers")
            .unique_url(true)
            .actions([Action::Response(ResponseSpec::for_request(
                RequestSpec::get("/secure").header("x-token", "secret"),
            ))]),
    );
    mock.start().expect("start");

    let client = common::client();
    let url = format!("{}/secure", service.url());

    let bare = client.get(&url).send().await.expect("no header");
    assert_eq!(bare.status(), StatusCode::BAD_REQUEST);
    assert!(error_text(bare).await.contains("expected headers present"));

    // extra observed headers are fine; declared ones are a subset match
    let ok = client
        .get(&url)
        .header("x-token", "secret")
        .header("x-extra", "ignored")
        .send()
        .await
        .expect("with header");
    assert_eq!(ok.status(), StatusCode::OK);

    mock.stop().expect("scenario complete");
}

#[tokio::test]
async fn query_matching_is_a_set_comparison() {
    common::setup();
    let mut mock = HttpMock::new();
    let service = mock.new_service(
        ServiceConfig::named("queries")
            .unique_url(true)
            .actions([Action::Response(ResponseSpec::for_request(
                RequestSpec::get("/search").query("a", "1").query("a", "2"),
            ))]),
    );
    mock.start().expect("start");

    let client = common::client();
    let url = format!("{}/search", service.url());

    let partial = client
        .get(&url)
        .query(&[("a", "1")])
        .send()
        .await
        .expect("partial query");
    assert_eq!(partial.status(), StatusCode::BAD_REQUEST);
    assert!(error_text(partial).await.contains("expected query params"));

    // same multimap, different order
    let reordered = client
        .get(&url)
        .query(&[("a", "2"), ("a", "1")])
        .send()
        .await
        .expect("reordered query");
    assert_eq!(reordered.status(), StatusCode::OK);

    mock.stop().expect("scenario complete");
}

#[tokio::test]
async fn path_template_matches_concrete_segments() {
    common::setup();
    let mut mock = HttpMock::new();
    let service = mock.new_service(
        ServiceConfig::named("catalog")
            .unique_url(true)
            .actions([Action::Response(
                ResponseSpec::for_request(RequestSpec::get("/catalog/{id}"))
                    .json(&json!({"id": "42"})),
            )]),
    );
    mock.start().expect("start");

    let client = common::client();

    let hit = client
        .get(format!("{}/catalog/42", service.url()))
        .send()
        .await
        .expect("templated hit");
    assert_eq!(hit.status(), StatusCode::OK);

    // missing segment never reaches the handler
    let miss = client
        .get(format!("{}/catalog", service.url()))
        .send()
        .await
        .expect("missing segment");
    assert_eq!(miss.status(), StatusCode::NOT_FOUND);

    mock.stop().expect("scenario complete");
}

#[tokio::test]
async fn unknown_endpoint_names_method_and_path() {
    common::setup();
    let mut mock = HttpMock::new();
    let service = mock.new_service(
        ServiceConfig::named("known")
            .unique_url(true)
            .actions([Action::Response(ResponseSpec::for_request(
                RequestSpec::get("/known"),
            ))]),
    );
    mock.start().expect("start");

    let client = common::client();
    let response = client
        .get(format!("{}/nope", service.url()))
        .send()
        .await
        .expect("unknown endpoint");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let text = error_text(response).await;
    assert!(text.contains("GET"));
    assert!(text.contains("/nope"));

    // wrong method on a known path is also an unknown endpoint
    let wrong_method = client
        .delete(format!("{}/known", service.url()))
        .send()
        .await
        .expect("wrong method");
    assert_eq!(wrong_method.status(), StatusCode::NOT_FOUND);

    // consume the declared response so teardown is clean
    let ok = client
        .get(format!("{}/known", service.url()))
        .send()
        .await
        .expect("known endpoint");
    assert_eq!(ok.status(), StatusCode::OK);

    mock.stop().expect("scenario complete");
}

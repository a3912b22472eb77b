//! Integration tests for the reqwest transport using wiremock.
//!
//! The first group exercises the transport alone (headers, bodies, status
//! mapping, timeouts). The second drives a full `ApiClient` over the real
//! transport to check pagination and rate-limit handling on the wire.

use std::sync::Arc;
use std::time::Duration;

use dispatcher::ApiClient;
use http_transport::ReqwestTransport;
use protocol::{
    AuthHeader, ClientConfig, DispatchError, HttpMethod, HttpTransport, QueryParams, QueryValue,
    TransportError, TransportRequest,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_config(base_url: &str) -> ClientConfig {
    ClientConfig::parse(base_url)
        .unwrap()
        .with_auth(AuthHeader::bearer("test-token"))
}

fn create_transport(base_url: &str) -> ReqwestTransport {
    ReqwestTransport::new(&create_config(base_url)).unwrap()
}

fn create_client(base_url: &str) -> ApiClient {
    let config = create_config(base_url);
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    ApiClient::new(transport, &config).unwrap()
}

fn get(url: &str) -> TransportRequest {
    TransportRequest {
        method: HttpMethod::Get,
        url: url.to_string(),
        body: None,
    }
}

// =============================================================================
// Transport Tests
// =============================================================================

#[tokio::test]
async fn test_auth_header_and_json_body_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/widgets"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "name": "gear" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let response = create_transport(&server.uri())
        .execute(TransportRequest {
            method: HttpMethod::Post,
            url: "/widgets".into(),
            body: Some(json!({ "name": "gear" })),
        })
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.data, json!({ "id": 42 }));
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/widgets/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = create_transport(&server.uri())
        .execute(TransportRequest {
            method: HttpMethod::Delete,
            url: "/widgets/1".into(),
            body: None,
        })
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert_eq!(response.data, serde_json::Value::Null);
}

#[tokio::test]
async fn test_error_status_carries_headers_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "7")
                .set_body_json(json!({ "errors": ["slow down"] })),
        )
        .mount(&server)
        .await;

    let err = create_transport(&server.uri())
        .execute(get("/widgets"))
        .await
        .unwrap_err();

    match err {
        TransportError::Status {
            status,
            headers,
            body,
        } => {
            assert_eq!(status, 429);
            assert_eq!(headers.get("retry-after"), Some("7"));
            assert_eq!(body, Some(json!({ "errors": ["slow down"] })));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = create_config(&server.uri()).with_timeout(Duration::from_millis(100));
    let transport = ReqwestTransport::new(&config).unwrap();

    let err = transport.execute(get("/slow")).await.unwrap_err();

    assert_eq!(
        err,
        TransportError::Timeout {
            timeout: Duration::from_millis(100)
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    // Port 9 (discard) on localhost is closed in test environments.
    let transport = create_transport("http://127.0.0.1:9");

    let err = transport.execute(get("/anything")).await.unwrap_err();

    assert!(matches!(err, TransportError::Network { .. }));
    assert_eq!(err.status(), None);
}

// =============================================================================
// Client Tests
// =============================================================================

#[tokio::test]
async fn test_client_follows_link_header_pagination() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("ids[]", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 1 }]))
                .insert_header("Link", format!("<{base}/items/page/2>; rel=\"next\"").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items/page/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 2 }]))
                .insert_header(
                    "Link",
                    format!("<{base}/items/page/1>; rel=\"prev\", <{base}/items/page/3>; rel=\"next\"")
                        .as_str(),
                ),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items/page/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 3 }])))
        .expect(1)
        .mount(&server)
        .await;

    let query = QueryParams::new().with("ids", QueryValue::list([1]));
    let response = create_client(&base).get("/items", Some(query)).await.unwrap();

    assert_eq!(response.data, json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }]));
    assert_eq!(response.pages, 3);
}

#[tokio::test]
async fn test_client_follows_relative_link_under_base_path() {
    let server = MockServer::start().await;
    let base = format!("{}/v2", server.uri());

    // Mounted first so it wins over the unfiltered page-one mock below.
    Mock::given(method("GET"))
        .and(path("/v2/items"))
        .and(query_param("cursor", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["B"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["A"]))
                .insert_header("Link", "<items?cursor=2>; rel=\"next\""),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = create_client(&base).get("/items", None).await.unwrap();

    assert_eq!(response.data, json!(["A", "B"]));
    assert_eq!(response.pages, 2);
}

#[tokio::test]
async fn test_client_retries_after_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string("Too Many Requests")
                .insert_header("Retry-After", "0"),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "u1" }])))
        .mount(&server)
        .await;

    let response = create_client(&server.uri()).get("/users", None).await.unwrap();

    assert_eq!(response.data, json!([{ "id": "u1" }]));
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn test_client_does_not_retry_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/users/1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "errors": ["boom", "bang"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = create_client(&server.uri())
        .put("/users/1", json!({ "name": "x" }))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.errors(), vec!["boom", "bang"]);
}

#[tokio::test]
async fn test_client_fails_whole_chain_when_a_page_fails() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["e1"]))
                .insert_header("Link", format!("<{base}/events/page/2>; rel=\"next\"").as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/events/page/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = create_client(&base).get("/events", None).await.unwrap_err();

    assert!(matches!(err, DispatchError::Pagination { page: 2, .. }));
    assert_eq!(err.status_code(), Some(503));
}

//! Contract tests for the HTTP call executor.
//!
//! Verifies request construction (Basic auth, JSON headers, body) and the
//! error taxonomy against a wiremock server.

use catsync_client::{Credential, Executor, Method, PrismApiError, PrismConfig};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_executor(server: &MockServer) -> Executor {
    let cred = Credential::new("admin", "nutanix/4u").unwrap();
    let mut config =
        PrismConfig::with_base_url(&format!("{}/api/nutanix/v3/", server.uri()), cred).unwrap();
    config.timeout_secs = 5;
    Executor::new(&config).unwrap()
}

#[tokio::test]
async fn execute_sends_basic_auth_and_json_headers() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/nutanix/v3/categories/Web"))
        .and(basic_auth("admin", "nutanix/4u"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({"name": "Web"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Web",
            "system_defined": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let url = exec.url(&["categories", "Web"]).unwrap();
    let body = exec
        .execute(Method::PUT, url, Some(&json!({"name": "Web"})))
        .await
        .unwrap();
    assert_eq!(body["name"], "Web");
}

#[tokio::test]
async fn structured_error_becomes_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/nutanix/v3/vms/list"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "api_version": "3.1",
            "code": 400,
            "message_list": [{"details": "bad kind", "reason": "INVALID_REQUEST"}],
            "state": "ERROR"
        })))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let url = exec.url(&["vms", "list"]).unwrap();
    let err = exec
        .execute(Method::POST, url, Some(&json!({"kind": "nope"})))
        .await
        .unwrap_err();

    match &err {
        PrismApiError::Api {
            endpoint,
            code,
            message,
        } => {
            assert_eq!(endpoint, "POST vms/list");
            assert_eq!(*code, 400);
            assert!(message.contains("bad kind"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.to_string().contains("bad kind"));
}

#[tokio::test]
async fn plain_error_status_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nutanix/v3/tasks/abc"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let url = exec.url(&["tasks", "abc"]).unwrap();
    let err = exec.execute(Method::GET, url, None).await.unwrap_err();
    match err {
        PrismApiError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/nutanix/v3/categories/Web/Old"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let url = exec.url(&["categories", "Web", "Old"]).unwrap();
    let body = exec.execute(Method::DELETE, url, None).await.unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn non_json_success_body_is_deserialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nutanix/v3/clusters/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let url = exec.url(&["clusters", "x"]).unwrap();
    let err = exec.execute(Method::GET, url, None).await.unwrap_err();
    assert!(matches!(err, PrismApiError::Deserialization { .. }));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let cred = Credential::new("admin", "pw").unwrap();
    let mut config = PrismConfig::with_base_url("http://127.0.0.1:1/api/nutanix/v3/", cred).unwrap();
    config.timeout_secs = 2;
    let exec = Executor::new(&config).unwrap();

    let url = exec.url(&["categories", "list"]).unwrap();
    let err = exec
        .execute(Method::POST, url, Some(&json!({"kind": "category"})))
        .await
        .unwrap_err();
    match err {
        PrismApiError::Transport { endpoint, .. } => assert_eq!(endpoint, "POST categories/list"),
        other => panic!("expected Transport error, got {other:?}"),
    }
}

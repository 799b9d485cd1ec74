//! Mapping of HTTP failures to `ContractError` kinds.

mod common;

use common::*;
use contract_sdk::{ContractError, NewContract};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_validation_error_keeps_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Bad title",
            "code": "INVALID_TITLE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_contract(&NewContract::new("", "nda"))
        .await
        .unwrap_err();

    match err {
        ContractError::Validation {
            ref message,
            ref code,
            status_code,
            ..
        } => {
            assert_eq!(message, "Bad title");
            assert_eq!(code.as_deref(), Some("INVALID_TITLE"));
            assert_eq!(status_code, Some(400));
        }
        other => panic!("Expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_carries_details() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contracts/c-1/sign"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Contract already signed",
            "code": "ALREADY_SIGNED",
            "details": {"signedAt": "2026-10-01T09:00:00Z"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .sign_contract("c-1", &json!({"signature": "data:image/png;base64,AAAA"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ContractError::Api { status_code: 409, .. }));
    assert_eq!(err.code(), Some("ALREADY_SIGNED"));
    assert_eq!(err.details(), Some(&json!({"signedAt": "2026-10-01T09:00:00Z"})));
    assert!(err.to_string().contains("Contract already signed"));
}

#[tokio::test]
async fn test_validation_message_list_is_kept() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": ["title must not be empty"],
            "code": "VALIDATION"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_contract(&NewContract::new("", "nda"))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.message(), "title must not be empty");
    assert_eq!(err.code(), Some("VALIDATION"));
}

#[tokio::test]
async fn test_error_body_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/templates/t-1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"reason": "nope"})))
        .mount(&server)
        .await;

    let err = client_for(&server).get_template("t-1").await.unwrap_err();

    assert_eq!(err.status_code(), Some(403));
    assert_eq!(err.message(), "An error occurred");
    assert_eq!(err.code(), Some("UNKNOWN_ERROR"));
}

#[tokio::test]
async fn test_non_json_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/analytics/dashboard"))
        .respond_with(
            ResponseTemplate::new(502).set_body_string("<html><body>Bad Gateway</body></html>"),
        )
        .mount(&server)
        .await;

    let client = builder_for(&server)
        .retry_policy(fast_retry(0))
        .build()
        .unwrap();
    let err = client
        .dashboard_analytics(&Default::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some("HTTP_502"));
    assert_eq!(
        err.message(),
        "HTTP 502: <html><body>Bad Gateway</body></html>"
    );
    assert!(err.details().is_none());
}

#[tokio::test]
async fn test_empty_error_body_uses_status_line() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/templates/t-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server).delete_template("t-1").await.unwrap_err();

    assert_eq!(err.code(), Some("HTTP_404"));
    assert_eq!(err.message(), "HTTP 404: Not Found");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Missing credentials",
            "code": "UNAUTHENTICATED"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).current_user().await.unwrap_err();

    assert!(err.is_authentication());
    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "Authentication failed: Missing credentials");
}

#[tokio::test]
async fn test_success_with_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contracts/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_contract("c-1").await.unwrap_err();

    assert!(matches!(err, ContractError::MalformedResponse(_)), "got {err:?}");
    assert!(err.message().contains("maintenance"));
}

#[tokio::test]
async fn test_no_content_responses() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/contracts/c-1/comments/m-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contracts/c-1/approve"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete_comment("c-1", "m-1").await.unwrap();

    let approved = client.approve_contract("c-1", Some("ok")).await.unwrap();
    assert!(approved.is_null());
}

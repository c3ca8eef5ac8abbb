/// Directory client tests against a mocked Graph endpoint
mod common;

use chrono::{Duration, Utc};
use common::*;
use onboarding_verify::error::OnboardError;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use wiremock::{
    matchers::{bearer_token, body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const SSN: &str = "01017012345";

#[tokio::test]
async fn test_find_user_by_ssn_single_match() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(bearer_token("graph-token"))
        .and(header("ConsistencyLevel", "eventual"))
        .and(query_param("$count", "true"))
        .and(query_param(
            "$filter",
            "customSecurityAttributes/IDM/SSN eq '01017012345'",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users(vec![user("abc-123", "a.b@org.no", "A B")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let found = ctx.directory.find_user_by_ssn(SSN).await.unwrap();

    assert_eq!(found.id, "abc-123");
    assert_eq!(found.user_principal_name.as_deref(), Some("a.b@org.no"));
    assert_eq!(found.display_name.as_deref(), Some("A B"));
}

#[tokio::test]
async fn test_find_user_by_ssn_no_match() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(vec![])))
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx.directory.find_user_by_ssn(SSN).await.unwrap_err();

    assert!(matches!(err, OnboardError::UserNotFound(_)));
}

#[tokio::test]
async fn test_find_user_by_ssn_ambiguous() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(vec![
            user("u1", "one@org.no", "One"),
            user("u2", "two@org.no", "Two"),
        ])))
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx.directory.find_user_by_ssn(SSN).await.unwrap_err();

    assert!(matches!(err, OnboardError::AmbiguousUser(_)));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_find_user_by_registry_id_none() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param(
            "$filter",
            "customSecurityAttributes/IDM/RegistryId eq '98765'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let found = ctx.directory.find_user_by_registry_id("98765").await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn test_token_is_cached_between_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DIRECTORY_TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("graph-token")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(users(vec![user("u1", "a@org.no", "A")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    ctx.directory.find_user_by_ssn(SSN).await.unwrap();
    ctx.directory.find_user_by_ssn(SSN).await.unwrap();
}

#[tokio::test]
async fn test_token_refreshed_after_expiry_margin() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DIRECTORY_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("graph-token")))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(users(vec![user("u1", "a@org.no", "A")])),
        )
        .mount(&server)
        .await;

    let clock = Arc::new(TestClock::new(Utc::now()));
    let ctx = context_with_clock(&server, &[], clock.clone());

    ctx.directory.find_user_by_ssn(SSN).await.unwrap();
    // 3600s lifetime minus the 300s margin
    clock.advance(Duration::seconds(3299));
    ctx.directory.find_user_by_ssn(SSN).await.unwrap();
    clock.advance(Duration::seconds(2));
    ctx.directory.find_user_by_ssn(SSN).await.unwrap();
}

#[tokio::test]
async fn test_token_endpoint_failure_is_upstream_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DIRECTORY_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "bad secret"
        })))
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx.directory.find_user_by_ssn(SSN).await.unwrap_err();

    match err {
        OnboardError::UpstreamAuth { service, body, .. } => {
            assert_eq!(service, "directory");
            assert_eq!(body.unwrap()["error"], "invalid_client");
        }
        other => panic!("expected UpstreamAuth, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retries_transient_failure() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(users(vec![user("u1", "a@org.no", "A")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let found = ctx.directory.find_user_by_ssn(SSN).await.unwrap();

    assert_eq!(found.id, "u1");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": "Authorization_RequestDenied"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx.directory.find_user_by_ssn(SSN).await.unwrap_err();

    match err {
        OnboardError::UpstreamApi { status, body, .. } => {
            assert_eq!(status, 403);
            assert_eq!(body["error"]["code"], "Authorization_RequestDenied");
        }
        other => panic!("expected UpstreamApi, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_temporary_access_pass() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("POST"))
        .and(path(
            "/v1.0/users/u1/authentication/temporaryAccessPassMethods",
        ))
        .and(body_string_contains("\"lifetimeInMinutes\":480"))
        .and(body_string_contains("\"isUsableOnce\":false"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "tap-1",
            "temporaryAccessPass": "Xk#4-pass",
            "lifetimeInMinutes": 480,
            "isUsableOnce": false,
            "isUsable": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let pass = ctx.directory.create_temporary_access_pass("u1").await.unwrap();

    assert_eq!(pass.id, "tap-1");
    assert_eq!(pass.temporary_access_pass.as_deref(), Some("Xk#4-pass"));
    assert_eq!(pass.lifetime_in_minutes, Some(480));
}

#[tokio::test]
async fn test_delete_temporary_access_pass_without_existing_pass() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path(
            "/v1.0/users/u1/authentication/temporaryAccessPassMethods",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let status = ctx.directory.delete_temporary_access_pass("u1").await.unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_temporary_access_pass_deletes_first() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path(
            "/v1.0/users/u1/authentication/temporaryAccessPassMethods",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "tap-1"}, {"id": "tap-2"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(
            "/v1.0/users/u1/authentication/temporaryAccessPassMethods/tap-1",
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let status = ctx.directory.delete_temporary_access_pass("u1").await.unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_set_password_keeps_next_sign_in() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("PATCH"))
        .and(path("/v1.0/users/u1"))
        .and(body_string_contains("\"forceChangePasswordNextSignIn\":false"))
        .and(body_string_contains("\"password\":\"N3w-secret\""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let status = ctx.directory.set_password("u1", "N3w-secret").await.unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_passthrough_rejects_unknown_method() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DIRECTORY_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("graph-token")))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx
        .directory
        .request("DELETE", "v1.0/users/u1", None)
        .await
        .unwrap_err();

    assert!(matches!(err, OnboardError::InvalidMethod { .. }));
}

#[tokio::test]
async fn test_passthrough_returns_json_and_null_on_no_content() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/organization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "org-1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/v1.0/users/u1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);

    let org = ctx
        .directory
        .request("get", "/v1.0/organization", None)
        .await
        .unwrap();
    assert_eq!(org["value"][0]["id"], "org-1");

    let patched = ctx
        .directory
        .request("Patch", "v1.0/users/u1", Some(&json!({"displayName": "New"})))
        .await
        .unwrap();
    assert!(patched.is_null());
}

#[tokio::test]
async fn test_out_of_range_token_expiry_is_upstream_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DIRECTORY_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "graph-token",
            "expires_in": i64::MAX
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(vec![])))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx.directory.find_user_by_ssn(SSN).await.unwrap_err();

    assert!(matches!(err, OnboardError::UpstreamAuth { .. }));
}

#[tokio::test]
async fn test_create_temporary_access_pass_is_sent_once() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("POST"))
        .and(path(
            "/v1.0/users/u1/authentication/temporaryAccessPassMethods",
        ))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx
        .directory
        .create_temporary_access_pass("u1")
        .await
        .unwrap_err();

    assert!(matches!(err, OnboardError::UpstreamApi { status: 503, .. }));
}

#[tokio::test]
async fn test_set_password_is_sent_once() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("PATCH"))
        .and(path("/v1.0/users/u1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server, &[]);
    let err = ctx.directory.set_password("u1", "N3w-secret").await.unwrap_err();

    assert!(matches!(err, OnboardError::UpstreamApi { status: 502, .. }));
}

#[tokio::test]
async fn test_slow_directory_times_out_after_retries() {
    let server = MockServer::start().await;
    mount_directory_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users(vec![user("u1", "a@org.no", "A")]))
                .set_delay(StdDuration::from_secs(3)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let ctx = context_for(
        &server,
        &[("HTTP_TIMEOUT_SECS", "1"), ("HTTP_RETRY_MAX_ATTEMPTS", "2")],
    );
    let err = ctx.directory.find_user_by_ssn(SSN).await.unwrap_err();

    assert!(matches!(err, OnboardError::Timeout(ref service) if service == "directory"));
    assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
}

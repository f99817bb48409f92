//! Behavior tests for the Okta transport against a live HTTP server.
//!
//! These tests verify HOW the transport paginates, retries and reports
//! failures when talking to an Okta-shaped API over real HTTP.

use std::time::Duration;

use httpmock::prelude::*;
use oktaflow_tests::*;
use serde_json::json;

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn when_okta_sends_next_link_transport_follows_it_until_the_last_page() {
    // Given: Two pages of users chained by a Link header
    let server = MockServer::start();
    let next = format!("{}/api/v1/users?after=00u2", server.base_url());
    let first = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/v1/users")
            .query_param("limit", "200");
        then.status(200)
            .header("link", format!("<{next}>; rel=\"next\"").as_str())
            .json_body(json!([{ "id": "00u1" }, { "id": "00u2" }]));
    });
    let second = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/v1/users")
            .query_param("after", "00u2");
        then.status(200).json_body(json!([{ "id": "00u3" }]));
    });

    // When: All items are requested
    let users = mock_transport(&server)
        .request_all_items(&RequestSpec::get("/users"), None)
        .await
        .expect("pagination succeeds");

    // Then: Items from both pages arrive in order
    assert_eq!(users, vec![json!({ "id": "00u1" }), json!({ "id": "00u2" }), json!({ "id": "00u3" })]);
    first.assert();
    second.assert();
}

#[tokio::test]
async fn when_limit_is_reached_on_first_page_no_further_page_is_requested() {
    // Given: A first page already holding more items than wanted
    let server = MockServer::start();
    let next = format!("{}/api/v1/groups?after=00g3", server.base_url());
    server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/v1/groups")
            .query_param("limit", "200");
        then.status(200)
            .header("link", format!("<{next}>; rel=\"next\"").as_str())
            .json_body(json!([{ "id": "00g1" }, { "id": "00g2" }, { "id": "00g3" }]));
    });
    let second = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/v1/groups")
            .query_param("after", "00g3");
        then.status(200).json_body(json!([{ "id": "00g4" }]));
    });

    // When: Only two items are requested
    let groups = mock_transport(&server)
        .request_all_items(&RequestSpec::get("/groups"), Some(2))
        .await
        .expect("limited fetch succeeds");

    // Then: The result is truncated and the next page is never fetched
    assert_eq!(groups, vec![json!({ "id": "00g1" }), json!({ "id": "00g2" })]);
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn caller_supplied_page_size_is_kept() {
    // Given: A caller asking for pages of 25
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/v1/logs")
            .query_param("limit", "25")
            .query_param("sortOrder", "DESCENDING");
        then.status(200).json_body(json!([]));
    });

    // When: The log is fetched
    let spec = RequestSpec::get("/logs")
        .with_query("limit", "25")
        .with_query("sortOrder", "DESCENDING");
    let events = mock_transport(&server)
        .request_all_items(&spec, None)
        .await
        .expect("fetch succeeds");

    // Then: The page size is not overridden by the default
    assert!(events.is_empty());
    mock.assert();
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn api_token_is_sent_with_ssws_scheme() {
    // Given: An Okta endpoint requiring the SSWS token
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/v1/users/me")
            .header("authorization", format!("SSWS {API_TOKEN}").as_str())
            .header("accept", "application/json");
        then.status(200).json_body(json!({ "id": "00uMe" }));
    });

    // When: The credential is tested
    let me = mock_transport(&server).test_credential().await.expect("credential accepted");

    // Then: The caller's own user comes back
    assert_eq!(me, json!({ "id": "00uMe" }));
    mock.assert();
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn when_rate_limit_persists_transport_gives_up_after_max_attempts() {
    // Given: An endpoint that keeps answering 429 with an elapsed reset time
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::GET).path("/api/v1/apps");
        then.status(429)
            .header("x-rate-limit-reset", "0")
            .json_body(json!({ "errorCode": "E0000047", "errorSummary": "API call exceeded rate limit due to too many requests." }));
    });
    let transport = mock_transport(&server)
        .with_rate_limit_retry(RateLimitRetry::new(3, Duration::from_millis(10)));

    // When: A request is made
    let error = transport
        .request(&RequestSpec::get("/apps"))
        .await
        .expect_err("rate limit is never lifted");

    // Then: Three attempts were made and the normalized 429 is surfaced
    assert_eq!(mock.calls(), 3);
    assert_eq!(error.status_code(), Some(429));
    assert_eq!(error.message(), "API call exceeded rate limit");
    assert_eq!(error.error_code(), Some("E0000047"));
}

#[tokio::test]
async fn non_rate_limit_failures_are_not_retried() {
    // Given: An endpoint failing with 500
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::GET).path("/api/v1/zones");
        then.status(500).body("upstream exploded");
    });
    let transport = mock_transport(&server)
        .with_rate_limit_retry(RateLimitRetry::new(3, Duration::from_millis(10)));

    // When: A request is made
    let error = transport
        .request(&RequestSpec::get("/zones"))
        .await
        .expect_err("server error");

    // Then: The failure is returned on the first attempt, unchanged
    assert_eq!(mock.calls(), 1);
    assert!(matches!(error, OktaError::Transport(TransportError::Status(_))));
    assert_eq!(error.status_code(), Some(500));
}

// =============================================================================
// Error normalization
// =============================================================================

#[tokio::test]
async fn okta_error_payload_is_normalized_with_causes() {
    // Given: A validation failure with two causes
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::POST).path("/api/v1/groups");
        then.status(400).json_body(json!({
            "errorCode": "E0000001",
            "errorSummary": "Api validation failed: profile",
            "errorCauses": [
                { "errorSummary": "name: The field cannot be left blank" },
                { "errorSummary": "description: Too long" }
            ]
        }));
    });

    // When: The create call fails
    let error = mock_transport(&server)
        .request(&RequestSpec::post("/groups").with_body(json!({ "profile": {} })))
        .await
        .expect_err("validation fails");

    // Then: The error carries the known message, the causes and the code
    assert_eq!(error.message(), "API validation failed");
    assert_eq!(
        error.description(),
        Some("name: The field cannot be left blank, description: Too long")
    );
    assert_eq!(error.error_code(), Some("E0000001"));
    assert_eq!(error.status_code(), Some(400));
}

#[tokio::test]
async fn unknown_error_code_keeps_okta_summary() {
    // Given: An error code the adapter has no message for
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::DELETE).path("/api/v1/idps/0oa1");
        then.status(403).json_body(json!({
            "errorCode": "E0000999",
            "errorSummary": "Something specific went wrong"
        }));
    });

    // When: The call fails
    let error = mock_transport(&server)
        .request(&RequestSpec::delete("/idps/0oa1"))
        .await
        .expect_err("forbidden");

    // Then: Okta's own summary becomes the message
    assert_eq!(error.message(), "Something specific went wrong");
    assert_eq!(error.description(), None);
}

#[tokio::test]
async fn unreachable_org_is_a_connection_failure() {
    // Given: A credential pointing at a closed port
    let transport = OktaTransport::new(
        Credential::api_token("http://127.0.0.1:9", API_TOKEN),
        Arc::new(ReqwestHttpClient::new()),
    )
    .expect("credential is valid")
    .with_timeout_ms(2_000);

    // When: A request is made
    let error = transport
        .request(&RequestSpec::get("/users/me"))
        .await
        .expect_err("nothing listens there");

    // Then: The failure is reported as a transport error without a status
    assert!(matches!(error, OktaError::Transport(TransportError::Connection(_))));
    assert_eq!(error.status_code(), None);
}

#[tokio::test]
async fn empty_success_body_reads_as_null() {
    // Given: A lifecycle endpoint answering 204
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::POST).path("/api/v1/users/00u1/lifecycle/suspend");
        then.status(204);
    });

    // When: The user is suspended
    let body = mock_transport(&server)
        .request(&RequestSpec::post("/users/00u1/lifecycle/suspend"))
        .await
        .expect("suspend succeeds");

    // Then: The empty body is reported as null
    assert!(body.is_null());
}

//! Cancellation integration tests
//!
//! **Coverage:**
//! - Cancelling mid-attempt aborts the in-flight request
//! - A cancelled dispatch never moves on to the next server
//! - Cancellation surfaces as `Cancelled`, not as a network failure

#[path = "support.rs"]
mod support;

use std::time::Duration;

use casebook_client::{ApiError, ErrorKind};
use casebook_domain::ChatRequest;
use support::{client_for, seed_session};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn cancelling_mid_attempt_aborts_without_failing_over() {
    let slow = MockServer::start().await;
    let next = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(30))
                .set_body_json(serde_json::json!({ "session_id": "s1", "reply": "late" })),
        )
        .mount(&slow)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "session_id": "s1", "reply": "fast" })),
        )
        .expect(0)
        .mount(&next)
        .await;

    let (client, _) = client_for(&[&slow, &next], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    let cancel = CancellationToken::new();
    let request =
        ChatRequest { session_id: None, message: "summarize the lease".to_string() };

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    let err = client.send_chat(&request, Some(cancel)).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, ApiError::Cancelled));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn a_token_cancelled_up_front_never_sends_anything() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/messages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let request = ChatRequest { session_id: None, message: "anything".to_string() };
    let err = client.send_chat(&request, Some(cancel)).await.unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}

//! Authentication flow integration tests
//!
//! **Coverage:**
//! - Login installs and persists a credential pair
//! - A credential rejection on an auth endpoint never fails over
//! - Signup behaves like login (rejections are decisive)
//! - Logout clears memory and the persisted store
//! - Validation errors surface field messages from the response body

#[path = "support.rs"]
mod support;

use casebook_client::store::keys;
use casebook_client::{ApiError, CredentialStore, ErrorKind};
use casebook_domain::{LoginRequest, SignupRequest};
use support::{client_for, token_json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn login_installs_and_persists_the_credential_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(serde_json::json!({
            "email": "ada@example.com", "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a1", "r1")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&[&server], &[]);
    assert!(!client.is_authenticated().await);

    client
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .unwrap();

    assert!(client.is_authenticated().await);
    assert_eq!(store.get(keys::ACCESS_TOKEN).await.unwrap().as_deref(), Some("a1"));
    assert_eq!(store.get(keys::REFRESH_TOKEN).await.unwrap().as_deref(), Some("r1"));
    assert!(store.get(keys::EXPIRES_AT).await.unwrap().is_some());
}

#[tokio::test]
async fn rejected_credentials_never_fail_over_to_another_server() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "detail": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&first)
        .await;
    // The wrong password must not be replayed against the mirror.
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a", "r")))
        .expect(0)
        .mount(&second)
        .await;

    let (client, _) = client_for(&[&first, &second], &[]);
    let err = client
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthRequired);
    assert!(err.to_string().contains("Invalid credentials"), "got: {err}");
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn signup_logs_the_new_account_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_partial_json(serde_json::json!({ "full_name": "Ada Lovelace" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_json("a1", "r1")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    client
        .signup(&SignupRequest {
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
            full_name: "Ada Lovelace".to_string(),
        })
        .await
        .unwrap();

    assert!(client.is_authenticated().await);
}

#[tokio::test]
async fn duplicate_signup_surfaces_the_validation_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "detail": "Email already registered" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    let err = client
        .signup(&SignupRequest {
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
            full_name: "Ada Lovelace".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation { .. }));
    assert!(err.to_string().contains("Email already registered"), "got: {err}");
}

#[tokio::test]
async fn logout_clears_memory_and_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a1", "r1")))
        .mount(&server)
        .await;

    let (client, store) = client_for(&[&server], &[]);
    client
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .unwrap();
    assert!(client.is_authenticated().await);

    client.logout().await.unwrap();

    assert!(!client.is_authenticated().await);
    for key in keys::ALL {
        assert!(store.get(key).await.unwrap().is_none(), "{key} should be gone");
    }
}

#[tokio::test]
async fn structured_field_errors_are_joined_into_one_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "detail": [
                { "loc": ["body", "email"], "msg": "value is not a valid email address" },
                { "loc": ["body", "password"], "msg": "ensure this value has at least 8 characters" },
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    let err = client
        .signup(&SignupRequest {
            email: "nope".to_string(),
            password: "x".to_string(),
            full_name: "Ada".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation { .. }));
    let message = err.to_string();
    assert!(message.contains("valid email address"), "got: {message}");
    assert!(message.contains("at least 8 characters"), "got: {message}");
}

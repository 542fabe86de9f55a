//! Domain operation integration tests
//!
//! **Coverage:**
//! - Profile fetch caches the profile in the credential store
//! - Document export negotiates content via the `Accept` header
//! - Upload sends multipart form data
//! - Bookmark removal tolerates an empty 204 body
//! - Chat round-trips the session identifier

#[path = "support.rs"]
mod support;

use casebook_client::store::keys;
use casebook_client::CredentialStore;
use casebook_domain::{ChatRequest, DocumentFormat};
use support::{client_for, seed_session};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn profile_is_cached_beside_the_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "u1", "email": "ada@example.com", "full_name": "Ada Lovelace"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&[&server], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    let profile = client.profile().await.unwrap();
    assert_eq!(profile.email, "ada@example.com");

    let cached = store.get(keys::USER_PROFILE).await.unwrap().unwrap();
    assert!(cached.contains("ada@example.com"));
    assert_eq!(client.session().cached_profile().await.unwrap().unwrap(), profile);
}

#[tokio::test]
async fn export_negotiates_markdown_via_accept_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/doc-1"))
        .and(header("Accept", "text/markdown"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Smith v. Jones\n\nHeld: ..."))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    let markdown = client.export_document("doc-1", DocumentFormat::Markdown).await.unwrap();
    assert!(markdown.starts_with("# Smith v. Jones"));
}

#[tokio::test]
async fn upload_sends_multipart_form_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "doc-9", "file_name": "brief.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    let receipt = client
        .upload_document("brief.pdf", b"%PDF-1.7 ...".to_vec(), "application/pdf")
        .await
        .unwrap();
    assert_eq!(receipt.id, "doc-9");
    assert_eq!(receipt.file_name, "brief.pdf");
}

#[tokio::test]
async fn bookmark_removal_accepts_an_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/bookmarks/b1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    client.remove_bookmark("b1").await.unwrap();
}

#[tokio::test]
async fn adding_a_bookmark_posts_the_document_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bookmarks"))
        .and(body_partial_json(serde_json::json!({ "document_id": "doc-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "b1", "document_id": "doc-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    let bookmark = client.add_bookmark("doc-1").await.unwrap();
    assert_eq!(bookmark.id, "b1");
}

#[tokio::test]
async fn chat_round_trips_the_session_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/messages"))
        .and(body_partial_json(serde_json::json!({
            "session_id": "s7", "message": "what did the court hold?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "s7", "reply": "The court held for the appellant."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&[&server], &[]);
    seed_session(&client, "tok", Some("ref")).await;

    let request = ChatRequest {
        session_id: Some("s7".to_string()),
        message: "what did the court hold?".to_string(),
    };
    let reply = client.send_chat(&request, None).await.unwrap();
    assert_eq!(reply.session_id, "s7");
    assert_eq!(reply.reply, "The court held for the appellant.");
}

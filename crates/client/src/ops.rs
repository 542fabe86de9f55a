//! Domain operation catalog
//!
//! Every named operation is declarative metadata (method, path template,
//! endpoint class) funneled through one generic invoke path, instead of
//! hand-built call sites repeating header and path logic.

use casebook_domain::{
    Bookmark, BookmarkRequest, ChatReply, ChatRequest, DocumentDetail, DocumentFormat,
    DocumentSummary, LoginRequest, SignupRequest, TokenResponse, UploadReceipt, UserProfile,
};
use reqwest::Method;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::dispatch::{EndpointClass, RequestBody, RequestSpec};
use crate::errors::ApiError;

/// One entry in the operation catalog.
#[derive(Debug, Clone)]
pub struct OperationDef {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub class: EndpointClass,
}

impl OperationDef {
    /// Materialize a request spec, substituting `{param}` path segments.
    pub fn spec(&self, args: &[(&str, &str)]) -> Result<RequestSpec, ApiError> {
        Ok(RequestSpec::new(self.method.clone(), render_path(self.path, args)?, self.class))
    }
}

fn render_path(template: &str, args: &[(&str, &str)]) -> Result<String, ApiError> {
    let mut path = template.to_string();
    for (name, value) in args {
        path = path.replace(&format!("{{{name}}}"), value);
    }
    if path.contains('{') {
        return Err(ApiError::Config(format!("unresolved parameter in path template {template}")));
    }
    Ok(path)
}

pub const LOGIN: OperationDef =
    OperationDef { name: "login", method: Method::POST, path: "/auth/login", class: EndpointClass::Auth };
pub const SIGNUP: OperationDef =
    OperationDef { name: "signup", method: Method::POST, path: "/auth/signup", class: EndpointClass::Auth };
pub const REFRESH: OperationDef =
    OperationDef { name: "refresh", method: Method::POST, path: "/auth/refresh", class: EndpointClass::Auth };
pub const PROFILE: OperationDef =
    OperationDef { name: "profile", method: Method::GET, path: "/users/me", class: EndpointClass::Generic };
pub const LIST_DOCUMENTS: OperationDef =
    OperationDef { name: "list_documents", method: Method::GET, path: "/documents", class: EndpointClass::Generic };
pub const GET_DOCUMENT: OperationDef =
    OperationDef { name: "get_document", method: Method::GET, path: "/documents/{id}", class: EndpointClass::Generic };
pub const UPLOAD_DOCUMENT: OperationDef =
    OperationDef { name: "upload_document", method: Method::POST, path: "/documents", class: EndpointClass::Generic };
pub const LIST_BOOKMARKS: OperationDef =
    OperationDef { name: "list_bookmarks", method: Method::GET, path: "/bookmarks", class: EndpointClass::Generic };
pub const ADD_BOOKMARK: OperationDef =
    OperationDef { name: "add_bookmark", method: Method::POST, path: "/bookmarks", class: EndpointClass::Generic };
pub const REMOVE_BOOKMARK: OperationDef = OperationDef {
    name: "remove_bookmark",
    method: Method::DELETE,
    path: "/bookmarks/{id}",
    class: EndpointClass::Generic,
};
pub const SEND_CHAT: OperationDef =
    OperationDef { name: "send_chat", method: Method::POST, path: "/chat/messages", class: EndpointClass::Generic };

impl ApiClient {
    /// Authenticate with email and password, installing the returned
    /// credential pair.
    pub async fn login(&self, request: &LoginRequest) -> Result<(), ApiError> {
        let response: TokenResponse =
            self.invoke(&LOGIN, &[], RequestBody::Json(json!(request)), None).await?;
        self.session().install(&response).await?;
        Ok(())
    }

    /// Create an account; the server logs the new user straight in.
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        let response: TokenResponse =
            self.invoke(&SIGNUP, &[], RequestBody::Json(json!(request)), None).await?;
        self.session().install(&response).await?;
        Ok(())
    }

    /// Drop the session: in-memory pair and every persisted entry.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.session().clear().await
    }

    /// Fetch the user profile and cache it beside the credentials.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.invoke(&PROFILE, &[], RequestBody::Empty, None).await?;
        self.session().cache_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn documents(&self) -> Result<Vec<DocumentSummary>, ApiError> {
        self.invoke(&LIST_DOCUMENTS, &[], RequestBody::Empty, None).await
    }

    pub async fn document(&self, id: &str) -> Result<DocumentDetail, ApiError> {
        self.invoke(&GET_DOCUMENT, &[("id", id)], RequestBody::Empty, None).await
    }

    /// Fetch a document in a non-JSON representation via content
    /// negotiation. JSON format callers should use [`Self::document`].
    pub async fn export_document(
        &self,
        id: &str,
        format: DocumentFormat,
    ) -> Result<String, ApiError> {
        match format.accept_header() {
            Some(accept) => self.invoke_text(&GET_DOCUMENT, &[("id", id)], accept).await,
            None => Ok(self.document(id).await?.content),
        }
    }

    pub async fn upload_document(
        &self,
        file_name: &str,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<UploadReceipt, ApiError> {
        let body = RequestBody::Multipart {
            field_name: "file".to_string(),
            file_name: file_name.to_string(),
            content,
            mime_type: mime_type.to_string(),
        };
        self.invoke(&UPLOAD_DOCUMENT, &[], body, None).await
    }

    pub async fn bookmarks(&self) -> Result<Vec<Bookmark>, ApiError> {
        self.invoke(&LIST_BOOKMARKS, &[], RequestBody::Empty, None).await
    }

    pub async fn add_bookmark(&self, document_id: &str) -> Result<Bookmark, ApiError> {
        let request = BookmarkRequest { document_id: document_id.to_string() };
        let body = RequestBody::Json(json!(request));
        self.invoke(&ADD_BOOKMARK, &[], body, None).await
    }

    pub async fn remove_bookmark(&self, id: &str) -> Result<(), ApiError> {
        self.invoke(&REMOVE_BOOKMARK, &[("id", id)], RequestBody::Empty, None).await
    }

    /// Send a chat message. Long-running; the caller may cancel the
    /// whole dispatch through `cancel`.
    pub async fn send_chat(
        &self,
        request: &ChatRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<ChatReply, ApiError> {
        let body = RequestBody::Json(json!(request));
        self.invoke(&SEND_CHAT, &[], body, cancel).await
    }
}

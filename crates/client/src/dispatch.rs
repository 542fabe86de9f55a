//! Failover dispatcher
//!
//! Executes one logical request against the server registry with
//! deterministic, policy-driven failover: primary descriptors in registry
//! order, then the fallback addresses, one attempt at a time. The first
//! decisive outcome wins; transport failures move on to the next server.
//!
//! The most important property here: an auth-endpoint credential
//! rejection is never retried against another server. Retrying a bad
//! password elsewhere wastes time and can mask account-lockout semantics.

use std::time::Duration;

use casebook_domain::constants::{TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE};
use casebook_domain::ClientConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ApiError;
use crate::registry::ServerRegistry;

/// Failover policy tag for a request.
///
/// Auth endpoints treat 400/401/403 as credential rejections (decisive);
/// generic endpoints only stop early on 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    Auth,
    Generic,
}

/// Owned request body, rebuilt for every failover attempt.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart { field_name: String, file_name: String, content: Vec<u8>, mime_type: String },
}

/// One logical request. Constructed per call, never persisted.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub class: EndpointClass,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub cancel: Option<CancellationToken>,
    /// Per-attempt timeout override; defaults come from configuration.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>, class: EndpointClass) -> Self {
        Self {
            method,
            path: path.into(),
            class,
            headers: Vec::new(),
            body: RequestBody::Empty,
            cancel: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Completed response from whichever server answered.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    /// Identifier of the serving descriptor; `None` for fallback
    /// addresses. Observability, not correctness.
    pub server_id: Option<String>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Unknown {
            message: format!("failed to parse response body: {e}"),
            status: Some(self.status.as_u16()),
        })
    }
}

/// What a received status means for the failover loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDisposition {
    /// 2xx - stick to this server and return.
    Success,
    /// Stop failover and surface this response as the outcome.
    Decisive,
    /// This server is unhealthy for this request; try the next one.
    NextServer,
}

/// Explicit retryable-vs-decisive classification, kept out of the
/// dispatch loop so new status codes can be classified in one place.
pub fn classify_status(class: EndpointClass, status: StatusCode) -> StatusDisposition {
    if status.is_success() {
        return StatusDisposition::Success;
    }
    match class {
        // Credential rejection, not a server outage
        EndpointClass::Auth if matches!(status.as_u16(), 400 | 401 | 403) => {
            StatusDisposition::Decisive
        }
        // A protected resource rejecting the token is a token problem,
        // not an availability problem
        EndpointClass::Generic if status == StatusCode::UNAUTHORIZED => {
            StatusDisposition::Decisive
        }
        _ => StatusDisposition::NextServer,
    }
}

/// Last-known-good endpoint, written only after a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveServer {
    pub server_id: Option<String>,
    pub base_address: String,
}

enum Attempt {
    Response { status: StatusCode, body: Vec<u8> },
    Unreachable(String),
}

pub struct FailoverDispatcher {
    http: Client,
    registry: ServerRegistry,
    active: RwLock<Option<ActiveServer>>,
    primary_timeout: Duration,
    fallback_timeout: Duration,
}

impl FailoverDispatcher {
    pub fn new(registry: ServerRegistry, config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(TUNNEL_BYPASS_HEADER, HeaderValue::from_static(TUNNEL_BYPASS_VALUE));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            registry,
            active: RwLock::new(None),
            primary_timeout: Duration::from_secs(config.primary_timeout_secs),
            fallback_timeout: Duration::from_secs(config.fallback_timeout_secs),
        })
    }

    /// The endpoint that served the last successful dispatch, if any.
    pub async fn active_server(&self) -> Option<ActiveServer> {
        self.active.read().await.clone()
    }

    /// Execute one logical request across the registry.
    pub async fn dispatch(&self, spec: &RequestSpec) -> Result<RawResponse, ApiError> {
        let mut transport_failures: Vec<String> = Vec::new();
        let mut last_retryable: Option<RawResponse> = None;

        let primary_timeout = spec.timeout.unwrap_or(self.primary_timeout);
        for descriptor in self.registry.primary() {
            check_cancelled(spec)?;
            match self.attempt(&descriptor.base_address, spec, primary_timeout).await? {
                Attempt::Response { status, body } => {
                    let raw =
                        RawResponse { status, body, server_id: Some(descriptor.id.clone()) };
                    match classify_status(spec.class, status) {
                        StatusDisposition::Success => {
                            self.mark_active(Some(&descriptor.id), &descriptor.base_address)
                                .await;
                            debug!(server = %descriptor.id, %status, "dispatch succeeded");
                            return Ok(raw);
                        }
                        StatusDisposition::Decisive => {
                            debug!(server = %descriptor.id, %status, "decisive response; stopping failover");
                            return Ok(raw);
                        }
                        StatusDisposition::NextServer => {
                            warn!(server = %descriptor.id, %status, "server unhealthy for this request; trying next");
                            last_retryable = Some(raw);
                        }
                    }
                }
                Attempt::Unreachable(message) => {
                    warn!(server = %descriptor.id, error = %message, "server unreachable");
                    transport_failures.push(message);
                }
            }
        }

        let fallback_timeout = spec.timeout.unwrap_or(self.fallback_timeout);
        for address in self.registry.fallback() {
            check_cancelled(spec)?;
            match self.attempt(address, spec, fallback_timeout).await? {
                Attempt::Response { status, body } => {
                    let raw = RawResponse { status, body, server_id: None };
                    match classify_status(spec.class, status) {
                        StatusDisposition::Success => {
                            self.mark_active(None, address).await;
                            info!(%address, %status, "dispatch succeeded via fallback address");
                            return Ok(raw);
                        }
                        StatusDisposition::Decisive => return Ok(raw),
                        StatusDisposition::NextServer => {
                            warn!(%address, %status, "fallback unhealthy for this request");
                            last_retryable = Some(raw);
                        }
                    }
                }
                Attempt::Unreachable(message) => {
                    warn!(%address, error = %message, "fallback unreachable");
                    transport_failures.push(message);
                }
            }
        }

        // Every server answered, none decisively: surface the last
        // response rather than pretending the network was down.
        if let Some(raw) = last_retryable {
            return Ok(raw);
        }

        let detail = transport_failures
            .last()
            .map(|m| format!(" (last failure: {m})"))
            .unwrap_or_default();
        Err(ApiError::Network(format!(
            "could not establish connectivity to any configured server{detail}"
        )))
    }

    async fn attempt(
        &self,
        base_address: &str,
        spec: &RequestSpec,
        timeout: Duration,
    ) -> Result<Attempt, ApiError> {
        let url = absolute_url(base_address, &spec.path);
        debug!(%url, method = %spec.method, "attempting request");

        let request = self.build_request(&url, spec)?;
        let send = async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>((status, body))
        };

        let outcome = match &spec.cancel {
            Some(cancel) => tokio::select! {
                () = cancel.cancelled() => return Err(ApiError::Cancelled),
                outcome = tokio::time::timeout(timeout, send) => outcome,
            },
            None => tokio::time::timeout(timeout, send).await,
        };

        match outcome {
            Ok(Ok((status, body))) => Ok(Attempt::Response { status, body }),
            Ok(Err(e)) => Ok(Attempt::Unreachable(format!("{url}: {e}"))),
            Err(_) => Ok(Attempt::Unreachable(format!(
                "{url}: no response within {}s",
                timeout.as_secs()
            ))),
        }
    }

    fn build_request(&self, url: &str, spec: &RequestSpec) -> Result<RequestBuilder, ApiError> {
        let mut request = self.http.request(spec.method.clone(), url);
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }
        request = match &spec.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart { field_name, file_name, content, mime_type } => {
                let part = reqwest::multipart::Part::bytes(content.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime_type)
                    .map_err(|e| ApiError::Config(format!("invalid mime type {mime_type}: {e}")))?;
                request.multipart(reqwest::multipart::Form::new().part(field_name.clone(), part))
            }
        };
        Ok(request)
    }

    async fn mark_active(&self, server_id: Option<&str>, base_address: &str) {
        *self.active.write().await = Some(ActiveServer {
            server_id: server_id.map(str::to_string),
            base_address: base_address.to_string(),
        });
    }
}

fn check_cancelled(spec: &RequestSpec) -> Result<(), ApiError> {
    if spec.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
        return Err(ApiError::Cancelled);
    }
    Ok(())
}

fn absolute_url(base_address: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}{path}", base_address.trim_end_matches('/'))
}

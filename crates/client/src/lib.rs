//! # Casebook Client
//!
//! Data-access layer for the Casebook legal-research application.
//!
//! This crate contains:
//! - Multi-endpoint failover dispatch with tunnel fallbacks
//! - Session management (token lifecycle, persisted credentials)
//! - Response normalization into typed errors
//! - The declarative domain-operation catalog
//!
//! ## Architecture
//! - DTOs and configuration live in `casebook-domain`
//! - [`ApiClient`] is the single entry point; every domain operation
//!   funnels through its failover and 401-recovery path

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod normalize;
pub mod ops;
pub mod registry;
pub mod store;

// Re-export commonly used items
pub use auth::{Clock, CredentialPair, RefreshClient, SessionManager, SystemClock};
pub use client::{ApiClient, ApiClientBuilder};
pub use dispatch::{
    ActiveServer, EndpointClass, FailoverDispatcher, RawResponse, RequestBody, RequestSpec,
};
pub use errors::{ApiError, ErrorKind};
pub use registry::ServerRegistry;
pub use store::{CredentialStore, KeyringStore, MemoryStore};

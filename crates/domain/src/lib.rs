//! # Casebook Domain
//!
//! Domain types and configuration for the casebook data-access client.
//!
//! This crate contains:
//! - Request/response types for the legal-research API (auth, documents,
//!   bookmarks, chat)
//! - Client configuration structures (server registry, timeouts, credential
//!   windows)
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other casebook crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod types;

// Re-export commonly used items
pub use config::{ClientConfig, ServerDescriptor};
pub use types::auth::{LoginRequest, SignupRequest, TokenResponse, UserProfile};
pub use types::bookmarks::{Bookmark, BookmarkRequest};
pub use types::chat::{ChatReply, ChatRequest};
pub use types::documents::{DocumentDetail, DocumentFormat, DocumentSummary, UploadReceipt};

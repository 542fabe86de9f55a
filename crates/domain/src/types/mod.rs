//! Request/response types carried by the data-access client.
//!
//! These are the payload shapes of the domain operation set; the client
//! core treats them as opaque serde types.

pub mod auth;
pub mod bookmarks;
pub mod chat;
pub mod documents;

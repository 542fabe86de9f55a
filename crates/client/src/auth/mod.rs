//! Credential lifecycle
//!
//! Owns the access/refresh pair: buffered expiry checks, the single
//! refresh protocol, and clearing. The session manager is the only writer
//! of the persisted credential store.

mod clock;
mod credentials;
mod session;

pub use clock::{Clock, SystemClock};
pub use credentials::CredentialPair;
pub use session::{RefreshClient, SessionManager};

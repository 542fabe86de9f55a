//! Server registry
//!
//! An ordered, immutable sequence of candidate servers. Primary
//! descriptors are tried in registry order; plain fallback addresses are
//! only consulted after every primary has failed.

use casebook_domain::{ClientConfig, ServerDescriptor};
use url::Url;

use crate::errors::ApiError;

/// Ordered registry of candidate endpoints. Configuration, not state:
/// there are no mutation operations.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    primary: Vec<ServerDescriptor>,
    fallback: Vec<String>,
}

impl ServerRegistry {
    /// Build a registry, validating descriptor ids and base addresses.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the primary list is empty, an id is
    /// duplicated, or a base address is not a valid absolute URL.
    pub fn new(primary: Vec<ServerDescriptor>, fallback: Vec<String>) -> Result<Self, ApiError> {
        if primary.is_empty() {
            return Err(ApiError::Config("server registry requires at least one primary".into()));
        }

        for (index, descriptor) in primary.iter().enumerate() {
            if primary[..index].iter().any(|d| d.id == descriptor.id) {
                return Err(ApiError::Config(format!(
                    "duplicate server id in registry: {}",
                    descriptor.id
                )));
            }
            validate_address(&descriptor.base_address)?;
        }
        for address in &fallback {
            validate_address(address)?;
        }

        Ok(Self { primary, fallback })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.servers.clone(), config.fallback_addresses.clone())
    }

    /// Primary descriptors in failover-priority order.
    pub fn primary(&self) -> &[ServerDescriptor] {
        &self.primary
    }

    /// Lower-trust fallback addresses, no identifier tracking.
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }
}

fn validate_address(address: &str) -> Result<(), ApiError> {
    let url = Url::parse(address)
        .map_err(|e| ApiError::Config(format!("invalid server address {address}: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ApiError::Config(format!("unsupported scheme in server address {address}")));
    }
    Ok(())
}

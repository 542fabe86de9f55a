//! Configuration loader
//!
//! Loads client configuration from a file, then applies environment
//! overrides. Every field has a default, so a missing file yields the
//! built-in server roster rather than an error.
//!
//! ## Environment Variables
//! - `CASEBOOK_CONFIG`: Explicit path to a config file
//! - `CASEBOOK_PRIMARY_TIMEOUT_SECS`: Per-attempt timeout for primary servers
//! - `CASEBOOK_FALLBACK_TIMEOUT_SECS`: Per-attempt timeout for fallback addresses
//! - `CASEBOOK_REFRESH_BUFFER_SECS`: Expiry buffer applied before refresh
//! - `CASEBOOK_FALLBACK_ADDRESSES`: Comma-separated fallback base addresses
//! - `CASEBOOK_CREDENTIAL_SERVICE`: OS keyring service name
//!
//! ## File Locations
//! When `CASEBOOK_CONFIG` is unset the loader probes (in order):
//! 1. `./casebook.toml` or `./casebook.json`
//! 2. `./config.toml` or `./config.json`

use std::path::{Path, PathBuf};

use casebook_domain::ClientConfig;

use crate::errors::ApiError;

/// Load configuration with automatic fallback strategy.
///
/// Reads the file named by `CASEBOOK_CONFIG`, or the first probed
/// candidate, or falls back to [`ClientConfig::default`]. Environment
/// overrides are applied last either way.
///
/// # Errors
/// Returns `ApiError::Config` if an explicitly named file is missing or
/// malformed, or if an override variable fails to parse.
pub fn load() -> Result<ClientConfig, ApiError> {
    let mut config = match std::env::var("CASEBOOK_CONFIG") {
        Ok(path) => load_from_file(PathBuf::from(path))?,
        Err(_) => match probe_config_paths() {
            Some(path) => load_from_file(path)?,
            None => {
                tracing::debug!("no config file found, using built-in defaults");
                ClientConfig::default()
            }
        },
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a specific file.
///
/// Format is detected by extension (`.toml` or `.json`).
///
/// # Errors
/// Returns `ApiError::Config` if the file is missing, unreadable, or
/// fails to parse.
pub fn load_from_file(path: PathBuf) -> Result<ClientConfig, ApiError> {
    if !path.exists() {
        return Err(ApiError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| ApiError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &path)
}

fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig, ApiError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ApiError::Config(format!("Unsupported config format: {}", extension))),
    }
}

fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let candidates = [
        cwd.join("casebook.toml"),
        cwd.join("casebook.json"),
        cwd.join("config.toml"),
        cwd.join("config.json"),
    ];
    candidates.into_iter().find(|path| path.exists())
}

fn apply_env_overrides(config: &mut ClientConfig) -> Result<(), ApiError> {
    if let Some(secs) = env_u64("CASEBOOK_PRIMARY_TIMEOUT_SECS")? {
        config.primary_timeout_secs = secs;
    }
    if let Some(secs) = env_u64("CASEBOOK_FALLBACK_TIMEOUT_SECS")? {
        config.fallback_timeout_secs = secs;
    }
    if let Some(secs) = env_i64("CASEBOOK_REFRESH_BUFFER_SECS")? {
        config.refresh_buffer_secs = secs;
    }
    if let Ok(addresses) = std::env::var("CASEBOOK_FALLBACK_ADDRESSES") {
        config.fallback_addresses = addresses
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Ok(service) = std::env::var("CASEBOOK_CREDENTIAL_SERVICE") {
        config.credential_service = service;
    }
    Ok(())
}

fn env_u64(name: &str) -> Result<Option<u64>, ApiError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ApiError::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

fn env_i64(name: &str) -> Result<Option<i64>, ApiError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|e| ApiError::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

//! Secret handling utilities.
//!
//! Credentials (database URL, place-search API keys) are read straight into
//! `SecretString` so they never sit in a plain `String` field.

pub use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Read a required secret from the environment.
pub fn required_secret(name: &str) -> Result<SecretString> {
    std::env::var(name)
        .map(SecretString::from)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

/// Read an optional secret. Unset and blank values are both `None`.
pub fn optional_secret(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// `true` when both halves of a key pair are configured.
pub fn pair_configured(id: &Option<SecretString>, secret: &Option<SecretString>) -> bool {
    matches!((id, secret), (Some(id), Some(secret))
        if !id.expose_secret().is_empty() && !secret.expose_secret().is_empty())
}

//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. Sensitive values are wrapped in `SecretString`.

pub mod secrets;

use crate::category::CategoryCatalog;
use crate::error::{Error, Result};
use crate::timeline::DEFAULT_GALLERY_COLUMNS;
use secrets::{SecretString, optional_secret, required_secret};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    /// Root directory of the image store.
    pub storage_dir: PathBuf,
    /// Prefix for public image URLs.
    pub storage_public_url: String,
    pub naver_client_id: Option<SecretString>,
    pub naver_client_secret: Option<SecretString>,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub gallery_columns: usize,
    pub search_debounce: Duration,
    pub categories_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let storage_dir =
            PathBuf::from(optional_var("STORAGE_DIR").unwrap_or_else(|| "./storage".to_string()));
        let storage_public_url = optional_var("STORAGE_PUBLIC_URL")
            .unwrap_or_else(|| format!("file://{}", storage_dir.display()));

        let gallery_columns = parsed_var("GALLERY_COLUMNS", DEFAULT_GALLERY_COLUMNS)?;
        if gallery_columns == 0 {
            return Err(Error::Config("GALLERY_COLUMNS must be at least 1".to_string()));
        }

        Ok(Self {
            database_url: required_secret("DATABASE_URL")?,
            storage_dir,
            storage_public_url,
            naver_client_id: optional_secret("NAVER_CLIENT_ID"),
            naver_client_secret: optional_secret("NAVER_CLIENT_SECRET"),
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            gallery_columns,
            search_debounce: Duration::from_millis(parsed_var("SEARCH_DEBOUNCE_MS", 300)?),
            categories_file: optional_var("CATEGORIES_FILE").map(PathBuf::from),
        })
    }

    /// The category catalog: the configured file, or the built-in one.
    pub fn category_catalog(&self) -> Result<CategoryCatalog> {
        match self.categories_file {
            Some(ref path) => CategoryCatalog::load_from_file(path),
            None => Ok(CategoryCatalog::builtin()),
        }
    }

    /// Whether place search has both Naver credentials.
    pub fn place_search_enabled(&self) -> bool {
        secrets::pair_configured(&self.naver_client_id, &self.naver_client_secret)
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{name}={raw} is invalid: {e}"))),
        None => Ok(default),
    }
}

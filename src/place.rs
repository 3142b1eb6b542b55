//! Place search for the "where was this?" picker.
//!
//! The provider returns titles with highlight markup (`<b>…</b>`) and HTML
//! entities, and coordinates in its own planar grid. Candidates are cleaned
//! up here and their coordinates resolved through [`crate::geo`].

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geo::{RawCoord, convert_katech};
use crate::model::GeoPoint;

/// Maximum number of candidates returned per query.
pub const MAX_CANDIDATES: usize = 5;

const NAVER_LOCAL_ENDPOINT: &str = "https://openapi.naver.com/v1/search/local.json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A selectable search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub title: String,
    pub address: String,
    pub category: String,
    /// `None` when the provider's coordinates could not be converted.
    pub point: Option<GeoPoint>,
}

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Place>>;
}

// ---------------------------------------------------------------------------
// Text cleanup
// ---------------------------------------------------------------------------

fn tag_pattern() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").ok()).as_ref()
}

/// Remove markup tags and decode the common HTML entities.
pub fn strip_markup(text: &str) -> String {
    let without_tags = match tag_pattern() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    };
    without_tags
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Naver local search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LocalResponse {
    #[serde(default)]
    items: Vec<LocalItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalItem {
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    road_address: String,
    mapx: Option<RawCoord>,
    mapy: Option<RawCoord>,
}

impl LocalItem {
    fn into_place(self) -> Place {
        let point = match (self.mapx, self.mapy) {
            (Some(x), Some(y)) => {
                let conversion = convert_katech(x, y);
                if !conversion.is_ok() {
                    debug!(title = %self.title, status = ?conversion.status, "place has no usable point");
                }
                conversion.ok()
            }
            _ => None,
        };
        let address = if self.road_address.trim().is_empty() {
            self.address
        } else {
            self.road_address
        };
        Place {
            title: strip_markup(&self.title),
            address: strip_markup(&address),
            category: strip_markup(&self.category),
            point,
        }
    }
}

/// Parse a local-search response body into at most [`MAX_CANDIDATES`] places.
pub fn parse_local_response(body: &str) -> Result<Vec<Place>> {
    let response: LocalResponse = serde_json::from_str(body)
        .map_err(|e| Error::Remote(format!("unexpected place search response: {e}")))?;
    Ok(response
        .items
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(LocalItem::into_place)
        .collect())
}

/// Client for the Naver local-search API.
pub struct NaverLocalSearch {
    client: reqwest::Client,
    endpoint: String,
    client_id: SecretString,
    client_secret: SecretString,
}

impl NaverLocalSearch {
    pub fn new(client_id: SecretString, client_secret: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: NAVER_LOCAL_ENDPOINT.to_string(),
            client_id,
            client_secret,
        })
    }

    /// Build from configuration. Both credentials must be set.
    pub fn from_config(config: &Config) -> Result<Self> {
        match (&config.naver_client_id, &config.naver_client_secret) {
            (Some(id), Some(secret)) if config.place_search_enabled() => {
                Self::new(id.clone(), secret.clone())
            }
            _ => Err(Error::Config(
                "place search needs NAVER_CLIENT_ID and NAVER_CLIENT_SECRET".to_string(),
            )),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl PlaceSearch for NaverLocalSearch {
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let display = MAX_CANDIDATES.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("display", display.as_str())])
            .header("X-Naver-Client-Id", self.client_id.expose_secret())
            .header("X-Naver-Client-Secret", self.client_secret.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, query, "place search rejected");
            return Err(Error::Remote(format!("place search returned {status}")));
        }

        let places = parse_local_response(&body)?;
        debug!(query, candidates = places.len(), "place search completed");
        Ok(places)
    }
}

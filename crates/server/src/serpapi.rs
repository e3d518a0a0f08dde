//! SerpApi reverse-image search client.

use crate::collaborators::SearchProvider;
use crate::error::SearchError;
use async_trait::async_trait;
use records::{candidates_from_value, CandidateRecord};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use url::Url;

pub const DEFAULT_SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Search engine requested from SerpApi
const ENGINE: &str = "google_reverse_image";

/// Largest batch the provider hands out per request
const MAX_RESULTS: u32 = 100;

/// `search_metadata.status` of a completed search
const SEARCH_SUCCESS: &str = "Success";

#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SERPAPI_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

/// `SearchProvider` backed by SerpApi's Google reverse image engine.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: reqwest::Client,
    config: SerpApiConfig,
}

impl SerpApiClient {
    pub fn new(config: SerpApiConfig) -> Result<Self, SearchError> {
        info!("Creating search client for {}", config.endpoint);
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::ClientBuild(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    #[instrument(skip(self), fields(image_url = %image_url))]
    async fn search(&self, image_url: &Url) -> Result<Vec<CandidateRecord>, SearchError> {
        let num = MAX_RESULTS.to_string();
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("engine", ENGINE),
                ("image_url", image_url.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Search provider returned {}: {}", status, body);
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        if let Some(message) = document.get("error").and_then(Value::as_str) {
            // An empty reverse search is reported as an error on a successful run
            if search_succeeded(&document) {
                info!("Search returned no candidates: {}", message);
                return Ok(Vec::new());
            }
            return Err(SearchError::Rejected(message.to_string()));
        }

        let candidates = candidates_from_value(document)
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;
        debug!("Search returned {} candidates", candidates.len());
        Ok(candidates)
    }
}

/// Whether SerpApi marked the run itself as successful.
fn search_succeeded(document: &Value) -> bool {
    document
        .pointer("/search_metadata/status")
        .and_then(Value::as_str)
        == Some(SEARCH_SUCCESS)
}

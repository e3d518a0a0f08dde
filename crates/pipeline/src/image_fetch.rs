//! Image download over HTTP.

use crate::traits::ImageFetcher;
use async_trait::async_trait;
use records::ImageBuffer;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use resolver::config::DEFAULT_USER_AGENT;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Client-level budget for image downloads
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from downloading an image
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid image URL '{0}'")]
    InvalidUrl(String),

    #[error("Failed to download image: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Image request returned HTTP {status}")]
    Status { status: u16 },

    #[error("Image response was empty")]
    EmptyBody,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// `ImageFetcher` backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &str) -> Result<ImageBuffer, FetchError> {
        let url = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        debug!("Downloaded {} bytes ({:?})", bytes.len(), content_type);

        let buffer = ImageBuffer::new(bytes);
        Ok(match content_type {
            Some(content_type) => buffer.with_content_type(content_type),
            None => buffer,
        })
    }
}

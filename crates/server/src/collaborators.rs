//! External collaborators of a reverse search.
//!
//! - `SearchProvider`: reverse-image search by image URL
//! - `ImageStore`: durable storage that turns uploaded bytes into a public URL

use crate::error::{SearchError, StoreError};
use async_trait::async_trait;
use records::{CandidateRecord, ImageBuffer};
use url::Url;

/// Returns the ordered candidate batch for an image URL.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, image_url: &Url) -> Result<Vec<CandidateRecord>, SearchError>;
}

/// Persists an image and returns a URL the search provider can fetch.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store(&self, image: &ImageBuffer) -> Result<Url, StoreError>;
}

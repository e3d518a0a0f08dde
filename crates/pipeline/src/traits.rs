//! Core traits for the enhancement pipeline.
//!
//! The pipeline talks to its three collaborators only through these traits,
//! so tests can swap in counting mocks and callers can plug in other
//! implementations.
//!
//! ## Design Note
//! - `Send + Sync` lets one pipeline drive many concurrent item tasks
//! - None of the methods except `fetch_image` can fail; degradation to
//!   "nothing found" / score 0 happens inside the implementations

use async_trait::async_trait;
use face_client::SimilarityScorer;
use records::{ImageBuffer, Similarity};
use resolver::CandidateImageResolver;

use crate::image_fetch::FetchError;

/// Finds a full-resolution image URL for a web page.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// `None` when no stage found anything.
    async fn resolve_image(&self, page_url: &str) -> Option<String>;
}

/// Downloads image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<ImageBuffer, FetchError>;
}

/// Scores identity similarity between the reference and a candidate image.
#[async_trait]
pub trait SimilarityScoring: Send + Sync {
    async fn score(&self, reference: &ImageBuffer, candidate: &ImageBuffer) -> Similarity;
}

#[async_trait]
impl ImageResolver for CandidateImageResolver {
    async fn resolve_image(&self, page_url: &str) -> Option<String> {
        self.resolve(page_url).await.map(String::from)
    }
}

#[async_trait]
impl SimilarityScoring for SimilarityScorer {
    async fn score(&self, reference: &ImageBuffer, candidate: &ImageBuffer) -> Similarity {
        SimilarityScorer::score(self, reference, candidate).await
    }
}

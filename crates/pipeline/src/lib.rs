//! Batch enhancement of reverse-image search results.
//!
//! This crate provides:
//! - `ResultEnhancementPipeline`, which resolves, downloads and scores every
//!   candidate of a batch with bounded concurrency
//! - The collaborator traits it is built on (`ImageResolver`,
//!   `ImageFetcher`, `SimilarityScoring`) and their production
//!   implementations
//! - `PipelineConfig` and the supported image extension list
//!
//! ## Architecture
//! Each candidate moves through the same stages:
//! 1. Resolve a full-resolution image URL from the candidate's page
//! 2. Pick the effective URL (resolved, then record high-res, then thumbnail)
//! 3. Skip scoring when the URL is not a supported image file
//! 4. Download the image and score it against the reference
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{HttpImageFetcher, PipelineConfig, ResultEnhancementPipeline};
//!
//! let pipeline = ResultEnhancementPipeline::new(
//!     Arc::new(resolver),
//!     Arc::new(HttpImageFetcher::new(DEFAULT_IMAGE_TIMEOUT)?),
//!     Arc::new(scorer),
//! )
//! .with_config(PipelineConfig::default().with_concurrency(8));
//!
//! let results = pipeline.enhance(records, &reference, has_face).await;
//! ```

pub mod config;
pub mod enhancement;
pub mod extensions;
pub mod image_fetch;
pub mod traits;

// Re-export main types
pub use config::{PipelineConfig, DEFAULT_CONCURRENCY};
pub use enhancement::{ItemOutcome, ResultEnhancementPipeline};
pub use extensions::{SupportedExtensions, DEFAULT_EXTENSIONS};
pub use image_fetch::{FetchError, HttpImageFetcher, DEFAULT_IMAGE_TIMEOUT};
pub use traits::{ImageFetcher, ImageResolver, SimilarityScoring};

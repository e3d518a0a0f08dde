//! Error types for image resolution.
//!
//! None of these escape `CandidateImageResolver::resolve`; they are logged
//! and the failing stage counts as having found nothing.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single extraction stage
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid page URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport failure while fetching markup
    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Page returned HTTP {status}")]
    Status { status: u16 },

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    /// Browser launch, navigation or evaluation failed
    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;

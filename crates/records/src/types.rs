//! Core domain types for a reverse-image search batch.
//!
//! - `CandidateRecord`: one search hit as returned by the search provider
//! - `ImageBuffer`: raw image bytes plus an optional content type
//! - `Similarity`: a face-identity confidence, always within [0, 100]
//! - `EnhancedResult`: a candidate record enriched with image and score

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Constants
// =============================================================================

/// Default classification threshold for `isSimilar`
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 70.0;

/// Lower bound of a similarity score
pub const MIN_SIMILARITY: f32 = 0.0;

/// Upper bound of a similarity score
pub const MAX_SIMILARITY: f32 = 100.0;

// =============================================================================
// Input Types
// =============================================================================

/// A single search-result record produced by the search provider.
///
/// Only the fields the pipeline reads are typed. Everything else the
/// provider sends (position, source, dimensions, ...) lands in `extra` and
/// is echoed back untouched in the `EnhancedResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    /// Web page the hit was found on
    pub link: String,

    /// Low-resolution thumbnail served by the provider; empty when absent
    #[serde(default)]
    pub thumbnail: String,

    /// Full-resolution image, when the provider already knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_res_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Passthrough fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CandidateRecord {
    /// Create a record from a page link and its thumbnail.
    pub fn new(link: impl Into<String>, thumbnail: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            thumbnail: thumbnail.into(),
            high_res_image: None,
            title: None,
            extra: Map::new(),
        }
    }

    /// Set the provider's own high-resolution image (builder style).
    pub fn with_high_res_image(mut self, url: impl Into<String>) -> Self {
        self.high_res_image = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Pick the image URL to use for this record.
    ///
    /// Priority: `resolved` (from page extraction), then the record's own
    /// `highResImage`, then `thumbnail`. Empty strings are skipped so the
    /// result is only empty when every source is empty.
    pub fn effective_image(&self, resolved: Option<&str>) -> String {
        [resolved, self.high_res_image.as_deref(), Some(self.thumbnail.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Raw image bytes with an optional MIME type.
///
/// `Bytes` makes clones cheap, so one reference image can be handed to
/// every concurrent item task without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl ImageBuffer {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// =============================================================================
// Output Types
// =============================================================================

/// A similarity score in [0, 100].
///
/// The constructor clamps out-of-range values and maps NaN to zero, so
/// holding a `Similarity` is proof the value is in range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Similarity(f32);

impl Similarity {
    pub const ZERO: Similarity = Similarity(MIN_SIMILARITY);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(MIN_SIMILARITY, MAX_SIMILARITY))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Classify against `threshold` (inclusive).
    pub fn meets(self, threshold: f32) -> bool {
        self.0 >= threshold
    }
}

impl From<f32> for Similarity {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// One enhanced search result, produced 1:1 and in order from the input batch.
///
/// Serializes as the input record plus `highResImage`, `similarity` and
/// `isSimilar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedResult {
    pub link: String,
    pub thumbnail: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Best available image for this hit; never empty if any source exists
    pub high_res_image: String,

    pub similarity: Similarity,
    pub is_similar: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnhancedResult {
    /// Build a result, classifying `similarity` against `threshold`.
    ///
    /// This is the only constructor, which keeps
    /// `is_similar == (similarity >= threshold)` true for every result.
    pub fn new(
        record: CandidateRecord,
        high_res_image: String,
        similarity: Similarity,
        threshold: f32,
    ) -> Self {
        Self {
            link: record.link,
            thumbnail: record.thumbnail,
            title: record.title,
            high_res_image,
            similarity,
            is_similar: similarity.meets(threshold),
            extra: record.extra,
        }
    }

    /// A result that was never scored: similarity 0, classified against
    /// `threshold` like any other score.
    pub fn unscored(record: CandidateRecord, high_res_image: String, threshold: f32) -> Self {
        Self::new(record, high_res_image, Similarity::ZERO, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_similarity_clamps() {
        assert_eq!(Similarity::new(-5.0).value(), 0.0);
        assert_eq!(Similarity::new(150.0).value(), 100.0);
        assert_eq!(Similarity::new(f32::NAN).value(), 0.0);
        assert_eq!(Similarity::new(42.5).value(), 42.5);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let record = CandidateRecord::new("http://x/a.html", "http://x/t.jpg");
        let at = EnhancedResult::new(record.clone(), "u".into(), Similarity::new(70.0), 70.0);
        let below = EnhancedResult::new(record, "u".into(), Similarity::new(69.99), 70.0);
        assert!(at.is_similar);
        assert!(!below.is_similar);
    }

    #[test]
    fn test_effective_image_priority() {
        let record = CandidateRecord::new("http://x/a.html", "http://x/t.jpg");
        assert_eq!(record.effective_image(None), "http://x/t.jpg");
        assert_eq!(
            record.effective_image(Some("http://x/full.png")),
            "http://x/full.png"
        );

        let record = record.with_high_res_image("http://x/hi.jpg");
        assert_eq!(record.effective_image(None), "http://x/hi.jpg");
        assert_eq!(record.effective_image(Some("")), "http://x/hi.jpg");
    }

    #[test]
    fn test_passthrough_fields_round_trip_into_result() {
        let record: CandidateRecord = serde_json::from_value(json!({
            "position": 3,
            "title": "Someone",
            "link": "http://x/a.html",
            "thumbnail": "http://x/t.jpg",
            "source": "x.com"
        }))
        .unwrap();
        assert_eq!(record.extra["position"], json!(3));

        let result = EnhancedResult::new(record, "http://x/t.jpg".into(), Similarity::new(88.0), 70.0);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["position"], json!(3));
        assert_eq!(value["source"], json!("x.com"));
        assert_eq!(value["highResImage"], json!("http://x/t.jpg"));
        assert_eq!(value["similarity"], json!(88.0));
        assert_eq!(value["isSimilar"], json!(true));
    }
}

//! Tunables for the enhancement pipeline.

use crate::extensions::SupportedExtensions;
use records::{DEFAULT_SIMILARITY_THRESHOLD, MAX_SIMILARITY, MIN_SIMILARITY};

/// Number of items processed at the same time
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// `isSimilar` is set when the score is at or above this value
    pub threshold: f32,

    /// Image URLs outside this list are never downloaded
    pub supported_extensions: SupportedExtensions,

    /// Upper bound on in-flight items; values below 1 are treated as 1
    pub concurrency: usize,
}

impl PipelineConfig {
    /// Thresholds outside the score range are clamped into it.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(MIN_SIMILARITY, MAX_SIMILARITY);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_extensions(mut self, extensions: SupportedExtensions) -> Self {
        self.supported_extensions = extensions;
        self
    }

    pub(crate) fn permits(&self) -> usize {
        self.concurrency.max(1)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            supported_extensions: SupportedExtensions::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.threshold, 70.0);
        assert_eq!(config.concurrency, 4);
        assert!(config.supported_extensions.matches("http://x/a.jpg"));
    }

    #[test]
    fn test_zero_concurrency_still_makes_progress() {
        let config = PipelineConfig::default().with_concurrency(0);
        assert_eq!(config.permits(), 1);
    }

    #[test]
    fn test_threshold_is_clamped_to_score_range() {
        assert_eq!(PipelineConfig::default().with_threshold(-5.0).threshold, 0.0);
        assert_eq!(PipelineConfig::default().with_threshold(250.0).threshold, 100.0);
        assert_eq!(PipelineConfig::default().with_threshold(42.0).threshold, 42.0);
    }
}

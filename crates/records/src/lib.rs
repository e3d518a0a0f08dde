//! # Records Crate
//!
//! Data model shared by every stage of the reverse-image search pipeline.
//!
//! ## Main Components
//!
//! - **types**: `CandidateRecord`, `ImageBuffer`, `Similarity`, `EnhancedResult`
//! - **parser**: load a saved candidate batch from JSON
//! - **error**: Error types for record loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use records::{load_candidates, EnhancedResult, Similarity};
//! use std::path::Path;
//!
//! let batch = load_candidates(Path::new("results.json"))?;
//! for record in batch {
//!     let image = record.effective_image(None);
//!     let result = EnhancedResult::new(record, image, Similarity::new(82.0), 70.0);
//!     assert!(result.is_similar);
//! }
//! ```

pub mod error;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{RecordError, Result};
pub use parser::{candidates_from_value, load_candidates, parse_candidates};
pub use types::{
    CandidateRecord,
    EnhancedResult,
    ImageBuffer,
    Similarity,
    DEFAULT_SIMILARITY_THRESHOLD,
    MAX_SIMILARITY,
    MIN_SIMILARITY,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscored_result_uses_given_image() {
        let record = CandidateRecord::new("http://x/a.html", "http://x/t.jpg");
        let result = EnhancedResult::unscored(record.clone(), "http://x/t.jpg".to_string(), 70.0);

        assert_eq!(result.high_res_image, "http://x/t.jpg");
        assert_eq!(result.similarity, Similarity::ZERO);
        assert!(!result.is_similar);

        let permissive = EnhancedResult::unscored(record, "http://x/t.jpg".to_string(), 0.0);
        assert!(permissive.is_similar, "A zero score meets a zero threshold");
    }

    #[test]
    fn test_image_buffer_accessors() {
        let buffer = ImageBuffer::new(vec![1u8, 2, 3]).with_content_type("image/png");
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.content_type.as_deref(), Some("image/png"));
        assert!(ImageBuffer::new(Vec::<u8>::new()).is_empty());
    }
}

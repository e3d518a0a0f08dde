//! The ResultEnhancementPipeline turns a candidate batch into enhanced results.
//!
//! ## Modes
//! - **No-face**: the reference has no detectable face. Nothing is resolved
//!   or scored; every record keeps its thumbnail with similarity 0.
//! - **Face**: every record goes through resolve, extension check, fetch and
//!   score independently. Items run concurrently up to
//!   `PipelineConfig::concurrency`.
//!
//! ## Guarantees
//! - Output has the same length and order as the input; results land in a
//!   slot indexed by input position, so completion order does not matter
//! - A failing or panicking item only affects its own slot, which falls back
//!   to the record's own image with similarity 0
//! - The reference image is the only state shared between item tasks

use crate::config::PipelineConfig;
use crate::traits::{ImageFetcher, ImageResolver, SimilarityScoring};
use records::{CandidateRecord, EnhancedResult, ImageBuffer, Similarity};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// How a single item finished in face mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemOutcome {
    /// Effective image URL has no supported extension; nothing was fetched
    ExtensionRejected,
    /// Download of the effective image failed
    FetchFailed,
    Scored(Similarity),
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::ExtensionRejected => write!(f, "extension rejected"),
            ItemOutcome::FetchFailed => write!(f, "fetch failed"),
            ItemOutcome::Scored(similarity) => write!(f, "scored {:.1}", similarity.value()),
        }
    }
}

/// Drives resolver, fetcher and scorer across a candidate batch.
///
/// Cloning is cheap; all collaborators sit behind `Arc`.
#[derive(Clone)]
pub struct ResultEnhancementPipeline {
    resolver: Arc<dyn ImageResolver>,
    fetcher: Arc<dyn ImageFetcher>,
    scorer: Arc<dyn SimilarityScoring>,
    config: Arc<PipelineConfig>,
}

impl ResultEnhancementPipeline {
    pub fn new(
        resolver: Arc<dyn ImageResolver>,
        fetcher: Arc<dyn ImageFetcher>,
        scorer: Arc<dyn SimilarityScoring>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            scorer,
            config: Arc::new(PipelineConfig::default()),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enhance `records` against `reference`.
    ///
    /// `has_face` is the FaceGate verdict for the reference and selects the
    /// mode. Never fails; every record yields exactly one result.
    #[instrument(skip_all, fields(items = records.len(), has_face = has_face))]
    pub async fn enhance(
        &self,
        records: Vec<CandidateRecord>,
        reference: &ImageBuffer,
        has_face: bool,
    ) -> Vec<EnhancedResult> {
        if !has_face {
            info!("Reference has no face, skipping resolution and scoring");
            let threshold = self.config.threshold;
            return records
                .into_iter()
                .map(|record| no_face_result(record, threshold))
                .collect();
        }

        let semaphore = Arc::new(Semaphore::new(self.config.permits()));
        let mut tasks = JoinSet::new();

        for (index, record) in records.iter().cloned().enumerate() {
            let pipeline = self.clone();
            let reference = reference.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let (result, outcome) = pipeline.enhance_item(record, &reference).await;
                debug!(index, %outcome, "Item finished");
                (index, result, outcome)
            });
        }

        let mut slots: Vec<Option<EnhancedResult>> = vec![None; records.len()];
        let (mut scored, mut similar) = (0usize, 0usize);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result, outcome)) => {
                    if matches!(outcome, ItemOutcome::Scored(_)) {
                        scored += 1;
                    }
                    if result.is_similar {
                        similar += 1;
                    }
                    slots[index] = Some(result);
                }
                Err(e) => warn!("Item task did not complete: {}", e),
            }
        }

        info!(
            "Enhanced {} results ({} scored, {} similar)",
            slots.len(),
            scored,
            similar
        );

        slots
            .into_iter()
            .zip(records)
            .map(|(slot, record)| {
                slot.unwrap_or_else(|| fallback_result(record, self.config.threshold))
            })
            .collect()
    }

    /// Face-mode processing of one record.
    async fn enhance_item(
        &self,
        record: CandidateRecord,
        reference: &ImageBuffer,
    ) -> (EnhancedResult, ItemOutcome) {
        let resolved = self.resolver.resolve_image(&record.link).await;
        let image_url = record.effective_image(resolved.as_deref());

        if !self.config.supported_extensions.matches(&image_url) {
            return (
                EnhancedResult::unscored(record, image_url, self.config.threshold),
                ItemOutcome::ExtensionRejected,
            );
        }

        let candidate = match self.fetcher.fetch_image(&image_url).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Could not download {}: {}", image_url, e);
                return (
                    EnhancedResult::unscored(record, image_url, self.config.threshold),
                    ItemOutcome::FetchFailed,
                );
            }
        };

        let similarity = self.scorer.score(reference, &candidate).await;
        let result = EnhancedResult::new(record, image_url, similarity, self.config.threshold);
        (result, ItemOutcome::Scored(similarity))
    }
}

fn no_face_result(record: CandidateRecord, threshold: f32) -> EnhancedResult {
    let thumbnail = record.thumbnail.clone();
    EnhancedResult::unscored(record, thumbnail, threshold)
}

fn fallback_result(record: CandidateRecord, threshold: f32) -> EnhancedResult {
    let image = record.effective_image(None);
    EnhancedResult::unscored(record, image, threshold)
}

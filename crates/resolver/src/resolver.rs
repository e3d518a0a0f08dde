//! CandidateImageResolver - best full-resolution image for a web page.
//!
//! ## Algorithm
//! Run the configured `ExtractionStrategy` list in order; the first stage
//! that proposes a URL wins and later stages never run.
//! 1. `StructuredMetadata`: fetch the markup once, read og/twitter/link tags
//! 2. `LargestInlineImage`: reuse the same markup, pick the largest `<img>`
//! 3. `RenderedDom`: render the page in a browser, pick the largest `<img>`
//!    of the live document
//!
//! A stage error (fetch, timeout, render) is logged and treated as "found
//! nothing", so `resolve` never fails; `None` means every stage came up empty.

use crate::config::ResolverConfig;
use crate::document::PageDocument;
use crate::error::{ResolveError, Result};
use crate::fetch::{HttpPageFetcher, PageFetcher};
use crate::render::PageRenderer;
use crate::strategies::{self, ExtractionStrategy};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Static markup for the page being resolved, fetched at most once.
enum StaticPage {
    Pending,
    Loaded(PageDocument),
    Unavailable,
}

/// Resolves the best image URL for a page through ordered fallback stages.
#[derive(Clone)]
pub struct CandidateImageResolver {
    fetcher: Arc<dyn PageFetcher>,
    renderer: Option<Arc<dyn PageRenderer>>,
    strategies: Vec<ExtractionStrategy>,
    config: ResolverConfig,
}

impl CandidateImageResolver {
    /// Create a resolver using `fetcher` for static markup and no renderer.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            renderer: None,
            strategies: ExtractionStrategy::ALL.to_vec(),
            config: ResolverConfig::default(),
        }
    }

    /// Build the production resolver: HTTP fetcher, plus headless Chromium
    /// when the `chromium` feature is compiled in and rendering is enabled.
    pub fn from_config(config: ResolverConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpPageFetcher::new(&config)?);
        let resolver = Self::new(fetcher).with_config(config.clone());

        #[cfg(feature = "chromium")]
        let resolver = if config.render_enabled {
            resolver.with_renderer(Arc::new(crate::render::ChromiumRenderer::new(config)))
        } else {
            resolver
        };

        if resolver.renderer.is_none() {
            debug!("No renderer configured; rendered-DOM stage will be skipped");
        }
        Ok(resolver)
    }

    /// Configure timeouts (builder pattern).
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a rendering engine for the `RenderedDom` stage.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Replace the stage order (default: `ExtractionStrategy::ALL`).
    pub fn with_strategies(mut self, strategies: Vec<ExtractionStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &[ExtractionStrategy] {
        &self.strategies
    }

    /// Resolve the best image for `page_url`. Never fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, page_url: &str) -> Option<Url> {
        let page_url = match Url::parse(page_url) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping resolution, invalid page URL: {}", e);
                return None;
            }
        };

        let mut page = StaticPage::Pending;
        for &strategy in &self.strategies {
            match self.run_strategy(strategy, &page_url, &mut page).await {
                Ok(Some(url)) => {
                    debug!("{} resolved {}", strategy, url);
                    return Some(url);
                }
                Ok(None) => debug!("{} found nothing", strategy),
                Err(e) => warn!("{} failed for {}: {}", strategy, page_url, e),
            }
        }

        debug!("No image resolved for {}", page_url);
        None
    }

    async fn run_strategy(
        &self,
        strategy: ExtractionStrategy,
        page_url: &Url,
        page: &mut StaticPage,
    ) -> Result<Option<Url>> {
        match strategy {
            ExtractionStrategy::StructuredMetadata => Ok(self
                .static_document(page_url, page)
                .await?
                .and_then(strategies::structured_metadata)),
            ExtractionStrategy::LargestInlineImage => Ok(self
                .static_document(page_url, page)
                .await?
                .and_then(|doc| strategies::largest_inline_image(&doc.images, &doc.base_url))),
            ExtractionStrategy::RenderedDom => self.rendered_image(page_url).await,
        }
    }

    /// Fetch and parse the markup on first use. A failed fetch is reported
    /// once; later static stages then see `None`.
    async fn static_document<'p>(
        &self,
        page_url: &Url,
        page: &'p mut StaticPage,
    ) -> Result<Option<&'p PageDocument>> {
        if let StaticPage::Pending = page {
            let fetched = with_timeout(
                "page fetch",
                self.config.fetch_timeout,
                self.fetcher.fetch_page(page_url),
            )
            .await;

            match fetched {
                Ok(fetched) => {
                    *page = StaticPage::Loaded(PageDocument::parse(&fetched.markup, fetched.final_url));
                }
                Err(e) => {
                    *page = StaticPage::Unavailable;
                    return Err(e);
                }
            }
        }

        Ok(match page {
            StaticPage::Loaded(doc) => Some(&*doc),
            StaticPage::Pending | StaticPage::Unavailable => None,
        })
    }

    async fn rendered_image(&self, page_url: &Url) -> Result<Option<Url>> {
        let Some(renderer) = &self.renderer else {
            debug!("Rendered-DOM stage skipped, no renderer");
            return Ok(None);
        };

        // Dropping the render future on timeout tears the browser session down
        let rendered = with_timeout(
            "page render",
            self.config.render_timeout,
            renderer.render_images(page_url),
        )
        .await?;

        Ok(strategies::largest_inline_image(&rendered.images, &rendered.final_url))
    }
}

async fn with_timeout<T>(
    stage: &'static str,
    after: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| ResolveError::Timeout { stage, after })?
}

//! Headless Chromium renderer (`chromium` feature).

use super::{DomSnapshot, PageRenderer, RenderedPage, COLLECT_IMAGES_JS};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use url::Url;

/// Spawns a fresh headless browser per render.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    config: ResolverConfig,
}

impl ChromiumRenderer {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    #[instrument(skip(self), fields(url = %url))]
    async fn render_images(&self, url: &Url) -> Result<RenderedPage> {
        let session = BrowserSession::launch(&self.config).await?;
        let outcome = session.snapshot(url, &self.config).await;
        session.close().await;

        let snapshot = outcome?;
        let final_url = Url::parse(&snapshot.href).unwrap_or_else(|_| url.clone());
        debug!("Rendered DOM holds {} images", snapshot.images.len());

        Ok(RenderedPage {
            final_url,
            images: snapshot.images,
        })
    }
}

/// A launched browser plus the task pumping its CDP event stream.
///
/// `close` shuts down gracefully. If the session is dropped instead (an
/// error path, or the render future cancelled by a timeout), `Drop` stops
/// the event task and `Browser`'s own drop kills the child process.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: &ResolverConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .request_timeout(config.render_timeout)
            .build()
            .map_err(ResolveError::Render)?;

        let (browser, mut events) = Browser::launch(browser_config).await.map_err(render_err)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self { browser, handler })
    }

    async fn snapshot(&self, url: &Url, config: &ResolverConfig) -> Result<DomSnapshot> {
        let page = self.browser.new_page("about:blank").await.map_err(render_err)?;
        page.set_user_agent(config.user_agent.as_str())
            .await
            .map_err(render_err)?;
        page.goto(url.as_str()).await.map_err(render_err)?;
        page.wait_for_navigation().await.map_err(render_err)?;

        // No network-idle event in CDP; give late loaders a moment
        tokio::time::sleep(config.render_settle).await;

        page.evaluate(COLLECT_IMAGES_JS)
            .await
            .map_err(render_err)?
            .into_value::<DomSnapshot>()
            .map_err(render_err)
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser wait failed: {}", e);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn render_err(e: impl std::fmt::Display) -> ResolveError {
    ResolveError::Render(e.to_string())
}

//! Static markup fetching.

use crate::config::{ResolverConfig, HTML_ACCEPT};
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;
use url::Url;

/// Markup returned by a page fetch.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; relative references resolve against it
    pub final_url: Url,
    pub markup: String,
}

/// Fetches raw page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage>;
}

/// `PageFetcher` over HTTP with browser-like headers.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ResolveError::ClientBuild(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| ResolveError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let markup = response.text().await?;
        debug!("Fetched {} bytes of markup from {}", markup.len(), final_url);

        Ok(FetchedPage { final_url, markup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::{Html, Redirect};
    use axum::routing::get;
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve pages that only answer browser-looking clients.
    async fn start_mock_site() -> (String, tokio::task::JoinHandle<()>) {
        async fn page(headers: AxumHeaders) -> (StatusCode, Html<&'static str>) {
            let user_agent = headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let accept = headers
                .get("accept")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();

            if user_agent.starts_with("Mozilla/5.0") && accept.contains("text/html") {
                (StatusCode::OK, Html("<html><img src=\"a.jpg\"></html>"))
            } else {
                (StatusCode::FORBIDDEN, Html("go away"))
            }
        }

        let router = Router::new()
            .route("/gallery/page.html", get(page))
            .route("/moved", get(|| async { Redirect::temporary("/gallery/page.html") }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock site");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Mock site failed");
        });

        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let (base, handle) = start_mock_site().await;
        let fetcher = HttpPageFetcher::new(&ResolverConfig::default()).unwrap();

        let url = Url::parse(&format!("{}/gallery/page.html", base)).unwrap();
        let page = fetcher.fetch_page(&url).await.expect("fetch failed");
        assert!(page.markup.contains("a.jpg"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_fetch_reports_final_url_after_redirect() {
        let (base, handle) = start_mock_site().await;
        let fetcher = HttpPageFetcher::new(&ResolverConfig::default()).unwrap();

        let url = Url::parse(&format!("{}/moved", base)).unwrap();
        let page = fetcher.fetch_page(&url).await.expect("fetch failed");
        assert_eq!(page.final_url.path(), "/gallery/page.html");

        handle.abort();
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let (base, handle) = start_mock_site().await;
        let fetcher = HttpPageFetcher::new(&ResolverConfig::default()).unwrap();

        let url = Url::parse(&format!("{}/missing", base)).unwrap();
        let result = fetcher.fetch_page(&url).await;
        assert!(matches!(result, Err(ResolveError::Status { status: 404 })));

        handle.abort();
    }
}

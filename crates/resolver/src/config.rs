//! Resolver configuration.

use std::time::Duration;

/// Desktop Chrome user agent; many sites serve a stripped page to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// `Accept` header sent with markup requests
pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml";

/// Budget for fetching static markup
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(7);

/// Budget for a full render (launch, navigate, evaluate)
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause after the load event so late script-inserted images can land
pub const DEFAULT_RENDER_SETTLE: Duration = Duration::from_millis(500);

/// Settings for `CandidateImageResolver` and the page clients it builds.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub user_agent: String,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub render_settle: Duration,

    /// Run the rendered-DOM stage at all (needs the `chromium` feature)
    pub render_enabled: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            render_settle: DEFAULT_RENDER_SETTLE,
            render_enabled: true,
        }
    }
}

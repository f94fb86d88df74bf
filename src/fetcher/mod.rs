//! Two-tier page acquisition.
//!
//! Tier 1 renders the page in a headless browser when a session is available.
//! Tier 2 is a plain HTTP fetch with a bounded number of attempts and linear
//! backoff. The first tier to produce usable content wins.

pub mod browser;
pub mod http;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::traits::{PageSource, Renderer, SourceError};

pub use browser::ChromeRenderer;
pub use http::HttpSource;

/// Case-insensitive signatures of anti-bot and error pages
pub const BLOCK_MARKERS: &[&str] = &[
    "access denied",
    "403 forbidden",
    "err_cert",
    "your connection is not private",
    "net::err_",
    "request blocked",
    "captcha",
    "are you a robot",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    /// Content looked like a block page rather than the real thing
    Blocked,
    Failed,
}

/// Content of a fetch together with how it was classified
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub content: String,
    pub outcome: FetchOutcome,
    /// Plain-HTTP attempts spent on this fetch
    pub attempts: u32,
}

impl FetchResult {
    fn new(content: String, outcome: FetchOutcome, attempts: u32) -> Self {
        Self {
            content,
            outcome,
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == FetchOutcome::Success
    }
}

/// Retry and classification settings taken from [`ScraperConfig`]
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub min_content_length: usize,
}

impl From<&ScraperConfig> for FetchSettings {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            retry_base_delay: config.retry_base_delay,
            min_content_length: config.min_content_length,
        }
    }
}

impl FetchSettings {
    /// Delay after failed attempt `attempt` (1-based) before the next one
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay * attempt
    }
}

fn has_block_marker(content: &str) -> bool {
    let lower = content.to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Classifies rendered content as real or as a block page.
///
/// Either an implausibly short body or a block marker anywhere marks it blocked.
pub fn classify(content: &str, min_content_length: usize) -> FetchOutcome {
    if content.len() < min_content_length || has_block_marker(content) {
        FetchOutcome::Blocked
    } else {
        FetchOutcome::Success
    }
}

/// Classifies a successful plain-HTTP body.
///
/// Full-length pages are always accepted, since real result pages may embed
/// captcha scripts. Only a short body carrying a block marker counts as blocked.
pub fn classify_plain(content: &str, min_content_length: usize) -> FetchOutcome {
    if content.len() < min_content_length && has_block_marker(content) {
        FetchOutcome::Blocked
    } else {
        FetchOutcome::Success
    }
}

/// Acquires page content through the renderer and plain-HTTP tiers.
///
/// The renderer session lives as long as the fetcher and is released by
/// [`Fetcher::close`] or on drop, whichever comes first.
pub struct Fetcher {
    source: Box<dyn PageSource>,
    renderer: Option<Box<dyn Renderer>>,
    settings: FetchSettings,
}

impl Fetcher {
    pub fn new(
        source: Box<dyn PageSource>,
        renderer: Option<Box<dyn Renderer>>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            source,
            renderer,
            settings,
        }
    }

    /// Builds the production fetcher: reqwest for plain HTTP, plus headless
    /// Chrome when the renderer is enabled and can be launched.
    pub fn from_config(config: &ScraperConfig) -> anyhow::Result<Self> {
        let source = HttpSource::new(config)?;

        let renderer: Option<Box<dyn Renderer>> = if config.renderer_enabled {
            match ChromeRenderer::launch(config) {
                Ok(renderer) => {
                    info!("Headless browser session started");
                    Some(Box::new(renderer))
                }
                Err(e) => {
                    warn!("Could not start headless browser, using plain HTTP only: {e:#}");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::new(Box::new(source), renderer, FetchSettings::from(config)))
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.as_ref().is_some_and(|r| r.is_open())
    }

    /// Fetches `url`, trying the renderer first and then plain HTTP
    pub async fn fetch(&self, url: &str) -> FetchResult {
        if let Some(content) = self.fetch_rendered(url).await {
            return FetchResult::new(content, FetchOutcome::Success, 0);
        }
        self.fetch_plain(url).await
    }

    async fn fetch_rendered(&self, url: &str) -> Option<String> {
        let renderer = self.renderer.as_ref().filter(|r| r.is_open())?;

        let page = match renderer.render(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, "Rendered fetch failed: {e:#}");
                return None;
            }
        };

        if page.timed_out {
            debug!(url = %url, "Page load timed out, using partial content");
        }

        match classify(&page.html, self.settings.min_content_length) {
            FetchOutcome::Success => Some(page.html),
            _ => {
                warn!(
                    url = %url,
                    bytes = page.html.len(),
                    "Rendered content looks blocked, falling back to plain HTTP"
                );
                None
            }
        }
    }

    async fn fetch_plain(&self, url: &str) -> FetchResult {
        let max_retries = self.settings.max_retries;

        for attempt in 1..=max_retries {
            match self.source.get(url).await {
                Ok(body) => {
                    let outcome = classify_plain(&body, self.settings.min_content_length);
                    if outcome == FetchOutcome::Blocked {
                        warn!(url = %url, bytes = body.len(), "Plain fetch returned a block page");
                    }
                    return FetchResult::new(body, outcome, attempt);
                }
                Err(e) => {
                    warn!(url = %url, attempt, max_retries, "Fetch attempt failed: {e}");
                    if attempt < max_retries {
                        let delay = self.settings.backoff(attempt);
                        debug!("Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        FetchResult::new(String::new(), FetchOutcome::Failed, max_retries)
    }

    /// A single plain request, used for detail pages
    pub async fn fetch_once(&self, url: &str) -> Result<String, SourceError> {
        self.source.get(url).await
    }

    /// Releases the renderer session; safe to call more than once
    pub fn close(&mut self) {
        if let Some(renderer) = self.renderer.as_mut()
            && renderer.is_open()
        {
            renderer.close();
            info!("Headless browser session closed");
        }
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        self.close();
    }
}

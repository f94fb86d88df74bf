//! Scraper configuration, built once and handed to the fetcher and page driver

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

pub const DEFAULT_BASE_URL: &str = "https://www.landwatch.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:database/landwatch.db";

/// Configuration for a listing scrape run
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Site root, used for search URLs and for resolving relative links
    pub base_url: String,
    /// Timeout for a single plain HTTP request
    pub request_timeout: Duration,
    /// Courtesy delay between consecutive requests to the site
    pub request_delay: Duration,
    /// Attempts allowed for the plain HTTP tier
    pub max_retries: u32,
    /// Backoff unit; attempt `k` waits `retry_base_delay * k` before retrying
    pub retry_base_delay: Duration,
    pub user_agent: String,
    /// Whether to try a headless browser before plain HTTP
    pub renderer_enabled: bool,
    pub page_load_timeout: Duration,
    /// Bodies shorter than this are treated as block pages
    pub min_content_length: usize,
    pub database_url: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            request_delay: Duration::from_secs(2),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(2),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            renderer_enabled: false,
            page_load_timeout: Duration::from_secs(30),
            min_content_length: 1000,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl ScraperConfig {
    /// Builds a configuration from `LANDWATCH_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable ones are errors.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            base_url: env_or("LANDWATCH_BASE_URL", defaults.base_url)?,
            request_timeout: secs_or("LANDWATCH_REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            request_delay: millis_or("LANDWATCH_REQUEST_DELAY_MS", defaults.request_delay)?,
            max_retries: env_or("LANDWATCH_MAX_RETRIES", defaults.max_retries)?,
            retry_base_delay: millis_or("LANDWATCH_RETRY_BASE_DELAY_MS", defaults.retry_base_delay)?,
            user_agent: env_or("LANDWATCH_USER_AGENT", defaults.user_agent)?,
            renderer_enabled: env_or("LANDWATCH_RENDERER", defaults.renderer_enabled)?,
            page_load_timeout: secs_or("LANDWATCH_PAGE_LOAD_TIMEOUT_SECS", defaults.page_load_timeout)?,
            min_content_length: env_or("LANDWATCH_MIN_CONTENT_LENGTH", defaults.min_content_length)?,
            database_url: env_or("DATABASE_URL", defaults.database_url)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base URL must be an absolute http(s) URL, got {:?}", self.base_url);
        }
        if self.max_retries == 0 {
            bail!("max retries must be at least 1");
        }
        if self.request_timeout.is_zero() {
            bail!("request timeout must be greater than zero");
        }
        Ok(())
    }

    /// Site root without a trailing slash
    pub fn site_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Search URL for a page of results, optionally scoped to a state/region code
    pub fn search_url(&self, region: Option<&str>, page: u32) -> String {
        let root = match region.map(str::trim).filter(|r| !r.is_empty()) {
            Some(region) => format!(
                "{}/{}/land-for-sale",
                self.site_root(),
                urlencoding::encode(&region.to_lowercase())
            ),
            None => format!("{}/land-for-sale", self.site_root()),
        };

        if page <= 1 { root } else { format!("{root}/page-{page}") }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn secs_or(key: &str, default: Duration) -> Result<Duration> {
    env_or(key, default.as_secs()).map(Duration::from_secs)
}

fn millis_or(key: &str, default: Duration) -> Result<Duration> {
    env_or(key, default.as_millis() as u64).map(Duration::from_millis)
}

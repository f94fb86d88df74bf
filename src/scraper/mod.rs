//! Page driver: walks search-result pages one at a time and aggregates listings

mod details;

use anyhow::{Result, bail};
use tracing::{debug, error, info, warn};

use crate::config::ScraperConfig;
use crate::extract::parse_search_page;
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::models::ListingRecord;

/// Where a scrape run currently stands
#[derive(Debug)]
enum PageState {
    Pending(u32),
    Fetching(u32),
    Parsing { page: u32, html: String },
    Delay(u32),
    Done,
    Aborted(u32),
}

pub struct Scraper {
    fetcher: Fetcher,
    config: ScraperConfig,
}

impl Scraper {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::from_config(&config)?;
        Ok(Self { fetcher, config })
    }

    pub fn with_fetcher(config: ScraperConfig, fetcher: Fetcher) -> Self {
        Self { fetcher, config }
    }

    /// Scrapes up to `max_pages` result pages, optionally scoped to a state/region code.
    ///
    /// Pages are fetched strictly in order with the configured delay between
    /// them. A page that cannot be fetched ends the run early, and whatever was
    /// collected so far is returned. Only asking for zero pages is an error.
    pub async fn search_listings(&self, region: Option<&str>, max_pages: u32) -> Result<Vec<ListingRecord>> {
        if max_pages == 0 {
            bail!("at least one page must be requested");
        }

        info!("Starting scrape from: {}", self.config.search_url(region, 1));

        let mut listings = Vec::new();
        let mut state = PageState::Pending(1);

        loop {
            state = match state {
                PageState::Pending(page) if page > max_pages => PageState::Done,
                PageState::Pending(page) => PageState::Fetching(page),
                PageState::Fetching(page) => {
                    let url = self.config.search_url(region, page);
                    info!("Scraping page {} of {}: {}", page, max_pages, url);

                    let result = self.fetcher.fetch(&url).await;
                    match result.outcome {
                        FetchOutcome::Success => PageState::Parsing {
                            page,
                            html: result.content,
                        },
                        FetchOutcome::Blocked | FetchOutcome::Failed => {
                            warn!(
                                "Page {} could not be fetched ({:?}) after {} attempts",
                                page, result.outcome, result.attempts
                            );
                            PageState::Aborted(page)
                        }
                    }
                }
                PageState::Parsing { page, html } => {
                    let page_listings = parse_search_page(&html, self.config.site_root());
                    info!("Found {} listings on page {}", page_listings.len(), page);
                    listings.extend(page_listings);

                    if page < max_pages {
                        PageState::Delay(page)
                    } else {
                        PageState::Pending(page + 1)
                    }
                }
                PageState::Delay(page) => {
                    debug!("Waiting {:?} before the next page", self.config.request_delay);
                    tokio::time::sleep(self.config.request_delay).await;
                    PageState::Pending(page + 1)
                }
                PageState::Done => break,
                PageState::Aborted(page) => {
                    error!(
                        "Stopping scrape at page {}; keeping {} listings from earlier pages",
                        page,
                        listings.len()
                    );
                    break;
                }
            };
        }

        info!("Scraped {} listings total", listings.len());
        Ok(listings)
    }

    /// Releases the renderer session held by the fetcher
    pub fn close(&mut self) {
        self.fetcher.close();
    }
}

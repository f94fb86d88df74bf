use tracing::{info, warn};

use super::Scraper;
use crate::extract::extract_details;
use crate::models::{ListingDetails, ListingRecord};

impl Scraper {
    /// Fetches a listing's detail page and extracts its supplementary fields.
    ///
    /// A failed fetch is logged and yields empty details.
    pub async fn fetch_details(&self, detail_url: &str) -> ListingDetails {
        match self.fetcher.fetch_once(detail_url).await {
            Ok(html) => extract_details(&html),
            Err(e) => {
                warn!(url = %detail_url, "Error scraping listing details: {e}");
                ListingDetails::default()
            }
        }
    }

    /// Fetches `detail_url` and merges what it yields into `record` without
    /// overwriting fields the record already has. Returns the fetched details.
    pub async fn enrich(&self, record: &mut ListingRecord, detail_url: &str) -> ListingDetails {
        let details = self.fetch_details(detail_url).await;
        record.merge_details(details.clone());
        details
    }

    /// Enriches every listing that has a URL.
    ///
    /// Each detail request is preceded by the courtesy delay, including the
    /// first one, which follows the last search-page request.
    pub async fn enrich_all(&self, listings: &mut [ListingRecord]) {
        let total = listings.len();

        for (i, listing) in listings.iter_mut().enumerate() {
            let Some(url) = listing.url.clone() else {
                continue;
            };

            tokio::time::sleep(self.config.request_delay).await;
            info!("Fetching details for listing {}/{}", i + 1, total);
            self.enrich(listing, &url).await;
        }
    }
}

use anyhow::Result;
use tracing::info;

use crate::config::ScraperConfig;
use crate::database::Database;
use crate::scraper::Scraper;
use crate::traits::ListingStore;

pub struct LandFinder {
    scraper: Scraper,
    database: Database,
}

impl LandFinder {
    pub async fn new(config: ScraperConfig) -> Result<Self> {
        let database = Database::connect(&config.database_url).await?;
        let scraper = Scraper::new(config)?;

        Ok(Self { scraper, database })
    }

    pub fn with_parts(scraper: Scraper, database: Database) -> Self {
        Self { scraper, database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Scrapes up to `pages` result pages, optionally enriches them from their
    /// detail pages, and stores everything. Returns the number of rows written.
    ///
    /// The browser session is released once the run ends, successful or not.
    pub async fn scrape_and_store(&mut self, region: Option<&str>, pages: u32, fetch_details: bool) -> Result<usize> {
        let result = self.run(region, pages, fetch_details).await;
        self.scraper.close();
        result
    }

    async fn run(&self, region: Option<&str>, pages: u32, fetch_details: bool) -> Result<usize> {
        let mut listings = self.scraper.search_listings(region, pages).await?;

        if listings.is_empty() {
            info!("No listings found to store");
            return Ok(0);
        }

        if fetch_details {
            info!("Fetching detailed information for {} listings", listings.len());
            self.scraper.enrich_all(&mut listings).await;
        }

        info!("Storing {} listings in database", listings.len());
        let stored = self.database.upsert_all(&listings).await?;
        info!("Successfully stored {} listings", stored);

        Ok(stored)
    }
}

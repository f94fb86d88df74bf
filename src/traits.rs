//! Traits at the seams between the scraping core and its collaborators

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::models::ListingRecord;

/// Why a plain page request failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Plain (non-rendering) page source
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the body of `url` with a single request
    async fn get(&self, url: &str) -> Result<String, SourceError>;
}

/// HTML produced by a browser session
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    /// The page-load timeout fired and `html` is whatever the DOM held at that point
    pub timed_out: bool,
}

/// Scripted browser that renders a page before handing back its DOM
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage>;

    /// Terminates the session. Calling it again is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Numeric columns that can be queried by range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Price,
    Acres,
}

/// Text columns that can be searched by substring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    /// Matches city, state, county, or the free-text location
    Location,
    Title,
    PropertyType,
}

/// Aggregate counts over stored listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingStats {
    pub total_listings: i64,
    /// `(state, count)` pairs, largest first
    pub by_state: Vec<(Option<String>, i64)>,
}

/// Persistence for scraped listings, keyed by `listing_id`
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Inserts or replaces a listing, returning whether a row was written
    async fn upsert(&self, listing: &ListingRecord) -> Result<bool>;

    async fn query_all(&self) -> Result<Vec<ListingRecord>>;

    /// Listings whose numeric value of `field` lies in `lo..=hi` (open-ended without `hi`)
    async fn query_by_range(&self, field: RangeField, lo: f64, hi: Option<f64>) -> Result<Vec<ListingRecord>>;

    async fn query_by_text(&self, field: TextField, needle: &str) -> Result<Vec<ListingRecord>>;

    async fn stats(&self) -> Result<ListingStats>;

    /// Upserts every listing, returning how many were written.
    ///
    /// A failed row is logged and skipped.
    async fn upsert_all(&self, listings: &[ListingRecord]) -> Result<usize> {
        let mut count = 0;
        for listing in listings {
            match self.upsert(listing).await {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to store listing {:?}: {e:#}", listing.title),
            }
        }
        Ok(count)
    }
}

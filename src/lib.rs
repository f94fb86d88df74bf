//! Land listing scraper: resilient page acquisition, heuristic card
//! extraction, detail enrichment and SQLite storage.

pub mod cli;
pub mod config;
pub mod database;
pub mod extract;
pub mod fetcher;
pub mod import;
pub mod land_finder;
pub mod models;
pub mod scraper;
pub mod traits;

pub use config::ScraperConfig;
pub use fetcher::{FetchOutcome, FetchResult, Fetcher};
pub use land_finder::LandFinder;
pub use models::{ListingDetails, ListingRecord};
pub use scraper::Scraper;

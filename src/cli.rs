use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

/// LandWatch scraper and listing database query tool
#[derive(Debug, Parser)]
#[command(name = "land-finder", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scrape listings and store them in the database.
    #[command(after_help = "\
EXAMPLES:
  # Scrape one page, any state
  land-finder scrape

  # Scrape three pages of Texas listings with detail pages
  land-finder scrape --state TX --pages 3 --details
")]
    Scrape(ScrapeArgs),
    /// Query stored listings.
    Query(QueryArgs),
    /// Import already-structured listings from a JSON or CSV file.
    #[command(after_help = "\
EXAMPLES:
  # One listing object or an array of them
  land-finder import --json listings.json

  # Header row naming the listing fields
  land-finder import --csv listings.csv
")]
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// State abbreviation (e.g. TX, CA).
    #[arg(long)]
    pub state: Option<String>,
    /// Number of result pages to scrape.
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
    /// Fetch the detail page of every listing.
    #[arg(long)]
    pub details: bool,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("query")
        .required(true)
        .multiple(true)
        .args(["all", "location", "price_min", "price_max", "acres_min", "stats"])
))]
pub struct QueryArgs {
    /// Show all listings.
    #[arg(long)]
    pub all: bool,
    /// Filter by city, state, county or location text.
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub price_min: Option<f64>,
    #[arg(long)]
    pub price_max: Option<f64>,
    #[arg(long)]
    pub acres_min: Option<f64>,
    #[arg(long, requires = "acres_min")]
    pub acres_max: Option<f64>,
    /// Show database statistics.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["json", "csv"])))]
pub struct ImportArgs {
    /// Path to a JSON file holding one listing or an array of listings.
    #[arg(long)]
    pub json: Option<PathBuf>,
    /// Path to a CSV file with a header row, e.g. listing_id,title,price,acres,location.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

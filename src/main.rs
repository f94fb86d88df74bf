use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use land_finder::cli::{Cli, Commands, QueryArgs};
use land_finder::database::Database;
use land_finder::import::{import_csv, import_json};
use land_finder::traits::{ListingStore, RangeField, TextField};
use land_finder::{LandFinder, ListingRecord, ScraperConfig};

const PREVIEW_LIMIT: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ScraperConfig::from_env()?;

    match cli.command {
        Commands::Scrape(args) => {
            info!("Starting LandWatch scraper");
            let mut finder = LandFinder::new(config).await?;
            let stored = finder
                .scrape_and_store(args.state.as_deref(), args.pages, args.details)
                .await?;
            info!("Scraping completed, {} listings stored", stored);
        }
        Commands::Query(args) => {
            let database = Database::connect(&config.database_url).await?;
            run_query(&database, &args).await?;
        }
        Commands::Import(args) => {
            let database = Database::connect(&config.database_url).await?;
            let stored = match (&args.json, &args.csv) {
                (Some(json), _) => import_json(&database, json).await?,
                (None, Some(csv)) => import_csv(&database, csv).await?,
                (None, None) => bail!("either --json or --csv is required"),
            };
            println!("Successfully imported {stored} listings");
        }
    }

    Ok(())
}

async fn run_query(store: &dyn ListingStore, args: &QueryArgs) -> Result<()> {
    if args.all {
        let listings = store.query_all().await?;
        println!("\nFound {} total listings:\n", listings.len());
        listings.iter().take(PREVIEW_LIMIT).for_each(print_listing);
        if listings.len() > PREVIEW_LIMIT {
            println!("... and {} more listings", listings.len() - PREVIEW_LIMIT);
        }
    } else if let Some(location) = &args.location {
        let listings = store.query_by_text(TextField::Location, location).await?;
        println!("\nFound {} listings in {}:\n", listings.len(), location);
        listings.iter().for_each(print_listing);
    } else if args.price_min.is_some() || args.price_max.is_some() {
        let lo = args.price_min.unwrap_or(0.0);
        let listings = store.query_by_range(RangeField::Price, lo, args.price_max).await?;
        let hi = args.price_max.map_or_else(|| "any".to_string(), |hi| format!("${hi:.0}"));
        println!("\nFound {} listings in price range ${lo:.0} - {hi}:\n", listings.len());
        listings.iter().for_each(print_listing);
    } else if let Some(lo) = args.acres_min {
        let listings = store.query_by_range(RangeField::Acres, lo, args.acres_max).await?;
        match args.acres_max {
            Some(hi) => println!("\nFound {} listings with {lo}-{hi} acres:\n", listings.len()),
            None => println!("\nFound {} listings with {lo}+ acres:\n", listings.len()),
        }
        listings.iter().for_each(print_listing);
    } else if args.stats {
        let stats = store.stats().await?;
        println!("\nTotal listings: {}\n", stats.total_listings);
        println!("Listings by state:");
        for (state, count) in stats.by_state.iter().take(PREVIEW_LIMIT) {
            println!("  {}: {} listings", state.as_deref().unwrap_or("unknown"), count);
        }
    }

    Ok(())
}

fn print_listing(listing: &ListingRecord) {
    let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
    println!("- {}", listing.title);
    println!("  Price: {}, Acres: {}", or_na(&listing.price), or_na(&listing.acres));
    println!("  Location: {}", or_na(&listing.location));
    println!("  URL: {}\n", or_na(&listing.url));
}

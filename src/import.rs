//! Bulk import of already-structured listings from JSON or CSV files

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::ListingRecord;
use crate::traits::ListingStore;

/// A JSON file holds either one listing or an array of them
#[derive(Deserialize)]
#[serde(untagged)]
enum ListingFile {
    Many(Vec<ListingRecord>),
    One(Box<ListingRecord>),
}

/// Parses listings from JSON text, dropping any without a title
pub fn parse_json(json: &str) -> Result<Vec<ListingRecord>> {
    let listings = match serde_json::from_str(json).context("parsing listings JSON")? {
        ListingFile::Many(listings) => listings,
        ListingFile::One(listing) => vec![*listing],
    };

    Ok(keep_titled(listings))
}

/// Parses listings from CSV with a header row naming the record fields.
///
/// Empty cells become absent fields. Rows without a title are dropped.
pub fn parse_csv<R: Read>(input: R) -> Result<Vec<ListingRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let listings = reader
        .deserialize::<ListingRecord>()
        .collect::<Result<Vec<_>, _>>()
        .context("parsing listings CSV")?;

    Ok(keep_titled(listings))
}

fn keep_titled(listings: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let (valid, invalid): (Vec<_>, Vec<_>) = listings.into_iter().partition(ListingRecord::is_valid);
    if !invalid.is_empty() {
        warn!("Skipping {} listings without a title", invalid.len());
    }
    valid
}

pub async fn load_json(path: &Path) -> Result<Vec<ListingRecord>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    parse_json(&json)
}

pub async fn load_csv(path: &Path) -> Result<Vec<ListingRecord>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    parse_csv(bytes.as_slice())
}

/// Loads a JSON file and upserts its listings, returning how many were stored
pub async fn import_json(store: &dyn ListingStore, path: &Path) -> Result<usize> {
    let listings = load_json(path).await?;
    store_listings(store, path, &listings).await
}

/// Loads a CSV file and upserts its listings, returning how many were stored
pub async fn import_csv(store: &dyn ListingStore, path: &Path) -> Result<usize> {
    let listings = load_csv(path).await?;
    store_listings(store, path, &listings).await
}

async fn store_listings(store: &dyn ListingStore, path: &Path, listings: &[ListingRecord]) -> Result<usize> {
    info!("Loaded {} listings from {}", listings.len(), path.display());

    let stored = store.upsert_all(listings).await?;
    info!("Imported {} of {} listings", stored, listings.len());
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_and_array_are_both_accepted() {
        let one = parse_json(r#"{"listing_id": "1", "title": "40 Acres Ranch Land"}"#).unwrap();
        assert_eq!(one.len(), 1);

        let many = parse_json(r#"[{"title": "A"}, {"title": "B", "acres": "40"}]"#).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].acres.as_deref(), Some("40"));
    }

    #[test]
    fn untitled_listings_are_dropped() {
        let listings = parse_json(r#"[{"title": ""}, {"price": "$1"}, {"title": "Kept"}]"#).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Kept");
    }

    #[test]
    fn csv_rows_map_onto_record_fields() {
        let csv = "listing_id,title,price,acres,location\n\
                   12345,40 Acres Ranch Land,\"$320,000\",40,\"Austin, TX\"\n\
                   67890,,$1,1,\n";
        let listings = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.listing_id.as_deref(), Some("12345"));
        assert_eq!(listing.price.as_deref(), Some("$320,000"));
        assert_eq!(listing.location.as_deref(), Some("Austin, TX"));
        assert!(listing.url.is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_json("not json").is_err());
    }
}

use land_finder::ListingRecord;
use land_finder::database::Database;
use land_finder::import::{import_csv, import_json};
use land_finder::traits::{ListingStore, RangeField, TextField};

fn listing(id: Option<&str>, title: &str, price: &str, acres: &str, location: &str) -> ListingRecord {
    let mut record = ListingRecord::new(title);
    record.listing_id = id.map(str::to_string);
    record.price = Some(price.to_string());
    record.acres = Some(acres.to_string());
    record.set_location(location.to_string());
    record
}

async fn seeded() -> Database {
    let database = Database::in_memory().await.unwrap();
    let listings = [
        listing(Some("1"), "Hill Country Ranch", "$450,000", "120", "Llano, TX"),
        listing(Some("2"), "Desert Lot", "$15,000", "2.5", "Tucson, AZ"),
        listing(Some("3"), "Cattle Farm", "$1,200,000", "1,250", "Amarillo, TX"),
    ];
    assert_eq!(database.upsert_all(&listings).await.unwrap(), 3);
    database
}

#[tokio::test]
async fn upsert_replaces_rows_with_the_same_listing_id() {
    let database = seeded().await;

    let updated = listing(Some("2"), "Desert Lot (reduced)", "$12,000", "2.5", "Tucson, AZ");
    assert!(database.upsert(&updated).await.unwrap());

    let all = database.query_all().await.unwrap();
    assert_eq!(all.len(), 3);
    let desert = all.iter().find(|l| l.listing_id.as_deref() == Some("2")).unwrap();
    assert_eq!(desert.title, "Desert Lot (reduced)");
    assert_eq!(desert.price.as_deref(), Some("$12,000"));
}

#[tokio::test]
async fn listings_without_id_are_always_inserted() {
    let database = Database::in_memory().await.unwrap();
    let record = listing(None, "Anonymous Tract", "$5,000", "1", "Nowhere, NM");

    database.upsert(&record).await.unwrap();
    database.upsert(&record).await.unwrap();

    assert_eq!(database.query_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn absent_fields_round_trip_as_none() {
    let database = Database::in_memory().await.unwrap();
    database.upsert(&ListingRecord::new("Bare")).await.unwrap();

    let stored = database.query_all().await.unwrap().remove(0);
    assert_eq!(stored.title, "Bare");
    assert!(stored.price.is_none());
    assert!(stored.listing_id.is_none());
    assert!(stored.date_scraped.is_some());
}

#[tokio::test]
async fn price_range_strips_currency_formatting() {
    let database = seeded().await;

    let mid = database
        .query_by_range(RangeField::Price, 100_000.0, Some(500_000.0))
        .await
        .unwrap();
    assert_eq!(mid.len(), 1);
    assert_eq!(mid[0].title, "Hill Country Ranch");

    let open_ended = database.query_by_range(RangeField::Price, 400_000.0, None).await.unwrap();
    assert_eq!(open_ended.len(), 2);
}

#[tokio::test]
async fn acres_range_handles_thousands_separators() {
    let database = seeded().await;

    let large = database.query_by_range(RangeField::Acres, 1000.0, None).await.unwrap();
    assert_eq!(large.len(), 1);
    assert_eq!(large[0].title, "Cattle Farm");
}

#[tokio::test]
async fn location_search_matches_city_or_state() {
    let database = seeded().await;

    let texas = database.query_by_text(TextField::Location, "tx").await.unwrap();
    assert_eq!(texas.len(), 2);

    let tucson = database.query_by_text(TextField::Location, "Tucson").await.unwrap();
    assert_eq!(tucson.len(), 1);
    assert_eq!(tucson[0].city.as_deref(), Some("Tucson"));
}

#[tokio::test]
async fn stats_count_by_state_largest_first() {
    let database = seeded().await;

    let stats = database.stats().await.unwrap();
    assert_eq!(stats.total_listings, 3);
    assert_eq!(stats.by_state[0], (Some("TX".to_string()), 2));
    assert_eq!(stats.by_state[1], (Some("AZ".to_string()), 1));
}

#[tokio::test]
async fn json_import_upserts_titled_listings() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("listings.json");
    std::fs::write(
        &file,
        r#"[
            {"listing_id": "12345", "title": "40 Acres Ranch Land", "price": "$320,000", "acres": "40"},
            {"listing_id": "67890", "price": "$1"}
        ]"#,
    )
    .unwrap();

    let database = Database::in_memory().await.unwrap();
    let stored = import_json(&database, &file).await.unwrap();

    assert_eq!(stored, 1);
    let all = database.query_all().await.unwrap();
    assert_eq!(all[0].listing_id.as_deref(), Some("12345"));
}

#[tokio::test]
async fn csv_import_upserts_titled_rows() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("listings.csv");
    std::fs::write(
        &file,
        "listing_id,title,price,acres,location,state\n\
         12345,40 Acres Ranch Land,\"$320,000\",40,\"Austin, TX\",TX\n\
         67890,,$1,1,,\n",
    )
    .unwrap();

    let database = Database::in_memory().await.unwrap();
    let stored = import_csv(&database, &file).await.unwrap();

    assert_eq!(stored, 1);
    let all = database.query_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "40 Acres Ranch Land");
    assert_eq!(all[0].price.as_deref(), Some("$320,000"));
    assert_eq!(all[0].state.as_deref(), Some("TX"));
    assert!(all[0].url.is_none());
}

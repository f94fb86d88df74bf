//! Data models for land listings and the partial results of detail-page scrapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A land listing scraped from a search-results card
///
/// Only `title` is required. Every other field is `None` when the page did not
/// provide it, which the store keeps distinct from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct ListingRecord {
    pub listing_id: Option<String>,
    pub title: String,
    pub property_type: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub acres: Option<String>,
    pub price_per_acre: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub county: Option<String>,
    pub zip_code: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub features: Option<String>,
    pub additional_info: Option<String>,
    pub date_listed: Option<String>,
    /// Stamped by the store on upsert, never by the scraper
    pub date_scraped: Option<DateTime<Utc>>,
}

impl ListingRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A record may be emitted only once it has a non-empty title
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Sets `location` and derives `city`/`state` from it.
    ///
    /// City is the text before the first comma and state the text after the
    /// last one. Both stay unset unless there are at least two segments.
    pub fn set_location(&mut self, location: String) {
        let parts: Vec<&str> = location.split(',').collect();
        if parts.len() >= 2 {
            self.city = Some(parts[0].trim().to_string());
            self.state = parts.last().map(|s| s.trim().to_string());
        }
        self.location = Some(location);
    }

    /// Fills fields a detail scrape produced, leaving existing values untouched
    pub fn merge_details(&mut self, details: ListingDetails) {
        fill(&mut self.description, details.description);
        fill(&mut self.agent_name, details.agent_name);
        fill(&mut self.agent_phone, details.agent_phone);
        fill(&mut self.latitude, details.latitude);
        fill(&mut self.longitude, details.longitude);
        fill(&mut self.features, details.features);
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none()
        && let Some(v) = value.filter(|v| !v.is_empty())
    {
        *slot = Some(v);
    }
}

/// Supplementary fields extracted from a listing's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDetails {
    pub description: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub features: Option<String>,
}

impl ListingDetails {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merging_empty_details_leaves_record_unchanged() {
        let mut record = ListingRecord::new("40 Acres");
        record.description = Some("Rolling hills".to_string());
        let before = record.clone();

        record.merge_details(ListingDetails::default());

        assert_eq!(record, before);
    }

    #[test]
    fn merge_sets_missing_description() {
        let mut record = ListingRecord::new("40 Acres");
        record.merge_details(ListingDetails {
            description: Some("x".to_string()),
            ..ListingDetails::default()
        });
        assert_eq!(record.description.as_deref(), Some("x"));
    }

    #[test]
    fn merge_never_overwrites_existing_field() {
        let mut record = ListingRecord::new("40 Acres");
        record.description = Some("original".to_string());
        record.merge_details(ListingDetails {
            description: Some("replacement".to_string()),
            agent_phone: Some("(555) 123-4567".to_string()),
            ..ListingDetails::default()
        });
        assert_eq!(record.description.as_deref(), Some("original"));
        assert_eq!(record.agent_phone.as_deref(), Some("(555) 123-4567"));
    }

    #[test]
    fn location_with_two_segments_derives_city_and_state() {
        let mut record = ListingRecord::new("Lot");
        record.set_location("Austin, Travis County, TX".to_string());
        assert_eq!(record.city.as_deref(), Some("Austin"));
        assert_eq!(record.state.as_deref(), Some("TX"));
    }

    #[test]
    fn location_without_comma_keeps_city_and_state_absent() {
        let mut record = ListingRecord::new("Lot");
        record.set_location("Somewhere in Texas".to_string());
        assert_eq!(record.location.as_deref(), Some("Somewhere in Texas"));
        assert!(record.city.is_none());
        assert!(record.state.is_none());
    }

    #[test]
    fn blank_title_is_not_valid() {
        assert!(!ListingRecord::new("   ").is_valid());
        assert!(ListingRecord::new("Ranch").is_valid());
    }

    #[test]
    fn imported_json_may_omit_optional_fields() {
        let record: ListingRecord =
            serde_json::from_str(r#"{"listing_id": "12345", "title": "40 Acres Ranch Land", "price": "$320,000"}"#)
                .unwrap();
        assert_eq!(record.listing_id.as_deref(), Some("12345"));
        assert_eq!(record.price.as_deref(), Some("$320,000"));
        assert!(record.acres.is_none());
    }
}

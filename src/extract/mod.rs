//! Listing-card discovery for search-result pages.
//!
//! Cards are located by a cascade of structural heuristics, most specific
//! first. The first tier that finds anything wins; later tiers only exist for
//! markup the earlier ones don't recognise.

pub mod details;
pub mod fields;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::ListingRecord;
use fields::{CARD_FIELDS, Field, pattern, selector};

pub use details::extract_details;
pub use fields::normalize_url;

static BLOCK_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| selector("div, article"));
static PROPERTY_ID_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| selector("div[data-property-id]"));
static CLASSED_DIVS: LazyLock<Selector> = LazyLock::new(|| selector("div[class]"));

static CARD_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)property|listing|card"));

const CARD_CLASS_KEYWORDS: &[&str] = &["propcard", "prop-card", "search-result"];

/// Finds candidate card elements in a parsed document
pub type CardStrategy = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

/// Card tiers in the order they are tried
pub const CARD_STRATEGIES: &[(&str, CardStrategy)] = &[
    ("class pattern", cards_by_class_pattern),
    ("property id attribute", cards_by_property_id),
    ("class keyword", cards_by_class_keyword),
];

/// Elements whose class or role looks like a property/listing card
pub fn cards_by_class_pattern(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&BLOCK_ELEMENTS)
        .filter(|el| {
            let value = el.value();
            value.attr("class").is_some_and(|c| CARD_CLASS.is_match(c))
                || value.attr("role").is_some_and(|r| CARD_CLASS.is_match(r))
        })
        .collect()
}

/// Elements carrying a `data-property-id` attribute
pub fn cards_by_property_id(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&PROPERTY_ID_ELEMENTS).collect()
}

/// Elements whose class mentions one of the known result-card keywords
pub fn cards_by_class_keyword(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&CLASSED_DIVS)
        .filter(|el| {
            el.value().attr("class").is_some_and(|class| {
                let class = class.to_lowercase();
                CARD_CLASS_KEYWORDS.iter().any(|k| class.contains(k))
            })
        })
        .collect()
}

/// Candidate cards from the first tier that finds any; empty if none do
pub fn extract_cards(document: &Html) -> Vec<ElementRef<'_>> {
    for (name, strategy) in CARD_STRATEGIES {
        let cards = strategy(document);
        if !cards.is_empty() {
            debug!("Card tier '{}' matched {} elements", name, cards.len());
            return cards;
        }
    }
    debug!("No card tier matched");
    Vec::new()
}

/// Runs every field extractor over a card, keeping it only if a title was found
pub fn extract_listing(card: ElementRef<'_>, site_root: &str) -> Option<ListingRecord> {
    let mut record = ListingRecord::default();

    for (field, extractor) in CARD_FIELDS {
        match extractor(card, site_root) {
            Some(value) => field.assign(&mut record, value),
            None if *field == Field::Title => {
                debug!("Discarding card without a title");
                return None;
            }
            None => debug!("Card has no {:?}", field),
        }
    }

    record.is_valid().then_some(record)
}

/// Extracts every valid listing from a search-results page.
///
/// Two cards with the same listing id are both returned.
pub fn parse_search_page(html: &str, site_root: &str) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    extract_cards(&document)
        .into_iter()
        .filter_map(|card| extract_listing(card, site_root))
        .collect()
}

//! Per-field extractors for a single listing card.
//!
//! Every extractor is total: a fragment that matches nothing yields `None`.
//! Each one tries its heuristics in order and the first hit wins.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::models::ListingRecord;

static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));

static TITLE_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)title|heading"));
static FOR_SALE_HREF: LazyLock<Regex> = LazyLock::new(|| pattern(r"/.*-for-sale/.*"));
static CURRENCY: LazyLock<Regex> = LazyLock::new(|| pattern(r"\$[\d,]+"));
static PRICE_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)price"));
static ACRES_TEXT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)[\d,.]+ acre"));
static ACRES_VALUE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)([\d,]+\.?\d*)\s*acre"));
static LOCATION_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)location|address|city"));
static PROPERTY_TYPE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\b(?:land|farm|ranch|lot)"));

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

pub(crate) fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| panic!("invalid built-in pattern {re:?}: {e}"))
}

/// A listing field the card extractor knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ListingId,
    Title,
    Url,
    Price,
    Acres,
    Location,
    ImageUrl,
    PropertyType,
}

/// Extracts one field from a card; the `&str` is the site root for link resolution
pub type FieldExtractor = fn(ElementRef<'_>, &str) -> Option<String>;

/// Card fields in the order they are extracted
pub const CARD_FIELDS: &[(Field, FieldExtractor)] = &[
    (Field::ListingId, listing_id),
    (Field::Title, title),
    (Field::Url, url),
    (Field::Price, price),
    (Field::Acres, acres),
    (Field::Location, location),
    (Field::ImageUrl, image_url),
    (Field::PropertyType, property_type),
];

impl Field {
    pub fn assign(self, record: &mut ListingRecord, value: String) {
        match self {
            Self::ListingId => record.listing_id = Some(value),
            Self::Title => record.title = value,
            Self::Url => record.url = Some(value),
            Self::Price => record.price = Some(value),
            Self::Acres => record.acres = Some(value),
            Self::Location => record.set_location(value),
            Self::ImageUrl => record.image_url = Some(value),
            Self::PropertyType => record.property_type = Some(value),
        }
    }
}

/// Resolves a link against the site root.
///
/// Absolute URLs pass through unchanged, so normalizing twice is harmless.
pub fn normalize_url(href: &str, site_root: &str) -> String {
    let href = href.trim();
    let root = site_root.trim_end_matches('/');

    if has_scheme(href, "http://") || has_scheme(href, "https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{root}{href}")
    } else {
        format!("{root}/{href}")
    }
}

fn has_scheme(href: &str, scheme: &str) -> bool {
    href.get(..scheme.len()).is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// Fragment, script and mail links never point at a listing
fn is_navigable(href: &str) -> bool {
    !(href.starts_with('#') || has_scheme(href, "javascript:") || has_scheme(href, "mailto:"))
}

/// Visible text of an element with whitespace runs trimmed away
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn is_script_like(element: Option<ElementRef<'_>>) -> bool {
    element.is_some_and(|el| matches!(el.value().name(), "script" | "style" | "noscript"))
}

/// Text nodes under `root` (script and style bodies excluded), paired with their parent element
pub(crate) fn text_nodes<'a>(
    root: ElementRef<'a>,
) -> impl Iterator<Item = (&'a str, Option<ElementRef<'a>>)> + 'a {
    root.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let parent = node.parent().and_then(ElementRef::wrap);
        if is_script_like(parent) {
            return None;
        }
        Some((&**text, parent))
    })
}

/// First text node under `root` matching `re`
pub(crate) fn find_text<'a>(root: ElementRef<'a>, re: &Regex) -> Option<&'a str> {
    text_nodes(root)
        .map(|(text, _)| text)
        .find(|text| re.is_match(text))
}

/// First descendant (not `root` itself) with one of `tags` whose class attribute matches `class_re`.
///
/// An empty tag list accepts any element.
pub(crate) fn find_by_class<'a>(
    root: ElementRef<'a>,
    tags: &[&str],
    class_re: &Regex,
) -> Option<ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| {
            (tags.is_empty() || tags.iter().any(|tag| *tag == el.value().name()))
                && el.value().attr("class").is_some_and(|c| class_re.is_match(c))
        })
}

fn first_match(card: ElementRef<'_>, site_root: &str, chain: &[FieldExtractor]) -> Option<String> {
    chain.iter().find_map(|heuristic| heuristic(card, site_root))
}

pub fn listing_id(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    let element = card.value();
    element
        .attr("data-property-id")
        .filter(|v| !v.trim().is_empty())
        .or_else(|| element.attr("id"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn title(card: ElementRef<'_>, site_root: &str) -> Option<String> {
    first_match(card, site_root, &[title_by_class, title_by_for_sale_link])
}

fn title_by_class(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    find_by_class(card, &["h2", "h3", "h4", "a"], &TITLE_CLASS)
        .map(element_text)
        .and_then(non_empty)
}

fn title_by_for_sale_link(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    card.select(&LINK)
        .find(|a| a.value().attr("href").is_some_and(|h| FOR_SALE_HREF.is_match(h)))
        .map(element_text)
        .and_then(non_empty)
}

pub fn url(card: ElementRef<'_>, site_root: &str) -> Option<String> {
    card.select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty() && is_navigable(href))
        .map(|href| normalize_url(href, site_root))
}

pub fn price(card: ElementRef<'_>, site_root: &str) -> Option<String> {
    first_match(card, site_root, &[price_by_currency_text, price_by_class])
}

fn price_by_currency_text(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    find_text(card, &CURRENCY).map(|t| t.trim().to_string())
}

fn price_by_class(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    find_by_class(card, &[], &PRICE_CLASS)
        .map(element_text)
        .and_then(non_empty)
}

pub fn acres(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    let text = find_text(card, &ACRES_TEXT)?;
    ACRES_VALUE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn location(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    find_by_class(card, &[], &LOCATION_CLASS)
        .map(element_text)
        .and_then(non_empty)
}

pub fn image_url(card: ElementRef<'_>, site_root: &str) -> Option<String> {
    let img = card.select(&IMAGE).next()?;
    let attr = |name: &str| img.value().attr(name).map(str::trim).filter(|v| !v.is_empty());
    attr("src")
        .or_else(|| attr("data-src"))
        .map(|src| normalize_url(src, site_root))
}

pub fn property_type(card: ElementRef<'_>, _site_root: &str) -> Option<String> {
    find_text(card, &PROPERTY_TYPE).map(|t| t.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const ROOT: &str = "https://www.landwatch.com";

    fn with_card<T>(html: &str, f: impl FnOnce(ElementRef<'_>) -> T) -> T {
        let fragment = Html::parse_fragment(html);
        let card = fragment
            .select(&selector("div.card"))
            .next()
            .expect("fixture has a div.card");
        f(card)
    }

    #[test]
    fn normalize_keeps_absolute_urls() {
        let url = "https://www.landwatch.com/texas-land-for-sale/pid/1";
        assert_eq!(normalize_url(url, ROOT), url);
        assert_eq!(normalize_url(&normalize_url(url, ROOT), ROOT), url);
    }

    #[test]
    fn normalize_resolves_relative_forms() {
        assert_eq!(
            normalize_url("//cdn.example.com/a.jpg", ROOT),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(normalize_url("/pid/42", ROOT), "https://www.landwatch.com/pid/42");
        assert_eq!(normalize_url("pid/42", ROOT), "https://www.landwatch.com/pid/42");
        assert_eq!(normalize_url("/pid/42", "https://www.landwatch.com/"), "https://www.landwatch.com/pid/42");
    }

    #[test]
    fn normalize_matches_scheme_case_insensitively() {
        assert_eq!(normalize_url("HTTPS://a.com/x", ROOT), "HTTPS://a.com/x");
        assert_eq!(normalize_url("Http://a.com/x", ROOT), "Http://a.com/x");
    }

    #[test]
    fn url_skips_fragment_script_and_mail_links() {
        let link = with_card(
            r##"<div class="card">
                <a href="#">Save</a>
                <a href="JavaScript:void(0)">Share</a>
                <a href="mailto:agent@example.com">Email</a>
                <a href="/texas-land-for-sale/pid/77">Tract</a>
            </div>"##,
            |card| url(card, ROOT),
        );
        assert_eq!(link.as_deref(), Some("https://www.landwatch.com/texas-land-for-sale/pid/77"));

        let none = with_card(r##"<div class="card"><a href="#top">Top</a></div>"##, |card| url(card, ROOT));
        assert!(none.is_none());
    }

    #[test]
    fn id_prefers_property_id_attribute() {
        let id = with_card(
            r#"<div class="card" id="dom-7" data-property-id="4242"></div>"#,
            |card| listing_id(card, ROOT),
        );
        assert_eq!(id.as_deref(), Some("4242"));

        let id = with_card(r#"<div class="card" id="dom-7"></div>"#, |card| listing_id(card, ROOT));
        assert_eq!(id.as_deref(), Some("dom-7"));
    }

    #[test]
    fn title_falls_back_to_for_sale_link() {
        let by_class = with_card(
            r#"<div class="card"><h3 class="PropertyTitle">  20 Acres in Llano </h3></div>"#,
            |card| title(card, ROOT),
        );
        assert_eq!(by_class.as_deref(), Some("20 Acres in Llano"));

        let by_link = with_card(
            r#"<div class="card"><a href="/llano-county-texas-land-for-sale/pid/9">Hill Country Tract</a></div>"#,
            |card| title(card, ROOT),
        );
        assert_eq!(by_link.as_deref(), Some("Hill Country Tract"));
    }

    #[test]
    fn title_is_absent_when_nothing_matches() {
        let missing = with_card(
            r#"<div class="card"><span>$10,000</span><a href="/about">About</a></div>"#,
            |card| title(card, ROOT),
        );
        assert!(missing.is_none());
    }

    #[test]
    fn price_prefers_currency_text_then_price_class() {
        let text = with_card(
            r#"<div class="card"><span>Only $125,000 </span></div>"#,
            |card| price(card, ROOT),
        );
        assert_eq!(text.as_deref(), Some("Only $125,000"));

        let class = with_card(
            r#"<div class="card"><span class="listing-price">Call for price</span></div>"#,
            |card| price(card, ROOT),
        );
        assert_eq!(class.as_deref(), Some("Call for price"));
    }

    #[test]
    fn acres_takes_leading_number() {
        let acres = with_card(
            r#"<div class="card"><span>1,250.5 acres</span></div>"#,
            |card| acres(card, ROOT),
        );
        assert_eq!(acres.as_deref(), Some("1,250.5"));
    }

    #[test]
    fn image_prefers_src_then_lazy_src() {
        let src = with_card(
            r#"<div class="card"><img src="//cdn.example.com/a.jpg" data-src="/lazy.jpg"></div>"#,
            |card| image_url(card, ROOT),
        );
        assert_eq!(src.as_deref(), Some("https://cdn.example.com/a.jpg"));

        let lazy = with_card(
            r#"<div class="card"><img data-src="/img/lazy.jpg"></div>"#,
            |card| image_url(card, ROOT),
        );
        assert_eq!(lazy.as_deref(), Some("https://www.landwatch.com/img/lazy.jpg"));
    }

    #[test]
    fn property_type_ignores_words_that_merely_contain_lot() {
        let kind = with_card(
            r#"<div class="card"><p>Pilot program</p><p>Ranch</p></div>"#,
            |card| property_type(card, ROOT),
        );
        assert_eq!(kind.as_deref(), Some("Ranch"));
    }

    #[test]
    fn script_text_is_not_searched() {
        let price = with_card(
            r#"<div class="card"><script>var p = "$999";</script></div>"#,
            |card| price(card, ROOT),
        );
        assert!(price.is_none());
    }
}

//! Extraction of supplementary fields from a listing's detail page

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::fields::{element_text, find_by_class, find_text, pattern, selector, text_nodes};
use crate::models::ListingDetails;

static SCRIPTS: LazyLock<Selector> = LazyLock::new(|| selector("script"));
static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("li[class]"));

static DESCRIPTION_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)description|detail"));
static AGENT_TEXT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)agent|broker|seller"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}"));
static COORDINATE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)lat.*lng|latitude.*longitude"));
static LATITUDE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)lat(?:itude)?["']?\s*[:=]\s*["']?([-\d.]+)"#));
static LONGITUDE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)(?:lng|lon(?:gitude)?)["']?\s*[:=]\s*["']?([-\d.]+)"#));
static FEATURE_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)feature|amenity"));

/// Pulls description, agent contact, coordinates and features out of a detail page.
///
/// Fields the page doesn't provide are left as `None`.
pub fn extract_details(html: &str) -> ListingDetails {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let description = find_by_class(root, &["div"], &DESCRIPTION_CLASS)
        .map(element_text)
        .filter(|t| !t.is_empty());

    let agent_name = text_nodes(root)
        .find(|(text, _)| AGENT_TEXT.is_match(text))
        .and_then(|(_, parent)| parent)
        .map(element_text)
        .filter(|t| !t.is_empty());

    let agent_phone = find_text(root, &PHONE).map(|t| t.trim().to_string());

    let (latitude, longitude) = coordinates(&document);

    let features: Vec<String> = document
        .select(&LIST_ITEMS)
        .filter(|li| li.value().attr("class").is_some_and(|c| FEATURE_CLASS.is_match(c)))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    let features = (!features.is_empty()).then(|| features.join(", "));

    ListingDetails {
        description,
        agent_name,
        agent_phone,
        latitude,
        longitude,
        features,
    }
}

fn coordinates(document: &Html) -> (Option<String>, Option<String>) {
    let Some(script) = document
        .select(&SCRIPTS)
        .map(|s| s.text().collect::<String>())
        .find(|body| COORDINATE_SCRIPT.is_match(body))
    else {
        return (None, None);
    };

    let capture = |re: &Regex| {
        re.captures(&script)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    (capture(&LATITUDE), capture(&LONGITUDE))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"
        <html><head>
          <script>window.analytics = {};</script>
          <script>var mapData = {"latitude": "30.2672", "longitude": "-97.7431"};</script>
        </head><body>
          <div class="property-description">Rolling hills with a creek.</div>
          <div class="contact"><span>Listing Agent: Jane Roe</span></div>
          <p>(512) 555-0199</p>
          <ul>
            <li class="feature-item">Well</li>
            <li class="feature-item">Barn</li>
            <li class="amenity">Paved road</li>
            <li>Unrelated</li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn extracts_every_detail_field() {
        let details = extract_details(DETAIL_PAGE);
        assert_eq!(details.description.as_deref(), Some("Rolling hills with a creek."));
        assert_eq!(details.agent_name.as_deref(), Some("Listing Agent: Jane Roe"));
        assert_eq!(details.agent_phone.as_deref(), Some("(512) 555-0199"));
        assert_eq!(details.latitude.as_deref(), Some("30.2672"));
        assert_eq!(details.longitude.as_deref(), Some("-97.7431"));
        assert_eq!(details.features.as_deref(), Some("Well, Barn, Paved road"));
    }

    #[test]
    fn short_coordinate_keys_are_understood() {
        let details = extract_details(r#"<script>map.init({lat: 35.1, lng: -101.8});</script>"#);
        assert_eq!(details.latitude.as_deref(), Some("35.1"));
        assert_eq!(details.longitude.as_deref(), Some("-101.8"));
    }

    #[test]
    fn page_without_details_is_empty() {
        let details = extract_details("<html><body><p>Nothing here</p></body></html>");
        assert!(details.is_empty());
    }
}

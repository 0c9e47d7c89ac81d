//! schema.org structured data: JSON-LD script blocks and inline microdata.
//!
//! Records from this strategy are the most trusted and are seeded with high
//! confidence before scoring.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;
use yachtscan_core::{Confidence, Currency, ListingRecord, RecordSource};

use crate::images::{accept_image_url, resolve_url};
use crate::price::{format_price, normalize_amount, MIN_PRICE_MAGNITUDE};
use crate::specs::{extract_boat_type, extract_length, extract_location, ExtractedSpecs};
use crate::text::{clean_text, inline_text, non_empty, truncate_chars};

const ACCEPTED_TYPES: &[&str] = &["Product", "Vehicle", "Offer", "Boat", "BoatOrShip"];
const MAX_DESCRIPTION_CHARS: usize = 2_000;

const JSONLD_SEED: Confidence = Confidence {
    overall: 85,
    title: 100,
    price: 90,
    images: 90,
    specs: 0,
};

const MICRODATA_SEED: Confidence = Confidence {
    overall: 80,
    title: 0,
    price: 0,
    images: 0,
    specs: 0,
};

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// Model years inside structured descriptions. Narrower than the free-text
/// extractor: product feeds are full of part numbers and SKUs.
static STRUCTURED_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19[89]\d|20[0-2]\d)\b").expect("valid regex"));

static MICRODATA_SCOPE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemscope][itemtype]").expect("valid selector"));

/// Runs both structured forms and returns every listing found, JSON-LD first.
#[must_use]
pub fn extract_structured_data(
    raw_html: &str,
    document: &Html,
    page_url: &Url,
) -> Vec<ListingRecord> {
    let mut records = extract_jsonld_listings(raw_html, page_url);
    let microdata = extract_microdata_listings(document, page_url);
    if !records.is_empty() && !microdata.is_empty() {
        tracing::debug!(
            page_url = %page_url,
            jsonld = records.len(),
            microdata = microdata.len(),
            "page carries both JSON-LD and microdata listings"
        );
    }
    records.extend(microdata);
    records
}

/// Listings from `<script type="application/ld+json">` blocks.
///
/// Accepts a top-level object or array, expands `@graph` containers and
/// `ItemList` wrappers, and skips blocks that fail to parse.
#[must_use]
pub fn extract_jsonld_listings(raw_html: &str, page_url: &Url) -> Vec<ListingRecord> {
    let mut results = Vec::new();

    for cap in SCRIPT_RE.captures_iter(raw_html) {
        let Some(json_text) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let value: Value = match serde_json::from_str(json_text.trim()) {
            Ok(v) => v,
            Err(err) => {
                tracing::debug!(page_url = %page_url, error = %err, "skipping malformed JSON-LD block");
                continue;
            }
        };

        let mut candidates = Vec::new();
        collect_candidates(&value, &mut candidates, 0);
        results.extend(
            candidates
                .into_iter()
                .filter(|item| type_matches(item))
                .filter_map(|item| jsonld_item_to_record(item, page_url)),
        );
    }

    results
}

/// Flattens arrays, `@graph` containers and `ItemList` members into a list
/// of candidate objects.
fn collect_candidates<'a>(value: &'a Value, out: &mut Vec<&'a Value>, depth: usize) {
    // Listing feeds nest at most a few levels; anything deeper is not ours.
    if depth > 8 {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_candidates(item, out, depth + 1);
            }
        }
        Value::Object(map) => {
            out.push(value);
            if let Some(graph) = map.get("@graph") {
                collect_candidates(graph, out, depth + 1);
            }
            if let Some(elements) = map.get("itemListElement") {
                collect_candidates(elements, out, depth + 1);
            }
            // ListItem wrappers carry the product under `item`.
            if let Some(item) = map.get("item").filter(|v| v.is_object()) {
                collect_candidates(item, out, depth + 1);
            }
        }
        _ => {}
    }
}

/// `@type` may be a plain string or an array of strings.
fn type_matches(item: &Value) -> bool {
    let Some(type_node) = item.get("@type") else {
        return false;
    };
    let accepted = |s: &str| {
        let bare = s.rsplit('/').next().unwrap_or(s);
        ACCEPTED_TYPES.iter().any(|t| bare.eq_ignore_ascii_case(t))
    };
    match type_node {
        Value::String(s) => accepted(s),
        Value::Array(types) => types.iter().filter_map(Value::as_str).any(accepted),
        _ => false,
    }
}

fn jsonld_item_to_record(item: &Value, page_url: &Url) -> Option<ListingRecord> {
    // A bare Offer describes its product under `itemOffered`.
    let product = item
        .get("itemOffered")
        .filter(|v| v.is_object())
        .unwrap_or(item);

    let title = string_field(product, "name").or_else(|| string_field(item, "name"));
    let description = string_field(product, "description")
        .map(|d| truncate_chars(&clean_text(&d), MAX_DESCRIPTION_CHARS))
        .and_then(|d| non_empty(&d));

    let offer = first_offer(item);
    let amount = offer.and_then(|o| {
        number_field(o, "price")
            .or_else(|| number_field(o, "lowPrice"))
            .filter(|p| *p >= MIN_PRICE_MAGNITUDE)
    });
    let currency = offer
        .and_then(|o| string_field(o, "priceCurrency"))
        .and_then(|code| Currency::from_code(&code))
        .unwrap_or(Currency::Usd);

    let images: Vec<String> = image_values(product.get("image").or_else(|| item.get("image")))
        .into_iter()
        .filter_map(|raw| accept_image_url(&raw, page_url))
        .fold(Vec::new(), |mut acc, url| {
            if !acc.contains(&url) {
                acc.push(url);
            }
            acc
        });

    if title.is_none() && amount.is_none() {
        return None;
    }

    let mut record = ListingRecord::new(page_url.as_str(), RecordSource::StructuredData);
    record.confidence = JSONLD_SEED;
    if title.is_none() {
        record.confidence.title = 0;
    }
    if amount.is_none() {
        record.confidence.price = 0;
    }
    if images.is_empty() {
        record.confidence.images = 0;
    }

    record.price_raw = amount;
    record.price = amount.map(|p| format_price(p, currency));
    record.currency = amount.map(|_| currency);
    record.detail_url = string_field(product, "url")
        .or_else(|| string_field(item, "url"))
        .and_then(|u| resolve_url(page_url, &u))
        .map(|u| u.to_string());
    record.images = images;

    let blob = format!(
        "{}\n{}",
        title.as_deref().unwrap_or_default(),
        description.as_deref().unwrap_or_default()
    );
    let year = model_date(product).or_else(|| {
        STRUCTURED_YEAR_RE
            .captures(&blob)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    });
    let location = offer
        .and_then(|o| o.get("availableAtOrFrom"))
        .and_then(address_locality)
        .or_else(|| extract_location(&blob));
    ExtractedSpecs {
        year,
        length: extract_length(&blob),
        boat_type: extract_boat_type(&blob),
        location,
    }
    .apply_to(&mut record);

    record.title = title;
    record.description = description;
    Some(record)
}

/// `offers` may be a single object or an array; an Offer item is its own
/// offer.
fn first_offer(item: &Value) -> Option<&Value> {
    let is_offer = item
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("Offer"));
    if is_offer {
        return Some(item);
    }
    match item.get("offers")? {
        Value::Array(offers) => offers
            .iter()
            .find(|o| o.get("price").is_some() || o.get("lowPrice").is_some())
            .or_else(|| offers.first()),
        offer @ Value::Object(_) => Some(offer),
        _ => None,
    }
}

/// `image` may be a string, an array of strings, an `ImageObject`, or an
/// array of `ImageObject`s.
fn image_values(node: Option<&Value>) -> Vec<String> {
    match node {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().flat_map(|v| image_values(Some(v))).collect(),
        Some(obj @ Value::Object(_)) => string_field(obj, "url")
            .or_else(|| string_field(obj, "contentUrl"))
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn model_date(product: &Value) -> Option<String> {
    ["vehicleModelDate", "modelDate", "productionDate"]
        .iter()
        .filter_map(|key| string_field(product, key))
        .find_map(|date| {
            STRUCTURED_YEAR_RE
                .captures(&date)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
}

fn address_locality(place: &Value) -> Option<String> {
    let address = place.get("address").unwrap_or(place);
    let city = string_field(address, "addressLocality")?;
    Some(match string_field(address, "addressRegion") {
        Some(region) => format!("{city}, {region}"),
        None => city,
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Prices in the wild are numbers or strings, sometimes with grouping.
fn number_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => normalize_amount(s.trim()),
        _ => None,
    }
}

/// Listings from `itemscope` elements typed as schema.org Product or Vehicle.
#[must_use]
pub fn extract_microdata_listings(document: &Html, page_url: &Url) -> Vec<ListingRecord> {
    document
        .select(&MICRODATA_SCOPE)
        .filter(|scope| {
            scope.value().attr("itemtype").is_some_and(|t| {
                let lower = t.to_ascii_lowercase();
                lower.contains("schema.org/product") || lower.contains("schema.org/vehicle")
            })
        })
        .filter_map(|scope| microdata_scope_to_record(&scope, page_url))
        .collect()
}

fn microdata_scope_to_record(scope: &ElementRef<'_>, page_url: &Url) -> Option<ListingRecord> {
    let title = itemprop_value(scope, "name");
    let amount = itemprop_value(scope, "price")
        .or_else(|| itemprop_value(scope, "lowPrice"))
        .and_then(|p| normalize_amount(p.trim_start_matches(['$', '€', '£']).trim()))
        .filter(|p| *p >= MIN_PRICE_MAGNITUDE);
    if title.is_none() && amount.is_none() {
        return None;
    }
    let currency = itemprop_value(scope, "priceCurrency")
        .and_then(|c| Currency::from_code(&c))
        .unwrap_or(Currency::Usd);

    let mut record = ListingRecord::new(page_url.as_str(), RecordSource::Microdata);
    record.confidence = MICRODATA_SEED;
    record.price_raw = amount;
    record.price = amount.map(|p| format_price(p, currency));
    record.currency = amount.map(|_| currency);
    record.description = itemprop_value(scope, "description")
        .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS));
    record.detail_url = itemprop_value(scope, "url")
        .and_then(|u| resolve_url(page_url, &u))
        .map(|u| u.to_string());

    let image_selector = itemprop_selector("image");
    for el in scope.select(&image_selector) {
        let raw = el
            .value()
            .attr("src")
            .or_else(|| el.value().attr("content"))
            .or_else(|| el.value().attr("href"));
        if let Some(url) = raw.and_then(|r| accept_image_url(r, page_url)) {
            if !record.images.contains(&url) {
                record.images.push(url);
            }
        }
    }

    let blob = format!(
        "{}\n{}",
        title.as_deref().unwrap_or_default(),
        record.description.as_deref().unwrap_or_default()
    );
    crate::specs::extract_specs(&blob).apply_to(&mut record);
    record.title = title;
    Some(record)
}

fn itemprop_selector(name: &str) -> Selector {
    // `name` comes from a fixed set of schema.org property names.
    Selector::parse(&format!("[itemprop~=\"{name}\"]")).expect("valid itemprop selector")
}

/// Value of the first `itemprop` in scope: `content`, then link/media
/// attributes, then visible text.
fn itemprop_value(scope: &ElementRef<'_>, name: &str) -> Option<String> {
    let selector = itemprop_selector(name);
    let el = scope.select(&selector).next()?;
    let value = el.value();
    let raw = value
        .attr("content")
        .or_else(|| match value.name() {
            "a" | "link" => value.attr("href"),
            "img" | "source" => value.attr("src"),
            "meta" => value.attr("content"),
            _ => None,
        })
        .map(str::to_string)
        .unwrap_or_else(|| inline_text(&el));
    non_empty(&raw)
}

#[cfg(test)]
mod tests {
    use yachtscan_core::{BoatType, LengthUnit};

    use super::*;

    fn page() -> Url {
        Url::parse("https://yachts.example.com/inventory").unwrap()
    }

    fn jsonld(body: &str) -> String {
        format!(r#"<html><head><script type="application/ld+json">{body}</script></head><body></body></html>"#)
    }

    #[test]
    fn product_with_offer_object() {
        let html = jsonld(
            r#"{"@context":"https://schema.org","@type":"Product","name":"2019 Sunseeker 76 Yacht",
                "description":"Motor yacht, LOA 76 ft, lying Antibes.",
                "image":"/media/sunseeker-76.jpg",
                "url":"/yachts/sunseeker-76",
                "offers":{"@type":"Offer","price":"2850000","priceCurrency":"EUR"}}"#,
        );
        let records = extract_jsonld_listings(&html, &page());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title.as_deref(), Some("2019 Sunseeker 76 Yacht"));
        assert_eq!(r.price_raw, Some(2_850_000.0));
        assert_eq!(r.currency, Some(Currency::Eur));
        assert_eq!(r.price.as_deref(), Some("€2,850,000"));
        assert_eq!(r.source, RecordSource::StructuredData);
        assert_eq!(r.confidence.overall, 85);
        assert_eq!(r.confidence.price, 90);
        assert_eq!(r.images, vec!["https://yachts.example.com/media/sunseeker-76.jpg".to_owned()]);
        assert_eq!(r.detail_url.as_deref(), Some("https://yachts.example.com/yachts/sunseeker-76"));
        assert_eq!(r.year.as_deref(), Some("2019"));
        assert_eq!(r.length.as_deref(), Some("76"));
        assert_eq!(r.length_unit, Some(LengthUnit::Ft));
        assert_eq!(r.boat_type, Some(BoatType::Motor));
    }

    #[test]
    fn offers_array_and_low_price() {
        let html = jsonld(
            r#"{"@type":"Vehicle","name":"Lagoon 42",
                "offers":[{"@type":"AggregateOffer","lowPrice":425000,"priceCurrency":"USD"}]}"#,
        );
        let records = extract_jsonld_listings(&html, &page());
        assert_eq!(records[0].price_raw, Some(425_000.0));
        assert_eq!(records[0].currency, Some(Currency::Usd));
    }

    #[test]
    fn implausibly_small_prices_are_ignored() {
        let titled = jsonld(r#"{"@type":"Product","name":"Dinghy cover","offers":{"price":"9.99"}}"#);
        let r = &extract_jsonld_listings(&titled, &page())[0];
        assert_eq!(r.price_raw, None);
        assert_eq!(r.price, None);

        let bare_offer = jsonld(r#"{"@type":"Offer","price":"9.99"}"#);
        assert!(extract_jsonld_listings(&bare_offer, &page()).is_empty());

        let doc = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/Product">
                 <span itemprop="price" content="25">$25</span></div>"#,
        );
        assert!(extract_microdata_listings(&doc, &page()).is_empty());
    }

    #[test]
    fn expands_graph_and_item_list() {
        let html = jsonld(
            r#"{"@context":"https://schema.org","@graph":[
                {"@type":"WebPage","name":"Inventory"},
                {"@type":"ItemList","itemListElement":[
                    {"@type":"ListItem","position":1,"item":{"@type":"Product","name":"Beneteau Oceanis 46","offers":{"price":310000}}},
                    {"@type":"ListItem","position":2,"item":{"@type":"Product","name":"Jeanneau 54","offers":{"price":690000}}}
                ]}
            ]}"#,
        );
        let titles: Vec<_> = extract_jsonld_listings(&html, &page())
            .into_iter()
            .filter_map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Beneteau Oceanis 46", "Jeanneau 54"]);
    }

    #[test]
    fn type_array_is_accepted() {
        let html = jsonld(r#"[{"@type":["Product","Boat"],"name":"Grand Banks 42"}]"#);
        assert_eq!(extract_jsonld_listings(&html, &page()).len(), 1);
    }

    #[test]
    fn image_object_forms() {
        let html = jsonld(
            r#"{"@type":"Product","name":"Nautor Swan 65",
                "image":[{"@type":"ImageObject","url":"https://cdn.example.com/a.jpg"},
                         {"contentUrl":"https://cdn.example.com/b.jpg"},
                         "data:image/png;base64,AAAA",
                         "https://cdn.example.com/logo.png"]}"#,
        );
        let r = &extract_jsonld_listings(&html, &page())[0];
        assert_eq!(
            r.images,
            vec![
                "https://cdn.example.com/a.jpg".to_owned(),
                "https://cdn.example.com/b.jpg".to_owned()
            ]
        );
    }

    #[test]
    fn malformed_blocks_and_other_types_are_skipped() {
        let html = format!(
            "{}{}",
            jsonld(r#"{"@type":"Product","name": broken"#),
            jsonld(r#"{"@type":"Organization","name":"Acme Yachts"}"#)
        );
        assert!(extract_jsonld_listings(&html, &page()).is_empty());
    }

    #[test]
    fn structured_year_ignores_implausible_numbers() {
        let html = jsonld(r#"{"@type":"Product","name":"Model 1850 tender, refit 2021"}"#);
        let r = &extract_jsonld_listings(&html, &page())[0];
        assert_eq!(r.year.as_deref(), Some("2021"));
    }

    #[test]
    fn microdata_product() {
        let doc = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/Product">
                 <h2 itemprop="name">2012 Fountaine Pajot Helia 44 Catamaran</h2>
                 <img itemprop="image" src="/photos/helia.jpg">
                 <span itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                   <meta itemprop="priceCurrency" content="GBP">
                   <span itemprop="price" content="365000">£365,000</span>
                 </span>
                 <a itemprop="url" href="/boats/helia-44">Details</a>
               </div>"#,
        );
        let records = extract_microdata_listings(&doc, &page());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.source, RecordSource::Microdata);
        assert_eq!(r.confidence.overall, 80);
        assert_eq!(r.price_raw, Some(365_000.0));
        assert_eq!(r.currency, Some(Currency::Gbp));
        assert_eq!(r.boat_type, Some(BoatType::Catamaran));
        assert_eq!(r.year.as_deref(), Some("2012"));
        assert_eq!(r.images, vec!["https://yachts.example.com/photos/helia.jpg".to_owned()]);
        assert_eq!(r.detail_url.as_deref(), Some("https://yachts.example.com/boats/helia-44"));
    }

    #[test]
    fn combined_extraction_puts_jsonld_first() {
        let html = format!(
            r#"{}<div itemscope itemtype="http://schema.org/Product"><span itemprop="name">Microdata Boat</span></div>"#,
            jsonld(r#"{"@type":"Product","name":"JSON-LD Boat"}"#)
        );
        let doc = Html::parse_document(&html);
        let titles: Vec<_> = extract_structured_data(&html, &doc, &page())
            .into_iter()
            .filter_map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["JSON-LD Boat", "Microdata Boat"]);
    }
}

//! Single-listing detail pages: one vessel, a gallery, a spec table.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;
use yachtscan_core::{Currency, ExtractionConfig, ListingRecord, RecordSource};

use super::SiteAdapter;
use crate::images::{accept_image_url, resolve_url, ImageRules};
use crate::price::format_price;
use crate::specs::extract_specs;
use crate::strategies::card::apply_price_text;
use crate::text::{element_text, inline_text, non_empty, truncate_chars};

const NAME: &str = "detail_page";
const MAX_DESCRIPTION_CHARS: usize = 2_000;

static CONTAINER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".yacht-detail, .yacht-details, .boat-detail, .boat-details, .listing-detail, \
         .listing-details, .vessel-detail, .vessel-details, #yacht-details, #boat-details",
    )
    .expect("valid selector")
});
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static SPEC_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*='spec'], [id*='spec'], table, dl").expect("valid selector")
});
static PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='price'], [id*='price']").expect("valid selector"));
static GALLERY_IMAGES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "[class*='gallery'] img, [class*='slider'] img, [class*='carousel'] img, \
         [class*='photos'] img, [class*='gallery'] a[href$='.jpg'], [class*='gallery'] a[href$='.jpeg']",
    )
    .expect("valid selector")
});
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*='description'], [id*='description']").expect("valid selector")
});
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));

pub struct DetailPageAdapter {
    rules: ImageRules,
}

impl DetailPageAdapter {
    #[must_use]
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            rules: ImageRules::from_config(config),
        }
    }
}

fn meta_content(document: &Html, key: &str) -> Option<String> {
    // `key` is one of a fixed set of Open Graph / product property names.
    let selector = Selector::parse(&format!("meta[property=\"{key}\"], meta[name=\"{key}\"]"))
        .expect("valid meta selector");
    document
        .select(&selector)
        .find_map(|m| m.value().attr("content"))
        .and_then(non_empty)
}

fn is_product_page(document: &Html) -> bool {
    meta_content(document, "og:type").is_some_and(|t| t.eq_ignore_ascii_case("product"))
}

impl SiteAdapter for DetailPageAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(&self, document: &Html, _page_url: &Url) -> bool {
        if document.select(&CONTAINER).next().is_some() {
            return true;
        }
        is_product_page(document)
            && document.select(&HEADING).next().is_some()
            && document.select(&SPEC_BLOCK).next().is_some()
    }

    fn parse(&self, document: &Html, page_url: &Url) -> Vec<ListingRecord> {
        let Some(container) = document
            .select(&CONTAINER)
            .next()
            .or_else(|| document.select(&BODY).next())
        else {
            return Vec::new();
        };

        let mut record = ListingRecord::new(page_url.as_str(), RecordSource::Adapter(NAME.to_owned()));

        record.title = document
            .select(&HEADING)
            .map(|h| inline_text(&h))
            .find(|t| !t.is_empty())
            .or_else(|| meta_content(document, "og:title"));

        if let Some(price_text) = container
            .select(&PRICE)
            .map(|el| inline_text(&el))
            .find(|t| !t.is_empty())
        {
            apply_price_text(&mut record, &price_text, true);
        }
        if record.price.is_none() {
            apply_meta_price(document, &mut record);
        }

        record.images = self.gallery(document, &container, page_url);

        record.description = container
            .select(&DESCRIPTION)
            .map(|el| inline_text(&el))
            .find(|t| !t.is_empty())
            .or_else(|| meta_content(document, "description"))
            .or_else(|| meta_content(document, "og:description"))
            .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS));

        record.detail_url = canonical_url(document, page_url).or_else(|| Some(page_url.to_string()));

        let mut blob: Vec<String> = container.select(&SPEC_BLOCK).map(|el| element_text(&el)).collect();
        if let Some(title) = &record.title {
            blob.push(title.clone());
        }
        if let Some(description) = &record.description {
            blob.push(description.clone());
        }
        extract_specs(&blob.join("\n")).apply_to(&mut record);

        if record.has_title() || record.has_numeric_price() {
            vec![record]
        } else {
            Vec::new()
        }
    }
}

impl DetailPageAdapter {
    /// Gallery images, then `og:image`, then anything else in the container.
    fn gallery(&self, document: &Html, container: &ElementRef<'_>, page_url: &Url) -> Vec<String> {
        let mut images: Vec<String> = Vec::new();
        let mut push = |url: String| {
            if !images.contains(&url) {
                images.push(url);
            }
        };

        for el in document.select(&GALLERY_IMAGES) {
            let found = if el.value().name() == "a" {
                el.value().attr("href").and_then(|h| accept_image_url(h, page_url))
            } else {
                self.rules.image_from_element(&el, page_url)
            };
            if let Some(url) = found {
                push(url);
            }
        }
        if let Some(url) = meta_content(document, "og:image").and_then(|u| accept_image_url(&u, page_url)) {
            push(url);
        }
        for url in self.rules.collect_images(container, page_url) {
            push(url);
        }
        images
    }
}

fn apply_meta_price(document: &Html, record: &mut ListingRecord) {
    let Some(amount) = meta_content(document, "product:price:amount")
        .and_then(|a| crate::price::normalize_amount(&a))
        .filter(|a| *a > 0.0)
    else {
        return;
    };
    let currency = meta_content(document, "product:price:currency")
        .and_then(|c| Currency::from_code(&c))
        .unwrap_or(Currency::Usd);
    record.price_raw = Some(amount);
    record.price = Some(format_price(amount, currency));
    record.currency = Some(currency);
}

fn canonical_url(document: &Html, page_url: &Url) -> Option<String> {
    static CANONICAL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("link[rel='canonical']").expect("valid selector"));
    let href = document.select(&CANONICAL).find_map(|l| l.value().attr("href"))?;
    let url = resolve_url(page_url, href)?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

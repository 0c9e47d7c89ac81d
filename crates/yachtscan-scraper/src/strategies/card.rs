//! Turns one listing-card element into a [`ListingRecord`].
//!
//! Shared by the site adapters and the generic heuristic; each caller passes
//! the selectors that describe its markup convention.

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Selector};
use url::Url;
use yachtscan_core::{ListingRecord, RecordSource};

use crate::images::{resolve_url, ImageRules};
use crate::price::{detect_price_sentinel, parse_price};
use crate::specs::extract_specs;
use crate::text::{element_text, inline_text, non_empty, truncate_chars};

const MIN_TITLE_CHARS: usize = 3;
const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1_000;

/// Comma-separated selectors kept apart so matches come back in list
/// order. A single `Selector` group yields document order instead.
#[derive(Debug, Clone)]
pub struct SelectorList(Vec<Selector>);

impl SelectorList {
    /// # Panics
    ///
    /// Panics if any selector in `css` is invalid. Callers pass literals.
    #[must_use]
    pub fn parse(css: &str) -> Self {
        Self(
            split_selector_list(css)
                .into_iter()
                .map(|part| Selector::parse(part).expect("valid card selector"))
                .collect(),
        )
    }

    /// Descendants of `element` matching each selector in turn. An element
    /// matched by several selectors appears once per match.
    #[must_use]
    pub fn select_ordered<'a>(&self, element: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.0.iter().flat_map(|sel| element.select(sel)).collect()
    }
}

/// Splits on commas outside brackets, parentheses and quotes.
fn split_selector_list(css: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in css.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(css[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(css[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Selectors describing where a card keeps each field, each in priority
/// order.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    pub title: SelectorList,
    pub price: SelectorList,
    pub image: SelectorList,
    pub link: SelectorList,
    pub specs: SelectorList,
    pub description: SelectorList,
}

impl CardSelectors {
    /// Builds selectors from CSS strings.
    ///
    /// # Panics
    ///
    /// Panics if a selector string is invalid. Callers pass literals.
    #[must_use]
    pub fn new(
        title: &str,
        price: &str,
        image: &str,
        link: &str,
        specs: &str,
        description: &str,
    ) -> Self {
        let parse = SelectorList::parse;
        Self {
            title: parse(title),
            price: parse(price),
            image: parse(image),
            link: parse(link),
            specs: parse(specs),
            description: parse(description),
        }
    }

    /// Broad selectors for unknown markup.
    #[must_use]
    pub fn generic() -> Self {
        Self::new(
            "h1, h2, h3, h4, h5, [class*='title'], [class*='name']",
            "[class*='price'], [class*='Price']",
            "img, [style*='background']",
            "[class*='title'] a[href], h2 a[href], h3 a[href], h4 a[href], a[href]",
            "[class*='spec'], [class*='detail'], [class*='meta'], ul, dl, table",
            "p, [class*='desc']",
        )
    }
}

/// Builds a record from `card`. Returns the record even when it is sparse;
/// callers decide whether a title or price is required.
#[must_use]
pub fn record_from_card(
    card: &ElementRef<'_>,
    page_url: &Url,
    source: RecordSource,
    selectors: &CardSelectors,
    rules: &ImageRules,
) -> ListingRecord {
    let mut record = ListingRecord::new(page_url.as_str(), source);
    let card_text = element_text(card);

    record.title = first_text(card, &selectors.title, is_plausible_title)
        .or_else(|| first_text(card, &selectors.link, is_plausible_title));

    if let Some(price_text) = first_text(card, &selectors.price, |t| !t.is_empty()) {
        apply_price_text(&mut record, &price_text, true);
    }
    if record.price.is_none() {
        apply_price_text(&mut record, &card_text, false);
    }

    let mut images: Vec<String> = Vec::new();
    for el in selectors.image.select_ordered(card) {
        let candidate = if el.value().name() == "img" {
            rules.image_from_element(&el, page_url)
        } else {
            el.value()
                .attr("style")
                .and_then(|style| rules.image_from_style(style, page_url))
        };
        if let Some(url) = candidate {
            if !images.contains(&url) {
                images.push(url);
            }
        }
    }
    for url in rules.collect_images(card, page_url) {
        if !images.contains(&url) {
            images.push(url);
        }
    }
    record.images = images;

    record.detail_url = card_links(card, &selectors.link, page_url).into_iter().next();

    record.description = first_text(card, &selectors.description, |t| t.chars().count() > 30)
        .map(|t| truncate_chars(&t, MAX_DESCRIPTION_CHARS));

    let mut spec_text: Vec<String> = Vec::new();
    for el in selectors.specs.select_ordered(card) {
        let text = element_text(&el);
        if !spec_text.contains(&text) {
            spec_text.push(text);
        }
    }
    let mut blob = spec_text.join("\n");
    if let Some(title) = record.title.as_deref() {
        blob.push('\n');
        blob.push_str(title);
    }
    blob.push('\n');
    blob.push_str(&card_text);
    extract_specs(&blob).apply_to(&mut record);

    record
}

/// Builds one record per card.
///
/// A link that appears in cards with different titles ("Enquire",
/// "/contact") is page chrome and never becomes a detail URL.
#[must_use]
pub fn records_from_cards(
    cards: &[ElementRef<'_>],
    page_url: &Url,
    source: &RecordSource,
    selectors: &CardSelectors,
    rules: &ImageRules,
) -> Vec<ListingRecord> {
    let mut built: Vec<(ListingRecord, Vec<String>)> = cards
        .iter()
        .map(|card| {
            let record = record_from_card(card, page_url, source.clone(), selectors, rules);
            let links = card_links(card, &selectors.link, page_url);
            (record, links)
        })
        .collect();

    let mut owners: HashMap<&str, HashSet<String>> = HashMap::new();
    for (index, (record, links)) in built.iter().enumerate() {
        // Untitled cards are told apart by position.
        let owner = record
            .title
            .as_deref()
            .map_or_else(|| format!("#{index}"), |t| t.trim().to_lowercase());
        for link in links {
            owners.entry(link.as_str()).or_default().insert(owner.clone());
        }
    }
    let shared: HashSet<String> = owners
        .into_iter()
        .filter(|(_, titles)| titles.len() > 1)
        .map(|(link, _)| link.to_owned())
        .collect();

    if !shared.is_empty() {
        tracing::debug!(page_url = %page_url, count = shared.len(), "ignoring links shared across cards");
    }
    for (record, links) in &mut built {
        record.detail_url = links.iter().find(|l| !shared.contains(*l)).cloned();
    }
    built.into_iter().map(|(record, _)| record).collect()
}

/// Applies price text to `record`.
///
/// Inside a dedicated price element a sentinel phrase wins over any number
/// ("Sold, was $1.2M" is sold). In free card text the number wins and the
/// sentinel is only a fallback.
pub(crate) fn apply_price_text(record: &mut ListingRecord, text: &str, sentinel_first: bool) {
    let sentinel = detect_price_sentinel(text);
    if sentinel_first {
        if let Some(label) = sentinel {
            set_sentinel(record, label);
            return;
        }
    }
    if let Some(parsed) = parse_price(text) {
        if let Some(raw) = parsed.raw {
            record.price_raw = Some(raw);
            record.price = parsed.display;
            record.currency = Some(parsed.currency);
            return;
        }
    }
    if let Some(label) = sentinel {
        set_sentinel(record, label);
    }
}

fn set_sentinel(record: &mut ListingRecord, label: &str) {
    record.price = Some(label.to_string());
    record.price_raw = Some(0.0);
    record.currency = None;
}

fn is_plausible_title(text: &str) -> bool {
    let len = text.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        return false;
    }
    // A bare price or a call-to-action is not a title.
    let starts_with_currency = text.starts_with(['$', '€', '£']);
    let lower = text.to_lowercase();
    !starts_with_currency
        && !matches!(
            lower.as_str(),
            "view details" | "more info" | "read more" | "details" | "view" | "enquire"
        )
}

fn first_text(card: &ElementRef<'_>, selectors: &SelectorList, accept: impl Fn(&str) -> bool) -> Option<String> {
    selectors
        .select_ordered(card)
        .iter()
        .map(inline_text)
        .find(|t| accept(t.as_str()))
}

/// Navigable links of the card in selector priority order, resolved
/// against the page URL and deduplicated.
pub(crate) fn card_links(card: &ElementRef<'_>, selectors: &SelectorList, page_url: &Url) -> Vec<String> {
    let own_href = (card.value().name() == "a")
        .then(|| card.value().attr("href"))
        .flatten();
    let matched = selectors.select_ordered(card);
    let mut links: Vec<String> = Vec::new();
    for href in own_href
        .into_iter()
        .chain(matched.iter().filter_map(|el| el.value().attr("href")))
        .map(str::trim)
        .filter(|href| {
            !href.is_empty()
                && !href.starts_with('#')
                && !href.to_ascii_lowercase().starts_with("javascript:")
                && !href.starts_with("mailto:")
                && !href.starts_with("tel:")
        })
    {
        let Some(url) = resolve_url(page_url, href) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        let Some(url) = non_empty(url.as_str()) else {
            continue;
        };
        if !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

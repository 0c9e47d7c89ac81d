//! Last-resort extraction for pages no adapter recognizes.
//!
//! Two phases: a fixed list of card selectors, then grouping elements by
//! class signature. Output is deliberately noisy; the confidence floor in
//! [`crate::scoring`] is what keeps it honest.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;
use yachtscan_core::{ListingRecord, RecordSource};

use super::card::{records_from_cards, CardSelectors};
use crate::images::ImageRules;
use crate::text::element_text;

/// A selector is accepted when its match count falls in this range.
const MIN_CARDS: usize = 2;
const MAX_CARDS: usize = 100;

/// Candidate text outside this window is layout, not a listing.
const MIN_CARD_TEXT: usize = 20;
const MAX_CARD_TEXT: usize = 5_000;

/// Exact class names first, then substring matches.
const CARD_SELECTORS: &[&str] = &[
    ".listing",
    ".listing-item",
    ".yacht",
    ".yacht-item",
    ".boat",
    ".boat-item",
    ".vessel",
    ".card",
    ".product",
    ".result",
    ".item",
    "article",
    "[class*='listing']",
    "[class*='yacht']",
    "[class*='boat']",
    "[class*='vessel']",
    "[class*='card']",
    "[class*='product']",
];

const GROUPABLE_TAGS: &[&str] = &["div", "li", "article", "section", "tr"];

static CURRENCY_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[$€£]\s*\d|\d[\d.,]*\s*(?:USD|EUR|GBP)\b").expect("valid regex")
});

static COMPILED_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    CARD_SELECTORS
        .iter()
        .map(|css| (*css, Selector::parse(css).expect("valid card selector")))
        .collect()
});

static ALL_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body *").expect("valid selector"));

static GENERIC_CARD: LazyLock<CardSelectors> = LazyLock::new(CardSelectors::generic);

/// Best-effort listing extraction.
#[must_use]
pub fn extract_heuristic(document: &Html, page_url: &Url, rules: &ImageRules) -> Vec<ListingRecord> {
    let cards = find_cards_by_selector(document).or_else(|| find_cards_by_signature(document));
    let Some(cards) = cards else {
        tracing::debug!(page_url = %page_url, "heuristic found no repeating card structure");
        return Vec::new();
    };

    let sized: Vec<_> = cards
        .into_iter()
        .filter(|card| {
            let len = element_text(card).chars().count();
            (MIN_CARD_TEXT..=MAX_CARD_TEXT).contains(&len)
        })
        .collect();
    records_from_cards(&sized, page_url, &RecordSource::Heuristic, &GENERIC_CARD, rules)
        .into_iter()
        .filter(|record| record.has_title() || record.has_numeric_price())
        .collect()
}

/// First selector whose outermost matches number between 2 and 100.
fn find_cards_by_selector(document: &Html) -> Option<Vec<ElementRef<'_>>> {
    COMPILED_SELECTORS.iter().find_map(|(css, selector)| {
        let matches = outermost(document.select(selector).collect());
        let count = matches.len();
        if (MIN_CARDS..=MAX_CARDS).contains(&count) {
            tracing::debug!(selector = css, count, "heuristic selector matched");
            Some(matches)
        } else {
            None
        }
    })
}

/// Drops matches nested inside another match so `.card` wrappers win over
/// `.card-title` children under a substring selector.
fn outermost(matches: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<_> = matches.iter().map(|el| el.id()).collect();
    matches
        .into_iter()
        .filter(|el| !el.ancestors().any(|a| ids.contains(&a.id())))
        .collect()
}

/// Groups elements by tag and sorted class list, keeps groups of at least
/// two where at least half the members show a currency amount, and returns
/// the largest. Ties go to the group seen first in document order.
fn find_cards_by_signature(document: &Html) -> Option<Vec<ElementRef<'_>>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ElementRef<'_>>> = HashMap::new();

    for el in document.select(&ALL_ELEMENTS) {
        let name = el.value().name();
        if !GROUPABLE_TAGS.contains(&name) {
            continue;
        }
        let mut classes: Vec<&str> = el.value().classes().collect();
        if classes.is_empty() {
            continue;
        }
        classes.sort_unstable();
        let signature = format!("{name}.{}", classes.join("."));
        groups
            .entry(signature.clone())
            .or_insert_with(|| {
                order.push(signature);
                Vec::new()
            })
            .push(el);
    }

    let mut best: Option<(&String, usize)> = None;
    for signature in &order {
        let members = &groups[signature];
        if members.len() < MIN_CARDS {
            continue;
        }
        let priced = members
            .iter()
            .filter(|el| CURRENCY_AMOUNT_RE.is_match(&element_text(el)))
            .count();
        if priced * 2 < members.len() {
            continue;
        }
        if best.is_none_or(|(_, size)| members.len() > size) {
            best = Some((signature, members.len()));
        }
    }

    let (signature, count) = best?;
    tracing::debug!(signature, count, "heuristic grouped cards by class signature");
    groups.remove(signature.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://boats.example.org/used-boats").unwrap()
    }

    fn rules() -> ImageRules {
        ImageRules {
            min_width: 200,
            min_height: 150,
        }
    }

    fn card(title: &str, price: &str) -> String {
        format!(
            r#"<div class="card"><h3 class="card-title">{title}</h3><span class="card-price">{price}</span><p>Freshwater kept, one owner</p><img src="/p/{title}.jpg" width="400" height="300"></div>"#
        )
    }

    #[test]
    fn selector_phase_finds_cards() {
        let html = format!(
            r#"<html><body><div class="cards">{}{}{}</div></body></html>"#,
            card("Bayliner 2855", "$32,500"),
            card("Sea Ray 340", "$89,000"),
            card("Boston Whaler 280", "$145,000"),
        );
        let doc = Html::parse_document(&html);
        let records = extract_heuristic(&doc, &page(), &rules());
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.source == RecordSource::Heuristic));
        assert_eq!(records[1].price_raw, Some(89_000.0));
    }

    #[test]
    fn single_match_is_not_a_grid() {
        let html = format!(
            "<html><body>{}</body></html>",
            card("Lonely boat listing", "$50,000")
        );
        let doc = Html::parse_document(&html);
        // One card is below the minimum for every selector and signature.
        assert!(extract_heuristic(&doc, &page(), &rules()).is_empty());
    }

    #[test]
    fn signature_phase_groups_priced_rows() {
        let html = r#"<html><body><table>
            <tr class="row inv"><td>Catalina 30 sailboat, well kept</td><td>$24,900</td></tr>
            <tr class="inv row"><td>Hunter 33 sloop with new sails</td><td>$41,000</td></tr>
            <tr class="inv row"><td>Island Packet 35 cutter rig</td><td>$99,500</td></tr>
            </table><div class="footer">About us</div><div class="footer">Contact</div></body></html>"#;
        let doc = Html::parse_document(html);
        let records = extract_heuristic(&doc, &page(), &rules());
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].price_raw, Some(99_500.0));
    }

    #[test]
    fn short_candidates_are_skipped() {
        let html = r#"<html><body>
            <div class="item">Menu</div><div class="item">Home</div><div class="item">Boats</div>
            </body></html>"#;
        let doc = Html::parse_document(html);
        assert!(extract_heuristic(&doc, &page(), &rules()).is_empty());
    }

    #[test]
    fn oversized_candidates_are_skipped() {
        let essay = "Full survey notes on the hull, rig, engines and electronics. ".repeat(100);
        let oversized = format!(
            r#"<div class="card"><h3>Beneteau Oceanis 51.1</h3><span class="card-price">$449,000</span><p>{essay}</p></div>"#
        );
        let html = format!(
            r#"<html><body><div class="cards">{}{}{oversized}{}</div></body></html>"#,
            card("Bayliner 2855", "$32,500"),
            card("Sea Ray 340", "$89,000"),
            card("Boston Whaler 280", "$145,000"),
        );
        let doc = Html::parse_document(&html);
        let records = extract_heuristic(&doc, &page(), &rules());
        let titles: Vec<_> = records.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["Bayliner 2855", "Sea Ray 340", "Boston Whaler 280"]);
    }

    #[test]
    fn outermost_keeps_wrappers() {
        let doc = Html::parse_document(
            r#"<div class="boat-card"><span class="boat-card-title">A</span></div>
               <div class="boat-card"><span class="boat-card-title">B</span></div>"#,
        );
        let sel = Selector::parse("[class*='card']").unwrap();
        let kept = outermost(doc.select(&sel).collect());
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|el| el.value().name() == "div"));
    }
}

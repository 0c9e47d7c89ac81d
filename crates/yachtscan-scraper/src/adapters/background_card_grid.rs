//! Card grids whose photos are CSS `background-image` declarations instead
//! of `img` elements. Page builders emit these; image-driven heuristics miss
//! them.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;
use yachtscan_core::{ExtractionConfig, ListingRecord, RecordSource};

use super::SiteAdapter;
use crate::images::ImageRules;
use crate::strategies::card::{records_from_cards, CardSelectors};

const NAME: &str = "background_card_grid";

/// A grid needs at least this many cards carrying a background image.
const MIN_BACKGROUND_CARDS: usize = 2;

static CARD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".boat-card, .yacht-card, .vessel-card, .listing-card, .card, .tile")
        .expect("valid selector")
});

static BACKGROUND: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[style*='background']").expect("valid selector"));

pub struct BackgroundCardGridAdapter {
    rules: ImageRules,
    selectors: CardSelectors,
}

impl BackgroundCardGridAdapter {
    #[must_use]
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            rules: ImageRules::from_config(config),
            selectors: CardSelectors::new(
                ".card-title, [class*='title'], [class*='name'], h2, h3, h4",
                "[class*='price']",
                "[style*='background']",
                "[class*='title'] a[href], h2 a[href], h3 a[href], h4 a[href], a[href]",
                "[class*='spec'], [class*='meta'], [class*='detail'], ul",
                "[class*='desc'], [class*='excerpt'], p",
            ),
        }
    }

    /// Outermost cards that carry a usable background image on themselves
    /// or a descendant.
    fn background_cards<'a>(&self, document: &'a Html, page_url: &Url) -> Vec<ElementRef<'a>> {
        document
            .select(&CARD)
            .filter(|card| {
                !card
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| CARD.matches(&a))
            })
            .filter(|card| self.has_background_image(card, page_url))
            .collect()
    }

    fn has_background_image(&self, card: &ElementRef<'_>, page_url: &Url) -> bool {
        let own = card
            .value()
            .attr("style")
            .and_then(|style| self.rules.image_from_style(style, page_url));
        own.is_some()
            || card.select(&BACKGROUND).any(|el| {
                el.value()
                    .attr("style")
                    .and_then(|style| self.rules.image_from_style(style, page_url))
                    .is_some()
            })
    }
}

impl SiteAdapter for BackgroundCardGridAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(&self, document: &Html, page_url: &Url) -> bool {
        self.background_cards(document, page_url).len() >= MIN_BACKGROUND_CARDS
    }

    fn parse(&self, document: &Html, page_url: &Url) -> Vec<ListingRecord> {
        records_from_cards(
            &self.background_cards(document, page_url),
            page_url,
            &RecordSource::Adapter(NAME.to_owned()),
            &self.selectors,
            &self.rules,
        )
        .into_iter()
        .filter(|r| r.has_title() || r.has_numeric_price())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://marine.example.com/boats").unwrap()
    }

    fn adapter() -> BackgroundCardGridAdapter {
        BackgroundCardGridAdapter::new(&ExtractionConfig::default())
    }

    #[test]
    fn parses_background_image_cards() {
        let doc = Html::parse_document(
            r#"<section>
                 <a class="boat-card" href="/boats/regal-33">
                   <div class="boat-card__media" style="background-image: url('/media/regal-33.jpg')"></div>
                   <div class="boat-card__title">2021 Regal 33 Express</div>
                   <div class="boat-card__price">$289,000</div>
                 </a>
                 <a class="boat-card" href="/boats/cobalt-r8">
                   <div class="boat-card__media" style="background-image: url(/media/cobalt-r8.jpg)"></div>
                   <div class="boat-card__title">2020 Cobalt R8</div>
                   <div class="boat-card__price">$215,000</div>
                 </a>
               </section>"#,
        );
        assert!(adapter().detect(&doc, &page()));
        let records = adapter().parse(&doc, &page());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("2021 Regal 33 Express"));
        assert_eq!(records[0].images, vec!["https://marine.example.com/media/regal-33.jpg".to_owned()]);
        assert_eq!(
            records[0].detail_url.as_deref(),
            Some("https://marine.example.com/boats/regal-33")
        );
        assert_eq!(records[1].price_raw, Some(215_000.0));
    }

    #[test]
    fn img_cards_are_not_detected() {
        let doc = Html::parse_document(
            r#"<div class="card"><img src="/a.jpg"><h3>One</h3></div>
               <div class="card"><img src="/b.jpg"><h3>Two</h3></div>"#,
        );
        assert!(!adapter().detect(&doc, &page()));
    }

    #[test]
    fn denylisted_backgrounds_do_not_count() {
        let doc = Html::parse_document(
            r#"<div class="card" style="background:url(/img/placeholder.png)"><h3>One</h3></div>
               <div class="card" style="background:url(/img/placeholder.png)"><h3>Two</h3></div>"#,
        );
        assert!(!adapter().detect(&doc, &page()));
    }
}

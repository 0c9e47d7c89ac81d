//! Brokerage inventory grids built from explicit listing classes, the markup
//! most yacht-broker site themes ship with.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;
use yachtscan_core::{ExtractionConfig, ListingRecord, RecordSource};

use super::SiteAdapter;
use crate::images::ImageRules;
use crate::strategies::card::{records_from_cards, CardSelectors};

const NAME: &str = "listing_grid";

static CARD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".yacht-listing, .boat-listing, .listing-item, .listing-card, .search-result-item, \
         .yacht-result, .boat-result, .vessel-listing",
    )
    .expect("valid selector")
});

pub struct ListingGridAdapter {
    rules: ImageRules,
    selectors: CardSelectors,
}

impl ListingGridAdapter {
    #[must_use]
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            rules: ImageRules::from_config(config),
            selectors: CardSelectors::new(
                ".listing-title, .yacht-title, .boat-title, .vessel-name, h2, h3, h4",
                ".listing-price, .yacht-price, .boat-price, [class*='price']",
                ".listing-image img, .yacht-image img, .listing-photo img, img",
                ".listing-title a, .yacht-title a, a.listing-link, h2 a, h3 a, h4 a, a[href]",
                ".listing-specs, .yacht-specs, .boat-specs, [class*='spec'], ul, dl",
                ".listing-description, .excerpt, [class*='desc'], p",
            ),
        }
    }
}

impl SiteAdapter for ListingGridAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(&self, document: &Html, _page_url: &Url) -> bool {
        document.select(&CARD).next().is_some()
    }

    fn parse(&self, document: &Html, page_url: &Url) -> Vec<ListingRecord> {
        let cards: Vec<_> = document
            .select(&CARD)
            // Theme wrappers sometimes repeat the class on an inner element.
            .filter(|card| {
                !card
                    .ancestors()
                    .filter_map(scraper::ElementRef::wrap)
                    .any(|a| CARD.matches(&a))
            })
            .collect();
        records_from_cards(
            &cards,
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
    use yachtscan_core::BoatType;

    use super::*;

    fn page() -> Url {
        Url::parse("https://broker.example.com/yachts-for-sale/").unwrap()
    }

    #[test]
    fn parses_theme_grid() {
        let doc = Html::parse_document(
            r#"<div class="results">
                 <div class="yacht-listing">
                   <div class="listing-image"><img data-src="/wp-content/uploads/prestige-590.jpg"></div>
                   <h3 class="listing-title"><a href="/yacht/prestige-590/">2018 Prestige 590</a></h3>
                   <div class="listing-price">USD 1,195,000</div>
                   <ul class="listing-specs"><li>59 ft</li><li>Located: Newport, RI</li></ul>
                 </div>
                 <div class="yacht-listing">
                   <h3 class="listing-title"><a href="/yacht/oyster-56/">Oyster 56 Ketch</a></h3>
                   <div class="listing-price">Price on Application</div>
                 </div>
               </div>"#,
        );
        let adapter = ListingGridAdapter::new(&ExtractionConfig::default());
        assert!(adapter.detect(&doc, &page()));
        let records = adapter.parse(&doc, &page());
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.source, RecordSource::Adapter("listing_grid".to_owned()));
        assert_eq!(first.title.as_deref(), Some("2018 Prestige 590"));
        assert_eq!(first.price_raw, Some(1_195_000.0));
        assert_eq!(
            first.detail_url.as_deref(),
            Some("https://broker.example.com/yacht/prestige-590/")
        );
        assert_eq!(
            first.images,
            vec!["https://broker.example.com/wp-content/uploads/prestige-590.jpg".to_owned()]
        );
        assert_eq!(first.length.as_deref(), Some("59"));
        assert_eq!(first.location.as_deref(), Some("Newport, RI"));

        let second = &records[1];
        assert_eq!(second.price.as_deref(), Some("Price on Application"));
        assert_eq!(second.boat_type, Some(BoatType::Sail));
    }

    #[test]
    fn shared_leading_link_and_badges_do_not_win() {
        let card = |slug: &str, title: &str, badge: &str| {
            format!(
                r#"<div class="yacht-listing">
                     <a href="/contact">Enquire</a>
                     <h4>{badge}</h4>
                     <h3><a href="/yacht/{slug}">{title}</a></h3>
                     <div class="price">$1,250,000</div>
                   </div>"#
            )
        };
        let html = format!(
            "<div>{}{}{}</div>",
            card("azimut-60", "2017 Azimut 60", "Featured"),
            card("ferretti-650", "2016 Ferretti 650", "Reduced"),
            card("riva-56", "2019 Riva 56 Rivale", "New arrival"),
        );
        let doc = Html::parse_document(&html);
        let records = ListingGridAdapter::new(&ExtractionConfig::default()).parse(&doc, &page());

        let titles: Vec<_> = records.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["2017 Azimut 60", "2016 Ferretti 650", "2019 Riva 56 Rivale"]);
        let links: Vec<_> = records.iter().filter_map(|r| r.detail_url.as_deref()).collect();
        assert_eq!(
            links,
            vec![
                "https://broker.example.com/yacht/azimut-60",
                "https://broker.example.com/yacht/ferretti-650",
                "https://broker.example.com/yacht/riva-56",
            ]
        );
    }

    #[test]
    fn does_not_detect_plain_pages() {
        let doc = Html::parse_document("<div class='card'><h3>Boat</h3></div>");
        let adapter = ListingGridAdapter::new(&ExtractionConfig::default());
        assert!(!adapter.detect(&doc, &page()));
    }
}

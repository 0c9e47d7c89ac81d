//! Site adapters: named detectors for known markup conventions.
//!
//! Dispatch is first-non-empty-wins. An adapter that detects its markup but
//! produces nothing does not stop dispatch; the next adapter is tried.

mod background_card_grid;
mod detail_page;
mod listing_grid;

pub use background_card_grid::BackgroundCardGridAdapter;
pub use detail_page::DetailPageAdapter;
pub use listing_grid::ListingGridAdapter;

use scraper::Html;
use url::Url;
use yachtscan_core::{ExtractionConfig, ListingRecord};

/// A site-specific extractor. Implementations are stateless after
/// construction and must not depend on each other.
pub trait SiteAdapter: Send + Sync {
    /// Stable identifier, recorded as the record's provenance.
    fn name(&self) -> &'static str;

    /// Whether the document uses this adapter's markup convention.
    fn detect(&self, document: &Html, page_url: &Url) -> bool;

    /// Listings for a document this adapter detected. May be empty.
    fn parse(&self, document: &Html, page_url: &Url) -> Vec<ListingRecord>;
}

/// Result of [`AdapterRegistry::dispatch`].
#[derive(Debug, Default)]
pub struct AdapterDispatch {
    /// Name and records of the first adapter that produced output.
    pub matched: Option<(&'static str, Vec<ListingRecord>)>,
    /// Adapters that detected the document but parsed nothing, in order.
    pub detected_empty: Vec<&'static str>,
}

/// Ordered adapter list. Order is priority.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SiteAdapter>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl AdapterRegistry {
    /// An empty registry. Dispatch always falls through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in adapters, most specific first.
    #[must_use]
    pub fn with_defaults(config: &ExtractionConfig) -> Self {
        let mut registry = Self::new();
        registry
            .register(ListingGridAdapter::new(config))
            .register(BackgroundCardGridAdapter::new(config))
            .register(DetailPageAdapter::new(config));
        registry
    }

    /// Appends an adapter at the lowest priority.
    pub fn register(&mut self, adapter: impl SiteAdapter + 'static) -> &mut Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Runs adapters in order and returns the first non-empty result.
    #[must_use]
    pub fn dispatch(&self, document: &Html, page_url: &Url) -> AdapterDispatch {
        let mut outcome = AdapterDispatch::default();
        for adapter in &self.adapters {
            let name = adapter.name();
            if !adapter.detect(document, page_url) {
                continue;
            }
            let records = adapter.parse(document, page_url);
            if records.is_empty() {
                tracing::warn!(
                    adapter = name,
                    page_url = %page_url,
                    "adapter detected its markup but parsed no listings"
                );
                outcome.detected_empty.push(name);
                continue;
            }
            tracing::debug!(adapter = name, count = records.len(), "adapter matched");
            outcome.matched = Some((name, records));
            break;
        }
        outcome
    }
}

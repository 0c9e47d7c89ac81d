//! Multi-page extraction runs.
//!
//! The session owns the fetcher, the config and the adapter registry, and
//! holds the most recent [`DebugReport`]. Records are pooled across pages
//! and deduplicated once at the end.

use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;
use yachtscan_core::{ExtractionConfig, ListingRecord};

use crate::adapters::AdapterRegistry;
use crate::error::ScraperError;
use crate::pipeline::{extract_listings, run_pipeline, ExtractionOutcome, PageExtraction};
use crate::report::DebugReport;
use crate::scoring::dedupe_records;

/// Source of raw page bodies.
pub trait PageFetcher {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, ScraperError>> + Send;
}

/// Pooled result of [`ExtractionSession::run`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    /// Deduplicated records from every page, truncated to `max_display_records`.
    pub records: Vec<ListingRecord>,
    pub total_found: usize,
    /// Set when the initial page could not be fetched or was rejected.
    pub error: Option<String>,
    pub pages_processed: usize,
    pub failed_pages: Vec<String>,
}

pub struct ExtractionSession<F> {
    fetcher: F,
    config: ExtractionConfig,
    adapters: AdapterRegistry,
    last_report: Option<DebugReport>,
}

impl<F: PageFetcher> ExtractionSession<F> {
    /// A session with the built-in adapters.
    pub fn new(fetcher: F, config: ExtractionConfig) -> Self {
        let adapters = AdapterRegistry::with_defaults(&config);
        Self::with_adapters(fetcher, config, adapters)
    }

    pub fn with_adapters(fetcher: F, config: ExtractionConfig, adapters: AdapterRegistry) -> Self {
        Self {
            fetcher,
            config,
            adapters,
            last_report: None,
        }
    }

    /// Report of the most recently processed page.
    pub fn last_report(&self) -> Option<&DebugReport> {
        self.last_report.as_ref()
    }

    /// Extracts from an already-loaded document.
    pub fn extract_document(&mut self, raw_html: &str, source_url: &str) -> ExtractionOutcome {
        let outcome = extract_listings(raw_html, source_url, &self.config, &self.adapters);
        self.last_report = Some(outcome.report.clone());
        outcome
    }

    /// Fetches and extracts `start_url`, then each of `discovered` in order.
    ///
    /// A failed initial fetch ends the run with an error. Failed secondary
    /// fetches are logged and skipped.
    pub async fn run(&mut self, start_url: &str, discovered: &[String]) -> SessionOutcome {
        let mut outcome = SessionOutcome::default();
        let mut pooled: Vec<ListingRecord> = Vec::new();

        match self.fetcher.fetch_page(start_url).await {
            Ok(html) => {
                let page = self.process_page(&html, start_url);
                outcome.error = page.error;
                outcome.pages_processed += 1;
                pooled.extend(page.records);
            }
            Err(err) => {
                tracing::warn!(url = start_url, error = %err, "initial page fetch failed");
                outcome.error = Some(format!("failed to fetch {start_url}: {err}"));
                outcome.failed_pages.push(start_url.to_owned());
                return outcome;
            }
        }

        let mut seen: HashSet<&str> = HashSet::from([start_url]);
        for url in discovered {
            if !seen.insert(url.as_str()) {
                continue;
            }
            match self.fetcher.fetch_page(url).await {
                Ok(html) => {
                    let page = self.process_page(&html, url);
                    if let Some(reason) = page.error {
                        tracing::debug!(url, reason, "discovered page produced no listings");
                    }
                    outcome.pages_processed += 1;
                    pooled.extend(page.records);
                }
                Err(err) => {
                    tracing::warn!(url, error = %err, "skipping discovered page after fetch failure");
                    outcome.failed_pages.push(url.clone());
                }
            }
        }

        let records = dedupe_records(pooled);
        outcome.total_found = records.len();
        outcome.records = records;
        outcome.records.truncate(self.config.max_display_records);

        tracing::info!(
            start_url,
            pages = outcome.pages_processed,
            failed = outcome.failed_pages.len(),
            total = outcome.total_found,
            "session finished"
        );
        outcome
    }

    fn process_page(&mut self, raw_html: &str, url: &str) -> PageExtraction {
        let page = run_pipeline(raw_html, url, &self.config, &self.adapters);
        self.last_report = Some(page.report.clone());
        page
    }
}

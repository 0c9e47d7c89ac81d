//! The extraction orchestrator.
//!
//! A pure function of (document, source URL, config, adapters) to
//! (records, report). Strategies run in strict priority order and the first
//! one that yields candidates wins; every candidate then passes through the
//! same scoring gate and deduplication.

use scraper::Html;
use serde::Serialize;
use url::Url;
use yachtscan_core::{ExtractionConfig, ListingRecord, RecordSource};

use crate::adapters::AdapterRegistry;
use crate::images::ImageRules;
use crate::report::DebugReport;
use crate::scoring::{dedupe_records, rejection_reason, score_record};
use crate::site::validate_site;
use crate::strategies::{extract_heuristic, extract_structured_data};

/// Records retained for one document plus its diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    /// Retained records, truncated to `max_display_records`.
    pub records: Vec<ListingRecord>,
    /// Retained records before truncation.
    pub total_found: usize,
    /// Why the document produced nothing, when it was rejected outright.
    pub error: Option<String>,
    pub report: DebugReport,
}

/// Uncapped result for one page; the session pools these across pages.
#[derive(Debug)]
pub(crate) struct PageExtraction {
    pub records: Vec<ListingRecord>,
    pub error: Option<String>,
    pub report: DebugReport,
}

/// Runs the full pipeline over one document.
///
/// Never fails: an unusable URL or a rejected page yields zero records and
/// an `error` string, with details in the report.
#[must_use]
pub fn extract_listings(
    raw_html: &str,
    source_url: &str,
    config: &ExtractionConfig,
    adapters: &AdapterRegistry,
) -> ExtractionOutcome {
    let page = run_pipeline(raw_html, source_url, config, adapters);
    let total_found = page.records.len();
    let mut records = page.records;
    records.truncate(config.max_display_records);
    ExtractionOutcome {
        records,
        total_found,
        error: page.error,
        report: page.report,
    }
}

pub(crate) fn run_pipeline(
    raw_html: &str,
    source_url: &str,
    config: &ExtractionConfig,
    adapters: &AdapterRegistry,
) -> PageExtraction {
    let mut report = DebugReport::new(source_url, raw_html);

    let page_url = match Url::parse(source_url.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(url) => {
            return rejected(report, format!("unsupported URL scheme \"{}\"", url.scheme()));
        }
        Err(err) => return rejected(report, format!("invalid source URL: {err}")),
    };

    let validation = validate_site(raw_html, config.min_keywords);
    let validation_reason = validation.reason.clone();
    report.record_validation(validation);
    if let Some(reason) = validation_reason {
        tracing::info!(source_url, reason, "site validation rejected document");
        return PageExtraction {
            records: Vec::new(),
            error: Some(reason),
            report,
        };
    }

    // html5ever recovers from any malformed input, so parsing cannot fail.
    let document = Html::parse_document(raw_html);

    let (strategy, candidates) =
        select_candidates(raw_html, &document, &page_url, config, adapters, &mut report);
    report.strategy = strategy;
    report.attempted = candidates.len();

    let mut retained = Vec::with_capacity(candidates.len());
    for mut record in candidates {
        score_record(&mut record, config);
        match rejection_reason(&record, config) {
            Some(reason) => {
                tracing::debug!(source_url, reason, "record rejected");
                report.reject(reason);
            }
            None => retained.push(record),
        }
    }

    let before_dedup = retained.len();
    let records = dedupe_records(retained);
    report.duplicates_dropped = before_dedup - records.len();
    report.accepted = records.len();

    tracing::info!(
        source_url,
        strategy = report.strategy.as_deref().unwrap_or("none"),
        attempted = report.attempted,
        accepted = report.accepted,
        rejected = report.rejected,
        duplicates = report.duplicates_dropped,
        "extraction finished"
    );
    if config.debug {
        tracing::debug!(report = ?report, "extraction debug report");
    }

    PageExtraction {
        records,
        error: None,
        report,
    }
}

/// Strict priority: structured data, then adapters, then the heuristic.
fn select_candidates(
    raw_html: &str,
    document: &Html,
    page_url: &Url,
    config: &ExtractionConfig,
    adapters: &AdapterRegistry,
    report: &mut DebugReport,
) -> (Option<String>, Vec<ListingRecord>) {
    let structured = extract_structured_data(raw_html, document, page_url);
    if !structured.is_empty() {
        tracing::debug!(source_url = %page_url, count = structured.len(), "structured data matched");
        return (Some(RecordSource::StructuredData.to_string()), structured);
    }

    let dispatch = adapters.dispatch(document, page_url);
    report.adapters_detected_empty = dispatch
        .detected_empty
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    if let Some((name, records)) = dispatch.matched {
        return (
            Some(RecordSource::Adapter(name.to_string()).to_string()),
            records,
        );
    }

    let heuristic = extract_heuristic(document, page_url, &ImageRules::from_config(config));
    if !heuristic.is_empty() {
        tracing::debug!(source_url = %page_url, count = heuristic.len(), "heuristic matched");
        return (Some(RecordSource::Heuristic.to_string()), heuristic);
    }

    (None, Vec::new())
}

fn rejected(mut report: DebugReport, reason: String) -> PageExtraction {
    tracing::warn!(source_url = report.source_url, reason, "document rejected");
    report.validation_reason = Some(reason.clone());
    PageExtraction {
        records: Vec::new(),
        error: Some(reason),
        report,
    }
}

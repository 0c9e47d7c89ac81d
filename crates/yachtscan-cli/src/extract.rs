//! Command handlers for `parse` and `fetch`.
//!
//! Both print a single pretty-printed JSON document to stdout; logs go to
//! stderr.

use std::path::Path;

use anyhow::Context;
use serde_json::{json, Value};
use yachtscan_core::{AppConfig, ExtractionConfig};
use yachtscan_scraper::{extract_listings, AdapterRegistry, ExtractionSession, HttpFetcher};

/// Extraction settings: the YAML file when given, otherwise the
/// environment-derived settings.
pub(crate) fn resolve_extraction_config(
    config: &AppConfig,
    file: Option<&Path>,
) -> anyhow::Result<ExtractionConfig> {
    match file {
        Some(path) => yachtscan_core::load_extraction_config_file(path)
            .with_context(|| format!("failed to load extraction config {}", path.display())),
        None => Ok(config.extraction.clone()),
    }
}

/// Runs the pipeline over a saved document.
///
/// # Errors
///
/// Returns an error if the config file or the document cannot be read.
/// Extraction itself never fails; rejections are reported in the output.
pub(crate) fn run_parse(
    config: &AppConfig,
    file: &Path,
    url: &str,
    extraction_file: Option<&Path>,
    include_report: bool,
) -> anyhow::Result<()> {
    let extraction = resolve_extraction_config(config, extraction_file)?;
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    tracing::debug!(file = %file.display(), bytes = html.len(), "read saved document");

    let registry = AdapterRegistry::with_defaults(&extraction);
    let outcome = extract_listings(&html, url, &extraction, &registry);

    let mut output = json!({
        "records": outcome.records,
        "totalFound": outcome.total_found,
        "error": outcome.error,
    });
    if include_report {
        output["report"] = serde_json::to_value(&outcome.report)?;
    }
    print_json(&output)
}

/// Fetches `url` plus `also` and pools their listings.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or the HTTP client
/// cannot be built. Page fetch failures are reported in the output.
pub(crate) async fn run_fetch(
    config: &AppConfig,
    url: &str,
    also: &[String],
    extraction_file: Option<&Path>,
    include_report: bool,
) -> anyhow::Result<()> {
    let extraction = resolve_extraction_config(config, extraction_file)?;
    let fetcher = HttpFetcher::from_config(config).context("failed to build HTTP client")?;

    let mut session = ExtractionSession::new(fetcher, extraction);
    let outcome = session.run(url, also).await;

    let mut output = serde_json::to_value(&outcome)?;
    if include_report {
        output["lastReport"] = match session.last_report() {
            Some(report) => serde_json::to_value(report)?,
            None => Value::Null,
        };
    }
    print_json(&output)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

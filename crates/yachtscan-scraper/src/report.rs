//! Per-run diagnostic snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::site::SiteValidation;
use crate::text::truncate_chars;

/// Characters of raw input kept in [`DebugReport::sample`].
pub const SAMPLE_CHARS: usize = 1_000;

/// Counts, findings and rejection reasons for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    pub source_url: String,
    pub generated_at: DateTime<Utc>,
    pub input_bytes: usize,
    pub site_valid: bool,
    pub validation_reason: Option<String>,
    pub keywords_found: BTreeSet<String>,
    pub inventory_markers_found: BTreeSet<String>,
    /// Strategy that produced candidates: `structured-data`, `adapter:<name>`
    /// or `heuristic`. `None` when nothing ran or nothing matched.
    pub strategy: Option<String>,
    pub adapters_detected_empty: Vec<String>,
    pub attempted: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates_dropped: usize,
    pub rejection_reasons: Vec<String>,
    pub sample: String,
}

impl DebugReport {
    #[must_use]
    pub fn new(source_url: &str, raw_html: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            generated_at: Utc::now(),
            input_bytes: raw_html.len(),
            site_valid: false,
            validation_reason: None,
            keywords_found: BTreeSet::new(),
            inventory_markers_found: BTreeSet::new(),
            strategy: None,
            adapters_detected_empty: Vec::new(),
            attempted: 0,
            accepted: 0,
            rejected: 0,
            duplicates_dropped: 0,
            rejection_reasons: Vec::new(),
            sample: truncate_chars(raw_html, SAMPLE_CHARS),
        }
    }

    pub(crate) fn record_validation(&mut self, validation: SiteValidation) {
        self.site_valid = validation.valid;
        self.validation_reason = validation.reason;
        self.keywords_found = validation.keywords_found;
        self.inventory_markers_found = validation.inventory_markers_found;
    }

    pub(crate) fn reject(&mut self, reason: String) {
        self.rejected += 1;
        self.rejection_reasons.push(reason);
    }
}

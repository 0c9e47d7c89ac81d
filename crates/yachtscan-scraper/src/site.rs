//! Cheap keyword pre-filter that rejects pages which are clearly not yacht
//! inventory before any DOM work happens.
//!
//! This is not a classifier. False positives are expected and are caught by
//! per-record confidence scoring downstream.

use std::collections::BTreeSet;

use serde::Serialize;

pub const NOT_A_YACHT_SITE: &str = "not a yacht site";
pub const NO_INVENTORY_MARKERS: &str = "no listing or inventory markers found";

const DOMAIN_KEYWORDS: &[&str] = &[
    "yacht",
    "boat",
    "vessel",
    "marine",
    "sail",
    "catamaran",
    "motor yacht",
    "sportfish",
    "trawler",
    "cruiser",
    "hull",
    "beam",
    "draft",
    "loa",
    "knots",
    "cabins",
    "berths",
    "helm",
    "flybridge",
    "marina",
    "brokerage",
    "broker",
    "charter",
    "nautical",
    "superyacht",
    "engine hours",
    "twin engine",
    "outboard",
    "inboard",
    "deck",
    "keel",
];

const INVENTORY_MARKERS: &[&str] = &[
    "for sale",
    "for-sale",
    "brokerage",
    "/listing",
    "/listings",
    "/inventory",
    "/yachts",
    "/boats",
    "/used",
    "/pre-owned",
    "listing",
    "inventory",
    "asking price",
    "price reduced",
    "view details",
];

/// Outcome of [`validate_site`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteValidation {
    pub valid: bool,
    pub reason: Option<String>,
    pub keywords_found: BTreeSet<String>,
    pub inventory_markers_found: BTreeSet<String>,
}

/// Checks `raw_html` for domain keywords and inventory markers.
///
/// Both checks always run so the debug report carries full findings; the
/// reason of the first failing check is the one returned.
#[must_use]
pub fn validate_site(raw_html: &str, min_keywords: usize) -> SiteValidation {
    let lower = raw_html.to_lowercase();

    let keywords_found: BTreeSet<String> = DOMAIN_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| (*k).to_string())
        .collect();
    let inventory_markers_found: BTreeSet<String> = INVENTORY_MARKERS
        .iter()
        .filter(|m| lower.contains(*m))
        .map(|m| (*m).to_string())
        .collect();

    let reason = if keywords_found.len() < min_keywords {
        Some(NOT_A_YACHT_SITE.to_string())
    } else if inventory_markers_found.is_empty() {
        Some(NO_INVENTORY_MARKERS.to_string())
    } else {
        None
    };

    SiteValidation {
        valid: reason.is_none(),
        reason,
        keywords_found,
        inventory_markers_found,
    }
}

//! Confidence scoring, per-field validation and deduplication.
//!
//! The confidence floor applied here is the single quality gate of the
//! pipeline. It is what makes the generic heuristic safe to run on any page.

use std::collections::HashSet;

use yachtscan_core::{ExtractionConfig, Issue, ListingRecord};

const TITLE_WEIGHT: u32 = 35;
const IMAGES_WEIGHT: u32 = 25;
const PRICE_WEIGHT: u32 = 15;
const YEAR_WEIGHT: u32 = 10;
const LENGTH_WEIGHT: u32 = 5;
const TYPE_WEIGHT: u32 = 5;
const LOCATION_WEIGHT: u32 = 5;
const TOTAL_WEIGHT: u32 = TITLE_WEIGHT
    + IMAGES_WEIGHT
    + PRICE_WEIGHT
    + YEAR_WEIGHT
    + LENGTH_WEIGHT
    + TYPE_WEIGHT
    + LOCATION_WEIGHT;

/// Added for structured-data and microdata records.
const PROVENANCE_BONUS: u32 = 10;

const SENTINEL_PRICE_SCORE: u8 = 50;

/// Overall confidence as a deterministic function of the fields present and
/// the record's provenance.
#[must_use]
pub fn compute_confidence(record: &ListingRecord) -> u8 {
    let mut earned = 0;
    if record.has_title() {
        earned += TITLE_WEIGHT;
    }
    if !record.images.is_empty() {
        earned += IMAGES_WEIGHT;
    }
    if record.has_numeric_price() {
        earned += PRICE_WEIGHT;
    }
    if record.year.is_some() {
        earned += YEAR_WEIGHT;
    }
    if record.length.is_some() {
        earned += LENGTH_WEIGHT;
    }
    if record.boat_type.is_some() {
        earned += TYPE_WEIGHT;
    }
    if record.location.is_some() {
        earned += LOCATION_WEIGHT;
    }

    // Integer rounding of earned / total as a percentage.
    let mut percent = (earned * 100 + TOTAL_WEIGHT / 2) / TOTAL_WEIGHT;
    if record.source.is_high_trust() {
        percent += PROVENANCE_BONUS;
    }
    u8::try_from(percent.min(100)).unwrap_or(100)
}

/// Recomputes `confidence` and `issues` for `record` in place.
pub fn score_record(record: &mut ListingRecord, config: &ExtractionConfig) {
    let confidence = &mut record.confidence;

    confidence.title = if record.title.as_deref().is_some_and(|t| !t.trim().is_empty()) {
        100
    } else {
        0
    };
    confidence.price = if record.price_raw.is_some_and(|p| p > 0.0) {
        if confidence.price == 0 {
            100
        } else {
            confidence.price
        }
    } else if record.price.is_some() {
        SENTINEL_PRICE_SCORE
    } else {
        0
    };
    confidence.images = if record.images.is_empty() {
        0
    } else if confidence.images == 0 {
        100
    } else {
        confidence.images
    };

    record.confidence.overall = compute_confidence(record);
    record.issues = validate_record(record, config);
}

/// Field-level issues for `record`. Only a missing title or a missing price
/// is an error; everything else is a warning and never blocks retention.
#[must_use]
pub fn validate_record(record: &ListingRecord, config: &ExtractionConfig) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !record.has_title() {
        issues.push(Issue::error("title", "Title is missing"));
    }

    match record.price_raw {
        Some(raw) if raw > 0.0 => {
            if raw < config.min_price || raw > config.max_price {
                issues.push(Issue::warning(
                    "price",
                    format!(
                        "Price {raw} is outside the plausible range {}–{}",
                        config.min_price, config.max_price
                    ),
                ));
            }
        }
        _ if record.has_sentinel_price() => {
            let label = record.price.as_deref().unwrap_or_default();
            issues.push(Issue::warning(
                "price",
                format!("Price is not numeric (\"{label}\"); importable as a draft"),
            ));
        }
        _ => issues.push(Issue::error("price", "Price is missing")),
    }

    if record.images.is_empty() {
        issues.push(Issue::warning("images", "No images found"));
    }
    if record.year.is_none() {
        issues.push(Issue::warning("year", "Year is missing"));
    }
    if record.length.is_none() {
        issues.push(Issue::warning("length", "Length is missing"));
    }
    if record.boat_type.is_none() {
        issues.push(Issue::warning("type", "Vessel type is unknown"));
    }
    if record.location.is_none() {
        issues.push(Issue::warning("location", "Location is missing"));
    }

    issues
}

/// Reason a scored record must be dropped, or `None` if it is retained.
#[must_use]
pub fn rejection_reason(record: &ListingRecord, config: &ExtractionConfig) -> Option<String> {
    if !record.has_title() && !record.has_numeric_price() {
        return Some(format!("record {} has no title and no price", record.id));
    }
    if record.confidence.overall < config.min_confidence {
        return Some(format!(
            "\"{}\" scored {} (minimum {})",
            record.title.as_deref().unwrap_or("untitled"),
            record.confidence.overall,
            config.min_confidence
        ));
    }
    None
}

/// Dedup key: the detail URL when present, otherwise the lower-cased trimmed
/// title joined with the numeric price (0 when absent).
#[must_use]
pub fn make_dedup_key(record: &ListingRecord) -> String {
    if let Some(url) = record
        .detail_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    {
        return format!("url:{url}");
    }
    let title = record
        .title
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let price = record.price_raw.unwrap_or(0.0);
    format!("title:{title}|{price}")
}

/// Keeps the first record for each [`make_dedup_key`]; later duplicates are
/// dropped silently.
#[must_use]
pub fn dedupe_records(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(make_dedup_key(record)))
        .collect()
}

#[cfg(test)]
#[path = "scoring_test.rs"]
mod tests;

//! Year, length, vessel type and location extraction from free text.
//!
//! Every pattern list here is ordered and first-match-wins. The order is part
//! of the extractor's contract: moving an entry changes which value wins when
//! a blob matches more than one pattern.

use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use yachtscan_core::{BoatType, LengthUnit, ListingRecord};

pub const YEAR_WEIGHT: u32 = 20;
pub const LENGTH_WEIGHT: u32 = 20;
pub const TYPE_WEIGHT: u32 = 15;
pub const LOCATION_WEIGHT: u32 = 15;

const MIN_YEAR: i32 = 1950;
const MIN_LENGTH: f64 = 15.0;
const MAX_LENGTH: f64 = 500.0;
const MIN_LOCATION_CHARS: usize = 3;
const MAX_LOCATION_CHARS: usize = 50;

/// Spec fields recovered from one text blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSpecs {
    pub year: Option<String>,
    pub length: Option<(String, LengthUnit)>,
    pub boat_type: Option<BoatType>,
    pub location: Option<String>,
}

impl ExtractedSpecs {
    /// Copies the extracted fields onto `record`, leaving fields the record
    /// already has untouched, and adds the weight of each field it filled to
    /// `confidence.specs`.
    pub fn apply_to(self, record: &mut ListingRecord) {
        if record.year.is_none() {
            if let Some(year) = self.year {
                record.year = Some(year);
                record.confidence.specs += YEAR_WEIGHT;
            }
        }
        if record.length.is_none() {
            if let Some((length, unit)) = self.length {
                record.length = Some(length);
                record.length_unit = Some(unit);
                record.confidence.specs += LENGTH_WEIGHT;
            }
        }
        if record.boat_type.is_none() {
            if let Some(boat_type) = self.boat_type {
                record.boat_type = Some(boat_type);
                record.confidence.specs += TYPE_WEIGHT;
            }
        }
        if record.location.is_none() {
            if let Some(location) = self.location {
                record.location = Some(location);
                record.confidence.specs += LOCATION_WEIGHT;
            }
        }
    }
}

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

static LENGTH_PATTERNS: LazyLock<Vec<(Regex, LengthUnit)>> = LazyLock::new(|| {
    [
        (
            r#"(?i)\b(?:loa|length)\s*:?\s*(\d+(?:\.\d+)?)\s*(?:ft\b|feet\b|foot\b|'|′)"#,
            LengthUnit::Ft,
        ),
        (
            r#"(?i)\b(\d+(?:\.\d+)?)\s*(?:ft\b|feet\b|foot\b|'|′)\s*(?:loa\b|length\b)?"#,
            LengthUnit::Ft,
        ),
        (
            r"(?i)\b(?:loa|length)\s*:?\s*(\d+(?:\.\d+)?)\s*(?:m|meters|metres)\b",
            LengthUnit::M,
        ),
        (
            r"(?i)\b(\d+(?:\.\d+)?)\s*(?:m|meters|metres)\b",
            LengthUnit::M,
        ),
    ]
    .into_iter()
    .map(|(pattern, unit)| (Regex::new(pattern).expect("valid length regex"), unit))
    .collect()
});

/// Keyword to category table. Earlier rows win: a "sailing catamaran" is a
/// catamaran, a "motor sailer" is sail.
const TYPE_KEYWORDS: &[(&str, BoatType)] = &[
    ("catamaran", BoatType::Catamaran),
    ("multihull", BoatType::Catamaran),
    ("power cat", BoatType::Catamaran),
    ("superyacht", BoatType::Superyacht),
    ("super yacht", BoatType::Superyacht),
    ("megayacht", BoatType::Superyacht),
    ("mega yacht", BoatType::Superyacht),
    ("sailboat", BoatType::Sail),
    ("sailing", BoatType::Sail),
    ("sail", BoatType::Sail),
    ("sloop", BoatType::Sail),
    ("ketch", BoatType::Sail),
    ("schooner", BoatType::Sail),
    ("cutter", BoatType::Sail),
    ("yawl", BoatType::Sail),
    ("motor yacht", BoatType::Motor),
    ("motoryacht", BoatType::Motor),
    ("motor", BoatType::Motor),
    ("sportfish", BoatType::Motor),
    ("trawler", BoatType::Motor),
    ("flybridge", BoatType::Motor),
    ("cruiser", BoatType::Motor),
    ("express", BoatType::Motor),
    ("center console", BoatType::Motor),
    ("power", BoatType::Motor),
];

static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Explicit label.
        r"(?i)\b(?:location|located|lying|port)\s*:\s*([^\n|•]+)",
        // City, ST
        r"\b([A-Z][a-zA-Z.]+(?: [A-Z][a-zA-Z.]+)*, [A-Z]{2})\b",
        // City, Country
        r"\b([A-Z][a-zA-Z]+(?: [A-Z][a-zA-Z]+)*, [A-Z][a-z]+(?: [A-Z][a-z]+)*)\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid location regex"))
    .collect()
});

/// Extracts all spec fields from `text` using the current calendar year.
#[must_use]
pub fn extract_specs(text: &str) -> ExtractedSpecs {
    extract_specs_for_year(text, chrono::Utc::now().year())
}

/// Extracts all spec fields, accepting model years up to `current_year`.
#[must_use]
pub fn extract_specs_for_year(text: &str, current_year: i32) -> ExtractedSpecs {
    ExtractedSpecs {
        year: extract_year(text, current_year),
        length: extract_length(text),
        boat_type: extract_boat_type(text),
        location: extract_location(text),
    }
}

/// First four-digit number within `MIN_YEAR..=current_year`.
#[must_use]
pub fn extract_year(text: &str, current_year: i32) -> Option<String> {
    YEAR_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .find(|m| {
            m.as_str()
                .parse::<i32>()
                .is_ok_and(|y| (MIN_YEAR..=current_year).contains(&y))
        })
        .map(|m| m.as_str().to_string())
}

/// First plausible length, tagged with the unit of the pattern that matched.
///
/// Patterns are tried in order; within a pattern, matches outside the
/// plausible range (a "2.5m" price shorthand, a 6ft tender) are skipped.
#[must_use]
pub fn extract_length(text: &str) -> Option<(String, LengthUnit)> {
    LENGTH_PATTERNS.iter().find_map(|(re, unit)| {
        re.captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .find(|m| {
                m.as_str()
                    .parse::<f64>()
                    .is_ok_and(|v| (MIN_LENGTH..=MAX_LENGTH).contains(&v))
            })
            .map(|m| (m.as_str().to_string(), *unit))
    })
}

#[must_use]
pub fn extract_boat_type(text: &str) -> Option<BoatType> {
    let lower = text.to_lowercase();
    TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, boat_type)| *boat_type)
}

#[must_use]
pub fn extract_location(text: &str) -> Option<String> {
    for re in LOCATION_PATTERNS.iter() {
        let Some(m) = re.captures(text).and_then(|cap| cap.get(1)) else {
            continue;
        };
        let candidate = m.as_str().trim().trim_end_matches([',', '.', ';']).trim();
        let len = candidate.chars().count();
        if (MIN_LOCATION_CHARS..=MAX_LOCATION_CHARS).contains(&len) {
            return Some(candidate.to_string());
        }
    }
    None
}

#[cfg(test)]
#[path = "specs_test.rs"]
mod tests;

//! Listing record types shared by the extraction pipeline and its callers.

use serde::{Deserialize, Serialize};

/// Closed set of vessel categories recognised by the boat-type keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoatType {
    Motor,
    Sail,
    Catamaran,
    Superyacht,
}

impl std::fmt::Display for BoatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoatType::Motor => write!(f, "motor"),
            BoatType::Sail => write!(f, "sail"),
            BoatType::Catamaran => write!(f, "catamaran"),
            BoatType::Superyacht => write!(f, "superyacht"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Ft,
    M,
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthUnit::Ft => write!(f, "ft"),
            LengthUnit::M => write!(f, "m"),
        }
    }
}

/// Currency a price was quoted in. Amounts are never converted between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    /// Display symbol used when formatting a price.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }

    /// Maps an ISO-4217 code (as found in `priceCurrency`) to a known currency.
    /// Unknown codes return `None`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Eur => write!(f, "EUR"),
            Currency::Gbp => write!(f, "GBP"),
        }
    }
}

/// Provenance tag identifying which strategy or adapter produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum RecordSource {
    StructuredData,
    Microdata,
    Adapter(String),
    Heuristic,
}

impl RecordSource {
    /// Sources whose markup is machine-readable and earns the provenance bonus.
    #[must_use]
    pub fn is_high_trust(&self) -> bool {
        matches!(self, RecordSource::StructuredData | RecordSource::Microdata)
    }
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSource::StructuredData => write!(f, "structured-data"),
            RecordSource::Microdata => write!(f, "microdata"),
            RecordSource::Adapter(name) => write!(f, "adapter:{name}"),
            RecordSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Per-record confidence, 0–100 for `overall`.
///
/// `specs` accumulates fixed weights per extracted spec field and is not
/// capped; only `overall` is bounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    pub overall: u8,
    pub title: u8,
    pub price: u8,
    pub images: u8,
    pub specs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A field-level extraction gap attached to an otherwise retained record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub field: String,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// One candidate yacht listing recovered from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    /// Opaque id, unique within one extraction run.
    pub id: String,
    pub title: Option<String>,
    /// Display string, e.g. `"$1,250,000"` or a sentinel label like `"Sold"`.
    pub price: Option<String>,
    /// Magnitude only. `Some(0.0)` marks a sentinel price.
    pub price_raw: Option<f64>,
    pub currency: Option<Currency>,
    /// Four-digit model year.
    pub year: Option<String>,
    pub length: Option<String>,
    pub length_unit: Option<LengthUnit>,
    #[serde(rename = "type")]
    pub boat_type: Option<BoatType>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Absolute image URLs; the first is the primary photo.
    pub images: Vec<String>,
    pub detail_url: Option<String>,
    pub source_url: String,
    pub source: RecordSource,
    pub confidence: Confidence,
    pub issues: Vec<Issue>,
}

impl ListingRecord {
    /// Creates an empty record for `source_url` tagged with `source`.
    #[must_use]
    pub fn new(source_url: &str, source: RecordSource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: None,
            price: None,
            price_raw: None,
            currency: None,
            year: None,
            length: None,
            length_unit: None,
            boat_type: None,
            location: None,
            description: None,
            images: Vec::new(),
            detail_url: None,
            source_url: source_url.to_owned(),
            source,
            confidence: Confidence::default(),
            issues: Vec::new(),
        }
    }

    /// `true` when the record carries a positive numeric price.
    #[must_use]
    pub fn has_numeric_price(&self) -> bool {
        self.price_raw.is_some_and(|p| p > 0.0)
    }

    /// `true` when a price string is present but carries no positive amount
    /// (`"Sold"`, `"Price on Application"`, ...).
    #[must_use]
    pub fn has_sentinel_price(&self) -> bool {
        self.price.as_deref().is_some_and(|p| !p.trim().is_empty()) && !self.has_numeric_price()
    }

    #[must_use]
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Issues of error severity only.
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }
}

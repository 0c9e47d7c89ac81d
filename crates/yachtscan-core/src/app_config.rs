use serde::Deserialize;

use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "yachtscan/0.1 (listing-extraction)";

/// Tunables for the extraction pipeline.
///
/// Every field has a default so a partial YAML file or an empty environment
/// still produces a usable configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Records scoring below this `confidence.overall` are dropped.
    pub min_confidence: u8,
    /// Distinct domain keywords a page must mention to pass site validation.
    pub min_keywords: usize,
    /// Lower bound of a plausible asking price, in any currency.
    pub min_price: f64,
    /// Upper bound of a plausible asking price, in any currency.
    pub max_price: f64,
    pub min_image_width: u32,
    pub min_image_height: u32,
    /// Records surfaced to a caller. The total found is reported separately.
    pub max_display_records: usize,
    /// Emit the full debug report through `tracing` after each run.
    pub debug: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 40,
            min_keywords: 3,
            min_price: 5_000.0,
            max_price: 100_000_000.0,
            min_image_width: 200,
            min_image_height: 150,
            max_display_records: 100,
            debug: false,
        }
    }
}

impl ExtractionConfig {
    /// Checks cross-field constraints that serde and env parsing cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_confidence > 100 {
            return Err(ConfigError::Invalid(format!(
                "min_confidence must be within 0..=100, got {}",
                self.min_confidence
            )));
        }
        if !(self.min_price.is_finite() && self.max_price.is_finite()) {
            return Err(ConfigError::Invalid("price bounds must be finite".into()));
        }
        if self.min_price >= self.max_price {
            return Err(ConfigError::Invalid(format!(
                "min_price ({}) must be below max_price ({})",
                self.min_price, self.max_price
            )));
        }
        if self.max_display_records == 0 {
            return Err(ConfigError::Invalid(
                "max_display_records must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub extraction: ExtractionConfig,
}

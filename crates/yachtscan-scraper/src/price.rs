//! Price parsing for free-text listing blobs.
//!
//! Patterns are tried in a fixed order (USD, EUR, GBP, then a bare
//! `price:`/`asking:` prefix that defaults to USD) and the first match wins.
//! Reordering [`PRICE_PATTERNS`] changes which currency a mixed-currency blob
//! resolves to.

use std::sync::LazyLock;

use regex::Regex;
use yachtscan_core::Currency;

/// Magnitudes below this are treated as mis-captures (model numbers, deposits).
pub const MIN_PRICE_MAGNITUDE: f64 = 1_000.0;

/// Result of running the price parser over a text blob.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    /// Normalized amount, `None` when the captured magnitude was implausible.
    pub raw: Option<f64>,
    pub currency: Currency,
    /// Formatted display string, present only when `raw` is.
    pub display: Option<String>,
}

static PRICE_PATTERNS: LazyLock<Vec<(Regex, Currency)>> = LazyLock::new(|| {
    [
        (r"\$\s*(\d[\d.,]*)", Currency::Usd),
        (r"(?i)\bUSD\s*(\d[\d.,]*)", Currency::Usd),
        (r"(?i)(\d[\d.,]*)\s*(?:USD|dollars)\b", Currency::Usd),
        (r"€\s*(\d[\d.,]*)", Currency::Eur),
        (r"(?i)\bEUR\s*(\d[\d.,]*)", Currency::Eur),
        (r"(?i)(\d[\d.,]*)\s*(?:€|EUR\b|euros?\b)", Currency::Eur),
        (r"£\s*(\d[\d.,]*)", Currency::Gbp),
        (r"(?i)\bGBP\s*(\d[\d.,]*)", Currency::Gbp),
        (r"(?i)(\d[\d.,]*)\s*(?:£|GBP\b)", Currency::Gbp),
        (r"(?i)\b(?:price|asking)\s*:?\s*(\d[\d.,]*)", Currency::Usd),
    ]
    .into_iter()
    .map(|(pattern, currency)| (Regex::new(pattern).expect("valid price regex"), currency))
    .collect()
});

/// Lead-in words that sit between a label and the currency symbol.
static LEAD_IN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:from|asking|now)\s*:?\s*([$€£])").expect("valid lead-in regex")
});

/// A dot followed by exactly three digits and then a non-digit (or the end)
/// marks European thousands grouping: `1.234.567,00`.
static EURO_GROUPING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\d{3}(?:\D|$)").expect("valid grouping regex"));

static SENTINEL_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bprice\s+on\s+application\b", "Price on Application"),
        (r"(?i)\bprice\s+on\s+request\b", "Price on Request"),
        (r"(?i)\b(?:call|contact)\s+for\s+(?:a\s+)?price\b", "Call for Price"),
        (r"(?i)\bunder\s+offer\b", "Under Offer"),
        (r"(?i)\bP\.?O\.?A\.?(?:\s|$)", "Price on Application"),
        (r"(?i)\bsold\b", "Sold"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("valid sentinel regex"), label))
    .collect()
});

/// Parses the first recognizable price in `text`.
///
/// Returns `None` when no pattern matches at all. Returns a [`ParsedPrice`]
/// with `raw: None` when a pattern matched but the amount was unparseable or
/// below [`MIN_PRICE_MAGNITUDE`].
#[must_use]
pub fn parse_price(text: &str) -> Option<ParsedPrice> {
    let text = LEAD_IN_RE.replace_all(text, "${1}");

    for (re, currency) in PRICE_PATTERNS.iter() {
        let Some(cap) = re.captures(&text) else {
            continue;
        };
        let Some(m) = cap.get(1) else {
            continue;
        };
        let raw = normalize_amount(m.as_str()).filter(|v| *v >= MIN_PRICE_MAGNITUDE);
        return Some(ParsedPrice {
            raw,
            currency: *currency,
            display: raw.map(|v| format_price(v, *currency)),
        });
    }
    None
}

/// Recognizes "sold" / "price on application" style phrases and returns the
/// display label to use in place of a numeric price.
#[must_use]
pub fn detect_price_sentinel(text: &str) -> Option<&'static str> {
    SENTINEL_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, label)| *label)
}

/// Converts a captured number with grouping separators into an `f64`.
///
/// European grouping (`1.234.567,89`) drops the dots and reads the comma as
/// the decimal point; everything else drops commas.
pub(crate) fn normalize_amount(captured: &str) -> Option<f64> {
    let trimmed = captured.trim_matches(|c| c == '.' || c == ',');
    if trimmed.is_empty() {
        return None;
    }
    let cleaned = if EURO_GROUPING_RE.is_match(trimmed) {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Formats `amount` with the currency symbol and comma thousands grouping,
/// rounded to whole units: `$1,234,567`.
#[must_use]
pub fn format_price(amount: f64, currency: Currency) -> String {
    // Listing prices are far below 2^53, so the rounded value is exact.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = amount.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{grouped}", currency.symbol())
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;

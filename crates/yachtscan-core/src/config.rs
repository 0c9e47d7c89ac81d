use std::path::Path;

use crate::app_config::{AppConfig, ExtractionConfig, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the resulting
/// extraction config is inconsistent.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the resulting
/// extraction config is inconsistent.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load an [`ExtractionConfig`] from a YAML file. Missing keys keep their defaults.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_extraction_config_file(path: &Path) -> Result<ExtractionConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_extraction_config_yaml(&content)
}

fn parse_extraction_config_yaml(content: &str) -> Result<ExtractionConfig, ConfigError> {
    // An empty document deserializes to unit, not to an empty map.
    let config = if content.trim().is_empty() {
        ExtractionConfig::default()
    } else {
        serde_yaml::from_str::<ExtractionConfig>(content)?
    };
    config.validate()?;
    Ok(config)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = ExtractionConfig::default();

    let or_default = |var: &str, default: String| -> String { lookup(var).unwrap_or(default) };

    let parse_num = |var: &str, default: String| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u8 = |var: &str, default: u8| -> Result<u8, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim().parse::<u8>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let extraction = ExtractionConfig {
        min_confidence: parse_u8("YACHTSCAN_MIN_CONFIDENCE", defaults.min_confidence)?,
        min_keywords: parse_usize("YACHTSCAN_MIN_KEYWORDS", defaults.min_keywords)?,
        min_price: parse_num("YACHTSCAN_MIN_PRICE", defaults.min_price.to_string())?,
        max_price: parse_num("YACHTSCAN_MAX_PRICE", defaults.max_price.to_string())?,
        min_image_width: parse_u32("YACHTSCAN_MIN_IMAGE_WIDTH", defaults.min_image_width)?,
        min_image_height: parse_u32("YACHTSCAN_MIN_IMAGE_HEIGHT", defaults.min_image_height)?,
        max_display_records: parse_usize(
            "YACHTSCAN_MAX_DISPLAY_RECORDS",
            defaults.max_display_records,
        )?,
        debug: parse_bool("YACHTSCAN_DEBUG", &or_default("YACHTSCAN_DEBUG", "false".into()))?,
    };
    extraction.validate()?;

    Ok(AppConfig {
        log_level: or_default("YACHTSCAN_LOG_LEVEL", "info".into()),
        fetch_timeout_secs: parse_u64("YACHTSCAN_FETCH_TIMEOUT_SECS", 20)?,
        user_agent: or_default("YACHTSCAN_USER_AGENT", DEFAULT_USER_AGENT.into()),
        extraction,
    })
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

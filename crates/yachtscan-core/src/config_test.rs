use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.fetch_timeout_secs, 20);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.extraction, ExtractionConfig::default());
    assert_eq!(cfg.extraction.min_confidence, 40);
    assert_eq!(cfg.extraction.min_keywords, 3);
    assert_eq!(cfg.extraction.min_image_width, 200);
    assert_eq!(cfg.extraction.min_image_height, 150);
    assert!(!cfg.extraction.debug);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("YACHTSCAN_MIN_CONFIDENCE", "55");
    map.insert("YACHTSCAN_MIN_KEYWORDS", "5");
    map.insert("YACHTSCAN_MAX_DISPLAY_RECORDS", "10");
    map.insert("YACHTSCAN_DEBUG", "true");
    map.insert("YACHTSCAN_LOG_LEVEL", "debug");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.extraction.min_confidence, 55);
    assert_eq!(cfg.extraction.min_keywords, 5);
    assert_eq!(cfg.extraction.max_display_records, 10);
    assert!(cfg.extraction.debug);
    assert_eq!(cfg.log_level, "debug");
}

#[test]
fn build_app_config_rejects_non_numeric_confidence() {
    let mut map = HashMap::new();
    map.insert("YACHTSCAN_MIN_CONFIDENCE", "high");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "YACHTSCAN_MIN_CONFIDENCE"),
        "expected InvalidEnvVar(YACHTSCAN_MIN_CONFIDENCE), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_confidence_above_100() {
    let mut map = HashMap::new();
    map.insert("YACHTSCAN_MIN_CONFIDENCE", "120");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::Invalid(_))),
        "expected Invalid, got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_inverted_price_bounds() {
    let mut map = HashMap::new();
    map.insert("YACHTSCAN_MIN_PRICE", "500000");
    map.insert("YACHTSCAN_MAX_PRICE", "1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn build_app_config_rejects_garbage_debug_flag() {
    let mut map = HashMap::new();
    map.insert("YACHTSCAN_DEBUG", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "YACHTSCAN_DEBUG")
    );
}

#[test]
fn yaml_config_fills_missing_keys_with_defaults() {
    let cfg = parse_extraction_config_yaml("min_confidence: 60\nmax_display_records: 25\n").unwrap();
    assert_eq!(cfg.min_confidence, 60);
    assert_eq!(cfg.max_display_records, 25);
    assert_eq!(cfg.min_keywords, 3);
    assert!((cfg.max_price - 100_000_000.0).abs() < f64::EPSILON);
}

#[test]
fn yaml_config_empty_document_is_default() {
    let cfg = parse_extraction_config_yaml("   \n").unwrap();
    assert_eq!(cfg, ExtractionConfig::default());
}

#[test]
fn yaml_config_rejects_unparseable_document() {
    let result = parse_extraction_config_yaml("min_confidence: [not, a, number]");
    assert!(matches!(result, Err(ConfigError::FileParse(_))));
}

#[test]
fn load_extraction_config_file_reports_missing_path() {
    let result = load_extraction_config_file(Path::new("/definitely/not/here.yaml"));
    assert!(
        matches!(result, Err(ConfigError::FileIo { ref path, .. }) if path.contains("here.yaml"))
    );
}

pub mod app_config;
pub mod config;
pub mod listing;

pub use app_config::{AppConfig, ExtractionConfig};
pub use config::{load_app_config, load_app_config_from_env, load_extraction_config_file};
pub use listing::{
    BoatType, Confidence, Currency, Issue, LengthUnit, ListingRecord, RecordSource, Severity,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    FileParse(#[from] serde_yaml::Error),

    #[error("invalid extraction config: {0}")]
    Invalid(String),
}

pub mod adapters;
pub mod error;
pub mod fetch;
pub mod images;
pub mod pipeline;
pub mod price;
pub mod report;
pub mod scoring;
pub mod session;
pub mod site;
pub mod specs;
pub mod strategies;
mod text;

pub use adapters::{AdapterRegistry, SiteAdapter};
pub use error::ScraperError;
pub use fetch::HttpFetcher;
pub use pipeline::{extract_listings, ExtractionOutcome};
pub use report::DebugReport;
pub use scoring::{compute_confidence, dedupe_records, make_dedup_key, validate_record};
pub use session::{ExtractionSession, PageFetcher, SessionOutcome};
pub use site::{validate_site, SiteValidation};

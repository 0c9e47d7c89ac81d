//! Extraction strategies in priority order: structured data, then the
//! adapter registry (see [`crate::adapters`]), then the generic heuristic.

pub mod card;
pub mod heuristic;
pub mod structured;

pub use heuristic::extract_heuristic;
pub use structured::{extract_jsonld_listings, extract_microdata_listings, extract_structured_data};

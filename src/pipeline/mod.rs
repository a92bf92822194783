//! Normalize → classify → aggregate, plus chart-ready series.

pub mod aggregator;
pub mod classifier;
pub mod normalizer;
pub mod series;

pub use aggregator::{aggregate, aggregate_feed, aggregate_normalized, build_feed, resolve_sector};
pub use classifier::infer_sector;
pub use normalizer::normalize;

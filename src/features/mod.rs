pub mod extract;
pub mod vector;

pub use extract::{extract_features, summarize_track, ExtractionParams, TrackSummary};
pub use vector::{FeatureKey, FeatureValue, FeatureVector};

//! # forage-scout
//!
//! Heuristic classifier for recorded GPS tracks. Tells slow, winding,
//! stop-and-go foraging excursions apart from ordinary hikes using nothing but
//! the movement pattern of the track.
//!
//! The pipeline is strictly layered:
//!
//! | Stage | Module |
//! |-------|--------|
//! | Track loading (GPX / JSON point lists) | [`track`] |
//! | Feature extraction | [`features`] |
//! | Weighted scoring with membership functions | [`scoring`] |
//! | Three-way labelling | [`classify`] |
//! | Batch orchestration | [`batch`] |
//!
//! All tunables live in an explicit [`config::Settings`] value that is passed
//! into every stage; nothing reads global state.
//!
//! ## Features
//!
//! - **`parallel`** - classify the tracks of a batch on the rayon thread pool

pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod features;
pub mod geo_utils;
pub mod output;
pub mod scoring;
pub mod track;

pub use batch::{run_batch, BatchError, BatchResult, CancelToken};
pub use classify::{classify_track, ClassificationResult, Label, Thresholds};
pub use config::{load_config, Config, Settings};
pub use error::{ClassifyError, ConfigurationError, ErrorKind, TrackError};
pub use features::{extract_features, FeatureKey, FeatureValue, FeatureVector};
pub use scoring::{calculate_score, Membership, ScoreResult, ScoringModel, ScoringWeights};
pub use track::{load_track, Track, TrackPoint, TrackScanner};

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::Settings;
use crate::error::{ClassifyError, ConfigurationError};
use crate::features::{extract_features, summarize_track, FeatureKey, FeatureVector, TrackSummary};
use crate::scoring::{calculate_score, FactorContribution};
use crate::track::Track;

/// Three-way outcome of classifying a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Uncertain,
    Negative,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Positive, Label::Uncertain, Label::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "positive",
            Label::Uncertain => "uncertain",
            Label::Negative => "negative",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score bands: `score >= high` is positive, `score <= low` negative,
/// anything between uncertain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    high: f64,
    low: f64,
}

impl Thresholds {
    pub fn new(high: f64, low: f64) -> Result<Self, ConfigurationError> {
        let mut errors = Vec::new();
        for (name, value) in [("high_threshold", high), ("low_threshold", low)] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{}: must lie within [0, 1], got {}", name, value));
            }
        }
        if errors.is_empty() && high < low {
            errors.push(format!(
                "high_threshold ({}) must not be below low_threshold ({})",
                high, low
            ));
        }
        if errors.is_empty() {
            Ok(Self { high, low })
        } else {
            Err(ConfigurationError::from_errors(errors))
        }
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn label_for(&self, score: f64) -> Label {
        if score >= self.high {
            Label::Positive
        } else if score <= self.low {
            Label::Negative
        } else {
            Label::Uncertain
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            low: 0.3,
        }
    }
}

/// Everything reported for one successfully classified track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub label: Label,
    pub score: f64,
    pub features: FeatureVector,
    /// Highest contributions first.
    pub top_contributors: Vec<(FeatureKey, f64)>,
    /// Sub-score, effective weight and contribution of every available
    /// feature, in the same order.
    pub breakdown: Vec<FactorContribution>,
    pub unavailable: Vec<FeatureKey>,
    pub summary: TrackSummary,
}

/// Run one track through extraction, scoring and labelling.
pub fn classify_track(
    track: &Track,
    settings: &Settings,
) -> Result<ClassificationResult, ClassifyError> {
    let features = extract_features(track, &settings.extraction);
    let scored = calculate_score(&features, &settings.model)?;
    let label = settings.thresholds.label_for(scored.score);

    debug!(
        track = track.id(),
        score = scored.score,
        label = %label,
        "classified track"
    );

    let top_contributors = scored.top_contributors(settings.top_contributors);
    Ok(ClassificationResult {
        id: track.id().to_string(),
        name: track.metadata().name.clone(),
        label,
        score: scored.score,
        top_contributors,
        breakdown: scored.breakdown.factors,
        unavailable: scored.breakdown.unavailable,
        summary: summarize_track(track),
        features,
    })
}

use serde::Serialize;

use super::config::ScoringModel;
use crate::error::ConfigurationError;
use crate::features::{FeatureKey, FeatureVector};

/// How one available feature entered the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub feature: FeatureKey,
    /// Raw feature value.
    pub value: f64,
    /// Membership output in [0, 1].
    pub sub_score: f64,
    /// Effective weight after redistribution.
    pub weight: f64,
    /// `sub_score * weight`.
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Available features, highest contribution first.
    pub factors: Vec<FactorContribution>,
    pub unavailable: Vec<FeatureKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoreResult {
    /// The `n` features that added most to the score. Features that added
    /// nothing are left out.
    pub fn top_contributors(&self, n: usize) -> Vec<(FeatureKey, f64)> {
        self.breakdown
            .factors
            .iter()
            .filter(|f| f.contribution > 0.0)
            .take(n)
            .map(|f| (f.feature, f.contribution))
            .collect()
    }

    /// Sum of the effective weights actually used; 1.0 up to rounding.
    pub fn effective_weight_sum(&self) -> f64 {
        self.breakdown.factors.iter().map(|f| f.weight).sum()
    }
}

/// Weighted sum of membership sub-scores over the available features.
///
/// Weights of unavailable features are redistributed proportionally among the
/// available ones, so a track without elevation or time data is neither
/// penalized nor inflated. Pure: the same inputs always give the same result.
///
/// Fails when no available feature carries any weight.
pub fn calculate_score(
    features: &FeatureVector,
    model: &ScoringModel,
) -> Result<ScoreResult, ConfigurationError> {
    let effective = model.weights.effective(features).ok_or_else(|| {
        ConfigurationError::new(
            "no available feature has a non-zero weight; score is undefined",
        )
    })?;

    let mut factors: Vec<FactorContribution> = features
        .available()
        .map(|(feature, value)| {
            let sub_score = model.membership(feature).apply(value);
            let weight = effective.get(&feature).copied().unwrap_or(0.0);
            FactorContribution {
                feature,
                value,
                sub_score,
                weight,
                contribution: weight * sub_score,
            }
        })
        .collect();

    let score: f64 = factors.iter().map(|f| f.contribution).sum();

    // Highest contribution first; ties keep feature order (stable sort)
    factors.sort_by(|a, b| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(ScoreResult {
        // Rounding can push a perfect sum a hair past 1
        score: score.clamp(0.0, 1.0),
        breakdown: ScoreBreakdown {
            factors,
            unavailable: features.unavailable(),
        },
    })
}

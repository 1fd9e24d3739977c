use std::collections::BTreeMap;

use super::factors::Membership;
use crate::error::ConfigurationError;
use crate::features::{FeatureKey, FeatureVector};

/// Raw default weights. They need not sum to 1; [`ScoringWeights::new`]
/// normalizes them.
pub const DEFAULT_WEIGHTS: [(FeatureKey, f64); 11] = [
    (FeatureKey::Tortuosity, 0.20),
    (FeatureKey::AvgSpeed, 0.15),
    (FeatureKey::SpeedVariance, 0.05),
    (FeatureKey::StopCount, 0.10),
    (FeatureKey::StopTimeFraction, 0.05),
    (FeatureKey::DirectionChangeRate, 0.10),
    (FeatureKey::SeasonMatch, 0.10),
    (FeatureKey::DaytimeMatch, 0.10),
    (FeatureKey::DurationHours, 0.10),
    (FeatureKey::AltitudeVariability, 0.05),
    (FeatureKey::SpatialDensity, 0.05),
];

/// Default "ideal range" for each feature.
pub fn default_membership(key: FeatureKey) -> Membership {
    match key {
        // 1.0 is a straight walk; foraging routes wander back and forth
        FeatureKey::Tortuosity => Membership::Linear { zero_at: 1.0, one_at: 2.5 },
        // km/h; slower is more likely
        FeatureKey::AvgSpeed => Membership::Linear { zero_at: 5.0, one_at: 2.0 },
        FeatureKey::SpeedVariance => Membership::Linear { zero_at: 0.25, one_at: 4.0 },
        FeatureKey::StopCount => Membership::Linear { zero_at: 0.0, one_at: 5.0 },
        FeatureKey::StopTimeFraction => Membership::Linear { zero_at: 0.0, one_at: 0.3 },
        // turns per km
        FeatureKey::DirectionChangeRate => Membership::Linear { zero_at: 1.0, one_at: 10.0 },
        FeatureKey::SeasonMatch => Membership::step(0.5),
        FeatureKey::DaytimeMatch => Membership::step(0.5),
        FeatureKey::DurationHours => Membership::Trapezoid {
            low: 0.5,
            plateau_start: 2.0,
            plateau_end: 6.0,
            high: 10.0,
        },
        // meters of elevation standard deviation
        FeatureKey::AltitudeVariability => Membership::Linear { zero_at: 0.0, one_at: 50.0 },
        // points per km
        FeatureKey::SpatialDensity => Membership::Linear { zero_at: 5.0, one_at: 30.0 },
    }
}

/// Non-negative feature weights, normalized to sum to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    weights: BTreeMap<FeatureKey, f64>,
}

impl ScoringWeights {
    /// Validate and normalize raw weights. Features missing from `raw` get
    /// weight 0. Fails when any weight is negative or non-finite, or when all
    /// weights are zero.
    pub fn new(raw: BTreeMap<FeatureKey, f64>) -> Result<Self, ConfigurationError> {
        let mut errors = Vec::new();
        for (key, weight) in &raw {
            if !weight.is_finite() || *weight < 0.0 {
                errors.push(format!(
                    "weights.{}: must be a non-negative number, got {}",
                    key, weight
                ));
            }
        }
        if !errors.is_empty() {
            return Err(ConfigurationError::from_errors(errors));
        }

        let total: f64 = raw.values().sum();
        if total <= 0.0 {
            return Err(ConfigurationError::new("weights: all weights are zero"));
        }

        let weights = FeatureKey::ALL
            .iter()
            .map(|k| (*k, raw.get(k).copied().unwrap_or(0.0) / total))
            .collect();
        Ok(Self { weights })
    }

    /// Normalized weight of a feature.
    pub fn get(&self, key: FeatureKey) -> f64 {
        self.weights.get(&key).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
        self.weights.iter().map(|(k, w)| (*k, *w))
    }

    /// Weights over only the available features of `features`, rescaled so
    /// they sum to 1.0. An unavailable feature's weight is shared among the
    /// rest in proportion to their own weights. `None` when the available
    /// features carry no weight at all.
    pub fn effective(&self, features: &FeatureVector) -> Option<BTreeMap<FeatureKey, f64>> {
        let available: Vec<(FeatureKey, f64)> = features
            .available()
            .map(|(key, _)| (key, self.get(key)))
            .collect();
        let total: f64 = available.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return None;
        }
        Some(available.into_iter().map(|(k, w)| (k, w / total)).collect())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let total: f64 = DEFAULT_WEIGHTS.iter().map(|(_, w)| w).sum();
        Self {
            weights: DEFAULT_WEIGHTS.iter().map(|(k, w)| (*k, w / total)).collect(),
        }
    }
}

/// Weights plus per-feature membership shapes: everything the engine needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringModel {
    pub weights: ScoringWeights,
    overrides: BTreeMap<FeatureKey, Membership>,
}

impl ScoringModel {
    /// `overrides` replace the default membership of the features they name.
    pub fn new(weights: ScoringWeights, overrides: BTreeMap<FeatureKey, Membership>) -> Self {
        Self { weights, overrides }
    }

    pub fn membership(&self, key: FeatureKey) -> Membership {
        self.overrides
            .get(&key)
            .copied()
            .unwrap_or_else(|| default_membership(key))
    }
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureValue;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_default_weights_normalized() {
        let weights = ScoringWeights::default();
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        assert!(approx_eq(total, 1.0));
        assert!(approx_eq(weights.get(FeatureKey::Tortuosity), 0.20 / 1.05));
    }

    #[test]
    fn test_new_normalizes_and_fills_missing() {
        let raw = BTreeMap::from([(FeatureKey::Tortuosity, 3.0), (FeatureKey::AvgSpeed, 1.0)]);
        let weights = ScoringWeights::new(raw).unwrap();
        assert!(approx_eq(weights.get(FeatureKey::Tortuosity), 0.75));
        assert!(approx_eq(weights.get(FeatureKey::AvgSpeed), 0.25));
        assert_eq!(weights.get(FeatureKey::SpatialDensity), 0.0);
        assert_eq!(weights.iter().count(), FeatureKey::ALL.len());
    }

    #[test]
    fn test_new_rejects_all_zero() {
        let raw = BTreeMap::from([(FeatureKey::Tortuosity, 0.0)]);
        let err = ScoringWeights::new(raw).unwrap_err();
        assert!(err.errors[0].contains("all weights are zero"));
        assert!(ScoringWeights::new(BTreeMap::new()).is_err());
    }

    #[test]
    fn test_new_collects_all_negative_weights() {
        let raw = BTreeMap::from([
            (FeatureKey::Tortuosity, -1.0),
            (FeatureKey::AvgSpeed, f64::NAN),
            (FeatureKey::StopCount, 1.0),
        ]);
        let err = ScoringWeights::new(raw).unwrap_err();
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn test_effective_redistributes_proportionally() {
        let raw = BTreeMap::from([
            (FeatureKey::Tortuosity, 0.5),
            (FeatureKey::AvgSpeed, 0.3),
            (FeatureKey::AltitudeVariability, 0.2),
        ]);
        let weights = ScoringWeights::new(raw).unwrap();
        let mut features = FeatureVector::from_values([
            (FeatureKey::Tortuosity, 2.0),
            (FeatureKey::AvgSpeed, 1.0),
        ]);
        features.set(FeatureKey::AltitudeVariability, FeatureValue::Unavailable);

        let effective = weights.effective(&features).unwrap();
        // The missing 0.2 is shared 5:3
        assert!(approx_eq(effective[&FeatureKey::Tortuosity], 0.625));
        assert!(approx_eq(effective[&FeatureKey::AvgSpeed], 0.375));
        assert!(!effective.contains_key(&FeatureKey::AltitudeVariability));
    }

    #[test]
    fn test_effective_none_without_weighted_features() {
        let raw = BTreeMap::from([(FeatureKey::AltitudeVariability, 1.0)]);
        let weights = ScoringWeights::new(raw).unwrap();
        let features = FeatureVector::from_values([(FeatureKey::Tortuosity, 2.0)]);
        assert!(weights.effective(&features).is_none());
    }

    #[test]
    fn test_model_membership_override() {
        let custom = Membership::step(3.0);
        let model = ScoringModel::new(
            ScoringWeights::default(),
            BTreeMap::from([(FeatureKey::Tortuosity, custom)]),
        );
        assert_eq!(model.membership(FeatureKey::Tortuosity), custom);
        assert_eq!(
            model.membership(FeatureKey::AvgSpeed),
            default_membership(FeatureKey::AvgSpeed)
        );
    }

    #[test]
    fn test_default_memberships_are_valid() {
        for key in FeatureKey::ALL {
            assert!(default_membership(key).validate().is_ok(), "{}", key);
        }
    }
}

use std::collections::BTreeMap;

use tracing::warn;

use super::config::{ScoringModel, ScoringWeights, DEFAULT_WEIGHTS};
use super::factors::Membership;
use crate::features::FeatureKey;

/// Validate the scoring section of a configuration and build the model.
/// Returns all validation errors at once (not just the first).
///
/// An empty `weights` map keeps the default weights; a non-empty one replaces
/// them entirely. Unknown feature names are logged and ignored.
pub fn validate_scoring(
    weights: &BTreeMap<String, f64>,
    membership: &BTreeMap<String, Membership>,
) -> Result<ScoringModel, Vec<String>> {
    let mut errors = Vec::new();

    let mut raw = BTreeMap::new();
    for (name, weight) in weights {
        match name.parse::<FeatureKey>() {
            Ok(key) => {
                raw.insert(key, *weight);
            }
            Err(_) => warn!(feature = %name, "ignoring weight for unknown feature"),
        }
    }
    if raw.is_empty() && !weights.is_empty() {
        errors.push("weights: no known feature is named".to_string());
    }

    let weights = if weights.is_empty() {
        Some(ScoringWeights::default())
    } else if raw.is_empty() {
        None
    } else {
        match ScoringWeights::new(raw) {
            Ok(w) => Some(w),
            Err(e) => {
                errors.extend(e.errors);
                None
            }
        }
    };

    let mut overrides = BTreeMap::new();
    for (name, shape) in membership {
        let key = match name.parse::<FeatureKey>() {
            Ok(key) => key,
            Err(_) => {
                warn!(feature = %name, "ignoring membership for unknown feature");
                continue;
            }
        };
        if let Err(e) = shape.validate() {
            errors.push(format!("membership.{}: invalid {} - {}", key, shape, e));
        } else {
            overrides.insert(key, *shape);
        }
    }

    match weights {
        Some(weights) if errors.is_empty() => Ok(ScoringModel::new(weights, overrides)),
        _ => Err(errors),
    }
}

/// Default weights keyed by feature name, as written in a config file.
pub fn default_weight_map() -> BTreeMap<String, f64> {
    DEFAULT_WEIGHTS
        .iter()
        .map(|(key, w)| (key.to_string(), *w))
        .collect()
}

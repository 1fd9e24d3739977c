use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// The fixed set of features computed for every track. Declaration order is
/// the canonical order used for output and tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    Tortuosity,
    AvgSpeed,
    SpeedVariance,
    StopCount,
    StopTimeFraction,
    DirectionChangeRate,
    SeasonMatch,
    DaytimeMatch,
    DurationHours,
    AltitudeVariability,
    SpatialDensity,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 11] = [
        FeatureKey::Tortuosity,
        FeatureKey::AvgSpeed,
        FeatureKey::SpeedVariance,
        FeatureKey::StopCount,
        FeatureKey::StopTimeFraction,
        FeatureKey::DirectionChangeRate,
        FeatureKey::SeasonMatch,
        FeatureKey::DaytimeMatch,
        FeatureKey::DurationHours,
        FeatureKey::AltitudeVariability,
        FeatureKey::SpatialDensity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::Tortuosity => "tortuosity",
            FeatureKey::AvgSpeed => "avg_speed",
            FeatureKey::SpeedVariance => "speed_variance",
            FeatureKey::StopCount => "stop_count",
            FeatureKey::StopTimeFraction => "stop_time_fraction",
            FeatureKey::DirectionChangeRate => "direction_change_rate",
            FeatureKey::SeasonMatch => "season_match",
            FeatureKey::DaytimeMatch => "daytime_match",
            FeatureKey::DurationHours => "duration_hours",
            FeatureKey::AltitudeVariability => "altitude_variability",
            FeatureKey::SpatialDensity => "spatial_density",
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FeatureKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown feature '{}'", s))
    }
}

/// A computed feature value, or an explicit marker that the inputs it needs
/// (timestamps, elevation, non-zero path) are missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Available(f64),
    Unavailable,
}

impl FeatureValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            FeatureValue::Available(v) => Some(*v),
            FeatureValue::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FeatureValue::Available(_))
    }
}

impl From<Option<f64>> for FeatureValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => FeatureValue::Available(v),
            _ => FeatureValue::Unavailable,
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Available(v) => serializer.serialize_f64(*v),
            FeatureValue::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Available(v) => write!(f, "{:.3}", v),
            FeatureValue::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// One value per [`FeatureKey`]; keys start out unavailable until set.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: BTreeMap<FeatureKey, FeatureValue>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self {
            values: FeatureKey::ALL
                .iter()
                .map(|k| (*k, FeatureValue::Unavailable))
                .collect(),
        }
    }

    /// Build a vector from explicit values; keys not listed stay unavailable.
    pub fn from_values(values: impl IntoIterator<Item = (FeatureKey, f64)>) -> Self {
        let mut vector = Self::new();
        for (key, value) in values {
            vector.set(key, FeatureValue::from(Some(value)));
        }
        vector
    }

    pub fn set(&mut self, key: FeatureKey, value: FeatureValue) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: FeatureKey) -> FeatureValue {
        self.values
            .get(&key)
            .copied()
            .unwrap_or(FeatureValue::Unavailable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, FeatureValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn available(&self) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
        self.iter().filter_map(|(k, v)| v.value().map(|v| (k, v)))
    }

    pub fn unavailable(&self) -> Vec<FeatureKey> {
        self.iter()
            .filter(|(_, v)| !v.is_available())
            .map(|(k, _)| k)
            .collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_key_round_trips_through_str() {
        for key in FeatureKey::ALL {
            assert_eq!(key.as_str().parse::<FeatureKey>().unwrap(), key);
        }
        assert!("mushrooms".parse::<FeatureKey>().is_err());
    }

    #[test]
    fn test_new_vector_is_all_unavailable() {
        let vector = FeatureVector::new();
        assert_eq!(vector.unavailable().len(), FeatureKey::ALL.len());
        assert_eq!(vector.available().count(), 0);
    }

    #[test]
    fn test_non_finite_values_are_unavailable() {
        assert_eq!(FeatureValue::from(Some(f64::NAN)), FeatureValue::Unavailable);
        assert_eq!(FeatureValue::from(Some(f64::INFINITY)), FeatureValue::Unavailable);
        assert_eq!(FeatureValue::from(None), FeatureValue::Unavailable);
        assert_eq!(FeatureValue::from(Some(0.0)), FeatureValue::Available(0.0));
    }

    #[test]
    fn test_vector_serializes_unavailable_marker() {
        let vector = FeatureVector::from_values([(FeatureKey::Tortuosity, 1.5)]);
        let json = serde_json::to_value(&vector).unwrap();
        assert_eq!(json["tortuosity"], serde_json::json!(1.5));
        assert_eq!(json["altitude_variability"], serde_json::json!("unavailable"));
        assert_eq!(json.as_object().unwrap().len(), FeatureKey::ALL.len());
    }
}

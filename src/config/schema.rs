use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::{default_membership, default_weight_map, Membership};
use crate::features::FeatureKey;
use crate::track::ScanOptions;

/// On-disk configuration. Every field has a default, so an empty file is a
/// valid config. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Feature name -> non-negative weight. Replaces the defaults when present.
    pub weights: BTreeMap<String, f64>,
    /// Feature name -> membership shape; overrides the default per feature.
    pub membership: BTreeMap<String, Membership>,
    pub high_threshold: f64,
    pub low_threshold: f64,
    /// km/h
    pub stop_speed_threshold: f64,
    /// Humantime duration, e.g. "60s" or "2m"
    pub min_stop_duration: String,
    /// Degrees
    pub direction_change_angle_threshold: f64,
    pub season_months: MonthSpec,
    pub daytime_hours: String,
    pub utc_offset_minutes: i32,
    pub max_tortuosity_cap: f64,
    /// Meters
    pub min_straight_line_distance: f64,
    pub top_contributors: usize,
    pub scan: ScanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            membership: BTreeMap::new(),
            high_threshold: 0.7,
            low_threshold: 0.3,
            stop_speed_threshold: 0.5,
            min_stop_duration: "60s".to_string(),
            direction_change_angle_threshold: 30.0,
            season_months: MonthSpec::Many(vec!["3-5".to_string(), "9-11".to_string()]),
            daytime_hours: "8-20".to_string(),
            utc_offset_minutes: 0,
            max_tortuosity_cap: 5.0,
            min_straight_line_distance: 50.0,
            top_contributors: 3,
            scan: ScanConfig::default(),
        }
    }
}

impl Config {
    /// The default config with weights and membership shapes written out, so
    /// it serves as an editable template.
    pub fn populated_defaults() -> Self {
        Self {
            weights: default_weight_map(),
            membership: FeatureKey::ALL
                .iter()
                .map(|k| (k.to_string(), default_membership(*k)))
                .collect(),
            ..Self::default()
        }
    }
}

/// One month range or a list of them: `"9-11"` or `["3-5", "9-11"]`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MonthSpec {
    One(String),
    Many(Vec<String>),
}

impl MonthSpec {
    pub fn ranges(&self) -> Vec<&str> {
        match self {
            MonthSpec::One(s) => vec![s.as_str()],
            MonthSpec::Many(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub recursive: bool,
    pub patterns: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            patterns: ScanOptions::DEFAULT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

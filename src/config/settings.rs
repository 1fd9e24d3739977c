use chrono::FixedOffset;

use super::ranges::{HourRange, MonthRange};
use super::schema::Config;
use crate::classify::Thresholds;
use crate::error::ConfigurationError;
use crate::features::ExtractionParams;
use crate::scoring::{validate_scoring, ScoringModel};
use crate::track::ScanOptions;

/// Fully validated settings, passed explicitly into every pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub extraction: ExtractionParams,
    pub model: ScoringModel,
    pub thresholds: Thresholds,
    pub top_contributors: usize,
    pub scan: ScanOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extraction: ExtractionParams::default(),
            model: ScoringModel::default(),
            thresholds: Thresholds::default(),
            top_contributors: 3,
            scan: ScanOptions::default(),
        }
    }
}

impl Settings {
    /// Validate a raw config at startup.
    /// Returns all problems at once (not just the first).
    pub fn resolve(config: &Config) -> Result<Self, ConfigurationError> {
        let mut errors = Vec::new();

        let model = validate_scoring(&config.weights, &config.membership)
            .map_err(|e| errors.extend(e))
            .ok();

        let thresholds = Thresholds::new(config.high_threshold, config.low_threshold)
            .map_err(|e| errors.extend(e.errors))
            .ok();

        if !config.stop_speed_threshold.is_finite() || config.stop_speed_threshold < 0.0 {
            errors.push(format!(
                "stop_speed_threshold: must be a non-negative number, got {}",
                config.stop_speed_threshold
            ));
        }

        let min_stop_duration = humantime::parse_duration(&config.min_stop_duration)
            .map_err(|e| {
                errors.push(format!(
                    "min_stop_duration: invalid '{}' - {}",
                    config.min_stop_duration, e
                ))
            })
            .ok();

        let angle = config.direction_change_angle_threshold;
        if !(0.0..=180.0).contains(&angle) {
            errors.push(format!(
                "direction_change_angle_threshold: must lie within [0, 180], got {}",
                angle
            ));
        }

        let mut season = Vec::new();
        for (i, raw) in config.season_months.ranges().into_iter().enumerate() {
            match MonthRange::parse(raw) {
                Ok(range) => season.push(range),
                Err(e) => errors.push(format!("season_months[{}]: invalid '{}' - {}", i, raw, e)),
            }
        }

        let daytime = HourRange::parse(&config.daytime_hours)
            .map_err(|e| {
                errors.push(format!(
                    "daytime_hours: invalid '{}' - {}",
                    config.daytime_hours, e
                ))
            })
            .ok();

        let utc_offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt);
        if utc_offset.is_none() {
            errors.push(format!(
                "utc_offset_minutes: {} is outside +/-24h",
                config.utc_offset_minutes
            ));
        }

        // A cap below 1 would undercut a perfectly straight track
        if !config.max_tortuosity_cap.is_finite() || config.max_tortuosity_cap < 1.0 {
            errors.push(format!(
                "max_tortuosity_cap: must be at least 1, got {}",
                config.max_tortuosity_cap
            ));
        }
        if !config.min_straight_line_distance.is_finite() || config.min_straight_line_distance < 0.0 {
            errors.push(format!(
                "min_straight_line_distance: must be non-negative, got {}",
                config.min_straight_line_distance
            ));
        }

        let scan = ScanOptions::new(config.scan.recursive, &config.scan.patterns)
            .map_err(|e| errors.extend(e))
            .ok();

        match (model, thresholds, min_stop_duration, daytime, utc_offset, scan) {
            (Some(model), Some(thresholds), Some(min_stop_duration), Some(daytime), Some(utc_offset), Some(scan))
                if errors.is_empty() =>
            {
                Ok(Self {
                    extraction: ExtractionParams {
                        stop_speed_kmh: config.stop_speed_threshold,
                        min_stop_duration,
                        direction_change_deg: angle,
                        season,
                        daytime,
                        utc_offset,
                        tortuosity_cap: config.max_tortuosity_cap,
                        min_straight_line_m: config.min_straight_line_distance,
                    },
                    model,
                    thresholds,
                    top_contributors: config.top_contributors,
                    scan,
                })
            }
            _ => Err(ConfigurationError::from_errors(errors)),
        }
    }
}

//! Feature extraction: pure functions from a [`Track`] to a [`FeatureVector`].
//!
//! Speeds are in km/h, distances in meters unless a name says otherwise.
//! Anything that needs timestamps or elevations the track does not carry is
//! left [`FeatureValue::Unavailable`].

use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use serde::Serialize;

use super::vector::{FeatureKey, FeatureValue, FeatureVector};
use crate::config::ranges::{HourRange, MonthRange};
use crate::geo_utils::{bearing_delta, haversine_distance, initial_bearing};
use crate::track::{Track, TrackPoint};

/// Tunables for the extractor, resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionParams {
    /// Segments slower than this (km/h) count towards a stop.
    pub stop_speed_kmh: f64,
    /// Shortest run of slow segments that counts as a stop.
    pub min_stop_duration: Duration,
    /// Bearing change (degrees) that must be exceeded to count as a turn.
    pub direction_change_deg: f64,
    pub season: Vec<MonthRange>,
    pub daytime: HourRange,
    /// Offset applied to timestamps before the season and daytime checks.
    pub utc_offset: FixedOffset,
    pub tortuosity_cap: f64,
    /// Below this straight-line distance (meters) the track counts as a loop.
    pub min_straight_line_m: f64,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            stop_speed_kmh: 0.5,
            min_stop_duration: Duration::from_secs(60),
            direction_change_deg: 30.0,
            season: vec![MonthRange::new(3, 5), MonthRange::new(9, 11)],
            daytime: HourRange::new(8, 20),
            utc_offset: Utc.fix(),
            tortuosity_cap: 5.0,
            min_straight_line_m: 50.0,
        }
    }
}

/// Extra per-track figures reported next to the features but not scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub point_count: usize,
    pub total_distance_km: f64,
    pub straight_line_km: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub avg_elevation_m: Option<f64>,
    pub elevation_gain_m: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    distance_m: f64,
    /// Seconds between the endpoints; `None` when either lacks a timestamp.
    dt_s: Option<f64>,
    /// `None` for zero-length segments, whose bearing is undefined.
    bearing: Option<f64>,
}

impl Segment {
    fn between(a: &TrackPoint, b: &TrackPoint) -> Self {
        let distance_m = haversine_distance(a, b);
        let dt_s = match (a.time, b.time) {
            (Some(ta), Some(tb)) => Some((tb - ta).num_milliseconds() as f64 / 1000.0),
            _ => None,
        };
        let bearing = (distance_m > 0.0).then(|| initial_bearing(a, b));
        Self {
            distance_m,
            dt_s,
            bearing,
        }
    }

    /// Speed in km/h for segments with a positive time delta.
    fn speed_kmh(&self) -> Option<f64> {
        match self.dt_s {
            Some(dt) if dt > 0.0 => Some(self.distance_m * 3.6 / dt),
            _ => None,
        }
    }
}

/// Compute the full feature vector for a track.
pub fn extract_features(track: &Track, params: &ExtractionParams) -> FeatureVector {
    let points = track.points();
    let segments: Vec<Segment> = points
        .windows(2)
        .map(|pair| Segment::between(&pair[0], &pair[1]))
        .collect();

    let path_m: f64 = segments.iter().map(|s| s.distance_m).sum();
    let straight_m = haversine_distance(track.first(), track.last());
    let path_km = path_m / 1000.0;

    let mut features = FeatureVector::new();
    features.set(
        FeatureKey::Tortuosity,
        FeatureValue::Available(tortuosity(path_m, straight_m, params)),
    );

    if path_km > 0.0 {
        features.set(
            FeatureKey::SpatialDensity,
            FeatureValue::Available(points.len() as f64 / path_km),
        );
        let turns = count_direction_changes(&segments, params.direction_change_deg);
        features.set(
            FeatureKey::DirectionChangeRate,
            FeatureValue::Available(turns as f64 / path_km),
        );
    }

    let speeds: Vec<f64> = segments.iter().filter_map(Segment::speed_kmh).collect();
    if let Some((mean, variance)) = mean_and_variance(&speeds) {
        features.set(FeatureKey::AvgSpeed, FeatureValue::Available(mean));
        features.set(FeatureKey::SpeedVariance, FeatureValue::Available(variance));
    }

    if let Some(elapsed_s) = elapsed_seconds(points) {
        features.set(
            FeatureKey::DurationHours,
            FeatureValue::Available(elapsed_s / 3600.0),
        );
        if elapsed_s > 0.0 && !speeds.is_empty() {
            let stops = detect_stops(&segments, params);
            features.set(FeatureKey::StopCount, FeatureValue::Available(stops.count as f64));
            features.set(
                FeatureKey::StopTimeFraction,
                FeatureValue::Available((stops.stopped_s / elapsed_s).min(1.0)),
            );
        }
    }

    if let Some(start) = track.start_time() {
        let local = start.with_timezone(&params.utc_offset);
        let in_season = params.season.iter().any(|r| r.contains(local.month()));
        let in_daytime = params.daytime.contains(local.hour());
        features.set(FeatureKey::SeasonMatch, flag(in_season));
        features.set(FeatureKey::DaytimeMatch, flag(in_daytime));
    }

    let elevations: Vec<f64> = points.iter().filter_map(|p| p.elevation).collect();
    if elevations.len() >= 2 {
        if let Some((_, variance)) = mean_and_variance(&elevations) {
            features.set(
                FeatureKey::AltitudeVariability,
                FeatureValue::Available(variance.sqrt()),
            );
        }
    }

    features
}

/// Distance and elevation figures reported alongside the classification.
pub fn summarize_track(track: &Track) -> TrackSummary {
    let points = track.points();
    let elevations: Vec<f64> = points.iter().filter_map(|p| p.elevation).collect();
    let elevation_gain_m = (elevations.len() >= 2).then(|| {
        elevations
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).max(0.0))
            .sum::<f64>()
    });

    TrackSummary {
        point_count: points.len(),
        total_distance_km: crate::geo_utils::polyline_length(points) / 1000.0,
        straight_line_km: haversine_distance(track.first(), track.last()) / 1000.0,
        start_time: track.start_time(),
        avg_elevation_m: mean_and_variance(&elevations).map(|(mean, _)| mean),
        elevation_gain_m,
    }
}

fn flag(value: bool) -> FeatureValue {
    FeatureValue::Available(if value { 1.0 } else { 0.0 })
}

/// Path length over straight-line distance, bounded to `[1, cap]`. Near-closed
/// loops return the cap outright.
fn tortuosity(path_m: f64, straight_m: f64, params: &ExtractionParams) -> f64 {
    if straight_m < params.min_straight_line_m {
        return params.tortuosity_cap;
    }
    (path_m / straight_m).max(1.0).min(params.tortuosity_cap)
}

/// Count bearing changes above the threshold between consecutive moving
/// segments. Zero-length segments are skipped rather than compared.
fn count_direction_changes(segments: &[Segment], threshold_deg: f64) -> usize {
    let mut previous: Option<f64> = None;
    let mut changes = 0;
    for bearing in segments.iter().filter_map(|s| s.bearing) {
        if let Some(prev) = previous {
            if bearing_delta(prev, bearing) > threshold_deg {
                changes += 1;
            }
        }
        previous = Some(bearing);
    }
    changes
}

/// Seconds between the first and last timestamped point. Needs two.
fn elapsed_seconds(points: &[TrackPoint]) -> Option<f64> {
    let mut times = points.iter().filter_map(|p| p.time);
    let first = times.next()?;
    let last = times.last()?;
    Some((last - first).num_milliseconds() as f64 / 1000.0)
}

/// Population mean and variance; `None` for an empty slice.
fn mean_and_variance(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance))
}

#[derive(Debug, Default, PartialEq)]
struct Stops {
    count: usize,
    stopped_s: f64,
}

/// A stop is a maximal run of timed segments below the stop speed whose total
/// duration reaches the minimum. Zero-duration segments neither extend nor
/// break a run; untimed segments break it.
fn detect_stops(segments: &[Segment], params: &ExtractionParams) -> Stops {
    let min_s = params.min_stop_duration.as_secs_f64();
    let mut stops = Stops::default();
    let mut run_s: Option<f64> = None;

    let close_run = |run_s: &mut Option<f64>, stops: &mut Stops| {
        if let Some(duration) = run_s.take() {
            if duration >= min_s {
                stops.count += 1;
                stops.stopped_s += duration;
            }
        }
    };

    for segment in segments {
        match (segment.dt_s, segment.speed_kmh()) {
            (Some(dt), Some(speed)) if speed < params.stop_speed_kmh => {
                *run_s.get_or_insert(0.0) += dt;
            }
            (Some(_), Some(_)) | (None, _) => close_run(&mut run_s, &mut stops),
            (Some(_), None) => {}
        }
    }
    close_run(&mut run_s, &mut stops);

    stops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackMetadata;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 12, 9, 0, 0).unwrap()
    }

    /// Points marching north along a meridian, one per minute.
    fn straight_track(n: usize, step_deg: f64) -> Track {
        let points = (0..n)
            .map(|i| {
                TrackPoint::new(46.0 + i as f64 * step_deg, 7.0)
                    .with_time(t0() + ChronoDuration::minutes(i as i64))
            })
            .collect();
        Track::new("straight", points, TrackMetadata::default()).unwrap()
    }

    fn value(features: &FeatureVector, key: FeatureKey) -> f64 {
        features.get(key).value().unwrap()
    }

    #[test]
    fn test_straight_line_tortuosity_is_one() {
        let features = extract_features(&straight_track(10, 0.001), &ExtractionParams::default());
        assert!((value(&features, FeatureKey::Tortuosity) - 1.0).abs() < 1e-9);
        assert_eq!(value(&features, FeatureKey::DirectionChangeRate), 0.0);
    }

    #[test]
    fn test_closed_loop_tortuosity_is_cap() {
        let points = vec![
            TrackPoint::new(46.0, 7.0),
            TrackPoint::new(46.001, 7.0),
            TrackPoint::new(46.001, 7.001),
            TrackPoint::new(46.0, 7.001),
            TrackPoint::new(46.0, 7.0),
        ];
        let track = Track::new("loop", points, TrackMetadata::default()).unwrap();
        let params = ExtractionParams {
            tortuosity_cap: 4.0,
            ..ExtractionParams::default()
        };
        let features = extract_features(&track, &params);
        assert_eq!(value(&features, FeatureKey::Tortuosity), 4.0);
    }

    #[test]
    fn test_time_features_unavailable_without_timestamps() {
        let points = vec![TrackPoint::new(46.0, 7.0), TrackPoint::new(46.01, 7.0)];
        let track = Track::new("untimed", points, TrackMetadata::default()).unwrap();
        let features = extract_features(&track, &ExtractionParams::default());

        for key in [
            FeatureKey::AvgSpeed,
            FeatureKey::SpeedVariance,
            FeatureKey::StopCount,
            FeatureKey::StopTimeFraction,
            FeatureKey::DurationHours,
            FeatureKey::SeasonMatch,
            FeatureKey::DaytimeMatch,
            FeatureKey::AltitudeVariability,
        ] {
            assert_eq!(features.get(key), FeatureValue::Unavailable, "{}", key);
        }
        assert!(features.get(FeatureKey::Tortuosity).is_available());
        assert!(features.get(FeatureKey::SpatialDensity).is_available());
    }

    #[test]
    fn test_speed_and_duration() {
        // 0.001 deg latitude ~ 111.19 m per minute ~ 6.67 km/h
        let features = extract_features(&straight_track(11, 0.001), &ExtractionParams::default());
        let speed = value(&features, FeatureKey::AvgSpeed);
        assert!((speed - 6.6717).abs() < 0.01, "speed was {}", speed);
        assert!(value(&features, FeatureKey::SpeedVariance) < 1e-9);
        assert!((value(&features, FeatureKey::DurationHours) - 10.0 / 60.0).abs() < 1e-12);
        assert_eq!(value(&features, FeatureKey::StopCount), 0.0);
        assert_eq!(value(&features, FeatureKey::StopTimeFraction), 0.0);
    }

    #[test]
    fn test_zero_speed_throughout() {
        // Bypasses the loader, which would reject a collapsed track
        let points = (0..6)
            .map(|i| TrackPoint::new(46.0, 7.0).with_time(t0() + ChronoDuration::minutes(i)))
            .collect();
        let track = Track::new("still", points, TrackMetadata::default()).unwrap();
        let features = extract_features(&track, &ExtractionParams::default());

        assert_eq!(value(&features, FeatureKey::AvgSpeed), 0.0);
        assert_eq!(value(&features, FeatureKey::StopTimeFraction), 1.0);
        assert_eq!(value(&features, FeatureKey::StopCount), 1.0);
        assert_eq!(features.get(FeatureKey::SpatialDensity), FeatureValue::Unavailable);
        assert_eq!(features.get(FeatureKey::DirectionChangeRate), FeatureValue::Unavailable);
    }

    #[test]
    fn test_short_pause_is_not_a_stop() {
        let mut points = Vec::new();
        let mut lat = 46.0;
        for i in 0..10 {
            // Segment 4->5 lasts 30 s without moving; everything else walks
            let t = t0() + ChronoDuration::seconds(i * 30);
            if i != 5 {
                lat += 0.0005;
            }
            points.push(TrackPoint::new(lat, 7.0).with_time(t));
        }
        let track = Track::new("pause", points, TrackMetadata::default()).unwrap();
        let features = extract_features(&track, &ExtractionParams::default());
        assert_eq!(value(&features, FeatureKey::StopCount), 0.0);
    }

    #[test]
    fn test_stop_detection_counts_runs() {
        let seg = |distance_m: f64, dt_s: f64| Segment {
            distance_m,
            dt_s: Some(dt_s),
            bearing: None,
        };
        let segments = vec![
            seg(50.0, 60.0),
            seg(0.0, 40.0),
            seg(0.0, 0.0), // zero duration keeps the run going
            seg(1.0, 40.0),
            seg(50.0, 60.0),
            seg(0.0, 30.0),
            Segment { distance_m: 0.0, dt_s: None, bearing: None },
            seg(0.0, 45.0),
        ];
        let stops = detect_stops(&segments, &ExtractionParams::default());
        assert_eq!(stops, Stops { count: 1, stopped_s: 80.0 });
    }

    #[test]
    fn test_direction_changes_skip_zero_length_segments() {
        let seg = |bearing: Option<f64>| Segment {
            distance_m: if bearing.is_some() { 10.0 } else { 0.0 },
            dt_s: None,
            bearing,
        };
        let segments = vec![
            seg(Some(0.0)),
            seg(None),
            seg(Some(45.0)),
            seg(Some(60.0)),
            seg(Some(350.0)),
        ];
        // 0->45 counts, 45->60 does not, 60->350 (70 deg) counts
        assert_eq!(count_direction_changes(&segments, 30.0), 2);
    }

    #[test]
    fn test_direction_change_at_threshold_not_counted() {
        let segments: Vec<Segment> = [0.0, 30.0, 60.0, 30.0, 0.0, 330.0, 331.0]
            .iter()
            .map(|b| Segment {
                distance_m: 10.0,
                dt_s: None,
                bearing: Some(*b),
            })
            .collect();
        // each step turns exactly 30 deg (0->330 across north) except the last
        assert_eq!(count_direction_changes(&segments, 30.0), 0);
        assert_eq!(count_direction_changes(&segments, 29.5), 5);
    }

    #[test]
    fn test_season_and_daytime_use_offset() {
        // 23:30 UTC on 31 August is 01:30 on 1 September at UTC+2
        let start = Utc.with_ymd_and_hms(2024, 8, 31, 23, 30, 0).unwrap();
        let points = vec![
            TrackPoint::new(46.0, 7.0).with_time(start),
            TrackPoint::new(46.001, 7.0).with_time(start + ChronoDuration::minutes(5)),
        ];
        let track = Track::new("night", points, TrackMetadata::default()).unwrap();

        let utc = extract_features(&track, &ExtractionParams::default());
        assert_eq!(value(&utc, FeatureKey::SeasonMatch), 0.0);
        assert_eq!(value(&utc, FeatureKey::DaytimeMatch), 0.0);

        let params = ExtractionParams {
            utc_offset: FixedOffset::east_opt(2 * 3600).unwrap(),
            ..ExtractionParams::default()
        };
        let local = extract_features(&track, &params);
        assert_eq!(value(&local, FeatureKey::SeasonMatch), 1.0);
        assert_eq!(value(&local, FeatureKey::DaytimeMatch), 0.0);
    }

    #[test]
    fn test_altitude_variability_is_std_dev() {
        let points = vec![
            TrackPoint::new(46.0, 7.0).with_elevation(100.0),
            TrackPoint::new(46.001, 7.0).with_elevation(110.0),
            TrackPoint::new(46.002, 7.0).with_elevation(120.0),
            TrackPoint::new(46.003, 7.0).with_elevation(130.0),
        ];
        let track = Track::new("hill", points, TrackMetadata::default()).unwrap();
        let features = extract_features(&track, &ExtractionParams::default());
        // population std dev of 100,110,120,130
        assert!((value(&features, FeatureKey::AltitudeVariability) - 125.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_track() {
        let points = vec![
            TrackPoint::new(46.0, 7.0).with_elevation(100.0),
            TrackPoint::new(46.001, 7.0).with_elevation(90.0),
            TrackPoint::new(46.002, 7.0).with_elevation(130.0),
        ];
        let track = Track::new("sum", points, TrackMetadata::default()).unwrap();
        let summary = summarize_track(&track);
        assert_eq!(summary.point_count, 3);
        assert_eq!(summary.elevation_gain_m, Some(40.0));
        assert!((summary.avg_elevation_m.unwrap() - 106.666_666).abs() < 1e-3);
        assert!((summary.total_distance_km - summary.straight_line_km).abs() < 1e-9);
        assert!(summary.start_time.is_none());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let track = straight_track(20, 0.0007);
        let params = ExtractionParams::default();
        assert_eq!(extract_features(&track, &params), extract_features(&track, &params));
    }
}

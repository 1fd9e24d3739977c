//! Synthetic tracks shared by the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use forage_scout::track::{Track, TrackMetadata, TrackPoint};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A walk that zigzags north. Every moving segment is `step_m` long and
/// alternates between `+theta` and `-theta` off north, where
/// `cos(theta) = 1 / tortuosity`, so path / straight-line distance comes out
/// at `tortuosity`. Segments listed in `stationary` do not move at all.
#[derive(Debug, Clone)]
pub struct Zigzag {
    pub points: usize,
    pub step_m: f64,
    pub tortuosity: f64,
    pub segment_secs: i64,
    pub stationary: Vec<usize>,
    pub start: Option<DateTime<Utc>>,
}

impl Zigzag {
    pub fn build(&self) -> Vec<TrackPoint> {
        let theta = (1.0 / self.tortuosity).acos();
        let (lat0, lon0) = (46.5_f64, 7.5_f64);
        let meters_per_deg_lat = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        let meters_per_deg_lon = meters_per_deg_lat * lat0.to_radians().cos();

        let mut points = Vec::with_capacity(self.points);
        let (mut lat, mut lon) = (lat0, lon0);
        let mut moves = 0;
        for i in 0..self.points {
            if i > 0 && !self.stationary.contains(&(i - 1)) {
                let sign = if moves % 2 == 0 { 1.0 } else { -1.0 };
                lat += self.step_m * theta.cos() / meters_per_deg_lat;
                lon += sign * self.step_m * theta.sin() / meters_per_deg_lon;
                moves += 1;
            }
            let mut point = TrackPoint::new(lat, lon);
            if let Some(start) = self.start {
                point = point.with_time(start + Duration::seconds(self.segment_secs * i as i64));
            }
            points.push(point);
        }
        points
    }

    pub fn track(&self, id: &str) -> Track {
        Track::new(id, self.build(), TrackMetadata::default()).unwrap()
    }
}

/// 100 points over ~3 hours at 1.4 km/h, six two-segment stops, tortuosity
/// 2.3, starting on an October morning.
pub fn foraging_walk() -> Zigzag {
    Zigzag {
        points: 100,
        step_m: 48.235,
        tortuosity: 2.3,
        segment_secs: 109,
        stationary: vec![10, 11, 25, 26, 40, 41, 55, 56, 70, 71, 85, 86],
        start: Some(Utc.with_ymd_and_hms(2024, 10, 12, 9, 0, 0).unwrap()),
    }
}

/// 20 points over 45 minutes at 6 km/h, no stops, tortuosity 1.05, July.
pub fn brisk_hike() -> Zigzag {
    Zigzag {
        points: 20,
        step_m: 236.67,
        tortuosity: 1.05,
        segment_secs: 142,
        stationary: vec![],
        start: Some(Utc.with_ymd_and_hms(2024, 7, 20, 10, 0, 0).unwrap()),
    }
}

/// Adds a gentle elevation profile.
pub fn with_elevation(points: Vec<TrackPoint>) -> Vec<TrackPoint> {
    points
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.with_elevation(600.0 + 25.0 * (i as f64 / 8.0).sin()))
        .collect()
}

/// Serialize points as a GPX 1.1 document with a single track segment.
pub fn to_gpx(name: &str, points: &[TrackPoint]) -> String {
    let mut gpx = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <gpx version=\"1.1\" creator=\"forage-scout-tests\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
    );
    gpx.push_str(&format!("  <trk>\n    <name>{}</name>\n    <trkseg>\n", name));
    for p in points {
        gpx.push_str(&format!(
            "      <trkpt lat=\"{:.8}\" lon=\"{:.8}\">",
            p.latitude, p.longitude
        ));
        if let Some(ele) = p.elevation {
            gpx.push_str(&format!("<ele>{:.1}</ele>", ele));
        }
        if let Some(time) = p.time {
            gpx.push_str(&format!(
                "<time>{}</time>",
                time.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        gpx.push_str("</trkpt>\n");
    }
    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    gpx
}

/// Serialize points as a JSON point array.
pub fn to_json(points: &[TrackPoint]) -> String {
    let list: Vec<serde_json::Value> = points
        .iter()
        .map(|p| {
            let mut obj = serde_json::json!({ "lat": p.latitude, "lon": p.longitude });
            if let Some(ele) = p.elevation {
                obj["ele"] = serde_json::json!(ele);
            }
            if let Some(time) = p.time {
                obj["time"] = serde_json::json!(time.to_rfc3339());
            }
            obj
        })
        .collect();
    serde_json::to_string(&list).unwrap()
}

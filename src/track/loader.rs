use std::fs;
use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::types::{Track, TrackMetadata, TrackPoint};
use crate::error::TrackError;

/// Load a track from disk, picking the parser from the file extension.
///
/// The track id is the file stem. Supported formats are `.gpx` and `.json`.
pub fn load_track(path: &Path) -> Result<Track, TrackError> {
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let bytes = fs::read(path).map_err(|source| TrackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read track source");

    match extension.as_str() {
        "gpx" => parse_gpx(&id, &bytes),
        "json" => parse_json(&id, &bytes),
        other => Err(TrackError::parse(
            "unknown",
            format!("unsupported file extension '{}'", other),
        )),
    }
}

/// Parse GPX 1.0/1.1 content. All segments of all tracks are concatenated in
/// document order; route points are used when the file carries no track.
pub fn parse_gpx(id: &str, input: &[u8]) -> Result<Track, TrackError> {
    let mut cursor = Cursor::new(input);
    let gpx = gpx::read(&mut cursor).map_err(|e| TrackError::parse("gpx", e.to_string()))?;

    let mut waypoints: Vec<&gpx::Waypoint> = gpx
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|s| s.points.iter())
        .collect();
    if waypoints.is_empty() {
        waypoints = gpx.routes.iter().flat_map(|r| r.points.iter()).collect();
    }

    let mut points = Vec::with_capacity(waypoints.len());
    for waypoint in waypoints {
        let position = waypoint.point();
        let mut point = TrackPoint::new(position.y(), position.x());
        point.elevation = waypoint.elevation;
        point.time = waypoint.time.as_ref().map(gpx_time).transpose()?;
        points.push(point);
    }

    let metadata_time = gpx
        .metadata
        .as_ref()
        .and_then(|m| m.time.as_ref())
        .map(gpx_time)
        .transpose()?;
    let name = gpx
        .tracks
        .iter()
        .find_map(|t| t.name.clone())
        .or_else(|| gpx.metadata.as_ref().and_then(|m| m.name.clone()));

    build_track(
        id,
        points,
        TrackMetadata {
            name,
            date: metadata_time,
        },
    )
}

fn gpx_time(time: &gpx::Time) -> Result<DateTime<Utc>, TrackError> {
    let iso = time
        .format()
        .map_err(|e| TrackError::parse("gpx", e.to_string()))?;
    DateTime::parse_from_rfc3339(&iso)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TrackError::parse("gpx", format!("bad timestamp '{}': {}", iso, e)))
}

#[derive(Debug, Deserialize)]
struct JsonPoint {
    #[serde(alias = "latitude")]
    lat: f64,
    #[serde(alias = "longitude", alias = "lng")]
    lon: f64,
    #[serde(default, alias = "elevation")]
    ele: Option<f64>,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonTrack {
    Points(Vec<JsonPoint>),
    Document {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        date: Option<DateTime<Utc>>,
        points: Vec<JsonPoint>,
    },
}

/// Parse a JSON point list: either a bare array of `{lat, lon, ele?, time?}`
/// objects or an object `{name?, date?, points: [...]}`.
pub fn parse_json(id: &str, input: &[u8]) -> Result<Track, TrackError> {
    let parsed: JsonTrack =
        serde_json::from_slice(input).map_err(|e| TrackError::parse("json", e.to_string()))?;

    let (raw_points, metadata) = match parsed {
        JsonTrack::Points(points) => (points, TrackMetadata::default()),
        JsonTrack::Document { name, date, points } => (points, TrackMetadata { name, date }),
    };

    let points = raw_points
        .into_iter()
        .map(|p| TrackPoint {
            latitude: p.lat,
            longitude: p.lon,
            elevation: p.ele,
            time: p.time,
        })
        .collect();

    build_track(id, points, metadata)
}

fn build_track(
    id: &str,
    points: Vec<TrackPoint>,
    metadata: TrackMetadata,
) -> Result<Track, TrackError> {
    if let Some(index) = points.iter().position(|p| !p.is_valid()) {
        return Err(TrackError::parse(
            "point",
            format!("invalid coordinates or elevation at point {}", index),
        ));
    }

    let track = Track::new(id, points, metadata)?;
    if track.is_collapsed() {
        return Err(TrackError::InsufficientData(
            "all points share a single coordinate".to_string(),
        ));
    }

    debug!(id = track.id(), points = track.len(), "loaded track");
    Ok(track)
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::TrackError;

/// A single recorded fix. Elevation and time are optional; their absence is
/// kept as `None` rather than defaulted, since zero is a valid reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            time: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Check that the coordinates are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.elevation.map_or(true, f64::is_finite)
    }

    fn same_position(&self, other: &TrackPoint) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackMetadata {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// An ordered, validated recording. Fields are private so a track cannot be
/// changed after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    id: String,
    points: Vec<TrackPoint>,
    metadata: TrackMetadata,
}

impl Track {
    /// Build a track, enforcing at least two points and non-decreasing
    /// timestamps. Points without a timestamp are skipped by the ordering
    /// check. Out-of-order input is rejected, never re-sorted.
    pub fn new(
        id: impl Into<String>,
        points: Vec<TrackPoint>,
        metadata: TrackMetadata,
    ) -> Result<Self, TrackError> {
        if points.len() < 2 {
            return Err(TrackError::InsufficientData(format!(
                "need at least 2 points, got {}",
                points.len()
            )));
        }

        let mut last_time: Option<DateTime<Utc>> = None;
        for (index, point) in points.iter().enumerate() {
            if let Some(time) = point.time {
                if last_time.is_some_and(|last| time < last) {
                    return Err(TrackError::UnorderedTimestamps { index });
                }
                last_time = Some(time);
            }
        }

        Ok(Self {
            id: id.into(),
            points,
            metadata,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &TrackPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &TrackPoint {
        &self.points[self.points.len() - 1]
    }

    /// Recording start: the first timestamped point, else the metadata date.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.points
            .iter()
            .find_map(|p| p.time)
            .or(self.metadata.date)
    }

    /// True when every point sits on the same coordinate.
    pub fn is_collapsed(&self) -> bool {
        let first = self.first();
        self.points.iter().all(|p| p.same_position(first))
    }
}

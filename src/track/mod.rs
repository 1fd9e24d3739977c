pub mod loader;
pub mod scan;
pub mod types;

pub use loader::{load_track, parse_gpx, parse_json};
pub use scan::{ScanOptions, TrackScan, TrackScanner};
pub use types::{Track, TrackMetadata, TrackPoint};

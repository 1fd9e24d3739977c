use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::batch::BatchResult;

/// Current report format version
pub const REPORT_VERSION: u32 = 1;

/// JSON batch record: the batch result plus when it was produced.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub batch: &'a BatchResult,
}

impl<'a> Report<'a> {
    pub fn new(batch: &'a BatchResult) -> Self {
        Self {
            version: REPORT_VERSION,
            generated_at: Utc::now(),
            batch,
        }
    }
}

/// Pretty-printed JSON for a batch
pub fn to_json(batch: &BatchResult) -> Result<String> {
    serde_json::to_string_pretty(&Report::new(batch)).context("Failed to serialize batch report")
}

/// Write the batch report as JSON atomically
///
/// Uses atomic-write-file so an interrupted run never leaves a truncated report.
/// Creates the parent directory if it doesn't exist.
pub fn write_json_report(path: &Path, batch: &BatchResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, &Report::new(batch))
        .context("Failed to serialize batch report")?;

    file.commit()
        .with_context(|| format!("Failed to save report to {}", path.display()))?;

    Ok(())
}

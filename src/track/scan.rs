use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::loader::load_track;
use super::types::Track;
use crate::error::TrackError;

/// Which files a directory scan picks up.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub recursive: bool,
    pub patterns: Vec<Pattern>,
}

impl ScanOptions {
    pub const DEFAULT_PATTERNS: [&'static str; 2] = ["*.gpx", "*.json"];

    /// Compile glob patterns, returning one message per invalid pattern.
    pub fn new(recursive: bool, patterns: &[String]) -> Result<Self, Vec<String>> {
        let mut compiled = Vec::new();
        let mut errors = Vec::new();
        for (i, raw) in patterns.iter().enumerate() {
            match Pattern::new(raw) {
                Ok(p) => compiled.push(p),
                Err(e) => errors.push(format!("scan.patterns[{}]: invalid '{}' - {}", i, raw, e)),
            }
        }
        if compiled.is_empty() && errors.is_empty() {
            errors.push("scan.patterns: at least one pattern is required".to_string());
        }
        if errors.is_empty() {
            Ok(Self {
                recursive,
                patterns: compiled,
            })
        } else {
            Err(errors)
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        self.patterns
            .iter()
            .any(|p| p.matches_with(file_name, options))
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            patterns: Self::DEFAULT_PATTERNS
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
        }
    }
}

/// Produces `(source-name, Track-or-error)` pairs for a file or directory.
///
/// Listing happens when [`TrackScanner::scan`] is called; each track is only
/// read when the iterator reaches it. Calling `scan` again restarts from the
/// top.
#[derive(Debug, Clone)]
pub struct TrackScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl TrackScanner {
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a scan. Fails only when the root itself cannot be accessed;
    /// problems with individual entries surface as items of the sequence.
    pub fn scan(&self) -> io::Result<TrackScan> {
        let metadata = std::fs::metadata(&self.root)?;
        if metadata.is_file() {
            let name = self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.root.display().to_string());
            return Ok(TrackScan {
                pending: vec![Candidate::File(name, self.root.clone())].into_iter(),
            });
        }

        let max_depth = if self.options.recursive { usize::MAX } else { 1 };
        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    // Dangling links and other unreadable files stay in the
                    // sequence so loading records them as io errors
                    if entry.file_type().is_dir() {
                        continue;
                    }
                    let path = entry.path();
                    let file_name = entry.file_name().to_string_lossy();
                    if self.options.matches(&file_name) {
                        candidates.push(Candidate::File(self.source_name(path), path.to_path_buf()));
                    }
                }
                Err(err) if err.depth() == 0 => return Err(io::Error::from(err)),
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    warn!(path = %path.display(), "unreadable entry during scan: {}", err);
                    candidates.push(Candidate::Unreadable(
                        self.source_name(&path),
                        path,
                        io::Error::from(err),
                    ));
                }
            }
        }

        debug!(root = %self.root.display(), sources = candidates.len(), "scanned track directory");
        Ok(TrackScan {
            pending: candidates.into_iter(),
        })
    }

    fn source_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[derive(Debug)]
enum Candidate {
    File(String, PathBuf),
    Unreadable(String, PathBuf, io::Error),
}

/// Lazy sequence of loaded tracks from one scan.
#[derive(Debug)]
pub struct TrackScan {
    pending: std::vec::IntoIter<Candidate>,
}

impl TrackScan {
    /// Number of sources not yet visited.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for TrackScan {
    type Item = (String, Result<Track, TrackError>);

    fn next(&mut self) -> Option<Self::Item> {
        match self.pending.next()? {
            Candidate::File(name, path) => {
                let loaded = load_track(&path);
                Some((name, loaded))
            }
            Candidate::Unreadable(name, path, source) => {
                Some((name, Err(TrackError::Io { path, source })))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

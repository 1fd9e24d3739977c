use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{classify_track, ClassificationResult, Label};
use crate::config::Settings;
use crate::error::{ClassifyError, ErrorKind, TrackError};
use crate::track::Track;

/// Shared flag that stops a batch from starting further tracks. Clones refer
/// to the same flag, so one can be handed to a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A track that failed before it could be labelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchError {
    pub source: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl BatchError {
    fn new(source: String, err: &ClassifyError) -> Self {
        Self {
            source,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Aggregated outcome of a batch: results and errors in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub results: Vec<ClassificationResult>,
    pub errors: Vec<BatchError>,
    /// Label counts over the classified tracks only. Every label is present.
    pub summary: BTreeMap<Label, usize>,
    pub cancelled: bool,
}

impl BatchResult {
    fn from_outcomes(outcomes: impl IntoIterator<Item = Outcome>, cancelled: bool) -> Self {
        let mut results = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Classified(result) => results.push(result),
                Outcome::Failed(error) => errors.push(error),
            }
        }

        let mut summary: BTreeMap<Label, usize> = Label::ALL.iter().map(|l| (*l, 0)).collect();
        for result in &results {
            *summary.entry(result.label).or_insert(0) += 1;
        }

        info!(
            classified = results.len(),
            failed = errors.len(),
            cancelled,
            "batch finished"
        );

        Self {
            results,
            errors,
            summary,
            cancelled,
        }
    }

    /// Number of sources visited, classified or not.
    pub fn processed(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    pub fn count(&self, label: Label) -> usize {
        self.summary.get(&label).copied().unwrap_or(0)
    }
}

enum Outcome {
    Classified(ClassificationResult),
    Failed(BatchError),
}

fn process(source: String, loaded: Result<Track, TrackError>, settings: &Settings) -> Outcome {
    let classified = loaded
        .map_err(ClassifyError::from)
        .and_then(|track| classify_track(&track, settings));

    match classified {
        Ok(result) => Outcome::Classified(result),
        Err(err) => {
            warn!(source = %source, kind = %err.kind(), "skipping track: {}", err);
            Outcome::Failed(BatchError::new(source, &err))
        }
    }
}

/// Classify every source in order, recording per-track failures instead of
/// stopping. Sources are pulled one at a time, so with a lazy scanner each
/// file is only read when its turn comes. Once `cancel` is set no further
/// source is pulled; results completed so far are kept.
pub fn run_batch<I>(sources: I, settings: &Settings, cancel: &CancelToken) -> BatchResult
where
    I: IntoIterator<Item = (String, Result<Track, TrackError>)>,
{
    let mut outcomes = Vec::new();
    let mut cancelled = false;
    let mut sources = sources.into_iter();

    loop {
        if cancel.is_cancelled() {
            debug!(completed = outcomes.len(), "batch cancelled");
            cancelled = true;
            break;
        }
        let Some((source, loaded)) = sources.next() else {
            break;
        };
        debug!(source = %source, "processing track");
        outcomes.push(process(source, loaded, settings));
    }

    BatchResult::from_outcomes(outcomes, cancelled)
}

/// Like [`run_batch`], but classifies tracks on the rayon thread pool.
/// Sources are collected first; results are merged once at the end and keep
/// input order. Tracks not yet started when `cancel` is set are dropped.
#[cfg(feature = "parallel")]
pub fn run_batch_parallel<I>(sources: I, settings: &Settings, cancel: &CancelToken) -> BatchResult
where
    I: IntoIterator<Item = (String, Result<Track, TrackError>)>,
{
    use rayon::prelude::*;

    let pending: Vec<_> = sources.into_iter().collect();
    let outcomes: Vec<Option<Outcome>> = pending
        .into_par_iter()
        .map(|(source, loaded)| {
            if cancel.is_cancelled() {
                None
            } else {
                Some(process(source, loaded, settings))
            }
        })
        .collect();

    let cancelled = cancel.is_cancelled() || outcomes.iter().any(Option::is_none);
    BatchResult::from_outcomes(outcomes.into_iter().flatten(), cancelled)
}

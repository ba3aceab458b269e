//! Run tracker adapters
//!
//! Each served prediction or forecast is recorded as one run with its
//! parameters and metrics. Recording is best-effort: the service logs a
//! failed write and carries on with the response.

use crate::config::{TrackingBackend, TrackingConfig};
use crate::error::TrackingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type TrackingResult<T> = std::result::Result<T, TrackingError>;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub experiment: String,
    pub run_name: String,
    pub started_at: DateTime<Utc>,
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
}

impl RunRecord {
    pub fn new(experiment: impl Into<String>, run_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            experiment: experiment.into(),
            run_name: run_name.into(),
            started_at: Utc::now(),
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// Result of a monitor query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonitorResponse {
    Runs { runs: Vec<RunRecord> },
    NotFound { message: String },
}

impl MonitorResponse {
    pub fn not_found(experiment: &str) -> Self {
        MonitorResponse::NotFound {
            message: format!("Experiment '{}' not found", experiment),
        }
    }
}

/// Destination for run records
pub trait RunTracker: Send + Sync {
    /// Record one run
    fn log_run(&self, record: &RunRecord) -> TrackingResult<()>;

    /// All runs of an experiment in recording order, or `None` if it was never seen
    fn search_runs(&self, experiment: &str) -> TrackingResult<Option<Vec<RunRecord>>>;
}

/// Tracker that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTracker;

impl RunTracker for DisabledTracker {
    fn log_run(&self, _record: &RunRecord) -> TrackingResult<()> {
        Ok(())
    }

    fn search_runs(&self, _experiment: &str) -> TrackingResult<Option<Vec<RunRecord>>> {
        Ok(None)
    }
}

/// Process-local tracker
#[derive(Debug, Default)]
pub struct MemoryTracker {
    experiments: Mutex<BTreeMap<String, Vec<RunRecord>>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunTracker for MemoryTracker {
    fn log_run(&self, record: &RunRecord) -> TrackingResult<()> {
        let mut experiments = self
            .experiments
            .lock()
            .map_err(|_| TrackingError::Unavailable("tracker lock poisoned".to_string()))?;
        experiments
            .entry(record.experiment.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn search_runs(&self, experiment: &str) -> TrackingResult<Option<Vec<RunRecord>>> {
        let experiments = self
            .experiments
            .lock()
            .map_err(|_| TrackingError::Unavailable("tracker lock poisoned".to_string()))?;
        Ok(experiments.get(experiment).cloned())
    }
}

/// Tracker writing one JSON line per run, one file per experiment
#[derive(Debug)]
pub struct JsonlTracker {
    directory: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlTracker {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn experiment_path(&self, experiment: &str) -> PathBuf {
        let slug: String = experiment
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        self.directory.join(format!("{}.jsonl", slug))
    }
}

impl RunTracker for JsonlTracker {
    fn log_run(&self, record: &RunRecord) -> TrackingResult<()> {
        let line = serde_json::to_string(record)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| TrackingError::Unavailable("tracker lock poisoned".to_string()))?;

        fs::create_dir_all(&self.directory)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.experiment_path(&record.experiment))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn search_runs(&self, experiment: &str) -> TrackingResult<Option<Vec<RunRecord>>> {
        let path = self.experiment_path(experiment);
        if !path.is_file() {
            return Ok(None);
        }

        let reader = BufReader::new(fs::File::open(path)?);
        let mut runs = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: RunRecord = serde_json::from_str(&line)?;
            // Distinct names can share a slug
            if record.experiment == experiment {
                runs.push(record);
            }
        }

        if runs.is_empty() {
            return Ok(None);
        }
        Ok(Some(runs))
    }
}

/// Look up the runs of an experiment.
///
/// Unlike recording, a failing backend is reported to the caller here.
pub fn monitor(tracker: &dyn RunTracker, experiment: &str) -> crate::error::Result<MonitorResponse> {
    match tracker.search_runs(experiment)? {
        Some(runs) => Ok(MonitorResponse::Runs { runs }),
        None => Ok(MonitorResponse::not_found(experiment)),
    }
}

/// Tracker for reading runs from outside a serving process.
///
/// A memory tracker starts empty in every process, so it cannot answer for
/// runs recorded elsewhere and is refused.
pub fn queryable_tracker(config: &TrackingConfig) -> crate::error::Result<Arc<dyn RunTracker>> {
    if config.backend == TrackingBackend::Memory {
        return Err(crate::error::SalesError::ConfigError(
            "memory tracker runs are not visible outside the serving process".to_string(),
        ));
    }
    Ok(tracker_from_config(config))
}

/// Build the tracker selected by configuration
pub fn tracker_from_config(config: &TrackingConfig) -> Arc<dyn RunTracker> {
    match config.backend {
        TrackingBackend::Disabled => Arc::new(DisabledTracker),
        TrackingBackend::Memory => Arc::new(MemoryTracker::new()),
        TrackingBackend::Jsonl => Arc::new(JsonlTracker::new(config.directory.clone())),
    }
}

//! Store-keyed registry of forecasters
//!
//! A forecast request moves through
//! `UNRESOLVED -> LOADED -> SERVING`, or ends in `NOT_FOUND` when no artifact
//! exists for the store. Loading is either done for every artifact at startup
//! (`eager`) or on first use (`lazy`); a failed lazy load is reported to that
//! request only and is retried by the next one.

use crate::config::LoadingStrategy;
use crate::error::{Result, SalesError};
use crate::models::{ArimaForecaster, ForecastStep, ForecasterArtifact, TrainedForecastModel};
use crate::request::MAX_STEPS;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tracing::{debug, info};

const ARTIFACT_PREFIX: &str = "ar_model_store_";
const ARTIFACT_SUFFIX: &str = ".json";

/// File name of the artifact for a store
pub fn artifact_file_name(store_id: u32) -> String {
    format!("{}{}{}", ARTIFACT_PREFIX, store_id, ARTIFACT_SUFFIX)
}

fn store_id_from_file_name(name: &str) -> Option<u32> {
    name.strip_prefix(ARTIFACT_PREFIX)?
        .strip_suffix(ARTIFACT_SUFFIX)?
        .parse()
        .ok()
}

/// Shared, immutable forecaster
pub type ForecasterHandle = Arc<dyn TrainedForecastModel>;

/// Maps store ids to loaded forecasters
#[derive(Debug)]
pub struct ForecastRouter {
    directory: Option<PathBuf>,
    strategy: LoadingStrategy,
    registry: RwLock<HashMap<u32, ForecasterHandle>>,
}

impl ForecastRouter {
    /// Build a router over a directory of `ar_model_store_<id>.json` artifacts
    pub fn open<P: AsRef<Path>>(directory: P, strategy: LoadingStrategy) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let router = Self {
            directory: Some(directory.clone()),
            strategy,
            registry: RwLock::new(HashMap::new()),
        };

        if strategy == LoadingStrategy::Eager {
            let loaded = router.load_all(&directory)?;
            info!(directory = %directory.display(), stores = loaded, "loaded forecasters");
        }

        Ok(router)
    }

    /// Build a router over already-instantiated forecasters
    pub fn from_models<I>(models: I) -> Self
    where
        I: IntoIterator<Item = ForecasterHandle>,
    {
        let registry = models
            .into_iter()
            .map(|model| (model.store_id(), model))
            .collect();

        Self {
            directory: None,
            strategy: LoadingStrategy::Eager,
            registry: RwLock::new(registry),
        }
    }

    pub fn strategy(&self) -> LoadingStrategy {
        self.strategy
    }

    /// Store ids currently held in memory, ascending
    pub fn cached_stores(&self) -> Vec<u32> {
        let mut stores: Vec<u32> = self
            .registry
            .read()
            .map(|registry| registry.keys().copied().collect())
            .unwrap_or_default();
        stores.sort_unstable();
        stores
    }

    fn load_all(&self, directory: &Path) -> Result<usize> {
        let mut loaded = HashMap::new();
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(store_id) = name.to_str().and_then(store_id_from_file_name) else {
                continue;
            };
            loaded.insert(store_id, Self::load_file(&entry.path(), store_id)?);
        }

        let count = loaded.len();
        let mut registry = self.write_registry()?;
        registry.extend(loaded);
        Ok(count)
    }

    fn load_file(path: &Path, store_id: u32) -> Result<ForecasterHandle> {
        let artifact = ForecasterArtifact::from_path(path)?;
        if artifact.store_id != store_id {
            return Err(SalesError::ArtifactError(format!(
                "{} holds a model for store {}",
                path.display(),
                artifact.store_id
            )));
        }

        let model = ArimaForecaster::from_artifact(artifact)?;
        debug!(store_id, model = model.name(), "loaded forecaster");
        Ok(Arc::new(model))
    }

    fn write_registry(&self) -> Result<RwLockWriteGuard<'_, HashMap<u32, ForecasterHandle>>> {
        self.registry
            .write()
            .map_err(|_| SalesError::StoreError("forecaster registry lock poisoned".to_string()))
    }

    /// Resolve the forecaster for a store, loading it if the strategy allows
    pub fn resolve(&self, store_id: u32) -> Result<ForecasterHandle> {
        let cached = self
            .registry
            .read()
            .map_err(|_| SalesError::StoreError("forecaster registry lock poisoned".to_string()))?
            .get(&store_id)
            .cloned();
        if let Some(model) = cached {
            return Ok(model);
        }

        let directory = match (&self.directory, self.strategy) {
            (Some(directory), LoadingStrategy::Lazy) => directory,
            _ => return Err(SalesError::ForecasterNotFound(store_id)),
        };

        let path = directory.join(artifact_file_name(store_id));
        if !path.is_file() {
            return Err(SalesError::ForecasterNotFound(store_id));
        }

        let model = Self::load_file(&path, store_id)?;
        let mut registry = self.write_registry()?;
        Ok(registry.entry(store_id).or_insert(model).clone())
    }

    /// Produce `steps` weekly forecasts for a store
    pub fn forecast(&self, store_id: u32, steps: usize) -> Result<Vec<ForecastStep>> {
        if steps == 0 || steps > MAX_STEPS {
            return Err(SalesError::ValidationError(format!(
                "steps must be between 1 and {}, got {}",
                MAX_STEPS, steps
            )));
        }

        let model = self.resolve(store_id)?;
        let sequence = model.forecast(steps)?;
        if sequence.len() != steps {
            return Err(SalesError::ModelError(format!(
                "{} returned {} steps, {} requested",
                model.name(),
                sequence.len(),
                steps
            )));
        }

        Ok(sequence)
    }
}

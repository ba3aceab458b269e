//! Serving context
//!
//! [`SalesService`] owns everything a request needs: the feature builder, the
//! regressor pair, the forecaster registry, the observation store and the run
//! tracker. It is built once at startup, is `Send + Sync`, and is shared
//! across request threads behind an `Arc`.

use crate::config::{ConsistencyMode, ServiceConfig};
use crate::error::{Result, SalesError};
use crate::features::{FeatureBuilder, FeatureSchema};
use crate::lags::resolve_lags;
use crate::models::EnsemblePredictor;
use crate::observation::{format_date, Observation};
use crate::request::{
    validate_store_id, ForecastPoint, ForecastRequest, ForecastResponse, PredictRequest,
    PredictResponse,
};
use crate::router::ForecastRouter;
use crate::store::{open_store, ObservationStore};
use crate::tracking::{self, tracker_from_config, MonitorResponse, RunRecord, RunTracker};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Pre-built components of a [`SalesService`]
pub struct ServiceParts {
    pub schema: FeatureSchema,
    pub ensemble: EnsemblePredictor,
    pub router: ForecastRouter,
    pub store: Arc<dyn ObservationStore>,
    pub tracker: Arc<dyn RunTracker>,
    pub consistency: ConsistencyMode,
    pub experiment: String,
    pub forecast_experiment: String,
}

/// Immutable serving context
pub struct SalesService {
    builder: FeatureBuilder,
    ensemble: EnsemblePredictor,
    router: ForecastRouter,
    store: Arc<dyn ObservationStore>,
    tracker: Arc<dyn RunTracker>,
    consistency: ConsistencyMode,
    experiment: String,
    forecast_experiment: String,
    store_locks: Mutex<HashMap<u32, Arc<Mutex<()>>>>,
}

impl fmt::Debug for SalesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesService")
            .field("schema", self.builder.schema())
            .field("ensemble", &self.ensemble)
            .field("router", &self.router)
            .field("consistency", &self.consistency)
            .finish_non_exhaustive()
    }
}

impl SalesService {
    pub fn new(parts: ServiceParts) -> Result<Self> {
        if parts.ensemble.n_features() != parts.schema.width() {
            return Err(SalesError::ModelError(format!(
                "regressors expect {} features, schema has {}",
                parts.ensemble.n_features(),
                parts.schema.width()
            )));
        }

        Ok(Self {
            builder: FeatureBuilder::new(parts.schema),
            ensemble: parts.ensemble,
            router: parts.router,
            store: parts.store,
            tracker: parts.tracker,
            consistency: parts.consistency,
            experiment: parts.experiment,
            forecast_experiment: parts.forecast_experiment,
            store_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Load models, open the store and pick the tracker described by `config`
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let schema = FeatureSchema::new(config.known_stores)?;
        let ensemble =
            EnsemblePredictor::load(&config.models.regressor_a, &config.models.regressor_b, &schema)?;
        let router = ForecastRouter::open(&config.models.forecast_dir, config.models.loading)?;

        let store = open_store(&config.store)?;

        let (model_a, model_b) = ensemble.model_names();
        info!(
            known_stores = config.known_stores,
            model_a,
            model_b,
            loading = ?router.strategy(),
            consistency = ?config.consistency,
            "service ready"
        );

        Self::new(ServiceParts {
            schema,
            ensemble,
            router,
            store,
            tracker: tracker_from_config(&config.tracking),
            consistency: config.consistency,
            experiment: config.tracking.experiment.clone(),
            forecast_experiment: config.tracking.forecast_experiment.clone(),
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.builder.schema()
    }

    pub fn store(&self) -> &Arc<dyn ObservationStore> {
        &self.store
    }

    pub fn tracker(&self) -> &Arc<dyn RunTracker> {
        &self.tracker
    }

    pub fn router(&self) -> &ForecastRouter {
        &self.router
    }

    fn store_lock(&self, store_id: u32) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .store_locks
            .lock()
            .map_err(|_| SalesError::StoreError("store lock table poisoned".to_string()))?;
        Ok(locks.entry(store_id).or_default().clone())
    }

    /// Run `f` under the per-store lock when the consistency mode asks for it
    fn with_store_consistency<T>(&self, store_id: u32, f: impl FnOnce() -> Result<T>) -> Result<T> {
        match self.consistency {
            ConsistencyMode::Unsynchronized => f(),
            ConsistencyMode::PerStore => {
                let lock = self.store_lock(store_id)?;
                let _guard = lock
                    .lock()
                    .map_err(|_| SalesError::StoreError(format!("store {} lock poisoned", store_id)))?;
                f()
            }
        }
    }

    fn track(&self, record: RunRecord) {
        if let Err(err) = self.tracker.log_run(&record) {
            warn!(
                experiment = %record.experiment,
                run = %record.run_name,
                error = %err,
                "failed to record run"
            );
        }
    }

    /// Point prediction for one store and week.
    ///
    /// The prediction is appended to the store as that week's sales, so it
    /// becomes a lag value for later requests.
    pub fn predict(&self, request: &PredictRequest) -> Result<PredictResponse> {
        let input = request.validate(self.schema().known_stores())?;

        let output = self.with_store_consistency(input.store_id, || {
            let lags = resolve_lags(self.store.as_ref(), input.store_id)?;
            let features = self.builder.build(&input, lags)?;
            let output = self.ensemble.predict(&features)?;

            self.store.append(&Observation {
                store_id: input.store_id,
                date: input.date,
                weekly_sales: output.mean,
                holiday_flag: input.holiday_flag,
                temperature: input.temperature,
                fuel_price: input.fuel_price,
                cpi: input.cpi,
                unemployment: input.unemployment,
            })?;
            Ok(output)
        })?;

        let (model_a, model_b) = self.ensemble.model_names();
        self.track(
            RunRecord::new(&self.experiment, format!("predict_store_{}", input.store_id))
                .param("store_id", input.store_id)
                .param("date", format_date(input.date))
                .param("holiday_flag", input.holiday_flag)
                .param("temperature", input.temperature)
                .param("fuel_price", input.fuel_price)
                .param("cpi", input.cpi)
                .param("unemployment", input.unemployment)
                .param("model_a", model_a)
                .param("model_b", model_b)
                .metric("model_a_prediction", output.model_a)
                .metric("model_b_prediction", output.model_b)
                .metric("ensemble_prediction", output.mean),
        );

        info!(
            store_id = input.store_id,
            date = %format_date(input.date),
            prediction = output.mean,
            "served prediction"
        );
        Ok(PredictResponse::from_ensemble(output.mean))
    }

    /// Decode a JSON request and predict
    pub fn predict_json(&self, json: &str) -> Result<PredictResponse> {
        self.predict(&PredictRequest::from_json(json)?)
    }

    /// Weekly forecast for one store
    pub fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        let steps = request.validate()?;
        let sequence = self.router.forecast(request.store_id, steps)?;

        let record = sequence.iter().enumerate().fold(
            RunRecord::new(
                &self.forecast_experiment,
                format!("forecast_store_{}", request.store_id),
            )
            .param("store_id", request.store_id)
            .param("steps", steps),
            |record, (i, step)| record.metric(format!("forecast_step_{}", i + 1), step.value),
        );
        self.track(record);

        info!(store_id = request.store_id, steps, "served forecast");
        Ok(ForecastResponse {
            predictions: sequence
                .iter()
                .map(|step| ForecastPoint::new(step.date, step.value))
                .collect(),
        })
    }

    /// Decode a JSON request and forecast
    pub fn forecast_json(&self, json: &str) -> Result<ForecastResponse> {
        self.forecast(&ForecastRequest::from_json(json)?)
    }

    /// Runs recorded under an experiment
    pub fn monitor(&self, experiment: &str) -> Result<MonitorResponse> {
        tracking::monitor(self.tracker.as_ref(), experiment)
    }

    /// Append an observed week of sales
    pub fn record_actual(&self, observation: Observation) -> Result<()> {
        validate_store_id(observation.store_id, self.schema().known_stores())?;
        if observation.holiday_flag > 1 || !observation.weekly_sales.is_finite() {
            return Err(SalesError::ValidationError(format!(
                "invalid observation for store {}",
                observation.store_id
            )));
        }

        self.with_store_consistency(observation.store_id, || self.store.append(&observation))?;
        info!(
            store_id = observation.store_id,
            date = %format_date(observation.date),
            "recorded actual sales"
        );
        Ok(())
    }
}

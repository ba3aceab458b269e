//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::NaiveDate;
use sales_forecast::config::ConsistencyMode;
use sales_forecast::error::{Result, TrackingError};
use sales_forecast::features::{FeatureSchema, FeatureVector};
use sales_forecast::models::{
    ArimaForecaster, EnsemblePredictor, ForecasterArtifact, LinearModel, Regressor,
};
use sales_forecast::router::{ForecastRouter, ForecasterHandle};
use sales_forecast::store::{InMemoryStore, ObservationStore};
use sales_forecast::tracking::{MemoryTracker, RunRecord, RunTracker};
use sales_forecast::{Observation, PredictRequest, SalesService, ServiceParts};
use sales_math::ArProcess;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const PREDICT_EXPERIMENT: &str = "Sales Forecasting Experiment";
pub const FORECAST_EXPERIMENT: &str = "ARIMA Forecasting";

pub fn date(day: u32, month: u32, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Linear model over the full schema with the given non-zero weights
pub fn linear(name: &str, intercept: f64, weights: &[(&str, f64)]) -> LinearModel {
    let schema = FeatureSchema::default();
    let mut coefficients = vec![0.0; schema.width()];
    for (column, weight) in weights {
        coefficients[schema.index_of(column).unwrap()] = *weight;
    }

    LinearModel {
        name: name.to_string(),
        intercept,
        feature_names: schema.columns(),
        coefficients,
    }
}

/// Regressor that counts how often it is asked to predict
#[derive(Debug)]
pub struct CountingRegressor {
    pub calls: AtomicUsize,
    width: usize,
}

impl CountingRegressor {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            width: FeatureSchema::default().width(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Regressor for CountingRegressor {
    fn name(&self) -> &str {
        "counting"
    }

    fn n_features(&self) -> usize {
        self.width
    }

    fn predict(&self, _features: &FeatureVector) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0.0)
    }
}

/// Tracker whose backend is always down
#[derive(Debug, Default)]
pub struct FailingTracker;

impl RunTracker for FailingTracker {
    fn log_run(&self, _record: &RunRecord) -> std::result::Result<(), TrackingError> {
        Err(TrackingError::Unavailable("connection refused".to_string()))
    }

    fn search_runs(
        &self,
        _experiment: &str,
    ) -> std::result::Result<Option<Vec<RunRecord>>, TrackingError> {
        Err(TrackingError::Unavailable("connection refused".to_string()))
    }
}

/// `a = 1000 + 10 * Temperature + 0.5 * Lag_1`, `b = 3000`
pub fn reference_ensemble() -> EnsemblePredictor {
    EnsemblePredictor::new(
        Arc::new(linear(
            "model_a",
            1000.0,
            &[("Temperature", 10.0), ("Lag_1_Week_Sales", 0.5)],
        )),
        Arc::new(linear("model_b", 3000.0, &[])),
    )
    .unwrap()
}

/// AR(1) artifact: `x[t] = 10 + 0.5 * x[t-1]`, last value 40 on 26-10-2012
pub fn ar_artifact(store_id: u32) -> ForecasterArtifact {
    ForecasterArtifact {
        store_id,
        order: [1, 0, 0],
        process: ArProcess::new(10.0, vec![0.5]).unwrap(),
        history: vec![20.0, 40.0],
        last_date: date(26, 10, 2012),
    }
}

pub fn ar_router(stores: &[u32]) -> ForecastRouter {
    ForecastRouter::from_models(stores.iter().map(|&store_id| {
        Arc::new(ArimaForecaster::from_artifact(ar_artifact(store_id)).unwrap()) as ForecasterHandle
    }))
}

pub struct Harness {
    pub service: SalesService,
    pub store: Arc<InMemoryStore>,
}

pub fn harness_with(
    ensemble: EnsemblePredictor,
    tracker: Arc<dyn RunTracker>,
    consistency: ConsistencyMode,
) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let service = SalesService::new(ServiceParts {
        schema: FeatureSchema::default(),
        ensemble,
        router: ar_router(&[1, 2]),
        store: store.clone() as Arc<dyn ObservationStore>,
        tracker,
        consistency,
        experiment: PREDICT_EXPERIMENT.to_string(),
        forecast_experiment: FORECAST_EXPERIMENT.to_string(),
    })
    .unwrap();

    Harness { service, store }
}

pub fn harness() -> Harness {
    harness_with(
        reference_ensemble(),
        Arc::new(MemoryTracker::new()),
        ConsistencyMode::Unsynchronized,
    )
}

pub fn predict_request(store_id: u32, date: &str, temperature: f64) -> PredictRequest {
    PredictRequest {
        store_id,
        date: date.to_string(),
        holiday_flag: 0,
        temperature,
        fuel_price: 3.45,
        cpi: 238.2,
        unemployment: 5.8,
    }
}

pub fn observation(store_id: u32, date: NaiveDate, weekly_sales: f64) -> Observation {
    Observation {
        store_id,
        date,
        weekly_sales,
        holiday_flag: 0,
        temperature: 60.0,
        fuel_price: 3.0,
        cpi: 210.0,
        unemployment: 7.5,
    }
}

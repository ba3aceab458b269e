mod common;

use common::{ar_artifact, predict_request, FORECAST_EXPERIMENT, PREDICT_EXPERIMENT};
use pretty_assertions::assert_eq;
use sales_forecast::config::{
    LoadingStrategy, ModelsConfig, StoreBackend, StoreConfig, TrackingBackend, TrackingConfig,
};
use sales_forecast::features::{FeatureBuilder, FeatureSchema};
use sales_forecast::lags::LagValues;
use sales_forecast::models::{load_regressor, Regressor, RegressorArtifact};
use sales_forecast::router::artifact_file_name;
use sales_forecast::store::ObservationStore;
use sales_forecast::{ForecastRequest, MonitorResponse, SalesError, SalesService, ServiceConfig};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Boosted stumps: 1000 + (Holiday_Flag < 0.5 ? 100 : 500) + (Temperature < 70 ? 0 : 50)
fn tree_artifact(columns: &[String]) -> Value {
    let stump = |feature: usize, threshold: f64, low: f64, high: f64| {
        json!({"nodes": [
            {"kind": "split", "feature": feature, "threshold": threshold, "left": 1, "right": 2},
            {"kind": "leaf", "value": low},
            {"kind": "leaf", "value": high}
        ]})
    };

    json!({
        "type": "tree_ensemble",
        "name": "xgboost",
        "aggregation": "sum",
        "base_score": 1000.0,
        "feature_names": columns,
        "trees": [stump(0, 0.5, 100.0, 500.0), stump(1, 70.0, 0.0, 50.0)]
    })
}

/// 2000 + 0.5 * Lag_1_Week_Sales
fn linear_artifact(columns: &[String]) -> Value {
    let mut coefficients = vec![0.0; columns.len()];
    coefficients[5] = 0.5;

    json!({
        "type": "linear",
        "name": "ridge",
        "intercept": 2000.0,
        "feature_names": columns,
        "coefficients": coefficients
    })
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn deployment() -> (TempDir, ServiceConfig) {
    let dir = tempdir().unwrap();
    let columns = FeatureSchema::default().columns();
    let forecast_dir = dir.path().join("forecast_models");
    fs::create_dir_all(&forecast_dir).unwrap();

    write_json(&dir.path().join("regressor_a.json"), &tree_artifact(&columns));
    write_json(&dir.path().join("regressor_b.json"), &linear_artifact(&columns));
    write_json(
        &forecast_dir.join(artifact_file_name(1)),
        &serde_json::to_value(ar_artifact(1)).unwrap(),
    );

    let config = ServiceConfig {
        store: StoreConfig {
            backend: StoreBackend::Sqlite,
            database: dir.path().join("walmart_sales.db"),
        },
        models: ModelsConfig {
            regressor_a: dir.path().join("regressor_a.json"),
            regressor_b: dir.path().join("regressor_b.json"),
            forecast_dir,
            loading: LoadingStrategy::Eager,
        },
        tracking: TrackingConfig {
            backend: TrackingBackend::Jsonl,
            directory: dir.path().join("mlruns"),
            ..TrackingConfig::default()
        },
        ..ServiceConfig::default()
    };

    (dir, config)
}

#[test]
fn test_regressor_artifacts_predict() {
    let schema = FeatureSchema::default();
    let columns = schema.columns();
    let builder = FeatureBuilder::new(schema);
    let input = predict_request(1, "03-11-2012", 75.5).validate(45).unwrap();
    let vector = builder.build(&input, LagValues::new(1000.0, 0.0)).unwrap();

    let tree = RegressorArtifact::from_json(&tree_artifact(&columns).to_string())
        .unwrap()
        .into_regressor(&schema)
        .unwrap();
    let linear = RegressorArtifact::from_json(&linear_artifact(&columns).to_string())
        .unwrap()
        .into_regressor(&schema)
        .unwrap();

    assert_eq!(tree.name(), "xgboost");
    assert_eq!(tree.predict(&vector).unwrap(), 1150.0);
    assert_eq!(linear.predict(&vector).unwrap(), 2500.0);
}

#[test]
fn test_artifact_with_reordered_columns_is_rejected() {
    let dir = tempdir().unwrap();
    let mut columns = FeatureSchema::default().columns();
    columns.swap(5, 6);
    let path = dir.path().join("regressor.json");
    write_json(&path, &linear_artifact(&columns));

    let err = load_regressor(&path, &FeatureSchema::default()).unwrap_err();
    assert!(matches!(err, SalesError::ArtifactError(_)));
    assert!(err.to_string().contains("Lag_2_Week_Sales"));
}

#[test]
fn test_artifact_for_other_store_count_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("regressor.json");
    write_json(&path, &tree_artifact(&FeatureSchema::default().columns()));

    let schema = FeatureSchema::new(44).unwrap();
    assert!(matches!(
        load_regressor(&path, &schema),
        Err(SalesError::ArtifactError(_))
    ));
}

#[test]
fn test_unknown_artifact_type_is_rejected() {
    let err = RegressorArtifact::from_json(r#"{"type": "neural_net", "name": "x"}"#).unwrap_err();
    assert!(matches!(err, SalesError::ArtifactError(_)));
}

#[test]
fn test_service_from_config_end_to_end() {
    let (_dir, config) = deployment();
    let service = SalesService::from_config(&config).unwrap();

    // (1150 + 2000) / 2
    let first = service
        .predict_json(
            r#"{"Store": 1, "Date": "03-11-2012", "Holiday_Flag": 0, "Temperature": 75.5,
                "Fuel_Price": 3.45, "CPI": 238.2, "Unemployment": 5.8}"#,
        )
        .unwrap();
    assert_eq!(first.prediction, 1575.0);

    // (1150 + 2000 + 0.5 * 1575) / 2
    let second = service.predict(&predict_request(1, "10-11-2012", 75.5)).unwrap();
    assert_eq!(second.prediction, 1968.75);

    let forecast = service.forecast(&ForecastRequest::new(1, 2)).unwrap();
    assert_eq!(forecast.predictions[0].sales, "30.00");
    assert_eq!(forecast.predictions[1].date, "09-11-2012");

    let MonitorResponse::Runs { runs } = service.monitor(PREDICT_EXPERIMENT).unwrap() else {
        panic!("expected recorded prediction runs");
    };
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].metrics["ensemble_prediction"], 1968.75);

    let MonitorResponse::Runs { runs } = service.monitor(FORECAST_EXPERIMENT).unwrap() else {
        panic!("expected recorded forecast runs");
    };
    assert_eq!(runs.len(), 1);
}

#[test]
fn test_state_survives_restart() {
    let (_dir, config) = deployment();
    {
        let service = SalesService::from_config(&config).unwrap();
        service.predict(&predict_request(1, "03-11-2012", 75.5)).unwrap();
    }

    let service = SalesService::from_config(&config).unwrap();
    assert_eq!(service.store().len().unwrap(), 1);

    // Lag from the previous process: (1150 + 2000 + 787.5) / 2
    let response = service.predict(&predict_request(1, "10-11-2012", 75.5)).unwrap();
    assert_eq!(response.prediction, 1968.75);

    let MonitorResponse::Runs { runs } = service.monitor(PREDICT_EXPERIMENT).unwrap() else {
        panic!("expected runs from both processes");
    };
    assert_eq!(runs.len(), 2);
}

#[test]
fn test_missing_regressor_fails_startup() {
    let (dir, config) = deployment();
    fs::remove_file(dir.path().join("regressor_b.json")).unwrap();

    let err = SalesService::from_config(&config).unwrap_err();
    assert!(matches!(err, SalesError::ArtifactError(_)));
}

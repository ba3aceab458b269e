//! Request and response payloads for the serving operations
//!
//! Decoding is strict: wrong-typed or missing fields are validation errors,
//! raised before any model or store is touched. Field names follow the
//! snake_case API and also accept the column names of the historical export
//! (`Store`, `Date`, `Holiday_Flag`, ...).

use crate::error::{Result, SalesError};
use crate::observation::{format_date, parse_date};
use chrono::NaiveDate;
use sales_math::{format_fixed, round_to};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Forecast horizon used when a request does not specify one
pub const DEFAULT_STEPS: i64 = 3;

/// Longest accepted forecast horizon, ten years of weeks
pub const MAX_STEPS: usize = 520;

/// Decimal places applied at the response boundary
pub const RESPONSE_DECIMALS: u32 = 2;

fn decode<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| SalesError::ValidationError(e.to_string()))
}

fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SalesError::ValidationError(format!(
            "{} must be a finite number",
            name
        )))
    }
}

/// Ensure a store id lies in `1..=known_stores`
pub fn validate_store_id(store_id: u32, known_stores: u32) -> Result<()> {
    if store_id == 0 || store_id > known_stores {
        return Err(SalesError::ValidationError(format!(
            "store_id {} is outside the known range 1..={}",
            store_id, known_stores
        )));
    }
    Ok(())
}

/// Point prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(alias = "Store")]
    pub store_id: u32,
    #[serde(alias = "Date")]
    pub date: String,
    #[serde(alias = "Holiday_Flag")]
    pub holiday_flag: u8,
    #[serde(alias = "Temperature")]
    pub temperature: f64,
    #[serde(alias = "Fuel_Price")]
    pub fuel_price: f64,
    #[serde(alias = "CPI")]
    pub cpi: f64,
    #[serde(alias = "Unemployment")]
    pub unemployment: f64,
}

/// A predict request whose fields have all been checked
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInput {
    pub store_id: u32,
    pub date: NaiveDate,
    pub holiday_flag: u8,
    pub temperature: f64,
    pub fuel_price: f64,
    pub cpi: f64,
    pub unemployment: f64,
}

impl PredictRequest {
    /// Decode a request from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        decode(json)
    }

    /// Check every field and parse the date
    pub fn validate(&self, known_stores: u32) -> Result<PredictionInput> {
        validate_store_id(self.store_id, known_stores)?;

        if self.holiday_flag > 1 {
            return Err(SalesError::ValidationError(format!(
                "holiday_flag must be 0 or 1, got {}",
                self.holiday_flag
            )));
        }

        ensure_finite("temperature", self.temperature)?;
        ensure_finite("fuel_price", self.fuel_price)?;
        ensure_finite("cpi", self.cpi)?;
        ensure_finite("unemployment", self.unemployment)?;

        Ok(PredictionInput {
            store_id: self.store_id,
            date: parse_date(&self.date)?,
            holiday_flag: self.holiday_flag,
            temperature: self.temperature,
            fuel_price: self.fuel_price,
            cpi: self.cpi,
            unemployment: self.unemployment,
        })
    }
}

/// Point prediction response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: f64,
}

impl PredictResponse {
    /// Round the ensemble output for the caller
    pub fn from_ensemble(value: f64) -> Self {
        Self {
            prediction: round_to(value, RESPONSE_DECIMALS),
        }
    }
}

fn default_steps() -> i64 {
    DEFAULT_STEPS
}

/// Multi-step forecast request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub store_id: u32,
    #[serde(default = "default_steps")]
    pub steps: i64,
}

impl ForecastRequest {
    pub fn new(store_id: u32, steps: i64) -> Self {
        Self { store_id, steps }
    }

    /// Decode a request from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        decode(json)
    }

    /// Check the store id and return the horizon as a count
    pub fn validate(&self) -> Result<usize> {
        if self.store_id == 0 {
            return Err(SalesError::ValidationError(
                "store_id must be at least 1".to_string(),
            ));
        }
        if self.steps <= 0 {
            return Err(SalesError::ValidationError(format!(
                "steps must be a positive integer, got {}",
                self.steps
            )));
        }

        match usize::try_from(self.steps) {
            Ok(steps) if steps <= MAX_STEPS => Ok(steps),
            _ => Err(SalesError::ValidationError(format!(
                "steps must be at most {}, got {}",
                MAX_STEPS, self.steps
            ))),
        }
    }
}

/// One forecast step as sent to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: String,
    pub sales: String,
}

impl ForecastPoint {
    pub fn new(date: NaiveDate, sales: f64) -> Self {
        Self {
            date: format_date(date),
            sales: format_fixed(sales, RESPONSE_DECIMALS as usize),
        }
    }
}

/// Multi-step forecast response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub predictions: Vec<ForecastPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"{
        "store_id": 1, "date": "03-11-2012", "holiday_flag": 0,
        "temperature": 75.5, "fuel_price": 3.45, "cpi": 238.2, "unemployment": 5.8
    }"#;

    #[test]
    fn test_decode_and_validate() {
        let input = PredictRequest::from_json(VALID).unwrap().validate(45).unwrap();
        assert_eq!(input.store_id, 1);
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2012, 11, 3).unwrap());
    }

    #[test]
    fn test_accepts_export_column_names() {
        let json = r#"{"Store": 1, "Date": "01-01-2022", "Holiday_Flag": 0,
            "Temperature": 20.0, "Fuel_Price": 2.0, "CPI": 100.0, "Unemployment": 5.0}"#;
        let request = PredictRequest::from_json(json).unwrap();
        assert_eq!(request.store_id, 1);
        assert_eq!(request.cpi, 100.0);
    }

    #[test]
    fn test_store_as_string_is_validation_error() {
        let json = VALID.replace("\"store_id\": 1", "\"store_id\": \"abc\"");
        let err = PredictRequest::from_json(&json).unwrap_err();
        assert!(matches!(err, SalesError::ValidationError(_)));
    }

    #[test]
    fn test_missing_fields_is_validation_error() {
        let err = PredictRequest::from_json(r#"{"Store": 1, "Date": "01-01-2022"}"#).unwrap_err();
        assert!(matches!(err, SalesError::ValidationError(_)));
    }

    #[test]
    fn test_holiday_flag_range() {
        let mut request = PredictRequest::from_json(VALID).unwrap();
        request.holiday_flag = 2;
        assert!(matches!(
            request.validate(45),
            Err(SalesError::ValidationError(_))
        ));
    }

    #[test]
    fn test_forecast_defaults_to_three_steps() {
        let request = ForecastRequest::from_json(r#"{"store_id": 4}"#).unwrap();
        assert_eq!(request.validate().unwrap(), 3);
    }

    #[test]
    fn test_forecast_rejects_non_positive_steps() {
        assert!(ForecastRequest::new(1, 0).validate().is_err());
        assert!(ForecastRequest::new(1, -1).validate().is_err());
    }

    #[test]
    fn test_forecast_horizon_is_capped() {
        assert_eq!(ForecastRequest::new(1, MAX_STEPS as i64).validate().unwrap(), MAX_STEPS);
        assert!(ForecastRequest::new(1, MAX_STEPS as i64 + 1).validate().is_err());
        assert!(ForecastRequest::new(1, i64::MAX).validate().is_err());
    }

    #[test]
    fn test_response_boundary_formatting() {
        assert_eq!(PredictResponse::from_ensemble(1554806.4689).prediction, 1554806.47);

        let point = ForecastPoint::new(NaiveDate::from_ymd_opt(2012, 11, 2).unwrap(), 1500.0);
        assert_eq!(point.date, "02-11-2012");
        assert_eq!(point.sales, "1500.00");
    }
}

//! Fixed-schema feature vectors for the point-estimate regressors
//!
//! The column order below is the order the regressors were fit with. Any
//! change here silently shifts every prediction, so artifacts carry their
//! column names and are checked against [`FeatureSchema::columns`] at load.
//!
//! ```text
//! Holiday_Flag, Temperature, Fuel_Price, CPI, Unemployment,
//! Lag_1_Week_Sales, Lag_2_Week_Sales,
//! DayOfWeek, Month, WeekOfYear, Year,
//! Store_1 .. Store_<known_stores>
//! ```

use crate::error::{Result, SalesError};
use crate::lags::LagValues;
use crate::request::{validate_store_id, PredictionInput};
use chrono::Datelike;
use tracing::debug;

/// Store count of the reference deployment
pub const DEFAULT_KNOWN_STORES: u32 = 45;

/// Columns preceding the one-hot store block
pub const BASE_COLUMNS: [&str; 11] = [
    "Holiday_Flag",
    "Temperature",
    "Fuel_Price",
    "CPI",
    "Unemployment",
    "Lag_1_Week_Sales",
    "Lag_2_Week_Sales",
    "DayOfWeek",
    "Month",
    "WeekOfYear",
    "Year",
];

/// Column layout shared by the feature builder and every regressor artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    known_stores: u32,
}

impl FeatureSchema {
    pub fn new(known_stores: u32) -> Result<Self> {
        if known_stores == 0 {
            return Err(SalesError::ConfigError(
                "known_stores must be at least 1".to_string(),
            ));
        }
        Ok(Self { known_stores })
    }

    pub fn known_stores(&self) -> u32 {
        self.known_stores
    }

    /// Total number of columns
    pub fn width(&self) -> usize {
        BASE_COLUMNS.len() + self.known_stores as usize
    }

    /// Column names in vector order
    pub fn columns(&self) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain((1..=self.known_stores).map(|id| format!("Store_{}", id)))
            .collect()
    }

    /// Position of a named column
    pub fn index_of(&self, column: &str) -> Option<usize> {
        if let Some(idx) = BASE_COLUMNS.iter().position(|c| *c == column) {
            return Some(idx);
        }
        column
            .strip_prefix("Store_")
            .and_then(|id| id.parse::<u32>().ok())
            .filter(|id| (1..=self.known_stores).contains(id))
            .map(|id| self.store_column(id))
    }

    /// Position of the one-hot column for `store_id` (caller checks the range)
    pub fn store_column(&self, store_id: u32) -> usize {
        BASE_COLUMNS.len() + store_id as usize - 1
    }

    /// Check that an artifact was fit on exactly this layout
    pub fn check_columns(&self, names: &[String]) -> Result<()> {
        let expected = self.columns();
        if names.len() != expected.len() {
            return Err(SalesError::ArtifactError(format!(
                "artifact expects {} features, schema has {}",
                names.len(),
                expected.len()
            )));
        }

        if let Some((idx, (got, want))) = names
            .iter()
            .zip(expected.iter())
            .enumerate()
            .find(|(_, (got, want))| got != want)
        {
            return Err(SalesError::ArtifactError(format!(
                "feature {} is '{}' in the artifact but '{}' in the schema",
                idx, got, want
            )));
        }

        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            known_stores: DEFAULT_KNOWN_STORES,
        }
    }
}

/// A single row ready for the regressors
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap raw values; used by callers that build rows outside the builder
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column under `schema`
    pub fn get(&self, schema: &FeatureSchema, column: &str) -> Option<f64> {
        schema
            .index_of(column)
            .and_then(|idx| self.values.get(idx).copied())
    }

    /// The one-hot store block
    pub fn store_block(&self) -> &[f64] {
        &self.values[BASE_COLUMNS.len().min(self.values.len())..]
    }
}

/// Calendar fields derived from the request date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    pub month: u32,
    /// ISO 8601 week number
    pub week_of_year: u32,
    pub year: i32,
}

impl CalendarFeatures {
    pub fn from_date(date: chrono::NaiveDate) -> Self {
        Self {
            day_of_week: date.weekday().num_days_from_monday(),
            month: date.month(),
            week_of_year: date.iso_week().week(),
            year: date.year(),
        }
    }
}

/// Builds feature vectors for a fixed store count
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder {
    schema: FeatureSchema,
}

impl FeatureBuilder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Assemble one row from a validated request and its lag values.
    ///
    /// The raw date and raw store id are not part of the output; only their
    /// derived calendar fields and one-hot encoding are.
    pub fn build(&self, input: &PredictionInput, lags: LagValues) -> Result<FeatureVector> {
        validate_store_id(input.store_id, self.schema.known_stores)?;

        let calendar = CalendarFeatures::from_date(input.date);
        let mut values = Vec::with_capacity(self.schema.width());

        values.push(f64::from(input.holiday_flag));
        values.push(input.temperature);
        values.push(input.fuel_price);
        values.push(input.cpi);
        values.push(input.unemployment);
        values.push(lags.lag_1);
        values.push(lags.lag_2);
        values.push(f64::from(calendar.day_of_week));
        values.push(f64::from(calendar.month));
        values.push(f64::from(calendar.week_of_year));
        values.push(f64::from(calendar.year));

        let mut stores = vec![0.0; self.schema.known_stores as usize];
        stores[input.store_id as usize - 1] = 1.0;
        values.extend(stores);

        let vector = FeatureVector { values };
        debug!(
            store_id = input.store_id,
            width = vector.len(),
            encoded_store = ?vector.store_block().iter().position(|v| *v == 1.0).map(|i| i + 1),
            "built feature vector"
        );
        Ok(vector)
    }
}

//! Store-level weekly observations and the DD-MM-YYYY date convention

use crate::error::{Result, SalesError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used on every external surface
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Parse a `DD-MM-YYYY` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        SalesError::ParseError(format!(
            "date '{}' is not in DD-MM-YYYY form: {}",
            value, e
        ))
    })
}

/// Render a date as `DD-MM-YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One week of sales and context for a single store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub store_id: u32,
    pub date: NaiveDate,
    pub weekly_sales: f64,
    pub holiday_flag: u8,
    pub temperature: f64,
    pub fuel_price: f64,
    pub cpi: f64,
    pub unemployment: f64,
}

/// Raw CSV row in the historical sales export layout
#[derive(Debug, Deserialize)]
pub(crate) struct CsvObservation {
    #[serde(rename = "Store")]
    pub store: u32,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Weekly_Sales")]
    pub weekly_sales: f64,
    #[serde(rename = "Holiday_Flag")]
    pub holiday_flag: u8,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Fuel_Price")]
    pub fuel_price: f64,
    #[serde(rename = "CPI")]
    pub cpi: f64,
    #[serde(rename = "Unemployment")]
    pub unemployment: f64,
}

impl TryFrom<CsvObservation> for Observation {
    type Error = SalesError;

    fn try_from(row: CsvObservation) -> Result<Self> {
        Ok(Observation {
            store_id: row.store,
            date: parse_date(&row.date)?,
            weekly_sales: row.weekly_sales,
            holiday_flag: row.holiday_flag,
            temperature: row.temperature,
            fuel_price: row.fuel_price,
            cpi: row.cpi,
            unemployment: row.unemployment,
        })
    }
}

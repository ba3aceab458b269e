//! Autoregressive projection for integrated series
//!
//! Contains the pieces an ARIMA(p, d, 0) forecaster needs at serving time:
//! - Differencing of order `d`
//! - Recursive AR(p) projection on the differenced series
//! - Integration of the projected differences back to levels

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Difference a series `order` times.
///
/// Each pass shortens the series by one element.
pub fn difference(series: &[f64], order: usize) -> Result<Vec<f64>> {
    if series.len() <= order {
        return Err(MathError::InsufficientData(format!(
            "Differencing of order {} needs more than {} observations, got {}",
            order,
            order,
            series.len()
        )));
    }

    let mut current = series.to_vec();
    for _ in 0..order {
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }

    Ok(current)
}

/// Undo `order` passes of differencing on values projected past the end of `series`.
///
/// `projected` holds forecasts of the `order`-times differenced series; the
/// anchors for each integration pass are the last values of `series` at every
/// intermediate differencing level.
pub fn integrate(series: &[f64], order: usize, projected: &[f64]) -> Result<Vec<f64>> {
    if order == 0 {
        return Ok(projected.to_vec());
    }
    if series.len() <= order {
        return Err(MathError::InsufficientData(format!(
            "Integration of order {} needs more than {} observations, got {}",
            order,
            order,
            series.len()
        )));
    }

    let mut anchors = Vec::with_capacity(order);
    let mut current = series.to_vec();
    for _ in 0..order {
        // Non-empty: len > order guarantees at least one element per level
        anchors.push(current[current.len() - 1]);
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }

    let mut levels = projected.to_vec();
    for anchor in anchors.into_iter().rev() {
        let mut running = anchor;
        for value in levels.iter_mut() {
            running += *value;
            *value = running;
        }
    }

    Ok(levels)
}

/// A fitted AR(p) process: `x[t] = intercept + Σ coefficients[i] * x[t-1-i]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArProcess {
    /// Constant term
    #[serde(default)]
    pub intercept: f64,
    /// Lag coefficients, lag 1 first
    #[serde(rename = "ar_coefficients")]
    pub coefficients: Vec<f64>,
}

impl ArProcess {
    /// Create a new AR process
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
            return Err(MathError::InvalidInput(
                "AR parameters must be finite".to_string(),
            ));
        }

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    /// Order of the process (number of lags)
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Project `horizon` values past the end of `history`.
    ///
    /// Each projected value is fed back as the most recent lag for the next step.
    pub fn forecast(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>> {
        let p = self.order();
        if history.len() < p {
            return Err(MathError::InsufficientData(format!(
                "AR({}) projection needs at least {} observations, got {}",
                p,
                p,
                history.len()
            )));
        }

        let mut window = history[history.len() - p..].to_vec();
        let mut forecasts = Vec::new();

        for _ in 0..horizon {
            let mut forecast = self.intercept;
            for (i, coefficient) in self.coefficients.iter().enumerate() {
                forecast += coefficient * window[window.len() - 1 - i];
            }

            if !forecast.is_finite() {
                return Err(MathError::CalculationError(
                    "AR projection diverged".to_string(),
                ));
            }

            window.push(forecast);
            forecasts.push(forecast);
        }

        Ok(forecasts)
    }
}

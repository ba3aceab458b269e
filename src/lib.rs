//! # Store Sales
//!
//! Workspace facade over the weekly store sales crates.
//!
//! - [`sales_math`]: differencing, autoregressive recursion and fixed-decimal rounding
//! - [`sales_forecast`]: observation store, feature construction, the regressor
//!   ensemble, per-store forecasters, run tracking and the serving context
//!
//! ## Example
//!
//! ```
//! use store_sales_workspace::sales_math::round_to;
//!
//! assert_eq!(round_to(1554806.4689, 2), 1554806.47);
//! ```

pub use sales_forecast;
pub use sales_math;

pub use sales_forecast::{
    ForecastRequest, ForecastResponse, MonitorResponse, Observation, PredictRequest,
    PredictResponse, SalesError, SalesService, ServiceConfig,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_reexports() {
        let config = ServiceConfig::default();
        assert_eq!(config.known_stores, 45);
        assert_eq!(sales_math::format_fixed(1500.0, 2), "1500.00");
    }
}

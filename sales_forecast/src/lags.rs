//! Lag feature lookup against the observation store

use crate::error::Result;
use crate::store::ObservationStore;

/// The two most recent weekly sales values for a store
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LagValues {
    /// Most recently appended value (`Lag_1_Week_Sales`)
    pub lag_1: f64,
    /// The one appended before it (`Lag_2_Week_Sales`)
    pub lag_2: f64,
}

impl LagValues {
    pub fn new(lag_1: f64, lag_2: f64) -> Self {
        Self { lag_1, lag_2 }
    }
}

/// Read the lag values for `store_id` from the store as it is now.
///
/// Missing history is filled with zero rather than reported. Callers must
/// resolve before appending the current request's observation.
pub fn resolve_lags(store: &dyn ObservationStore, store_id: u32) -> Result<LagValues> {
    let recent = store.recent_sales(store_id, 2)?;

    Ok(LagValues {
        lag_1: recent.first().copied().unwrap_or(0.0),
        lag_2: recent.get(1).copied().unwrap_or(0.0),
    })
}

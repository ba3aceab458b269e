//! Process-local observation store

use super::ObservationStore;
use crate::error::{Result, SalesError};
use crate::observation::Observation;
use std::sync::{RwLock, RwLockReadGuard};

/// Observation store backed by a vector in append order
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RwLock<Vec<Observation>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with existing rows, kept in the given order
    pub fn with_rows(rows: Vec<Observation>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Observation>>> {
        self.rows
            .read()
            .map_err(|_| SalesError::StoreError("observation store lock poisoned".to_string()))
    }
}

impl ObservationStore for InMemoryStore {
    fn append(&self, observation: &Observation) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| SalesError::StoreError("observation store lock poisoned".to_string()))?;
        rows.push(observation.clone());
        Ok(())
    }

    fn recent_sales(&self, store_id: u32, limit: usize) -> Result<Vec<f64>> {
        Ok(self
            .read()?
            .iter()
            .rev()
            .filter(|row| row.store_id == store_id)
            .take(limit)
            .map(|row| row.weekly_sales)
            .collect())
    }

    fn history(&self, store_id: u32) -> Result<Vec<Observation>> {
        Ok(self
            .read()?
            .iter()
            .filter(|row| row.store_id == store_id)
            .cloned()
            .collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

//! Append-only historical observation store
//!
//! Rows are never updated or deleted. Within a store, "most recent" means
//! most recently appended; no ordering by date is implied.

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::observation::Observation;
use std::sync::Arc;

pub mod loader;
pub mod memory;
pub mod sqlite;

pub use loader::{bulk_load, read_csv_tail};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Persistence contract shared by the lag resolver and the observation sink
pub trait ObservationStore: Send + Sync {
    /// Append one observation at the end of the log
    fn append(&self, observation: &Observation) -> Result<()>;

    /// Up to `limit` weekly sales values for a store, most recently appended first
    fn recent_sales(&self, store_id: u32, limit: usize) -> Result<Vec<f64>>;

    /// All observations for a store in append order
    fn history(&self, store_id: u32) -> Result<Vec<Observation>>;

    /// Total number of rows across all stores
    fn len(&self) -> Result<usize>;

    /// Whether the store holds no rows at all
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Open the store backend selected by configuration
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn ObservationStore>> {
    let store: Arc<dyn ObservationStore> = match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.database)?),
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
    };
    Ok(store)
}

//! Bulk seeding of the observation store from a historical sales export

use super::ObservationStore;
use crate::error::Result;
use crate::observation::{CsvObservation, Observation};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use tracing::info;

/// Rows kept per store when seeding, matching the reference deployment
pub const DEFAULT_TAIL: usize = 10;

/// Read a sales CSV and keep the last `tail` rows of every store.
///
/// Rows keep their file order within a store; stores are returned in
/// ascending id order.
pub fn read_csv_tail<P: AsRef<Path>>(path: P, tail: usize) -> Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut per_store: BTreeMap<u32, VecDeque<Observation>> = BTreeMap::new();

    for record in reader.deserialize::<CsvObservation>() {
        let observation = Observation::try_from(record?)?;
        let rows = per_store.entry(observation.store_id).or_default();
        rows.push_back(observation);
        if rows.len() > tail {
            rows.pop_front();
        }
    }

    Ok(per_store.into_values().flatten().collect())
}

/// Append the last `tail` rows per store of a sales CSV into `store`.
///
/// Returns the number of rows appended.
pub fn bulk_load<P: AsRef<Path>>(
    store: &dyn ObservationStore,
    path: P,
    tail: usize,
) -> Result<usize> {
    let path = path.as_ref();
    let rows = read_csv_tail(path, tail)?;
    for row in &rows {
        store.append(row)?;
    }

    info!(path = %path.display(), rows = rows.len(), "seeded observation store");
    Ok(rows.len())
}

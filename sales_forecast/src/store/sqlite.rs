//! SQLite-backed observation store

use super::ObservationStore;
use crate::error::{Result, SalesError};
use crate::observation::Observation;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const ISO_DATE: &str = "%Y-%m-%d";

/// Observation store persisted in a single SQLite table
///
/// The autoincrement `id` column records append order.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init_schema(&conn)?;
        debug!(path = %path.display(), "opened observation store");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS walmart_sales (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                store INTEGER NOT NULL,
                date TEXT NOT NULL,
                weekly_sales REAL NOT NULL,
                holiday_flag INTEGER NOT NULL,
                temperature REAL NOT NULL,
                fuel_price REAL NOT NULL,
                cpi REAL NOT NULL,
                unemployment REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_walmart_sales_store ON walmart_sales(store, id DESC);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SalesError::StoreError("observation store lock poisoned".to_string()))
    }

    fn row_to_observation(row: &Row<'_>) -> rusqlite::Result<Observation> {
        let date: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date, ISO_DATE)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        Ok(Observation {
            store_id: row.get(0)?,
            date,
            weekly_sales: row.get(2)?,
            holiday_flag: row.get(3)?,
            temperature: row.get(4)?,
            fuel_price: row.get(5)?,
            cpi: row.get(6)?,
            unemployment: row.get(7)?,
        })
    }
}

impl ObservationStore for SqliteStore {
    fn append(&self, observation: &Observation) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO walmart_sales
                (store, date, weekly_sales, holiday_flag, temperature, fuel_price, cpi, unemployment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                observation.store_id,
                observation.date.format(ISO_DATE).to_string(),
                observation.weekly_sales,
                observation.holiday_flag,
                observation.temperature,
                observation.fuel_price,
                observation.cpi,
                observation.unemployment,
            ],
        )?;

        Ok(())
    }

    fn recent_sales(&self, store_id: u32, limit: usize) -> Result<Vec<f64>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT weekly_sales FROM walmart_sales WHERE store = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let sales = stmt
            .query_map(params![store_id, limit as i64], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;

        Ok(sales)
    }

    fn history(&self, store_id: u32) -> Result<Vec<Observation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT store, date, weekly_sales, holiday_flag, temperature, fuel_price, cpi, unemployment
             FROM walmart_sales WHERE store = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![store_id], Self::row_to_observation)?
            .collect::<rusqlite::Result<Vec<Observation>>>()?;

        Ok(rows)
    }

    fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM walmart_sales", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

//! Read-only data access over the relational store.
//!
//! One [`DashboardStore`] wraps one SQLite connection. The HTTP layer opens
//! one store per worker thread, so the worker count bounds the number of
//! concurrently outstanding queries.
//!
//! Every fetch is keyed by `(year, month identifier)`; the month identifier's
//! spelling is the caller's concern (see [`sd_common::MonthNameStyle`]).
//! Failures surface as [`DataFetchError`], never as empty results.

pub mod rows;
pub mod schema;

use rusqlite::{params, Connection, OpenFlags, Row};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub use rows::{
    AwsCostRow, R2ThresholdRow, R2UsageRow, S3BucketRow, ZoneThresholdRow, ZoneUsageRow,
};

/// A data-access failure, tagged with the metric family being fetched.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {family} data: {source}")]
pub struct DataFetchError {
    pub family: &'static str,
    #[source]
    pub source: rusqlite::Error,
}

impl DataFetchError {
    pub fn new(family: &'static str, source: rusqlite::Error) -> Self {
        Self { family, source }
    }
}

impl From<DataFetchError> for sd_common::Error {
    fn from(err: DataFetchError) -> Self {
        sd_common::Error::DataFetch {
            family: err.family.to_string(),
            message: err.source.to_string(),
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, DataFetchError>;

/// Result of a connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PingReport {
    pub select_one: i64,
    pub server_count: i64,
}

pub struct DashboardStore {
    conn: Connection,
}

impl DashboardStore {
    /// Open an existing database file for reading.
    pub fn open(path: &Path, busy_timeout: Duration) -> FetchResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DataFetchError::new("store", e))?;
        conn.busy_timeout(busy_timeout)
            .map_err(|e| DataFetchError::new("store", e))?;
        debug!(path = %path.display(), "store opened read-only");
        Ok(Self { conn })
    }

    /// Open (creating if needed) a database file for schema setup.
    pub fn open_writable(path: &Path) -> FetchResult<Self> {
        let conn = Connection::open(path).map_err(|e| DataFetchError::new("store", e))?;
        Ok(Self { conn })
    }

    /// In-memory store with the schema applied. Used by tests and demos.
    pub fn open_in_memory() -> FetchResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DataFetchError::new("store", e))?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create the tables the dashboard queries read.
    pub fn initialize_schema(&self) -> FetchResult<()> {
        schema::initialize_schema(&self.conn).map_err(|e| DataFetchError::new("store", e))
    }

    /// Direct connection access for seeding fixtures.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// `SELECT 1` plus a row count of the `servers` table.
    pub fn ping(&self) -> FetchResult<PingReport> {
        let select_one: i64 = self
            .conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(|e| DataFetchError::new("store", e))?;
        let server_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM servers", [], |row| row.get(0))
            .map_err(|e| DataFetchError::new("store", e))?;
        Ok(PingReport {
            select_one,
            server_count,
        })
    }

    /// Per-account AWS cost rows for one month, ordered by account name.
    pub fn aws_costs(&self, year: i32, month: &str) -> FetchResult<Vec<AwsCostRow>> {
        self.query_rows(
            "aws_cost",
            "SELECT account_name, account_id, current_cost, baseline_cost
             FROM aws_cost_report
             WHERE year = ?1 AND month = ?2
             ORDER BY account_name",
            year,
            month,
            AwsCostRow::from_row,
        )
    }

    /// Cloudflare R2 usage rows for one month.
    pub fn r2_usage(&self, year: i32, month: &str) -> FetchResult<Vec<R2UsageRow>> {
        self.query_rows(
            "cloudflare_r2",
            "SELECT OBJECT_COUNT, PAYLOAD_SIZE_TB,
                    Class_A_Requests_MM_PutObject, Class_B_Requests_MM_GetObject,
                    LAST_REFRESH_TIME
             FROM cloudflare_R2_usageth
             WHERE YEAR = ?1 AND MONTH = ?2",
            year,
            month,
            R2UsageRow::from_row,
        )
    }

    /// Cloudflare zone usage rows for one month, largest bandwidth first.
    pub fn zone_usage(&self, year: i32, month: &str) -> FetchResult<Vec<ZoneUsageRow>> {
        self.query_rows(
            "cloudflare_zones",
            "SELECT Account_Name, Zone_Name, Requests_M, Bandwidth_TB, Is_China, refresh_time_ist
             FROM cloudflare_zone_usage
             WHERE Year = ?1 AND Month = ?2
             ORDER BY CAST(Bandwidth_TB AS REAL) DESC",
            year,
            month,
            ZoneUsageRow::from_row,
        )
    }

    /// S3 bucket usage rows for one month, largest first.
    pub fn s3_usage(&self, year: i32, month: &str) -> FetchResult<Vec<S3BucketRow>> {
        self.query_rows(
            "s3_buckets",
            "SELECT Account_Name, Bucket_Name, Size_MB, Retention
             FROM s3_bucket_usage
             WHERE Year = ?1 AND Month = ?2
             ORDER BY CAST(Size_MB AS REAL) DESC",
            year,
            month,
            S3BucketRow::from_row,
        )
    }

    /// The single R2 threshold row, if configured.
    pub fn r2_thresholds(&self) -> FetchResult<Option<R2ThresholdRow>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT PAYLOAD_SIZE_TB, Class_A_Requests_PutObject, Class_B_Requests_GetObject
                 FROM R2thresholds
                 LIMIT 1",
            )
            .map_err(|e| DataFetchError::new("thresholds", e))?;
        let mut rows = stmt
            .query_map([], R2ThresholdRow::from_row)
            .map_err(|e| DataFetchError::new("thresholds", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DataFetchError::new("thresholds", e))
    }

    /// Zone threshold rows (one per region flag).
    pub fn zone_thresholds(&self) -> FetchResult<Vec<ZoneThresholdRow>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT Requests_M, Bandwidth_TB, Is_China FROM ZoneThreshold")
            .map_err(|e| DataFetchError::new("thresholds", e))?;
        let rows = stmt
            .query_map([], ZoneThresholdRow::from_row)
            .map_err(|e| DataFetchError::new("thresholds", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataFetchError::new("thresholds", e))
    }

    /// Run a fixed query and return each row as a JSON object keyed by column
    /// name, for panels whose columns are passed through untouched.
    pub fn query_json(&self, family: &'static str, sql: &str) -> FetchResult<Vec<Map<String, Value>>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| DataFetchError::new(family, e))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let rows = stmt
            .query_map([], |row| {
                let mut object = Map::with_capacity(columns.len());
                for (idx, name) in columns.iter().enumerate() {
                    object.insert(name.clone(), rows::json_value(row.get_ref(idx)?));
                }
                Ok(object)
            })
            .map_err(|e| DataFetchError::new(family, e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataFetchError::new(family, e))
    }

    fn query_rows<T, F>(
        &self,
        family: &'static str,
        sql: &str,
        year: i32,
        month: &str,
        map: F,
    ) -> FetchResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| DataFetchError::new(family, e))?;
        let rows = stmt
            .query_map(params![year, month], map)
            .map_err(|e| DataFetchError::new(family, e))?;
        let out = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataFetchError::new(family, e))?;
        debug!(family, year, month, rows = out.len(), "fetched month rows");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> DashboardStore {
        let store = DashboardStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "INSERT INTO aws_cost_report (account_name, account_id, baseline_cost, current_cost, year, month)
                 VALUES ('prod', '111', '1000', '812.50', 2026, 'October'),
                        ('dev', '222', 200, 'n/a', 2026, 'October'),
                        ('prod', '111', 1000, 700, 2026, 'September');
                 INSERT INTO cloudflare_zone_usage (Account_Name, Zone_Name, Requests_M, Bandwidth_TB, Is_China, Year, Month)
                 VALUES ('cf', 'a.cn', 10, 1.5, '1', 2026, 'Oct'),
                        ('cf', 'a.com', 20, 7.25, 0, 2026, 'Oct');",
            )
            .unwrap();
        store
    }

    #[test]
    fn aws_costs_are_ordered_and_tolerant() {
        let store = seeded();
        let rows = store.aws_costs(2026, "October").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_name.as_deref(), Some("dev"));
        assert_eq!(rows[0].current_cost, None);
        assert_eq!(rows[1].current_cost, Some(812.5));
        assert_eq!(rows[1].baseline_cost, Some(1000.0));
    }

    #[test]
    fn month_key_spelling_matters() {
        let store = seeded();
        assert!(store.aws_costs(2026, "Oct").unwrap().is_empty());
        assert!(store.zone_usage(2026, "October").unwrap().is_empty());
        assert_eq!(store.zone_usage(2026, "Oct").unwrap().len(), 2);
    }

    #[test]
    fn zone_rows_sorted_by_bandwidth_with_flags() {
        let store = seeded();
        let rows = store.zone_usage(2026, "Oct").unwrap();
        assert_eq!(rows[0].zone_name.as_deref(), Some("a.com"));
        assert!(!rows[0].is_china);
        assert!(rows[1].is_china);
    }

    #[test]
    fn missing_table_is_an_error_not_empty() {
        let store = DashboardStore {
            conn: Connection::open_in_memory().unwrap(),
        };
        let err = store.aws_costs(2026, "October").unwrap_err();
        assert_eq!(err.family, "aws_cost");
        let common: sd_common::Error = err.into();
        assert_eq!(common.code(), 20);
    }

    #[test]
    fn empty_thresholds_are_none() {
        let store = seeded();
        assert!(store.r2_thresholds().unwrap().is_none());
        assert!(store.zone_thresholds().unwrap().is_empty());
    }

    #[test]
    fn ping_counts_servers() {
        let store = seeded();
        let report = store.ping().unwrap();
        assert_eq!(report, PingReport { select_one: 1, server_count: 0 });
    }

    #[test]
    fn query_json_keeps_column_names() {
        let store = seeded();
        let rows = store
            .query_json("aws_cost", "SELECT account_name AS name, current_cost FROM aws_cost_report WHERE year = 2026 AND month = 'September'")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::from("prod"));
        assert_eq!(rows[0]["current_cost"], Value::from(700));
    }
}

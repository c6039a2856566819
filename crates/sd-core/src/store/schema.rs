//! Tables read by the dashboard queries.
//!
//! Upstream collectors own the real schema; this DDL only mirrors the table
//! and column names the queries touch, for local development and tests.
//! Numeric columns use NUMERIC affinity so numeric-looking text is stored as a
//! number while anything else is kept verbatim. `Is_China` carries no type so
//! both `1` and `'1'` survive as written.

use rusqlite::Connection;

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS servers (
        id INTEGER PRIMARY KEY,
        SERVER_NAME TEXT NOT NULL,
        TYPE TEXT,
        ENV TEXT
    )",
    "CREATE TABLE IF NOT EXISTS rp_server_details (
        server_id INTEGER NOT NULL REFERENCES servers(id),
        STATUS TEXT,
        APACHE_STATUS TEXT,
        OPENSSL_STATUS TEXT,
        WEBSITE_NAME TEXT,
        INCIDENT_ID TEXT,
        LAST_UPDATED TEXT
    )",
    "CREATE TABLE IF NOT EXISTS AEM_server_details (
        server_id INTEGER NOT NULL REFERENCES servers(id),
        STATUS TEXT,
        \"LOAD\" TEXT,
        PROCESS_NAME TEXT,
        SEGMENT_STORE_SIZE TEXT
    )",
    "CREATE TABLE IF NOT EXISTS eesof_app_details (
        server_id INTEGER NOT NULL REFERENCES servers(id),
        APP_NAME TEXT,
        APP_USER TEXT,
        APP_VERSION TEXT,
        APP_STATUS TEXT,
        INCIDENT_ID TEXT
    )",
    "CREATE TABLE IF NOT EXISTS ruby_apps (
        server_id INTEGER NOT NULL REFERENCES servers(id),
        APP_NAME TEXT,
        APP_USER TEXT,
        APP_PORT TEXT,
        APP_STATUS TEXT
    )",
    "CREATE TABLE IF NOT EXISTS ping_monitor_status (
        hostname TEXT NOT NULL,
        ping_status TEXT,
        response_time_ms NUMERIC,
        last_checked TEXT,
        ip_address TEXT
    )",
    "CREATE TABLE IF NOT EXISTS new_relic_details (
        MONITOR_NAME TEXT NOT NULL,
        MONITOR_STATE TEXT,
        MONITOR_STATUS TEXT,
        LAST_REFRESH_TIME TEXT,
        INCIDENT_ID TEXT
    )",
    "CREATE TABLE IF NOT EXISTS ssl_certificates (
        HOST TEXT NOT NULL,
        PORT TEXT,
        STATUS TEXT,
        EXPIRY_DATE TEXT,
        DAYS_REMAINING NUMERIC,
        INCIDENT_ID TEXT
    )",
    "CREATE TABLE IF NOT EXISTS Zbrain_url_status (
        url TEXT NOT NULL,
        status TEXT,
        status_code TEXT,
        LAST_REFRESH_TIME TEXT
    )",
    "CREATE TABLE IF NOT EXISTS aws_cost_report (
        account_name TEXT,
        account_id TEXT,
        baseline_cost NUMERIC,
        current_cost NUMERIC,
        year INTEGER NOT NULL,
        month TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cloudflare_R2_usageth (
        OBJECT_COUNT NUMERIC,
        PAYLOAD_SIZE_TB NUMERIC,
        Class_A_Requests_MM_PutObject NUMERIC,
        Class_B_Requests_MM_GetObject NUMERIC,
        LAST_REFRESH_TIME TEXT,
        YEAR INTEGER NOT NULL,
        MONTH TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS R2thresholds (
        PAYLOAD_SIZE_TB NUMERIC,
        Class_A_Requests_PutObject NUMERIC,
        Class_B_Requests_GetObject NUMERIC
    )",
    "CREATE TABLE IF NOT EXISTS cloudflare_zone_usage (
        Account_Name TEXT,
        Zone_Name TEXT,
        Requests_M NUMERIC,
        Bandwidth_TB NUMERIC,
        Is_China,
        refresh_time_ist TEXT,
        Year INTEGER NOT NULL,
        Month TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ZoneThreshold (
        Requests_M NUMERIC,
        Bandwidth_TB NUMERIC,
        Is_China
    )",
    "CREATE TABLE IF NOT EXISTS s3_bucket_usage (
        Account_Name TEXT,
        Bucket_Name TEXT,
        Size_MB NUMERIC,
        Retention TEXT,
        Year INTEGER NOT NULL,
        Month TEXT NOT NULL
    )",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_aws_cost_period ON aws_cost_report(year, month)",
    "CREATE INDEX IF NOT EXISTS idx_r2_usage_period ON cloudflare_R2_usageth(YEAR, MONTH)",
    "CREATE INDEX IF NOT EXISTS idx_zone_usage_period ON cloudflare_zone_usage(Year, Month)",
    "CREATE INDEX IF NOT EXISTS idx_s3_usage_period ON s3_bucket_usage(Year, Month)",
];

/// Create every table and index the dashboard reads. Idempotent.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    for ddl in TABLES.iter().chain(INDEXES) {
        conn.execute(ddl, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = ?1")
            .unwrap();
        stmt.query_map([kind], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        let tables = names(&conn, "table");
        assert_eq!(tables.len(), TABLES.len());
        for t in ["aws_cost_report", "cloudflare_zone_usage", "ssl_certificates", "Zbrain_url_status"] {
            assert!(tables.iter().any(|n| n == t), "missing {t}");
        }
    }

    #[test]
    fn is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(names(&conn, "index").len(), INDEXES.len());
    }

    #[test]
    fn region_flag_keeps_written_type() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO ZoneThreshold (Requests_M, Bandwidth_TB, Is_China) VALUES (1200, 5, '1'), (1200, 120, 0);",
        )
        .unwrap();
        let types: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT typeof(Is_China) FROM ZoneThreshold ORDER BY Bandwidth_TB")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .map(|r| r.unwrap())
                .collect()
        };
        assert_eq!(types, vec!["text".to_string(), "integer".to_string()]);
    }
}

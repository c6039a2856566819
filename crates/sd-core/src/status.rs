//! Live-status panels: pass-through rows with a server-side failure flag.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::store::{DashboardStore, FetchResult};

pub type StatusRow = Map<String, Value>;

/// Columns inspected for a failing status word.
pub const STATUS_COLUMNS: &[&str] = &[
    "STATUS",
    "APP_STATUS",
    "ping_status",
    "MONITOR_STATUS",
    "APACHE_STATUS",
    "OPENSSL_STATUS",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    RpServers,
    AemServers,
    EesofApplications,
    RubyApplications,
    PingMonitor,
    NewRelicMonitors,
    SslCertificates,
}

impl Panel {
    pub const ALL: [Panel; 7] = [
        Panel::RpServers,
        Panel::AemServers,
        Panel::EesofApplications,
        Panel::RubyApplications,
        Panel::PingMonitor,
        Panel::NewRelicMonitors,
        Panel::SslCertificates,
    ];

    /// Display name, also the key in the response object.
    pub fn name(self) -> &'static str {
        match self {
            Panel::RpServers => "rp servers",
            Panel::AemServers => "aem servers",
            Panel::EesofApplications => "eesof applications",
            Panel::RubyApplications => "ruby applications",
            Panel::PingMonitor => "ping monitor",
            Panel::NewRelicMonitors => "new relic monitors",
            Panel::SslCertificates => "ssl certificates",
        }
    }

    pub fn query(self) -> &'static str {
        match self {
            Panel::RpServers => {
                "SELECT s.SERVER_NAME, s.TYPE, s.ENV, rp.STATUS, rp.APACHE_STATUS,
                        rp.OPENSSL_STATUS, rp.WEBSITE_NAME, rp.INCIDENT_ID, rp.LAST_UPDATED
                 FROM rp_server_details rp
                 JOIN servers s ON rp.server_id = s.id
                 ORDER BY s.SERVER_NAME"
            }
            Panel::AemServers => {
                "SELECT s.SERVER_NAME, s.TYPE, s.ENV, aem.STATUS, aem.\"LOAD\" AS \"LOAD\",
                        aem.PROCESS_NAME, aem.SEGMENT_STORE_SIZE
                 FROM AEM_server_details aem
                 JOIN servers s ON aem.server_id = s.id
                 ORDER BY s.SERVER_NAME"
            }
            Panel::EesofApplications => {
                "SELECT s.SERVER_NAME, s.TYPE, s.ENV, e.APP_NAME, e.APP_USER,
                        e.APP_VERSION, e.APP_STATUS, e.INCIDENT_ID
                 FROM eesof_app_details e
                 JOIN servers s ON e.server_id = s.id
                 ORDER BY s.SERVER_NAME, e.APP_NAME"
            }
            Panel::RubyApplications => {
                "SELECT s.SERVER_NAME, s.TYPE, s.ENV, r.APP_NAME, r.APP_USER,
                        r.APP_PORT, r.APP_STATUS
                 FROM ruby_apps r
                 JOIN servers s ON r.server_id = s.id
                 ORDER BY s.SERVER_NAME, r.APP_NAME"
            }
            Panel::PingMonitor => {
                "SELECT hostname AS SERVER_NAME, '' AS TYPE, '' AS ENV,
                        ping_status AS STATUS, response_time_ms, last_checked, ip_address
                 FROM ping_monitor_status
                 ORDER BY hostname"
            }
            Panel::NewRelicMonitors => {
                "SELECT MONITOR_NAME AS SERVER_NAME, '' AS TYPE, '' AS ENV,
                        MONITOR_STATE, MONITOR_STATUS AS STATUS,
                        LAST_REFRESH_TIME, INCIDENT_ID
                 FROM new_relic_details
                 ORDER BY MONITOR_NAME"
            }
            Panel::SslCertificates => {
                "SELECT HOST AS SERVER_NAME, '' AS TYPE, '' AS ENV,
                        PORT, STATUS, EXPIRY_DATE, DAYS_REMAINING, INCIDENT_ID
                 FROM ssl_certificates
                 ORDER BY CAST(DAYS_REMAINING AS INTEGER)"
            }
        }
    }
}

fn upper_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.to_uppercase()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("TRUE".to_string()),
        _ => None,
    }
}

/// DOWN, FAILED, CRITICAL, ERROR, OFFLINE, ALERTING, or anything mentioning FAIL.
pub fn is_failing_status(status: &str) -> bool {
    let status = status.to_uppercase();
    matches!(
        status.as_str(),
        "DOWN" | "FAILED" | "CRITICAL" | "ERROR" | "OFFLINE" | "ALERTING"
    ) || status.contains("FAIL")
}

/// Leading integer of a numeric or text cell, e.g. `"12 days"` → 12.
fn leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                .map_or(s.len(), |(i, _)| i);
            s[..end].parse().ok()
        }
        _ => None,
    }
}

/// A row fails on any failing status column or a certificate inside the
/// warning window.
pub fn row_is_failing(row: &StatusRow, ssl_warning_days: i64) -> bool {
    let status_failed = STATUS_COLUMNS
        .iter()
        .filter_map(|col| row.get(*col).and_then(upper_text))
        .any(|s| is_failing_status(&s));
    let expiring = row
        .get("DAYS_REMAINING")
        .and_then(leading_int)
        .is_some_and(|days| days < ssl_warning_days);
    status_failed || expiring
}

/// Connectivity rows are down on DOWN, FAILED, ERROR, OFFLINE or anything
/// mentioning FAIL, read from `status` or `STATUS`.
pub fn is_down(row: &StatusRow) -> bool {
    row.get("status")
        .or_else(|| row.get("STATUS"))
        .and_then(upper_text)
        .is_some_and(|s| matches!(s.as_str(), "DOWN" | "FAILED" | "ERROR" | "OFFLINE") || s.contains("FAIL"))
}

/// All seven panels, in display order.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    pub panels: Vec<(Panel, Vec<StatusRow>)>,
}

impl StatusBoard {
    pub fn fetch(store: &DashboardStore, ssl_warning_days: i64) -> FetchResult<Self> {
        let mut panels = Vec::with_capacity(Panel::ALL.len());
        for panel in Panel::ALL {
            let mut rows = store.query_json("servers", panel.query())?;
            let mut failing = 0usize;
            for row in &mut rows {
                let failed = row_is_failing(row, ssl_warning_days);
                failing += usize::from(failed);
                row.insert("failing".to_string(), Value::Bool(failed));
            }
            if failing > 0 {
                info!(panel = panel.name(), failing, total = rows.len(), "panel has failures");
            } else {
                debug!(panel = panel.name(), total = rows.len(), "panel healthy");
            }
            panels.push((panel, rows));
        }
        Ok(Self { panels })
    }

    pub fn rows(&self, panel: Panel) -> Option<&[StatusRow]> {
        self.panels
            .iter()
            .find(|(p, _)| *p == panel)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn failing_count(&self, panel: Panel) -> usize {
        self.rows(panel)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.get("failing") == Some(&Value::Bool(true)))
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Serialize for StatusBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.panels.len()))?;
        for (panel, rows) in &self.panels {
            map.serialize_entry(panel.name(), rows)?;
        }
        map.end()
    }
}

/// Connectivity rows, down rows first, each flagged with `down`.
pub fn fetch_zbrain(store: &DashboardStore) -> FetchResult<Vec<StatusRow>> {
    let mut rows = store.query_json("zbrain", "SELECT * FROM Zbrain_url_status")?;
    for row in &mut rows {
        let down = is_down(row);
        row.insert("down".to_string(), Value::Bool(down));
    }
    rows.sort_by_key(|row| row.get("down") != Some(&Value::Bool(true)));
    info!(records = rows.len(), "zbrain status fetched");
    Ok(rows)
}

//! JSON-over-HTTP boundary.
//!
//! One listener is shared by `pool_size` worker threads. Each worker owns a
//! read-only store connection, so at most `pool_size` queries are in flight.
//! Routing is a pure function ([`dispatch`]) over method, path, store and
//! clock, which keeps the endpoints testable without sockets.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{error, info, warn};

use sd_common::{Error, RequestId, Result, SCHEMA_VERSION};
use sd_config::{ConfigSnapshot, DashboardConfig};

use crate::forecast::ForecastReport;
use crate::present::render_report;
use crate::status::{fetch_zbrain, StatusBoard};
use crate::store::{DashboardStore, FetchResult};
use crate::usage::UsageSnapshot;

const API_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-store, no-cache, must-revalidate, private"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Shared, read-only request context.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: DashboardConfig,
    pub snapshot: ConfigSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Servers,
    Zbrain,
    Usage,
    Forecast,
    ForecastCharts,
}

impl Route {
    /// Match a request URL, ignoring any query string and trailing slash.
    pub fn parse(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        match path {
            "/health" => Some(Route::Health),
            "/api/monitoring/servers" => Some(Route::Servers),
            "/api/monitoring/zbrain" => Some(Route::Zbrain),
            "/api/monitoring/usage" => Some(Route::Usage),
            "/api/monitoring/forecast" => Some(Route::Forecast),
            "/api/monitoring/forecast/charts" => Some(Route::ForecastCharts),
            _ => None,
        }
    }

    /// The panel named in failure responses.
    pub fn failure_message(self) -> &'static str {
        match self {
            Route::Health => "Failed to fetch health data",
            Route::Servers => "Failed to fetch server monitoring data",
            Route::Zbrain => "Failed to fetch Zbrain status data",
            Route::Usage => "Failed to fetch usage data",
            Route::Forecast => "Failed to fetch forecast data",
            Route::ForecastCharts => "Failed to fetch forecast chart data",
        }
    }

    pub fn is_api(self) -> bool {
        !matches!(self, Route::Health)
    }
}

/// A response before it is bound to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub api: bool,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T, api: bool) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body, api },
            Err(e) => {
                error!(error = %e, "response serialization failed");
                Self::error(500, "Internal server error", api)
            }
        }
    }

    fn error(status: u16, message: &str, api: bool) -> Self {
        Self {
            status,
            body: json!({ "error": message }).to_string(),
            api,
        }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            api: true,
        }
    }

    pub fn into_response(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body.into_bytes()).with_status_code(self.status);
        let mut headers: Vec<(&str, &str)> = CORS_HEADERS.to_vec();
        if self.api {
            headers.extend_from_slice(API_HEADERS);
        }
        if self.status != 204 {
            headers.push(("Content-Type", "application/json; charset=utf-8"));
        }
        for (name, value) in headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        response
    }
}

#[derive(Serialize)]
struct Health<'a> {
    status: &'static str,
    timestamp: String,
    schema_version: &'static str,
    config_hash: &'a str,
}

fn respond_with<T: Serialize>(route: Route, result: FetchResult<T>) -> Reply {
    match result {
        Ok(value) => Reply::json(200, &value, route.is_api()),
        Err(e) => {
            error!(family = e.family, error = %e.source, route = ?route, "data fetch failed");
            Reply::error(500, route.failure_message(), route.is_api())
        }
    }
}

/// Route one request.
pub fn dispatch(
    method: &Method,
    url: &str,
    store: &DashboardStore,
    ctx: &AppContext,
    now: DateTime<Local>,
) -> Reply {
    let Some(route) = Route::parse(url) else {
        return Reply::error(404, "Not found", url.starts_with("/api"));
    };
    match method {
        Method::Get | Method::Head => {}
        Method::Options => return Reply::empty(204),
        _ => return Reply::error(405, "Method not allowed", route.is_api()),
    }

    let today = now.date_naive();
    let mut reply = match route {
        Route::Health => Reply::json(
            200,
            &Health {
                status: "ok",
                timestamp: now.to_utc().to_rfc3339_opts(SecondsFormat::Millis, true),
                schema_version: SCHEMA_VERSION,
                config_hash: &ctx.snapshot.config_hash,
            },
            false,
        ),
        Route::Servers => respond_with(
            route,
            StatusBoard::fetch(store, ctx.config.thresholds.ssl_warning_days),
        ),
        Route::Zbrain => respond_with(route, fetch_zbrain(store)),
        Route::Usage => respond_with(route, UsageSnapshot::fetch(store, today, &ctx.config)),
        Route::Forecast => respond_with(
            route,
            ForecastReport::build(store, today, &ctx.config.families),
        ),
        Route::ForecastCharts => respond_with(
            route,
            ForecastReport::build(store, today, &ctx.config.families)
                .map(|report| render_report(&report, &report.current_actuals())),
        ),
    };
    // HEAD answers with the GET status and headers only.
    if *method == Method::Head {
        reply.body.clear();
    }
    reply
}

fn handle(request: Request, store: &DashboardStore, ctx: &AppContext) {
    let request_id = RequestId::new();
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();

    let reply = dispatch(&method, &url, store, ctx, Local::now());
    let status = reply.status;
    let response = reply.into_response();
    if let Err(e) = request.respond(response) {
        warn!(request_id = %request_id, error = %e, "failed to write response");
    }
    info!(
        request_id = %request_id,
        method = %method,
        path = %url,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}

fn worker_loop(server: &Server, store: &DashboardStore, ctx: &AppContext) {
    loop {
        match server.recv() {
            Ok(request) => handle(request, store, ctx),
            Err(e) => {
                error!(error = %e, "listener failed");
                break;
            }
        }
    }
}

/// Bind and serve until the listener fails.
pub fn serve(ctx: AppContext) -> Result<()> {
    let bind = ctx.config.server.bind.clone();
    let server = Server::http(bind.as_str()).map_err(|e| Error::Bind {
        addr: bind.clone(),
        message: e.to_string(),
    })?;
    let server = Arc::new(server);

    let db_path: PathBuf = ctx.config.database.path.clone();
    let busy_timeout = Duration::from_millis(ctx.config.database.busy_timeout_ms);
    let workers = ctx.config.database.pool_size.max(1);
    let ctx = Arc::new(ctx);

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let store = DashboardStore::open(&db_path, busy_timeout)
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let server = Arc::clone(&server);
        let ctx = Arc::clone(&ctx);
        let handle = thread::Builder::new()
            .name(format!("sd-http-{worker}"))
            .spawn(move || worker_loop(&server, &store, &ctx))?;
        handles.push(handle);
    }

    info!(
        bind = %bind,
        workers,
        db = %db_path.display(),
        config_hash = ctx.snapshot.short_hash(),
        "status dashboard listening"
    );

    for handle in handles {
        if handle.join().is_err() {
            return Err(Error::Serve("worker thread panicked".to_string()));
        }
    }
    Err(Error::Serve("all workers stopped".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sd_config::{ConfigSource, ResolvedConfig};
    use serde_json::Value;

    fn ctx() -> AppContext {
        let resolved = ResolvedConfig {
            config: DashboardConfig::default(),
            source: ConfigSource::Defaults,
        };
        AppContext {
            snapshot: ConfigSnapshot::capture(&resolved),
            config: resolved.config,
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn routes_ignore_query_and_trailing_slash() {
        assert_eq!(Route::parse("/api/monitoring/usage?t=1"), Some(Route::Usage));
        assert_eq!(Route::parse("/api/monitoring/forecast/"), Some(Route::Forecast));
        assert_eq!(Route::parse("/api/monitoring/forecast/charts"), Some(Route::ForecastCharts));
        assert_eq!(Route::parse("/"), None);
        assert_eq!(Route::parse("/api/other"), None);
    }

    #[test]
    fn health_reports_config_hash() {
        let store = DashboardStore::open_in_memory().unwrap();
        let ctx = ctx();
        let reply = dispatch(&Method::Get, "/health", &store, &ctx, now());
        assert_eq!(reply.status, 200);
        let body: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["config_hash"], ctx.snapshot.config_hash.as_str());
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn options_unknown_and_bad_method() {
        let store = DashboardStore::open_in_memory().unwrap();
        let ctx = ctx();
        assert_eq!(dispatch(&Method::Options, "/api/monitoring/usage", &store, &ctx, now()).status, 204);
        assert_eq!(dispatch(&Method::Get, "/api/nope", &store, &ctx, now()).status, 404);
        assert_eq!(dispatch(&Method::Post, "/api/monitoring/usage", &store, &ctx, now()).status, 405);
    }

    #[test]
    fn head_keeps_status_but_drops_body() {
        let store = DashboardStore::open_in_memory().unwrap();
        let ctx = ctx();
        let get = dispatch(&Method::Get, "/api/monitoring/forecast", &store, &ctx, now());
        let head = dispatch(&Method::Head, "/api/monitoring/forecast", &store, &ctx, now());
        assert_eq!(get.status, 200);
        assert!(!get.body.is_empty());
        assert_eq!(head.status, 200);
        assert!(head.body.is_empty());
        assert_eq!(dispatch(&Method::Head, "/health", &store, &ctx, now()).body, "");
    }

    #[test]
    fn fetch_failure_is_generic_500() {
        let store = DashboardStore::open_in_memory().unwrap();
        store.connection().execute_batch("DROP TABLE aws_cost_report").unwrap();
        let reply = dispatch(&Method::Get, "/api/monitoring/forecast", &store, &ctx(), now());
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, r#"{"error":"Failed to fetch forecast data"}"#);
    }

    #[test]
    fn api_responses_carry_no_cache_headers() {
        let reply = Reply::json(200, &json!({}), true);
        let response = reply.into_response();
        let has = |name: &str| {
            response
                .headers()
                .iter()
                .any(|h| h.field.to_string().eq_ignore_ascii_case(name))
        };
        assert!(has("Cache-Control"));
        assert!(has("Access-Control-Allow-Origin"));
        assert!(has("Content-Type"));
        assert_eq!(response.status_code().0, 200);
    }
}

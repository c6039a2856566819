//! Command-line interface.

use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{error, info};

use sd_common::{Error, OutputFormat, RequestId, SCHEMA_VERSION};
use sd_config::{resolve_config, ConfigOverrides, ConfigSnapshot, LogFormat, ResolvedConfig};

use crate::exit_codes::ExitCode;
use crate::forecast::ForecastReport;
use crate::logging;
use crate::server::{serve, AppContext};
use crate::store::DashboardStore;

/// Status dashboard backend: usage forecasts and live status panels over HTTP.
#[derive(Parser, Debug)]
#[command(name = "sd-core", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Path to a JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides config and SD_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Listen address (overrides config and SD_BIND)
    #[arg(long, global = true, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Output format for command results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalOpts {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            db_path: self.db.clone(),
            bind: self.bind.clone(),
            log_format: self.log_format.map(LogFormat::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Human,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Human => LogFormat::Human,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve,
    /// Compute the month-end forecast report once and print it
    Forecast {
        /// Anchor date (YYYY-MM-DD); defaults to today
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Validate configuration and check the store is reachable
    Check,
    /// Create the tables the dashboard reads
    InitDb,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the resolved configuration and its hash
    Show,
}

fn fail(err: Error) -> ExitCode {
    error!(code = err.code(), error = %err, "command failed");
    eprintln!("sd-core: {err}");
    ExitCode::for_error(&err)
}

fn emit(format: OutputFormat, value: &serde_json::Value, table: impl FnOnce() -> String) -> ExitCode {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
        OutputFormat::Table => Ok(table()),
    };
    match rendered {
        Ok(text) => {
            let mut stdout = std::io::stdout().lock();
            match writeln!(stdout, "{text}") {
                Ok(()) => ExitCode::Ok,
                Err(e) => fail(Error::Io(e)),
            }
        }
        Err(e) => fail(Error::Json(e)),
    }
}

/// Resolve configuration, install logging and run the chosen command.
pub fn run(cli: Cli) -> ExitCode {
    let resolved = match resolve_config(&cli.global.overrides()) {
        Ok(resolved) => resolved,
        Err(e) => {
            let err: Error = e.into();
            eprintln!("sd-core: {err}");
            return ExitCode::for_error(&err);
        }
    };
    logging::init(
        resolved.config.logging.format,
        &resolved.config.logging.level,
        cli.global.verbose,
    );
    let snapshot = ConfigSnapshot::capture(&resolved);
    info!(source = %snapshot.source, config_hash = snapshot.short_hash(), "configuration resolved");

    let format = cli.global.format;
    match cli.command {
        Commands::Serve => run_serve(resolved, snapshot),
        Commands::Forecast { date } => run_forecast(&resolved, format, date),
        Commands::Check => run_check(&resolved, &snapshot, format),
        Commands::InitDb => run_init_db(&resolved, format),
        Commands::Config {
            command: ConfigCommands::Show,
        } => run_config_show(&resolved, &snapshot, format),
    }
}

fn run_serve(resolved: ResolvedConfig, snapshot: ConfigSnapshot) -> ExitCode {
    let ctx = AppContext {
        config: resolved.config,
        snapshot,
    };
    match serve(ctx) {
        Ok(()) => ExitCode::Ok,
        Err(e) => fail(e),
    }
}

fn open_store(resolved: &ResolvedConfig) -> Result<DashboardStore, Error> {
    let db = &resolved.config.database;
    DashboardStore::open(&db.path, std::time::Duration::from_millis(db.busy_timeout_ms))
        .map_err(|e| Error::StoreUnavailable(format!("{}: {}", db.path.display(), e.source)))
}

fn run_forecast(resolved: &ResolvedConfig, format: OutputFormat, date: Option<NaiveDate>) -> ExitCode {
    let store = match open_store(resolved) {
        Ok(store) => store,
        Err(e) => return fail(e),
    };
    let today = date.unwrap_or_else(|| Local::now().date_naive());
    let report = match ForecastReport::build(&store, today, &resolved.config.families) {
        Ok(report) => report,
        Err(e) => return fail(e.into()),
    };
    let value = match serde_json::to_value(&report) {
        Ok(value) => value,
        Err(e) => return fail(Error::Json(e)),
    };
    emit(format, &value, || forecast_table(&report))
}

/// One line per series: family, key, high, mean, low.
pub fn forecast_table(report: &ForecastReport) -> String {
    let mut lines = vec![format!(
        "{:<18} {:<28} {:>12} {:>12} {:>12}",
        "FAMILY", "SERIES", "HIGH", "MEAN", "LOW"
    )];
    let families = [
        ("aws_cost", &report.aws_cost.forecast),
        ("cloudflare_r2", &report.cloudflare_r2.forecast),
        ("cloudflare_zones", &report.cloudflare_zones.forecast),
    ];
    for (family, forecasts) in families {
        for (key, f) in forecasts {
            lines.push(format!(
                "{:<18} {:<28} {:>12.2} {:>12.2} {:>12.2}",
                family, key, f.high, f.mean, f.low
            ));
        }
    }
    lines.push(format!(
        "forecast for {} {}, {}",
        report.current.name(sd_common::MonthNameStyle::Abbreviated),
        report.forecast_date(),
        report.current.year
    ));
    lines.join("\n")
}

fn run_check(resolved: &ResolvedConfig, snapshot: &ConfigSnapshot, format: OutputFormat) -> ExitCode {
    let store = match open_store(resolved) {
        Ok(store) => store,
        Err(e) => return fail(e),
    };
    let ping = match store.ping() {
        Ok(ping) => ping,
        Err(e) => return fail(e.into()),
    };
    let path = resolved.config.database.path.display().to_string();
    let value = json!({
        "schema_version": SCHEMA_VERSION,
        "check_id": RequestId::new().0,
        "status": "ok",
        "config_source": snapshot.source,
        "config_hash": snapshot.config_hash,
        "store": {
            "path": path,
            "select_one": ping.select_one,
            "server_count": ping.server_count,
        },
    });
    emit(format, &value, || {
        format!(
            "status        ok\nconfig        {} ({})\nstore         {}\nservers       {}",
            snapshot.source,
            snapshot.short_hash(),
            path,
            ping.server_count
        )
    })
}

fn run_init_db(resolved: &ResolvedConfig, format: OutputFormat) -> ExitCode {
    let path = &resolved.config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return fail(Error::Io(e));
        }
    }
    let result = DashboardStore::open_writable(path).and_then(|store| store.initialize_schema());
    if let Err(e) = result {
        return fail(e.into());
    }
    info!(path = %path.display(), "schema initialized");
    let value = json!({
        "schema_version": SCHEMA_VERSION,
        "initialized": path.display().to_string(),
    });
    emit(format, &value, || format!("initialized {}", path.display()))
}

fn run_config_show(resolved: &ResolvedConfig, snapshot: &ConfigSnapshot, format: OutputFormat) -> ExitCode {
    let value = json!({
        "source": snapshot.source,
        "config_hash": snapshot.config_hash,
        "config": resolved.config,
    });
    emit(format, &value, || {
        let c = &resolved.config;
        [
            format!("source            {}", snapshot.source),
            format!("config_hash       {}", snapshot.config_hash),
            format!("database.path     {}", c.database.path.display()),
            format!("database.pool     {}", c.database.pool_size),
            format!("server.bind       {}", c.server.bind),
            format!("logging           {} {}", c.logging.format, c.logging.level),
        ]
        .join("\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sd-core", "forecast", "--date", "2026-01-15", "--db", "/tmp/x.db", "--format", "table", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.global.format, OutputFormat::Table);
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Commands::Forecast { date } => assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 15)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn overrides_carry_log_format() {
        let cli = Cli::try_parse_from(["sd-core", "--log-format", "json", "check"]).unwrap();
        assert_eq!(cli.global.overrides().log_format, Some(LogFormat::Json));
    }

    #[test]
    fn table_lists_every_series() {
        let store = DashboardStore::open_in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let report = ForecastReport::build(&store, today, &Default::default()).unwrap();
        let table = forecast_table(&report);
        assert!(table.contains("payload_tb"));
        assert!(table.contains("all_requests"));
        assert!(table.ends_with("forecast for Oct 31, 2026"));
    }
}

//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` wins over the configured level; `-v` flags raise the level.

use sd_config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Log targets of the workspace crates; everything else stays at `warn`.
const WORKSPACE_TARGETS: &[&str] = &["sd_core", "sd_config", "sd_math", "sd_common"];

/// Effective filter directive for a configured level and verbosity count.
pub fn filter_directive(level: &str, verbose: u8) -> String {
    let level = match verbose {
        0 => level,
        1 => "debug",
        _ => "trace",
    };
    let mut directives: Vec<String> = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Install the global subscriber. Calling this twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init(format: LogFormat, level: &str, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level, verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Human => builder.compact().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_overrides_level() {
        assert_eq!(
            filter_directive("info", 0),
            "sd_core=info,sd_config=info,sd_math=info,sd_common=info,warn"
        );
        assert!(filter_directive("info", 1).starts_with("sd_core=debug,"));
        assert!(filter_directive("warn", 3).starts_with("sd_core=trace,"));
    }

    #[test]
    fn every_workspace_crate_gets_the_level() {
        let directive = filter_directive("debug", 0);
        for target in ["sd_core", "sd_config", "sd_math", "sd_common"] {
            assert!(directive.contains(&format!("{target}=debug")), "{target} missing from {directive}");
        }
        assert!(directive.ends_with(",warn"));
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn init_twice_is_harmless() {
        init(LogFormat::Human, "info", 0);
        init(LogFormat::Json, "debug", 0);
    }
}

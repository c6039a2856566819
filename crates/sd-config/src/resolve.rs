//! Config resolution: CLI → env → XDG → defaults.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{DashboardConfig, LogFormat};
use crate::validate::validate;
use crate::ConfigError;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "SD_CONFIG";
/// Environment override for `database.path`.
pub const ENV_DB_PATH: &str = "SD_DB_PATH";
/// Environment override for `server.bind`.
pub const ENV_BIND: &str = "SD_BIND";

/// Where the base configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    /// `--config` on the command line.
    Explicit(PathBuf),
    /// `SD_CONFIG` environment variable.
    Env(PathBuf),
    /// `<config dir>/sd-dashboard/config.json`.
    Xdg(PathBuf),
    /// No file found; built-in defaults.
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit(p) => write!(f, "cli:{}", p.display()),
            ConfigSource::Env(p) => write!(f, "env:{}", p.display()),
            ConfigSource::Xdg(p) => write!(f, "xdg:{}", p.display()),
            ConfigSource::Defaults => write!(f, "defaults"),
        }
    }
}

/// Command-line overrides, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub log_format: Option<LogFormat>,
}

/// A fully resolved and validated configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: DashboardConfig,
    pub source: ConfigSource,
}

/// Resolve configuration from the process environment and XDG config dir.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig, ConfigError> {
    let xdg = dirs::config_dir().map(|d| d.join("sd-dashboard").join("config.json"));
    resolve_config_with(overrides, |key| std::env::var(key).ok(), xdg)
}

/// Resolve configuration with an injectable environment and XDG path.
pub fn resolve_config_with<E>(
    overrides: &ConfigOverrides,
    env: E,
    xdg_path: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let (mut config, source) = if let Some(path) = &overrides.config_path {
        (load_file(path)?, ConfigSource::Explicit(path.clone()))
    } else if let Some(path) = env(ENV_CONFIG).filter(|v| !v.trim().is_empty()) {
        let path = PathBuf::from(path);
        (load_file(&path)?, ConfigSource::Env(path))
    } else {
        match xdg_path.filter(|p| p.is_file()) {
            Some(path) => (load_file(&path)?, ConfigSource::Xdg(path)),
            None => (DashboardConfig::default(), ConfigSource::Defaults),
        }
    };

    if let Some(db) = env(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
        config.database.path = PathBuf::from(db);
    }
    if let Some(bind) = env(ENV_BIND).filter(|v| !v.trim().is_empty()) {
        config.server.bind = bind;
    }

    if let Some(db) = &overrides.db_path {
        config.database.path = db.clone();
    }
    if let Some(bind) = &overrides.bind {
        config.server.bind = bind.clone();
    }
    if let Some(format) = overrides.log_format {
        config.logging.format = format;
    }

    let result = validate(&config);
    if !result.is_valid() {
        return Err(ConfigError::Invalid(
            result.errors.iter().map(|e| e.to_string()).collect(),
        ));
    }

    Ok(ResolvedConfig { config, source })
}

fn load_file(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    DashboardConfig::from_json(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn write_config(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn no_sources_uses_defaults() {
        let resolved =
            resolve_config_with(&ConfigOverrides::default(), env_from(&[]), None).unwrap();
        assert_eq!(resolved.source, ConfigSource::Defaults);
        assert_eq!(resolved.config, DashboardConfig::default());
    }

    #[test]
    fn missing_xdg_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_config_with(
            &ConfigOverrides::default(),
            env_from(&[]),
            Some(dir.path().join("missing.json")),
        )
        .unwrap();
        assert_eq!(resolved.source, ConfigSource::Defaults);
    }

    #[test]
    fn xdg_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "config.json", r#"{"server": {"bind": "0.0.0.0:8080"}}"#);
        let resolved =
            resolve_config_with(&ConfigOverrides::default(), env_from(&[]), Some(path.clone()))
                .unwrap();
        assert_eq!(resolved.source, ConfigSource::Xdg(path));
        assert_eq!(resolved.config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn explicit_path_beats_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let cli = write_config(dir.path(), "cli.json", r#"{"database": {"pool_size": 2}}"#);
        let envp = write_config(dir.path(), "env.json", r#"{"database": {"pool_size": 7}}"#);
        let overrides = ConfigOverrides {
            config_path: Some(cli.clone()),
            ..Default::default()
        };
        let env = env_from(&[(ENV_CONFIG, envp.to_str().unwrap())]);
        let resolved = resolve_config_with(&overrides, env, None).unwrap();
        assert_eq!(resolved.source, ConfigSource::Explicit(cli));
        assert_eq!(resolved.config.database.pool_size, 2);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let overrides = ConfigOverrides {
            config_path: Some(PathBuf::from("/nonexistent/sd.json")),
            ..Default::default()
        };
        let err = resolve_config_with(&overrides, env_from(&[]), None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "bad.json", "{ not json");
        let overrides = ConfigOverrides {
            config_path: Some(path),
            ..Default::default()
        };
        let err = resolve_config_with(&overrides, env_from(&[]), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn cli_flags_beat_env_overrides() {
        let env = env_from(&[(ENV_DB_PATH, "/env/db.sqlite"), (ENV_BIND, "127.0.0.1:9000")]);
        let overrides = ConfigOverrides {
            db_path: Some(PathBuf::from("/cli/db.sqlite")),
            log_format: Some(LogFormat::Json),
            ..Default::default()
        };
        let resolved = resolve_config_with(&overrides, env, None).unwrap();
        assert_eq!(resolved.config.database.path, PathBuf::from("/cli/db.sqlite"));
        assert_eq!(resolved.config.server.bind, "127.0.0.1:9000");
        assert_eq!(resolved.config.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_result_is_rejected() {
        let overrides = ConfigOverrides {
            bind: Some("not-an-address".to_string()),
            ..Default::default()
        };
        let err = resolve_config_with(&overrides, env_from(&[]), None).unwrap_err();
        match err {
            ConfigError::Invalid(problems) => {
                assert!(problems.iter().any(|p| p.contains("server.bind")));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}

use crate::error::CliError;
use crate::model::Timestamp;
use crate::ts::{parse_timestamp, system_now};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "DIABUDDY_DATA_DIR";
pub const NOW_ENV: &str = "DIABUDDY_NOW";
pub const LOG_ENV: &str = "DIABUDDY_LOG";

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub now: Timestamp,
    pub color: bool,
}

impl Settings {
    pub fn resolve(
        cli_data_dir: Option<&str>,
        cli_now: Option<&str>,
        no_color_flag: bool,
    ) -> Result<Self, CliError> {
        Ok(Self {
            data_dir: resolve_data_dir(cli_data_dir)?,
            now: resolve_now(cli_now)?,
            color: resolve_color_enabled(no_color_flag),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn resolve_data_dir(cli_data_dir: Option<&str>) -> Result<PathBuf, CliError> {
    if let Some(p) = cli_data_dir.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(p));
    }

    if let Some(p) = non_empty_env(DATA_DIR_ENV) {
        return Ok(PathBuf::from(p));
    }

    let base = match (non_empty_env("XDG_DATA_HOME"), non_empty_env("HOME")) {
        (Some(b), _) => PathBuf::from(b),
        (None, Some(h)) => Path::new(&h).join(".local").join("share"),
        (None, None) => return Err(CliError::io("Cannot locate a data directory")),
    };

    Ok(base.join("diabuddy"))
}

pub fn resolve_now(cli_now: Option<&str>) -> Result<Timestamp, CliError> {
    if let Some(t) = cli_now {
        return parse_timestamp(t, "now");
    }
    if let Some(t) = non_empty_env(NOW_ENV) {
        return parse_timestamp(&t, "now");
    }
    Ok(system_now())
}

pub fn resolve_color_enabled(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var_os("NO_COLOR").is_none()
}

/// Logs go to stderr so JSON output on stdout stays clean.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

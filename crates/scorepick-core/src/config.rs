// Configuration loading and validation (config/scorepick.toml).

use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the main configuration inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "scorepick.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub data_paths: DataPaths,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BacktestConfig {
    /// Picks simulated per day in pooled mode.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Length of the default date range ending today.
    #[serde(default = "default_range_days")]
    pub default_range_days: u32,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            top_n: default_top_n(),
            default_range_days: default_range_days(),
        }
    }
}

/// Remote endpoints and the per-request retry policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,
    #[serde(default = "default_stats_base_url")]
    pub stats_base_url: String,
    #[serde(default = "default_injury_report_url")]
    pub injury_report_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            web_base_url: default_web_base_url(),
            stats_base_url: default_stats_base_url(),
            injury_report_url: default_injury_report_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    #[serde(default = "default_team_name_fixes")]
    pub team_name_fixes: String,
    #[serde(default = "default_jersey_number_fixes")]
    pub jersey_number_fixes: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            team_name_fixes: default_team_name_fixes(),
            jersey_number_fixes: default_jersey_number_fixes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for the log file and CSV reports.
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: default_output_dir(),
        }
    }
}

fn default_top_n() -> usize {
    3
}
fn default_range_days() -> u32 {
    14
}
fn default_web_base_url() -> String {
    "https://api-web.nhle.com/v1".into()
}
fn default_stats_base_url() -> String {
    "https://api.nhle.com/stats/rest/en".into()
}
fn default_injury_report_url() -> String {
    "https://www.rotowire.com/hockey/tables/injury-report.php?team=ALL&pos=ALL".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_team_name_fixes() -> String {
    "data/team_name_fixes.json".into()
}
fn default_jersey_number_fixes() -> String {
    "data/jersey_number_fixes.json".into()
}
fn default_output_dir() -> String {
    "logs".into()
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/scorepick.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Parse config TOML text without validation.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy any file from `defaults/` that is missing in `config/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the repository root",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        let mut dest = match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(dest) => dest,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                })
            }
        };
        File::open(&path)
            .and_then(|mut src| io::copy(&mut src, &mut dest))
            .map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
            })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.backtest.top_n == 0 {
        return Err(invalid("backtest.top_n", "must be greater than 0".into()));
    }
    if config.backtest.default_range_days == 0 {
        return Err(invalid("backtest.default_range_days", "must be greater than 0".into()));
    }

    let api = &config.api;
    if api.max_attempts == 0 {
        return Err(invalid("api.max_attempts", "must be greater than 0".into()));
    }
    if api.request_timeout_secs == 0 {
        return Err(invalid("api.request_timeout_secs", "must be greater than 0".into()));
    }
    let urls: &[(&str, &str)] = &[
        ("api.web_base_url", &api.web_base_url),
        ("api.stats_base_url", &api.stats_base_url),
        ("api.injury_report_url", &api.injury_report_url),
    ];
    for (field, url) in urls {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid(field, format!("must be an http(s) URL, got '{url}'")));
        }
    }

    if config.output.dir.trim().is_empty() {
        return Err(invalid("output.dir", "must not be empty".into()));
    }

    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

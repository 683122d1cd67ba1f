//! Job configuration
//!
//! Every job takes one config object, built once at startup and passed by
//! reference. Values come from the defaults below, then `ETL_*` environment
//! variables, then command-line flags.

use etl_common::{EtlError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TARGET_FILE: &str = "transformed_data.csv";
pub const DEFAULT_PIPELINE_LOG: &str = "log_file.txt";
pub const DEFAULT_PIPELINE_TABLE: &str = "transformed_data";

pub const DEFAULT_BANKS_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_EXCHANGE_RATES: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMSkillsNetwork-PY0221EN-Coursera/labs/v2/exchange_rate.csv";

pub const DEFAULT_GDP_URL: &str = "https://web.archive.org/web/20230902185326/https://en.wikipedia.org/wiki/List_of_countries_by_GDP_%28nominal%29";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| EtlError::config(format!("{} has invalid value '{}': {}", name, raw, e)))
        })
        .transpose()
}

fn env_timeout() -> Result<Option<Duration>> {
    Ok(env_parse::<u64>("ETL_HTTP_TIMEOUT_SECS")?.map(Duration::from_secs))
}

// ============================================================================
// Person pipeline
// ============================================================================

/// Configuration for the multi-format person pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory scanned for `*.csv`, `*.json` and `*.xml` sources
    pub source_dir: PathBuf,

    /// CSV output; never read back as a source
    pub target_file: PathBuf,

    /// Progress log, appended to on every run
    pub log_file: PathBuf,

    /// Optional SQLite database that also receives the transformed table
    pub database: Option<PathBuf>,

    /// Table name used when `database` is set
    pub table_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            target_file: PathBuf::from(DEFAULT_TARGET_FILE),
            log_file: PathBuf::from(DEFAULT_PIPELINE_LOG),
            database: None,
            table_name: DEFAULT_PIPELINE_TABLE.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Defaults with every source, target and log path rooted at `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            target_file: dir.join(DEFAULT_TARGET_FILE),
            log_file: dir.join(DEFAULT_PIPELINE_LOG),
            source_dir: dir,
            ..Self::default()
        }
    }

    /// Load config from environment variables
    ///
    /// - `ETL_SOURCE_DIR`
    /// - `ETL_TARGET_FILE`
    /// - `ETL_LOG_FILE`
    /// - `ETL_DATABASE`
    /// - `ETL_TABLE`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = env_path("ETL_SOURCE_DIR") {
            config.source_dir = dir;
        }
        if let Some(target) = env_path("ETL_TARGET_FILE") {
            config.target_file = target;
        }
        if let Some(log) = env_path("ETL_LOG_FILE") {
            config.log_file = log;
        }
        if let Some(db) = env_path("ETL_DATABASE") {
            config.database = Some(db);
        }
        if let Some(table) = env_string("ETL_TABLE") {
            config.table_name = table;
        }

        Ok(config)
    }
}

// ============================================================================
// Largest banks
// ============================================================================

/// Configuration for the largest-banks scrape
#[derive(Debug, Clone, PartialEq)]
pub struct BanksConfig {
    pub url: String,

    /// Exchange rate CSV, as an `http(s)://` URL or a local path
    pub exchange_rates: String,

    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_file: PathBuf,

    /// Number of banks kept from the top of the table
    pub top_n: usize,

    pub http_timeout: Duration,
}

impl Default for BanksConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BANKS_URL.to_string(),
            exchange_rates: DEFAULT_EXCHANGE_RATES.to_string(),
            csv_path: PathBuf::from("Largest_banks_data.csv"),
            db_path: PathBuf::from("Bank_Project.db"),
            table_name: "Largest_banks".to_string(),
            log_file: PathBuf::from("code_log.txt"),
            top_n: 10,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl BanksConfig {
    /// Load config from `ETL_BANKS_*`, `ETL_EXCHANGE_RATES` and `ETL_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = env_string("ETL_BANKS_URL") {
            config.url = url;
        }
        if let Some(rates) = env_string("ETL_EXCHANGE_RATES") {
            config.exchange_rates = rates;
        }
        if let Some(path) = env_path("ETL_BANKS_CSV") {
            config.csv_path = path;
        }
        if let Some(path) = env_path("ETL_BANKS_DB") {
            config.db_path = path;
        }
        if let Some(path) = env_path("ETL_BANKS_LOG") {
            config.log_file = path;
        }
        if let Some(top_n) = env_parse::<usize>("ETL_BANKS_TOP_N")? {
            config.top_n = top_n;
        }
        if let Some(timeout) = env_timeout()? {
            config.http_timeout = timeout;
        }

        Ok(config)
    }
}

// ============================================================================
// Countries by GDP
// ============================================================================

/// Configuration for the countries-by-GDP scrape
#[derive(Debug, Clone, PartialEq)]
pub struct GdpConfig {
    pub url: String,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_file: PathBuf,

    /// Threshold for the reporting query, in billions of USD
    pub min_gdp_billions: f64,

    pub http_timeout: Duration,
}

impl Default for GdpConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GDP_URL.to_string(),
            csv_path: PathBuf::from("Countries_by_GDP.csv"),
            db_path: PathBuf::from("World_Economies.db"),
            table_name: "Countries_by_GDP".to_string(),
            log_file: PathBuf::from("etl_project_log.txt"),
            min_gdp_billions: 100.0,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl GdpConfig {
    /// Load config from `ETL_GDP_*` and `ETL_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = env_string("ETL_GDP_URL") {
            config.url = url;
        }
        if let Some(path) = env_path("ETL_GDP_CSV") {
            config.csv_path = path;
        }
        if let Some(path) = env_path("ETL_GDP_DB") {
            config.db_path = path;
        }
        if let Some(path) = env_path("ETL_GDP_LOG") {
            config.log_file = path;
        }
        if let Some(min) = env_parse::<f64>("ETL_GDP_MIN_BILLIONS")? {
            config.min_gdp_billions = min;
        }
        if let Some(timeout) = env_timeout()? {
            config.http_timeout = timeout;
        }

        Ok(config)
    }
}

// ============================================================================
// Staff database
// ============================================================================

/// Configuration for the instructor table load
#[derive(Debug, Clone, PartialEq)]
pub struct StaffConfig {
    /// Headerless `ID,FNAME,LNAME,CITY,CCODE` file
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_file: PathBuf,
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("INSTRUCTOR.csv"),
            db_path: PathBuf::from("STAFF.db"),
            table_name: "INSTRUCTOR".to_string(),
            log_file: PathBuf::from("staff_log.txt"),
        }
    }
}

impl StaffConfig {
    /// Load config from `ETL_STAFF_*`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = env_path("ETL_STAFF_CSV") {
            config.csv_path = path;
        }
        if let Some(path) = env_path("ETL_STAFF_DB") {
            config.db_path = path;
        }
        if let Some(path) = env_path("ETL_STAFF_LOG") {
            config.log_file = path;
        }

        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_file, PathBuf::from("transformed_data.csv"));
        assert_eq!(config.log_file, PathBuf::from("log_file.txt"));
        assert!(config.database.is_none());
    }

    #[test]
    fn test_pipeline_in_dir() {
        let config = PipelineConfig::in_dir("/data/etl");
        assert_eq!(config.source_dir, PathBuf::from("/data/etl"));
        assert_eq!(config.target_file, PathBuf::from("/data/etl/transformed_data.csv"));
        assert_eq!(config.log_file, PathBuf::from("/data/etl/log_file.txt"));
    }

    #[test]
    #[serial]
    fn test_pipeline_from_env() {
        std::env::set_var("ETL_SOURCE_DIR", "/tmp/etl-source");
        std::env::set_var("ETL_DATABASE", "/tmp/etl.db");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/tmp/etl-source"));
        assert_eq!(config.database, Some(PathBuf::from("/tmp/etl.db")));
        assert_eq!(config.target_file, PathBuf::from(DEFAULT_TARGET_FILE));

        std::env::remove_var("ETL_SOURCE_DIR");
        std::env::remove_var("ETL_DATABASE");
    }

    #[test]
    #[serial]
    fn test_invalid_numeric_env_is_config_error() {
        std::env::set_var("ETL_BANKS_TOP_N", "ten");

        let err = BanksConfig::from_env().unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
        assert!(err.to_string().contains("ETL_BANKS_TOP_N"));

        std::env::remove_var("ETL_BANKS_TOP_N");
    }

    #[test]
    fn test_job_defaults_match_course_files() {
        assert_eq!(BanksConfig::default().table_name, "Largest_banks");
        assert_eq!(BanksConfig::default().db_path, PathBuf::from("Bank_Project.db"));
        assert_eq!(GdpConfig::default().table_name, "Countries_by_GDP");
        assert_eq!(StaffConfig::default().table_name, "INSTRUCTOR");
        assert_eq!(GdpConfig::default().min_gdp_billions, 100.0);
    }
}

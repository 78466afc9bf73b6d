//! Application configuration for CoSuJu.
//!
//! User config lives at `~/.cosuju/cosuju.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CosujuError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "cosuju.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cosuju";

/// SAFLII index of Constitutional Court decisions, one sub-directory per year.
pub const DEFAULT_ARCHIVE_URL: &str = "http://www.saflii.org/za/cases/ZACC/";

/// User-Agent string for archive requests.
pub const DEFAULT_USER_AGENT: &str = concat!("cosuju/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Config structs (matching cosuju.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which archive to scrape and which years.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Where downloaded documents and `data.json` go.
    #[serde(default)]
    pub output: OutputConfig,

    /// Run behaviour.
    #[serde(default)]
    pub run: RunConfig,
}

/// `[archive]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Base URL of the per-year listings.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// First year to scrape (inclusive).
    #[serde(default = "default_first_year")]
    pub first_year: u16,

    /// Last year to scrape (inclusive).
    #[serde(default = "default_last_year")]
    pub last_year: u16,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            first_year: default_first_year(),
            last_year: default_last_year(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_ARCHIVE_URL.into()
}
fn default_first_year() -> u16 {
    1995
}
fn default_last_year() -> u16 {
    1997
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between consecutive requests to the archive.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_request_delay_ms() -> u64 {
    2000
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root for downloaded documents; files land in `<docs_dir>/<year>/`.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Path of the year-keyed JSON output.
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            data_file: default_data_file(),
        }
    }
}

fn default_docs_dir() -> String {
    "docs".into()
}
fn default_data_file() -> String {
    "data.json".into()
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Stop each year after this many decisions (sampling). Unset means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_decisions_per_year: Option<usize>,

    /// Log and skip a failing decision instead of aborting the run.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_decisions_per_year: None,
            continue_on_error: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Scrape config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scrape configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Archive base URL, always ending in `/`.
    pub base_url: Url,
    pub first_year: u16,
    pub last_year: u16,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub request_delay_ms: u64,
    pub docs_dir: PathBuf,
    pub data_file: PathBuf,
    pub max_decisions_per_year: Option<usize>,
    pub continue_on_error: bool,
}

impl ScrapeConfig {
    /// Check invariants that CLI overrides could have broken.
    pub fn validate(&self) -> Result<()> {
        if self.first_year > self.last_year {
            return Err(CosujuError::config(format!(
                "first year {} is after last year {}",
                self.first_year, self.last_year
            )));
        }
        if !self.base_url.path().ends_with('/') {
            return Err(CosujuError::config(format!(
                "archive base URL must end with '/': {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Years to scrape, in ascending order.
    pub fn years(&self) -> impl Iterator<Item = u16> {
        self.first_year..=self.last_year
    }

    /// Listing page URL for a single year (`<base>/<year>/`).
    pub fn year_url(&self, year: u16) -> Result<Url> {
        self.base_url
            .join(&format!("{year}/"))
            .map_err(|e| CosujuError::config(format!("bad listing URL for {year}: {e}")))
    }

    /// Directory holding the downloaded documents of `year`.
    pub fn year_docs_dir(&self, year: u16) -> PathBuf {
        self.docs_dir.join(year.to_string())
    }
}

impl TryFrom<&AppConfig> for ScrapeConfig {
    type Error = CosujuError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.archive.base_url)?;

        let scrape = Self {
            base_url,
            first_year: config.archive.first_year,
            last_year: config.archive.last_year,
            user_agent: config.http.user_agent.clone(),
            timeout_secs: config.http.timeout_secs,
            request_delay_ms: config.http.request_delay_ms,
            docs_dir: PathBuf::from(&config.output.docs_dir),
            data_file: PathBuf::from(&config.output.data_file),
            max_decisions_per_year: config.run.max_decisions_per_year,
            continue_on_error: config.run.continue_on_error,
        };
        scrape.validate()?;
        Ok(scrape)
    }
}

/// Parse the archive URL, appending a trailing slash so `join` keeps the last segment.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|e| CosujuError::config(format!("invalid base URL '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cosuju/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CosujuError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cosuju/cosuju.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CosujuError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CosujuError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CosujuError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CosujuError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CosujuError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("saflii.org"));
        assert!(!toml_str.contains("max_decisions_per_year"));
    }

    #[test]
    fn config_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.archive.first_year, 1995);
        assert_eq!(parsed.archive.last_year, 1997);
        assert_eq!(parsed.http.request_delay_ms, 2000);
        assert!(parsed.run.continue_on_error);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[archive]
first_year = 2001
last_year = 2003

[run]
max_decisions_per_year = 1
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.archive.base_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(config.archive.first_year, 2001);
        assert_eq!(config.run.max_decisions_per_year, Some(1));
        assert_eq!(config.output.data_file, "data.json");
    }

    #[test]
    fn scrape_config_from_app_config() {
        let scrape = ScrapeConfig::try_from(&AppConfig::default()).expect("valid defaults");
        assert_eq!(scrape.years().collect::<Vec<_>>(), vec![1995, 1996, 1997]);
        assert_eq!(scrape.docs_dir, PathBuf::from("docs"));
        assert_eq!(scrape.year_docs_dir(1996), PathBuf::from("docs").join("1996"));
    }

    #[test]
    fn year_url_joins_under_base() {
        let scrape = ScrapeConfig::try_from(&AppConfig::default()).unwrap();
        assert_eq!(
            scrape.year_url(1995).unwrap().as_str(),
            "http://www.saflii.org/za/cases/ZACC/1995/"
        );
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:8080/za/cases/ZACC").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/za/cases/ZACC/");
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let mut app = AppConfig::default();
        app.archive.first_year = 2000;
        app.archive.last_year = 1999;
        let err = ScrapeConfig::try_from(&app).unwrap_err();
        assert!(err.to_string().contains("after last year"));
    }
}

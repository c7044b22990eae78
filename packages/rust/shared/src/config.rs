//! Application configuration for pubwatch.
//!
//! User config lives at `~/.pubwatch/pubwatch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{PubwatchError, Result};
use crate::institutions::{builtin_institutions, builtin_rating_schedule};
use crate::types::{InstitutionConfig, RatingSchedule};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pubwatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pubwatch";

/// Browser-like user agent; several institution sites reject bot agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching pubwatch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// File locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP and politeness settings.
    #[serde(default)]
    pub crawl: CrawlSettings,

    /// Daily schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Monitored publications, in display order.
    #[serde(default = "builtin_institutions")]
    pub institutions: Vec<InstitutionConfig>,

    /// Rating-agency review calendar.
    #[serde(default = "builtin_rating_schedule")]
    pub rating_schedule: RatingSchedule,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            crawl: CrawlSettings::default(),
            schedule: ScheduleConfig::default(),
            institutions: builtin_institutions(),
            rating_schedule: builtin_rating_schedule(),
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Historical store (JSON).
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Dashboard HTML template.
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Rendered dashboard.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            template: default_template(),
            output: default_output(),
        }
    }
}

fn default_data_file() -> PathBuf {
    "publications_data.json".into()
}
fn default_template() -> PathBuf {
    "dashboard_template.html".into()
}
fn default_output() -> PathBuf {
    "index.html".into()
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause after each institution, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_delay_ms() -> u64 {
    2000
}

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Wall-clock time of the daily run, `HH:MM`.
    #[serde(default = "default_time")]
    pub time: String,

    /// IANA timezone for the schedule and all displayed timestamps.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// How often the scheduler checks the clock.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time: default_time(),
            timezone: default_timezone(),
            poll_secs: default_poll_secs(),
        }
    }
}

fn default_time() -> String {
    "07:00".into()
}
fn default_timezone() -> String {
    "Europe/Paris".into()
}
fn default_poll_secs() -> u64 {
    60
}

impl ScheduleConfig {
    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| PubwatchError::config(format!("unknown timezone '{}'", self.timezone)))
    }

    /// Parse the configured daily time.
    pub fn daily_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, "%H:%M").map_err(|e| {
            PubwatchError::config(format!("invalid schedule time '{}': {e}", self.time))
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, derived from the crawl section)
// ---------------------------------------------------------------------------

/// Runtime HTTP configuration for the page fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&CrawlSettings::default())
    }
}

impl From<&CrawlSettings> for FetchConfig {
    fn from(crawl: &CrawlSettings) -> Self {
        Self {
            user_agent: crawl.user_agent.clone(),
            timeout: Duration::from_secs(crawl.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Check everything that would otherwise fail mid-cycle: timezone,
    /// schedule time, institution URLs, search patterns, duplicate keys.
    pub fn validate(&self) -> Result<()> {
        self.schedule.tz()?;
        self.schedule.daily_time()?;

        if self.institutions.is_empty() {
            return Err(PubwatchError::validation("no institutions configured"));
        }

        let mut seen = std::collections::HashSet::new();
        for inst in &self.institutions {
            let key = inst.key();
            if !seen.insert(key.clone()) {
                return Err(PubwatchError::validation(format!(
                    "duplicate institution/publication '{key}'"
                )));
            }

            url::Url::parse(&inst.url).map_err(|e| {
                PubwatchError::validation(format!("invalid url for '{key}': {e}"))
            })?;

            if inst.search_patterns.is_empty() {
                return Err(PubwatchError::validation(format!(
                    "'{key}' has no search patterns"
                )));
            }
            for pattern in &inst.search_patterns {
                regex::RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        PubwatchError::parse(format!("bad search pattern for '{key}': {e}"))
                    })?;
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pubwatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PubwatchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pubwatch/pubwatch.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| PubwatchError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PubwatchError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| PubwatchError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PubwatchError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| PubwatchError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Time-related constants
// =============================================================================

/// Default refresh interval in milliseconds (24 hours)
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

/// Age in milliseconds after which stored records count as stale (24 hours)
pub const DEFAULT_STALE_AFTER_MS: u64 = 24 * 60 * 60 * 1000;

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Upstream defaults
// =============================================================================

pub const DEFAULT_TAGS_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_REPOSITORY: &str = "python/cpython";
pub const DEFAULT_EOL_BASE_URL: &str = "https://endoflife.date";
pub const DEFAULT_PRODUCT: &str = "python";
pub const DEFAULT_USER_AGENT: &str = "Python-Versions-Applet";

/// Minor series tracked by default, oldest first
pub const DEFAULT_ACTIVE_SERIES: &[&str] = &["3.9", "3.10", "3.11", "3.12", "3.13"];

/// Upcoming release announced ahead of any tag
pub const DEFAULT_PRE_RELEASE: &str = "3.14.0a0";

const APP_DIR_NAME: &str = "python-versions";

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub refresh: RefreshConfig,
    pub sources: SourcesConfig,
    pub tracking: TrackingConfig,
}

/// Refresh cadence configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshConfig {
    /// Pause between the end of one cycle and the start of the next, in milliseconds
    pub interval_ms: u64,
    /// Records older than this trigger an on-demand refresh, in milliseconds
    pub stale_after_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }
}

/// Upstream feed locations
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SourcesConfig {
    pub tags_base_url: String,
    pub repository: String,
    pub eol_base_url: String,
    pub product: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            tags_base_url: DEFAULT_TAGS_BASE_URL.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            eol_base_url: DEFAULT_EOL_BASE_URL.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

/// Which series are tracked and which upcoming release is announced
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingConfig {
    pub active_series: Vec<String>,
    /// Empty string disables the synthesized pre-release record
    pub pre_release: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            active_series: DEFAULT_ACTIVE_SERIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pre_release: DEFAULT_PRE_RELEASE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject durations that would spin the refresh loop or fail every fetch
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.refresh.interval_ms > 0, "refresh.intervalMs must be greater than 0");
        anyhow::ensure!(
            self.refresh.stale_after_ms > 0,
            "refresh.staleAfterMs must be greater than 0"
        );
        anyhow::ensure!(self.sources.timeout_ms > 0, "sources.timeoutMs must be greater than 0");
        Ok(())
    }
}

/// Returns the path to the data directory for python-versions.
/// Uses $XDG_DATA_HOME/python-versions if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/python-versions,
/// or ./python-versions if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("versions.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("python-versions.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_DIR_NAME)
}

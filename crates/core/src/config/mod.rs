//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LINKER_*)
//! 2. TOML config file (if LINKER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LINKER_*)
/// 2. TOML config file (if LINKER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for page fetches and status checks.
    ///
    /// Set via LINKER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page fetch timeout in milliseconds.
    ///
    /// Set via LINKER_PAGE_TIMEOUT_MS environment variable.
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Per-link status check timeout in milliseconds.
    ///
    /// Set via LINKER_STATUS_TIMEOUT_MS environment variable.
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,

    /// Maximum bytes to fetch per page.
    ///
    /// Set via LINKER_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Redirect limit for page fetches and status checks.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Number of status checks in flight at once. 1 checks links one by one.
    ///
    /// Set via LINKER_STATUS_CONCURRENCY environment variable.
    #[serde(default = "default_status_concurrency")]
    pub status_concurrency: usize,

    /// Default content-region selector.
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Selector for the sidebar region.
    #[serde(default = "default_sidebar_selector")]
    pub sidebar_selector: String,

    /// Whether sidebar content is extracted alongside the main region.
    #[serde(default)]
    pub include_sidebar: bool,

    /// Directory searched for `dsm-MMDD.xlsx` workbooks.
    #[serde(default = "default_dsm_dir")]
    pub dsm_dir: PathBuf,

    /// Explicit workbook path; skips discovery when set.
    ///
    /// Set via LINKER_DSM_FILE environment variable.
    #[serde(default)]
    pub dsm_file: Option<PathBuf>,

    /// Directory holding cached page snapshots.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Directory HTML reports are written to.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Extra hosts that always count as internal during reconciliation.
    ///
    /// Set via LINKER_INTERNAL_HOSTS environment variable (array syntax: `[a.edu,b.edu]`).
    #[serde(default)]
    pub internal_hosts: Vec<String>,
}

fn default_user_agent() -> String {
    "linker/0.1".into()
}

fn default_page_timeout_ms() -> u64 {
    30_000
}

fn default_status_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    10
}

fn default_status_concurrency() -> usize {
    1
}

fn default_selector() -> String {
    "#main".into()
}

fn default_sidebar_selector() -> String {
    "#sidebar-components".into()
}

fn default_dsm_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./migration_cache")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("./reports")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_ms: default_page_timeout_ms(),
            status_timeout_ms: default_status_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            status_concurrency: default_status_concurrency(),
            selector: default_selector(),
            sidebar_selector: default_sidebar_selector(),
            include_sidebar: false,
            dsm_dir: default_dsm_dir(),
            dsm_file: None,
            cache_dir: default_cache_dir(),
            reports_dir: default_reports_dir(),
            internal_hosts: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Page fetch timeout as Duration.
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    /// Status check timeout as Duration.
    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LINKER_`
    /// 2. TOML file from `LINKER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LINKER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LINKER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.user_agent, "linker/0.1");
        assert_eq!(config.page_timeout_ms, 30_000);
        assert_eq!(config.status_timeout_ms, 10_000);
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.status_concurrency, 1);
        assert_eq!(config.selector, "#main");
        assert_eq!(config.sidebar_selector, "#sidebar-components");
        assert!(!config.include_sidebar);
        assert!(config.dsm_file.is_none());
        assert_eq!(config.cache_dir, PathBuf::from("./migration_cache"));
        assert!(config.internal_hosts.is_empty());
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.page_timeout(), Duration::from_secs(30));
        assert_eq!(config.status_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r##"
                selector = "#content"
                status_concurrency = 4
                internal_hosts = ["intranet.example.edu"]
            "##,
        ));
        let config: AppConfig = figment.extract().unwrap();
        assert_eq!(config.selector, "#content");
        assert_eq!(config.status_concurrency, 4);
        assert_eq!(config.internal_hosts, vec!["intranet.example.edu".to_string()]);
        assert_eq!(config.page_timeout_ms, 30_000);
    }
}

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::core::error::DashError;

pub const DEFAULT_CONFIG_PATH: &str = "config/cybernow.toml";
pub const BASE_URL_ENV: &str = "CYBERNOW_BASE_URL";

/// Which incident source backs the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Live,
    Demo,
    /// Demo for `file:` URLs and GitHub Pages hosts, live otherwise.
    #[default]
    Auto,
}

impl SourceMode {
    /// Settle `Auto` against the configured base URL. Never returns `Auto`.
    pub fn resolve(self, base_url: &str) -> SourceMode {
        match self {
            SourceMode::Auto => {
                if looks_like_static_host(base_url) {
                    SourceMode::Demo
                } else {
                    SourceMode::Live
                }
            }
            other => other,
        }
    }
}

fn looks_like_static_host(base_url: &str) -> bool {
    match reqwest::Url::parse(base_url) {
        Ok(url) => {
            url.scheme() == "file"
                || url
                    .host_str()
                    .map(|h| h.ends_with("github.io"))
                    .unwrap_or(false)
        }
        Err(_) => base_url.trim_start().starts_with("file:"),
    }
}

/// Where the critical and affected-sector counters come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    /// Recompute from the live feed.
    #[default]
    Client,
    /// Trust the summary endpoint when it reports the field.
    Backend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub poll_interval_secs: u64,
    pub min_refresh_interval_ms: u64,
    pub user_agent: String,
    pub source: SourceMode,
    /// Unset means backend counts for the demo source and client counts otherwise.
    pub count_policy: Option<CountPolicy>,
    pub feed_limit: usize,
    pub animation_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
            poll_interval_secs: 60,
            min_refresh_interval_ms: 1_000,
            user_agent: format!("cybernow/{}", env!("CARGO_PKG_VERSION")),
            source: SourceMode::Auto,
            count_policy: None,
            feed_limit: 50,
            animation_ms: 1_000,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), DashError> {
        if self.base_url.trim().is_empty() {
            return Err(DashError::Config("base_url must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(DashError::Config("poll_interval_secs must be > 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(DashError::Config("timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn count_policy_for(&self, demo: bool) -> CountPolicy {
        self.count_policy.unwrap_or(if demo {
            CountPolicy::Backend
        } else {
            CountPolicy::Client
        })
    }

    pub fn resolved_source(&self) -> SourceMode {
        self.source.resolve(&self.base_url)
    }
}

/// Load the TOML config; a missing file means built-in defaults.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, DashError> {
    let explicit = path.is_some();
    let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));

    let mut cfg = if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| DashError::Config(e.to_string()))?;
        parse_config(&content)?
    } else if explicit {
        return Err(DashError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    } else {
        AppConfig::default()
    };

    if let Ok(url) = std::env::var(BASE_URL_ENV) {
        if !url.trim().is_empty() {
            cfg.base_url = url.trim().to_string();
        }
    }
    Ok(cfg)
}

pub fn parse_config(content: &str) -> Result<AppConfig, DashError> {
    toml::from_str(content).map_err(|e| DashError::Config(e.to_string()))
}

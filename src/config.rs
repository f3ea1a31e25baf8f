// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::providers::{arxiv_atom, google_trends, hn_rss};

pub const ENV_CONFIG_PATH: &str = "TREND_RADAR_CONFIG_PATH";
pub const ENV_REFRESH_SECS: &str = "TREND_RADAR_REFRESH_SECS";
pub const DEFAULT_TOML_PATH: &str = "config/trend_radar.toml";
pub const DEFAULT_JSON_PATH: &str = "config/trend_radar.json";

const DEFAULT_REFRESH_SECS: u64 = 3600;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MAX_RESULTS: usize = 10;

/// Upstream feeds and batch-cache TTLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub papers_ttl_secs: u64,
    pub stories_ttl_secs: u64,
    pub arxiv_api_base: String,
    pub arxiv_max_results: usize,
    pub hn_feed_url: String,
    pub hn_limit: usize,
    pub trends_url: String,
    pub trends_limit: Option<usize>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            papers_ttl_secs: 3600,
            stories_ttl_secs: 1800,
            arxiv_api_base: arxiv_atom::DEFAULT_API_BASE.to_string(),
            arxiv_max_results: arxiv_atom::DEFAULT_MAX_RESULTS,
            hn_feed_url: hn_rss::DEFAULT_FEED_URL.to_string(),
            hn_limit: hn_rss::DEFAULT_LIMIT,
            trends_url: google_trends::DEFAULT_FEED_URL.to_string(),
            trends_limit: None,
        }
    }
}

/// Dashboard view TTLs, one per view family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewsConfig {
    pub papers_ttl_secs: u64,
    pub stories_ttl_secs: u64,
    pub insights_ttl_secs: u64,
    pub trends_ttl_secs: u64,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            papers_ttl_secs: 3600,
            stories_ttl_secs: 1800,
            insights_ttl_secs: 1800,
            trends_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub refresh_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_results: usize,
    pub sources: SourcesConfig,
    pub views: ViewsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_results: DEFAULT_MAX_RESULTS,
            sources: SourcesConfig::default(),
            views: ViewsConfig::default(),
        }
    }
}

fn nonzero<T: PartialEq + Default>(v: T, fallback: T) -> T {
    if v == T::default() {
        fallback
    } else {
        v
    }
}

impl AppConfig {
    /// Replace zero TTLs/intervals/limits with their defaults.
    pub fn sanitized(self) -> Self {
        let d = AppConfig::default();
        Self {
            refresh_interval_secs: nonzero(self.refresh_interval_secs, d.refresh_interval_secs),
            fetch_timeout_secs: nonzero(self.fetch_timeout_secs, d.fetch_timeout_secs),
            max_results: nonzero(self.max_results, d.max_results),
            sources: SourcesConfig {
                papers_ttl_secs: nonzero(self.sources.papers_ttl_secs, d.sources.papers_ttl_secs),
                stories_ttl_secs: nonzero(self.sources.stories_ttl_secs, d.sources.stories_ttl_secs),
                arxiv_max_results: nonzero(
                    self.sources.arxiv_max_results,
                    d.sources.arxiv_max_results,
                ),
                hn_limit: nonzero(self.sources.hn_limit, d.sources.hn_limit),
                ..self.sources
            },
            views: ViewsConfig {
                papers_ttl_secs: nonzero(self.views.papers_ttl_secs, d.views.papers_ttl_secs),
                stories_ttl_secs: nonzero(self.views.stories_ttl_secs, d.views.stories_ttl_secs),
                insights_ttl_secs: nonzero(self.views.insights_ttl_secs, d.views.insights_ttl_secs),
                trends_ttl_secs: nonzero(self.views.trends_ttl_secs, d.views.trends_ttl_secs),
            },
        }
    }

    /// Apply `TREND_RADAR_REFRESH_SECS` when it holds a positive integer.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(secs) = std::env::var(ENV_REFRESH_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            self.refresh_interval_secs = secs;
        }
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Load config from an explicit path. TOML or JSON, chosen by extension.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = match ext.as_str() {
        "json" => serde_json::from_str::<AppConfig>(&content)
            .with_context(|| format!("parsing json config {}", path.display()))?,
        _ => toml::from_str::<AppConfig>(&content)
            .with_context(|| format!("parsing toml config {}", path.display()))?,
    };
    Ok(cfg.sanitized())
}

/// Load config using env var + fallbacks:
/// 1) $TREND_RADAR_CONFIG_PATH
/// 2) config/trend_radar.toml
/// 3) config/trend_radar.json
/// 4) built-in defaults
///
/// `TREND_RADAR_REFRESH_SECS` is applied on top.
pub fn load_config_default() -> Result<AppConfig> {
    let cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_config_from(&pb)?
    } else if Path::new(DEFAULT_TOML_PATH).exists() {
        load_config_from(Path::new(DEFAULT_TOML_PATH))?
    } else if Path::new(DEFAULT_JSON_PATH).exists() {
        load_config_from(Path::new(DEFAULT_JSON_PATH))?
    } else {
        AppConfig::default()
    };
    Ok(cfg.with_env_overrides())
}

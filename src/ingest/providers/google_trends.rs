// src/ingest/providers/google_trends.rs
//! Daily search-trends RSS. Served as a plain view (no ranking).

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};

use super::hn_rss::parse_rfc2822;

pub const DEFAULT_FEED_URL: &str = "https://trends.google.com/trending/rss?geo=ID";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

// `ht:`-prefixed elements are matched by local name.
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    approx_traffic: Option<String>,
    picture: Option<String>,
    #[serde(rename = "news_item", default)]
    news_item: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    news_item_title: Option<String>,
    news_item_url: Option<String>,
    news_item_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendNews {
    pub title: String,
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Trend {
    pub title: String,
    pub traffic: String,
    pub pub_date: String,
    pub picture: Option<String>,
    pub news_items: Vec<TrendNews>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendsDigest {
    /// `YYYY-MM-DD` of the first dated trend, or today.
    pub date: String,
    pub trends: Vec<Trend>,
}

fn trimmed(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

pub fn parse_trends_from_str(s: &str, limit: Option<usize>) -> Result<TrendsDigest> {
    crate::ingest::ensure_metrics_described();
    let t0 = std::time::Instant::now();
    let rss: Rss = from_str(s).context("parsing trends rss xml")?;

    let mut date = None;
    let mut trends = Vec::new();
    let take = limit.unwrap_or(usize::MAX);
    for it in rss.channel.item.into_iter().take(take) {
        let title = trimmed(it.title);
        if title.is_empty() {
            continue;
        }
        let pub_date = trimmed(it.pub_date);
        if date.is_none() {
            date = parse_rfc2822(&pub_date).map(|d| d.format("%Y-%m-%d").to_string());
        }
        let news_items = it
            .news_item
            .into_iter()
            .filter_map(|n| {
                let title = trimmed(n.news_item_title);
                let url = trimmed(n.news_item_url);
                (!title.is_empty() && !url.is_empty()).then(|| TrendNews {
                    title,
                    url,
                    source: trimmed(n.news_item_source),
                })
            })
            .collect();
        trends.push(Trend {
            title,
            traffic: trimmed(it.approx_traffic),
            pub_date,
            picture: it.picture.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            news_items,
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("provider_parse_ms", "provider" => "google_trends").record(ms);
    counter!("provider_items_total", "provider" => "google_trends").increment(trends.len() as u64);

    Ok(TrendsDigest {
        date: date.unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
        trends,
    })
}

/// Source of the daily trends digest.
#[async_trait::async_trait]
pub trait TrendsFeed: Send + Sync {
    async fn fetch_digest(&self) -> Result<TrendsDigest>;
}

pub struct TrendsProvider {
    mode: Mode,
    limit: Option<usize>,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl TrendsProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            limit: None,
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub async fn fetch(&self) -> Result<TrendsDigest> {
        match &self.mode {
            Mode::Fixture(s) => parse_trends_from_str(s, self.limit),
            Mode::Http { url, client } => {
                tracing::info!(target: "providers", %url, "fetching search trends");
                let body = client
                    .get(url)
                    .header("Accept", "application/rss+xml, application/xml, text/xml")
                    .send()
                    .await
                    .context("trends http get()")?
                    .error_for_status()
                    .context("trends non-2xx")?
                    .text()
                    .await
                    .context("trends http .text()")?;
                parse_trends_from_str(&body, self.limit).inspect_err(|_| {
                    counter!("provider_errors_total", "provider" => "google_trends").increment(1);
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl TrendsFeed for TrendsProvider {
    async fn fetch_digest(&self) -> Result<TrendsDigest> {
        self.fetch().await
    }
}

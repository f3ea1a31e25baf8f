// src/ingest/providers/hn_rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::normalize_text;
use crate::ingest::types::{ContentItem, ItemSource, Story};

pub const DEFAULT_FEED_URL: &str = "https://hnrss.org/frontpage";
pub const DEFAULT_LIMIT: usize = 30;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    comments: Option<String>,
    /// `dc:creator`
    creator: Option<String>,
}

pub(crate) fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0))
}

/// Engagement and article link embedded in the item description HTML.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DescriptionStats {
    pub article_url: Option<String>,
    pub points: u32,
    pub comments: u32,
}

/// Extract `Points: N`, `# Comments: N` and the first `href` from an hnrss description.
/// Anything missing or unparsable defaults to 0 / `None`.
pub fn parse_description(html: &str) -> DescriptionStats {
    static RE_POINTS: OnceCell<Regex> = OnceCell::new();
    static RE_COMMENTS: OnceCell<Regex> = OnceCell::new();
    static RE_HREF: OnceCell<Regex> = OnceCell::new();
    let re_points = RE_POINTS.get_or_init(|| Regex::new(r"Points:\s*(\d+)").unwrap());
    let re_comments = RE_COMMENTS.get_or_init(|| Regex::new(r"Comments:\s*(\d+)").unwrap());
    let re_href = RE_HREF.get_or_init(|| Regex::new(r#"href="([^"]+)""#).unwrap());

    let num = |re: &Regex| {
        re.captures(html)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };

    DescriptionStats {
        article_url: re_href
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| html_escape::decode_html_entities(m.as_str()).to_string()),
        points: num(re_points),
        comments: num(re_comments),
    }
}

pub struct HnRssProvider {
    mode: Mode,
    limit: usize,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl HnRssProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn parse_items_from_str(s: &str, limit: usize) -> Result<Vec<ContentItem>> {
        crate::ingest::ensure_metrics_described();
        let t0 = std::time::Instant::now();
        let rss: Rss = from_str(s).context("parsing hn rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(limit));
        for it in rss.channel.item.into_iter().take(limit) {
            let description = it.description.unwrap_or_default();
            let stats = parse_description(&description);
            let link = it.link.unwrap_or_default().trim().to_string();

            out.push(ContentItem::Story(Story {
                title: normalize_text(it.title.as_deref().unwrap_or_default()),
                url: stats.article_url.unwrap_or_else(|| link.clone()),
                hn_url: link,
                discussion_url: it.comments.map(|c| c.trim().to_string()),
                author: it
                    .creator
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty()),
                published: it.pub_date.as_deref().and_then(parse_rfc2822),
                points: stats.points,
                comments_count: stats.comments,
                description: String::new(),
            }));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("provider_parse_ms", "provider" => "hackernews").record(ms);
        counter!("provider_items_total", "provider" => "hackernews").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ItemSource for HnRssProvider {
    async fn fetch_batch(&self) -> Result<Vec<ContentItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s, self.limit),
            Mode::Http { url, client } => {
                tracing::info!(target: "providers", %url, "fetching hacker news stories");
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("hn http get()")?
                    .error_for_status()
                    .context("hn non-2xx")?
                    .text()
                    .await
                    .context("hn http .text()")?;
                Self::parse_items_from_str(&body, self.limit).inspect_err(|_| {
                    counter!("provider_errors_total", "provider" => "hackernews").increment(1);
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "hackernews"
    }
}

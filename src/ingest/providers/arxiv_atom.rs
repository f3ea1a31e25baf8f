// src/ingest/providers/arxiv_atom.rs
//! arXiv export API (Atom) provider for the paper rankings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::normalize_text;
use crate::ingest::types::{ContentItem, ItemSource, Paper};

/// Categories queried in one combined request.
pub const CATEGORIES: &[&str] = &[
    "cs", "q-bio.BM", "q-bio.NC", "econ.GN", "q-fin.ST", "math.NT", "math.PR", "physics", "eess",
    "stat",
];

pub const DEFAULT_API_BASE: &str = "http://export.arxiv.org/api/query";
pub const DEFAULT_MAX_RESULTS: usize = 100;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    published: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    #[serde(rename = "author", default)]
    author: Vec<Author>,
    #[serde(rename = "link", default)]
    link: Vec<Link>,
    #[serde(rename = "category", default)]
    category: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@title", default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: Option<String>,
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build the export API query URL for the configured categories.
pub fn query_url(base: &str, max_results: usize) -> String {
    let query = CATEGORIES
        .iter()
        .map(|c| format!("cat:{c}"))
        .collect::<Vec<_>>()
        .join("+OR+");
    format!(
        "{base}?search_query={query}&sortBy=submittedDate&sortOrder=descending&max_results={max_results}"
    )
}

pub struct ArxivProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl ArxivProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<ContentItem>> {
        crate::ingest::ensure_metrics_described();
        let t0 = std::time::Instant::now();
        let feed: Feed = from_str(s).context("parsing arxiv atom xml")?;

        let mut out = Vec::with_capacity(feed.entry.len());
        for e in feed.entry {
            let entry_id = e.id.unwrap_or_default().trim().to_string();
            let pdf_url = e
                .link
                .iter()
                .find(|l| l.title.as_deref() == Some("pdf"))
                .and_then(|l| l.href.clone());

            out.push(ContentItem::Paper(Paper {
                title: normalize_text(e.title.as_deref().unwrap_or_default()),
                entry_id,
                pdf_url,
                authors: e
                    .author
                    .into_iter()
                    .filter_map(|a| a.name.map(|n| n.trim().to_string()))
                    .filter(|n| !n.is_empty())
                    .collect(),
                published: e.published.as_deref().and_then(parse_rfc3339),
                summary: normalize_text(e.summary.as_deref().unwrap_or_default()),
                categories: e.category.into_iter().filter_map(|c| c.term).collect(),
            }));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("provider_parse_ms", "provider" => "arxiv").record(ms);
        counter!("provider_items_total", "provider" => "arxiv").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ItemSource for ArxivProvider {
    async fn fetch_batch(&self) -> Result<Vec<ContentItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, client } => {
                tracing::info!(target: "providers", %url, "fetching arxiv papers");
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("arxiv http get()")?
                    .error_for_status()
                    .context("arxiv non-2xx")?
                    .text()
                    .await
                    .context("arxiv http .text()")?;
                Self::parse_items_from_str(&body).inspect_err(|_| {
                    counter!("provider_errors_total", "provider" => "arxiv").increment(1);
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "arxiv"
    }
}

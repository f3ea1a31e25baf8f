// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A preprint as delivered by the paper feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Paper {
    pub title: String,
    /// Canonical abstract URL, e.g. `http://arxiv.org/abs/2401.01234v1`.
    pub entry_id: String,
    pub pdf_url: Option<String>,
    pub authors: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    pub summary: String,
    pub categories: Vec<String>,
}

/// A link-aggregator story (Hacker News front page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Story {
    pub title: String,
    /// Article URL (falls back to the discussion link when the post has none).
    pub url: String,
    pub hn_url: String,
    pub discussion_url: Option<String>,
    pub author: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub points: u32,
    pub comments_count: u32,
    pub description: String,
}

/// One fetched record from a ranked source. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Paper(Paper),
    Story(Story),
}

impl ContentItem {
    pub fn title(&self) -> &str {
        match self {
            ContentItem::Paper(p) => &p.title,
            ContentItem::Story(s) => &s.title,
        }
    }

    /// Unique identity inside a batch.
    pub fn url(&self) -> &str {
        match self {
            ContentItem::Paper(p) => &p.entry_id,
            ContentItem::Story(s) => &s.url,
        }
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        match self {
            ContentItem::Paper(p) => p.published,
            ContentItem::Story(s) => s.published,
        }
    }

    /// Actors credited with the item: paper authors or the story submitter.
    pub fn actors(&self) -> Vec<&str> {
        match self {
            ContentItem::Paper(p) => p.authors.iter().map(String::as_str).collect(),
            ContentItem::Story(s) => s.author.as_deref().into_iter().collect(),
        }
    }

    /// Text used for keyword matching (title + summary/description).
    pub fn text(&self) -> String {
        match self {
            ContentItem::Paper(p) => format!("{} {}", p.title, p.summary),
            ContentItem::Story(s) if s.description.is_empty() => s.title.clone(),
            ContentItem::Story(s) => format!("{} {}", s.title, s.description),
        }
    }

    /// `(points, comments)` for stories. Papers carry no engagement.
    pub fn engagement(&self) -> Option<(u32, u32)> {
        match self {
            ContentItem::Paper(_) => None,
            ContentItem::Story(s) => Some((s.points, s.comments_count)),
        }
    }

    /// Items without a title or identity cannot be displayed or linked.
    pub fn is_well_formed(&self) -> bool {
        !self.title().trim().is_empty() && !self.url().trim().is_empty()
    }
}

/// Upstream fetcher for one ranked content domain.
#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_batch(&self) -> Result<Vec<ContentItem>>;
    fn name(&self) -> &'static str;
}

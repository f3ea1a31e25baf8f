//! Display records for ranked items. Raw scores are carried alongside the
//! printable fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyze::scoring::{ScoredItem, SortMethod};
use crate::ingest::domain_of;
use crate::ingest::types::{ContentItem, Paper, Story};

pub const SUMMARY_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaperView {
    pub title: String,
    pub url: String,
    pub authors: Vec<String>,
    /// ISO date (`YYYY-MM-DD`), empty when unknown.
    pub published: String,
    pub summary: String,
    pub categories: Vec<String>,
    pub score: f64,
    pub paper_id: String,
    pub method: SortMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryView {
    pub title: String,
    pub url: String,
    pub hn_url: String,
    pub points: u32,
    pub num_comments: u32,
    /// `YYYY-MM-DD HH:MM:SS` UTC, empty when unknown.
    pub published: String,
    pub by: String,
    /// Rounded to one decimal.
    pub score: f64,
    pub raw_score: f64,
    pub time_ago: String,
    pub domain: String,
    pub discussion_url: String,
    pub method: SortMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DisplayItem {
    Paper(PaperView),
    Story(StoryView),
}

impl DisplayItem {
    pub fn title(&self) -> &str {
        match self {
            DisplayItem::Paper(p) => &p.title,
            DisplayItem::Story(s) => &s.title,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            DisplayItem::Paper(p) => p.score,
            DisplayItem::Story(s) => s.raw_score,
        }
    }
}

/// Cut to `max` chars and append `...` when anything was dropped.
pub fn truncate_summary(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Last path segment of an entry URL: `http://arxiv.org/abs/2401.01234v1` -> `2401.01234v1`.
pub fn entry_id_of(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Human "N units ago" label.
pub fn time_ago(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - published).num_seconds().max(0);
    let days = secs / 86_400;
    let rem = secs % 86_400;
    if days > 0 {
        plural(days, "day")
    } else if rem >= 3_600 {
        plural(rem / 3_600, "hour")
    } else if rem >= 60 {
        plural(rem / 60, "minute")
    } else {
        plural(rem, "second")
    }
}

pub fn format_paper(p: &Paper, score: f64, method: SortMethod) -> PaperView {
    PaperView {
        title: p.title.clone(),
        url: p.pdf_url.clone().unwrap_or_else(|| p.entry_id.clone()),
        authors: p.authors.clone(),
        published: p
            .published
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        summary: truncate_summary(&p.summary, SUMMARY_MAX_CHARS),
        categories: p.categories.clone(),
        score,
        paper_id: entry_id_of(&p.entry_id),
        method,
    }
}

pub fn format_story(s: &Story, score: f64, method: SortMethod, now: DateTime<Utc>) -> StoryView {
    let discussion_url = s
        .discussion_url
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| s.hn_url.clone());
    StoryView {
        title: s.title.clone(),
        url: s.url.clone(),
        hn_url: s.hn_url.clone(),
        points: s.points,
        num_comments: s.comments_count,
        published: s
            .published
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        by: s
            .author
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string()),
        score: (score * 10.0).round() / 10.0,
        raw_score: score,
        time_ago: s.published.map(|p| time_ago(p, now)).unwrap_or_default(),
        domain: domain_of(&s.url).unwrap_or_default(),
        discussion_url,
        method,
    }
}

pub fn format_scored(scored: &ScoredItem, now: DateTime<Utc>) -> DisplayItem {
    match &scored.item {
        ContentItem::Paper(p) => DisplayItem::Paper(format_paper(p, scored.score, scored.method)),
        ContentItem::Story(s) => {
            DisplayItem::Story(format_story(s, scored.score, scored.method, now))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn summary_truncates_at_150_chars() {
        let long = "a".repeat(200);
        let t = truncate_summary(&long, SUMMARY_MAX_CHARS);
        assert_eq!(t.chars().count(), 153);
        assert!(t.ends_with("..."));
        assert_eq!(truncate_summary("short", SUMMARY_MAX_CHARS), "short");
    }

    #[test]
    fn summary_truncation_respects_char_boundaries() {
        let s = "é".repeat(151);
        let t = truncate_summary(&s, 150);
        assert_eq!(t.chars().count(), 153);
    }

    #[test]
    fn entry_id_is_last_segment() {
        assert_eq!(entry_id_of("http://arxiv.org/abs/2401.01234v1"), "2401.01234v1");
        assert_eq!(entry_id_of("http://arxiv.org/abs/hep-th/9901001v2/"), "9901001v2");
    }

    #[test]
    fn time_ago_pluralizes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now - Duration::days(1), now), "1 day ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now, now), "0 seconds ago");
    }

    #[test]
    fn paper_view_prefers_pdf_url() {
        let p = Paper {
            title: "T".into(),
            entry_id: "http://arxiv.org/abs/1234.5678v1".into(),
            pdf_url: Some("http://arxiv.org/pdf/1234.5678v1".into()),
            published: Some(Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap()),
            ..Default::default()
        };
        let v = format_paper(&p, 42.0, SortMethod::Hot);
        assert_eq!(v.url, "http://arxiv.org/pdf/1234.5678v1");
        assert_eq!(v.paper_id, "1234.5678v1");
        assert_eq!(v.published, "2024-03-05");
    }

    #[test]
    fn story_view_fills_fallbacks() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let s = Story {
            title: "T".into(),
            url: "https://www.example.org/x".into(),
            hn_url: "https://news.ycombinator.com/item?id=9".into(),
            published: Some(now - Duration::hours(2)),
            ..Default::default()
        };
        let v = format_story(&s, 12.345, SortMethod::New, now);
        assert_eq!(v.by, "Anonymous");
        assert_eq!(v.domain, "example.org");
        assert_eq!(v.discussion_url, "https://news.ycombinator.com/item?id=9");
        assert_eq!(v.score, 12.3);
        assert_eq!(v.raw_score, 12.345);
        assert_eq!(v.time_ago, "2 hours ago");
    }
}

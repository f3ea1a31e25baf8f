//! Rank scores for papers and stories.
//!
//! Every method returns a value in `[0, 100]`:
//! - `hot`    : 0.5 recency + 0.3 keyword relevance + 0.2 actor activity
//! - `rising` : 0.6 piecewise recency + 0.4 novelty
//! - `new`    : pure recency (days for papers, hours for stories)
//!
//! Stories also carry points and comments, which take weight from the text
//! signals:
//! - `hot`    : 0.4 recency + 0.3 interaction + 0.2 keyword + 0.1 actor
//! - `rising` : 0.5 piecewise recency + 0.3 discussion + 0.2 novelty
//!
//! The constants are empirically tuned; keep them literal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::{CorpusContext, KeywordPolicy};
use crate::ingest::types::ContentItem;

const SECS_PER_DAY: f64 = 86_400.0;
const MIN_AGE_DAYS: f64 = 0.1;
/// Items without a timestamp are scored as if published this long ago.
const MISSING_AGE_DAYS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMethod {
    Hot,
    Rising,
    New,
}

impl SortMethod {
    pub const ALL: [SortMethod; 3] = [SortMethod::Hot, SortMethod::Rising, SortMethod::New];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMethod::Hot => "hot",
            SortMethod::Rising => "rising",
            SortMethod::New => "new",
        }
    }
}

impl fmt::Display for SortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(SortMethod::Hot),
            "rising" => Ok(SortMethod::Rising),
            "new" => Ok(SortMethod::New),
            other => anyhow::bail!("unknown sort method: {other}"),
        }
    }
}

/// Granularity of the `new` recency curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyScale {
    /// 0–365 day curve, used for papers.
    Days,
    /// 0–24 hour curve, used for fast-moving stories.
    Hours,
}

/// Everything a scorer needs besides the item itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoreParams<'a> {
    pub context: &'a CorpusContext,
    pub policy: &'a KeywordPolicy,
    pub scale: RecencyScale,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: ContentItem,
    pub score: f64,
    pub method: SortMethod,
}

fn clamp_score(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Age in days, floored at 0.1 so fresh items never divide by ~zero.
pub fn age_days(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match published {
        Some(p) => {
            let secs = (now - p).num_milliseconds() as f64 / 1_000.0;
            (secs / SECS_PER_DAY).max(MIN_AGE_DAYS)
        }
        None => MISSING_AGE_DAYS,
    }
}

/// Age in hours, never negative.
pub fn age_hours(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match published {
        Some(p) => ((now - p).num_milliseconds() as f64 / 3_600_000.0).max(0.0),
        None => MISSING_AGE_DAYS * 24.0,
    }
}

pub fn hot_recency(days: f64) -> f64 {
    100.0 / (days + 1.0)
}

/// 100 -> 0 over the first 30 days, then 50 -> 0 over the next 335.
pub fn rising_recency(days: f64) -> f64 {
    if days <= 30.0 {
        100.0 * (1.0 - days / 30.0)
    } else {
        (50.0 * (1.0 - (days - 30.0) / 335.0)).max(0.0)
    }
}

/// 100 -> 80 (0–30d), 80 -> 30 (30–90d), 30 -> 0 (90–365d), 0 after.
pub fn new_recency_days(days: f64) -> f64 {
    let s = if days <= 30.0 {
        100.0 - (days / 30.0) * 20.0
    } else if days <= 90.0 {
        80.0 - ((days - 30.0) / 60.0) * 50.0
    } else {
        let over = (days - 90.0).min(275.0);
        30.0 - (over / 275.0) * 30.0
    };
    clamp_score(s)
}

/// 100 -> 0 linearly over the first 24 hours.
pub fn new_recency_hours(hours: f64) -> f64 {
    clamp_score(100.0 - hours * (100.0 / 24.0))
}

/// `min(100, 10 × trending keywords contained in the item text)`.
pub fn keyword_score(text_lower: &str, ctx: &CorpusContext) -> f64 {
    let hits = ctx
        .trending_keywords
        .iter()
        .filter(|k| text_lower.contains(k.as_str()))
        .count();
    (hits as f64 * 10.0).min(100.0)
}

/// `min(100, 5 × summed batch activity of the item's actors)`.
pub fn actor_score(item: &ContentItem, ctx: &CorpusContext) -> f64 {
    let total: u64 = item
        .actors()
        .iter()
        .map(|a| u64::from(ctx.activity_of(a.trim())))
        .sum();
    (total as f64 * 5.0).min(100.0)
}

/// `min(100, 2 × distinct significant words outside the trending set)`.
pub fn novelty_score(text: &str, ctx: &CorpusContext, policy: &KeywordPolicy) -> f64 {
    let uncommon: std::collections::HashSet<String> = policy
        .significant_words(text)
        .filter(|w| !ctx.is_trending(w))
        .collect();
    (uncommon.len() as f64 * 2.0).min(100.0)
}

/// Log-scaled points + comments; 1000 interactions saturate at 100.
pub fn interaction_score(points: u32, comments: u32) -> f64 {
    let total = f64::from(points) + f64::from(comments);
    (100.0 * total.ln_1p() / 1000f64.ln_1p()).min(100.0)
}

/// Comments per point, capped at 2, scaled to [0, 100].
pub fn discussion_score(points: u32, comments: u32) -> f64 {
    let ratio = f64::from(comments) / f64::from(points.max(1));
    ratio.min(2.0) * 50.0
}

pub fn hot_score(item: &ContentItem, p: &ScoreParams<'_>) -> f64 {
    let recency = hot_recency(age_days(item.published(), p.now));
    let text = item.text().to_lowercase();
    let keyword = keyword_score(&text, p.context);
    let actor = actor_score(item, p.context);
    let s = match item.engagement() {
        Some((points, comments)) => {
            0.4 * recency
                + 0.3 * interaction_score(points, comments)
                + 0.2 * keyword
                + 0.1 * actor
        }
        None => 0.5 * recency + 0.3 * keyword + 0.2 * actor,
    };
    clamp_score(s)
}

pub fn rising_score(item: &ContentItem, p: &ScoreParams<'_>) -> f64 {
    let recency = rising_recency(age_days(item.published(), p.now));
    let novelty = novelty_score(&item.text(), p.context, p.policy);
    let s = match item.engagement() {
        Some((points, comments)) => {
            0.5 * recency + 0.3 * discussion_score(points, comments) + 0.2 * novelty
        }
        None => 0.6 * recency + 0.4 * novelty,
    };
    clamp_score(s)
}

pub fn new_score(item: &ContentItem, p: &ScoreParams<'_>) -> f64 {
    match p.scale {
        RecencyScale::Days => new_recency_days(age_days(item.published(), p.now)),
        RecencyScale::Hours => new_recency_hours(age_hours(item.published(), p.now)),
    }
}

/// Pure and deterministic for a fixed `p.now`.
pub fn score(item: &ContentItem, method: SortMethod, p: &ScoreParams<'_>) -> f64 {
    match method {
        SortMethod::Hot => hot_score(item, p),
        SortMethod::Rising => rising_score(item, p),
        SortMethod::New => new_score(item, p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::context::build_context;
    use crate::ingest::types::{Paper, Story};
    use chrono::Duration;

    fn paper_aged(now: DateTime<Utc>, days: f64) -> ContentItem {
        ContentItem::Paper(Paper {
            title: "Untitled".into(),
            entry_id: "http://arxiv.org/abs/0000.0000v1".into(),
            published: Some(now - Duration::milliseconds((days * SECS_PER_DAY * 1000.0) as i64)),
            ..Default::default()
        })
    }

    #[test]
    fn sort_method_parses_case_insensitively() {
        assert_eq!("HOT".parse::<SortMethod>().unwrap(), SortMethod::Hot);
        assert_eq!(" rising ".parse::<SortMethod>().unwrap(), SortMethod::Rising);
        assert!("top".parse::<SortMethod>().is_err());
    }

    #[test]
    fn new_curve_hits_segment_boundaries() {
        assert!((new_recency_days(0.0) - 100.0).abs() < 1e-9);
        assert!((new_recency_days(30.0) - 80.0).abs() < 1e-9);
        assert!((new_recency_days(90.0) - 30.0).abs() < 1e-9);
        assert!(new_recency_days(365.0).abs() < 1e-9);
        assert!(new_recency_days(5_000.0).abs() < 1e-9);
    }

    #[test]
    fn rising_curve_is_piecewise() {
        assert!((rising_recency(15.0) - 50.0).abs() < 1e-9);
        // discontinuity at 30 days: 0 from the first segment, 50 from the second
        assert!(rising_recency(30.0).abs() < 1e-9);
        assert!((rising_recency(30.0001) - 50.0).abs() < 1e-3);
        assert_eq!(rising_recency(400.0), 0.0);
    }

    #[test]
    fn hours_curve_reaches_zero_after_a_day() {
        assert!((new_recency_hours(0.0) - 100.0).abs() < 1e-9);
        assert!((new_recency_hours(12.0) - 50.0).abs() < 1e-9);
        assert_eq!(new_recency_hours(30.0), 0.0);
    }

    #[test]
    fn age_is_floored_for_future_and_fresh_items() {
        let now = Utc::now();
        assert_eq!(age_days(Some(now + Duration::days(2)), now), MIN_AGE_DAYS);
        assert_eq!(age_hours(Some(now + Duration::hours(2)), now), 0.0);
        assert_eq!(age_days(None, now), MISSING_AGE_DAYS);
    }

    #[test]
    fn fresh_paper_hot_score_is_recency_only_without_signals() {
        let now = Utc::now();
        let item = paper_aged(now, 0.0);
        let ctx = CorpusContext::default();
        let p = ScoreParams {
            context: &ctx,
            policy: &KeywordPolicy::PAPERS,
            scale: RecencyScale::Days,
            now,
        };
        // 0.5 * 100 / 1.1
        let expected = 0.5 * 100.0 / 1.1;
        assert!((hot_score(&item, &p) - expected).abs() < 1e-9);
    }

    #[test]
    fn keyword_and_actor_signals_raise_hot_score() {
        let now = Utc::now();
        let mk = |title: &str, authors: &[&str]| {
            ContentItem::Paper(Paper {
                title: title.into(),
                entry_id: format!("http://arxiv.org/abs/{title}"),
                authors: authors.iter().map(|s| s.to_string()).collect(),
                published: Some(now - Duration::days(3)),
                ..Default::default()
            })
        };
        let batch = vec![
            mk("transformer scaling laws", &["Ada"]),
            mk("transformer scaling limits", &["Ada"]),
            mk("unrelated botany survey", &["Bob"]),
        ];
        let policy = KeywordPolicy {
            top_k: 2,
            ..KeywordPolicy::PAPERS
        };
        let ctx = build_context(&batch, &policy);
        assert_eq!(ctx.trending_keywords, vec!["transformer", "scaling"]);
        let p = ScoreParams {
            context: &ctx,
            policy: &policy,
            scale: RecencyScale::Days,
            now,
        };
        assert!(hot_score(&batch[0], &p) > hot_score(&batch[2], &p));
    }

    #[test]
    fn novelty_counts_distinct_uncommon_words() {
        let ctx = CorpusContext::default();
        let n = novelty_score("graph graph neural networks", &ctx, &KeywordPolicy::PAPERS);
        assert_eq!(n, 6.0);
    }

    #[test]
    fn non_finite_scores_collapse_to_zero() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 0.0);
        assert_eq!(clamp_score(250.0), 100.0);
    }

    #[test]
    fn engagement_curves_are_bounded() {
        assert_eq!(interaction_score(0, 0), 0.0);
        assert_eq!(interaction_score(900, 400), 100.0);
        assert!((interaction_score(500, 500) - 100.0).abs() < 1e-9);
        assert_eq!(discussion_score(0, 0), 0.0);
        assert_eq!(discussion_score(10, 5), 25.0);
        // zero points counts as one; ratio capped at 2
        assert_eq!(discussion_score(0, 40), 100.0);
    }

    #[test]
    fn story_engagement_separates_equal_age_stories() {
        let now = Utc::now();
        let story = |title: &str, points: u32, comments_count: u32| {
            ContentItem::Story(Story {
                title: title.into(),
                url: format!("https://example.com/{title}"),
                hn_url: format!("https://news.ycombinator.com/item?id={points}"),
                published: Some(now - Duration::hours(3)),
                points,
                comments_count,
                ..Default::default()
            })
        };
        let quiet = story("quiet", 1, 0);
        let viral = story("viral", 900, 400);
        let ctx = CorpusContext::default();
        let p = ScoreParams {
            context: &ctx,
            policy: &KeywordPolicy::STORIES,
            scale: RecencyScale::Hours,
            now,
        };

        for method in [SortMethod::Hot, SortMethod::Rising] {
            let (q, v) = (score(&quiet, method, &p), score(&viral, method, &p));
            assert!(v > q, "{method}: viral {v} should beat quiet {q}");
            assert!((0.0..=100.0).contains(&v));
        }
        // `new` stays pure recency
        assert_eq!(score(&quiet, SortMethod::New, &p), score(&viral, SortMethod::New, &p));
    }
}

//! Aggregate statistics over a story batch (the "insights" panel).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::context::{trending_keywords, KeywordPolicy};
use crate::ingest::domain_of;
use crate::ingest::types::{ContentItem, Story};

pub const TOP_DOMAINS: usize = 10;
pub const TOP_RATIO_STORIES: usize = 5;
/// Stories with fewer comments are ignored by the agreement ranking.
pub const MIN_DISCUSSION: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Counted {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatioStory {
    pub title: String,
    /// points / comments, one decimal.
    pub ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StoryInsights {
    pub trending_keywords: Vec<Counted>,
    pub trending_domains: Vec<Counted>,
    pub avg_points: f64,
    pub avg_comments: f64,
    pub most_agreed: Vec<RatioStory>,
    pub most_controversial: Vec<RatioStory>,
    pub story_count: usize,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn stories(items: &[ContentItem]) -> impl Iterator<Item = &Story> {
    items.iter().filter_map(|it| match it {
        ContentItem::Story(s) => Some(s),
        ContentItem::Paper(_) => None,
    })
}

/// Top domains by story count; ties keep first-seen order.
pub fn trending_domains(items: &[ContentItem], top: usize) -> Vec<Counted> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Counted> = Vec::new();
    for d in stories(items).filter_map(|s| domain_of(&s.url)) {
        match index.get(&d) {
            Some(&i) => out[i].count += 1,
            None => {
                index.insert(d.clone(), out.len());
                out.push(Counted { name: d, count: 1 });
            }
        }
    }
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out.truncate(top);
    out
}

/// Empty batches produce the default (all-zero) insights.
pub fn story_insights(items: &[ContentItem]) -> StoryInsights {
    let batch: Vec<&Story> = stories(items).collect();
    if batch.is_empty() {
        return StoryInsights::default();
    }

    let policy = KeywordPolicy::STORIES.with_min_frequency(2);
    let trending_keywords = trending_keywords(batch.iter().map(|s| s.title.as_str()), &policy)
        .into_iter()
        .map(|(name, count)| Counted { name, count })
        .collect();

    let n = batch.len() as f64;
    let total_points: f64 = batch.iter().map(|s| f64::from(s.points)).sum();
    let total_comments: f64 = batch.iter().map(|s| f64::from(s.comments_count)).sum();

    let with_ratio: Vec<(&Story, f64)> = batch
        .iter()
        .filter(|s| s.comments_count >= MIN_DISCUSSION)
        .map(|s| (*s, f64::from(s.points) / f64::from(s.comments_count.max(1))))
        .collect();

    let to_view = |v: &[(&Story, f64)]| -> Vec<RatioStory> {
        v.iter()
            .take(TOP_RATIO_STORIES)
            .map(|(s, r)| RatioStory {
                title: s.title.clone(),
                ratio: round1(*r),
            })
            .collect()
    };

    let mut agreed = with_ratio.clone();
    agreed.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut controversial = with_ratio;
    controversial.sort_by(|a, b| a.1.total_cmp(&b.1));

    StoryInsights {
        trending_keywords,
        trending_domains: trending_domains(items, TOP_DOMAINS),
        avg_points: round1(total_points / n),
        avg_comments: round1(total_comments / n),
        most_agreed: to_view(&agreed),
        most_controversial: to_view(&controversial),
        story_count: batch.len(),
    }
}

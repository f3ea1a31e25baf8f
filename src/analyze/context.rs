//! Corpus context: batch-wide keyword trends and actor activity.
//!
//! Built once per ranking pass and shared by every item of that batch.

use std::collections::{HashMap, HashSet};

use crate::ingest::types::ContentItem;

/// Tokenization and truncation rules for one content domain.
#[derive(Debug, Clone, Copy)]
pub struct KeywordPolicy {
    /// Minimum token length in chars (inclusive).
    pub min_len: usize,
    /// How many keywords to keep.
    pub top_k: usize,
    /// Keywords seen fewer times than this are dropped.
    pub min_frequency: u32,
    pub stopwords: &'static [&'static str],
}

impl KeywordPolicy {
    /// Papers: words longer than four letters, top 50.
    pub const PAPERS: KeywordPolicy = KeywordPolicy {
        min_len: 5,
        top_k: 50,
        min_frequency: 1,
        stopwords: RESEARCH_STOPWORDS,
    };

    /// Stories: titles are short, so shorter words count; top 20.
    pub const STORIES: KeywordPolicy = KeywordPolicy {
        min_len: 3,
        top_k: 20,
        min_frequency: 1,
        stopwords: NEWS_STOPWORDS,
    };

    pub fn with_min_frequency(self, min_frequency: u32) -> Self {
        Self {
            min_frequency,
            ..self
        }
    }

    fn is_stopword(&self, w: &str) -> bool {
        self.stopwords.contains(&w)
    }

    /// Significant tokens of `text` under this policy, in order, duplicates kept.
    pub fn significant_words<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        tokenize(text).filter(move |w| w.chars().count() >= self.min_len && !self.is_stopword(w))
    }
}

/// Lowercase, whitespace-split, strip surrounding punctuation, drop empties.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|raw| {
        let w = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        (!w.is_empty()).then_some(w)
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusContext {
    /// Ordered by descending frequency, ties in encounter order.
    pub trending_keywords: Vec<String>,
    /// Parallel to `trending_keywords`.
    pub keyword_counts: Vec<u32>,
    pub actor_activity: HashMap<String, u32>,
    keyword_set: HashSet<String>,
}

impl CorpusContext {
    pub fn is_trending(&self, word: &str) -> bool {
        self.keyword_set.contains(word)
    }

    pub fn activity_of(&self, actor: &str) -> u32 {
        self.actor_activity.get(actor).copied().unwrap_or(0)
    }
}

/// Count words across all items and return the top `policy.top_k`.
pub fn trending_keywords<'a, I>(texts: I, policy: &KeywordPolicy) -> Vec<(String, u32)>
where
    I: IntoIterator<Item = &'a str>,
{
    // first-seen order is the tie-breaker, so keep an index alongside the map
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, u32)> = Vec::new();
    for text in texts {
        for w in policy.significant_words(text) {
            match index.get(&w) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(w.clone(), counts.len());
                    counts.push((w, 1));
                }
            }
        }
    }

    counts.retain(|(_, c)| *c >= policy.min_frequency);
    // stable sort keeps encounter order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(policy.top_k);
    counts
}

/// One increment per item for each distinct actor it lists.
pub fn actor_activity(items: &[ContentItem]) -> HashMap<String, u32> {
    let mut out: HashMap<String, u32> = HashMap::new();
    for it in items {
        let mut seen = HashSet::new();
        for actor in it.actors() {
            let a = actor.trim();
            if a.is_empty() || !seen.insert(a) {
                continue;
            }
            *out.entry(a.to_string()).or_insert(0) += 1;
        }
    }
    out
}

pub fn build_context(items: &[ContentItem], policy: &KeywordPolicy) -> CorpusContext {
    let texts: Vec<String> = items.iter().map(ContentItem::text).collect();
    let top = trending_keywords(texts.iter().map(String::as_str), policy);

    let (trending_keywords, keyword_counts): (Vec<String>, Vec<u32>) = top.into_iter().unzip();
    let keyword_set = trending_keywords.iter().cloned().collect();

    CorpusContext {
        trending_keywords,
        keyword_counts,
        actor_activity: actor_activity(items),
        keyword_set,
    }
}

/// Common English function words; only entries of five or more letters matter
/// under the paper policy, the rest are kept so the list reads naturally.
pub const RESEARCH_STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "and", "any", "are", "aren't",
    "because", "been", "before", "being", "below", "between", "both", "but", "cannot", "could",
    "couldn't", "did", "didn't", "does", "doesn't", "doing", "don't", "down", "during", "each",
    "few", "for", "from", "further", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "here", "how", "into", "itself", "just", "more", "most", "mustn't", "not", "off",
    "once", "only", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shan't", "she", "should", "shouldn't", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "thus", "too", "under", "until", "very", "was", "wasn't", "were", "weren't",
    "what", "when", "where", "which", "while", "who", "whom", "why", "with", "won't", "would",
    "wouldn't", "your", "yours", "yourself", "yourselves",
];

/// English stopwords plus words that carry no signal in tech-news titles.
pub const NEWS_STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "him", "his", "its", "let", "she", "too", "who", "did", "get",
    "got", "may", "own", "why", "how", "what", "when", "where", "which", "with", "from", "that",
    "this", "than", "then", "they", "them", "their", "there", "these", "those", "have", "been",
    "being", "into", "over", "under", "about", "after", "before", "again", "against", "between",
    "through", "during", "above", "below", "off", "once", "only", "other", "same", "some",
    "such", "very", "just", "more", "most", "your", "yours", "will", "would", "should", "could",
    "does", "doing", "each", "few", "further", "here", "nor", "now", "ours", "itself", "while",
    "whom", "were", "also", "via", "new", "using", "use", "used", "make", "made", "making",
    "build", "built", "building", "create", "created", "creating", "best", "top", "first",
    "latest", "show", "ask",
];

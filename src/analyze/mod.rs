//! Batch analysis: corpus context, rank scores and story insights.

pub mod context;
pub mod insights;
pub mod scoring;

pub use context::{build_context, CorpusContext, KeywordPolicy};
pub use insights::{story_insights, StoryInsights};
pub use scoring::{score, RecencyScale, ScoreParams, ScoredItem, SortMethod};

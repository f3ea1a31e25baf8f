//! The two cache tiers: upstream batches and rendered dashboard views.

pub mod dashboard;
pub mod source;

pub use dashboard::{DashboardCache, Lookup};
pub use source::SourceCache;

pub mod arxiv_atom;
pub mod google_trends;
pub mod hn_rss;

// tests/providers.rs
//
// Fixture parsing for the three upstream feeds.

use trend_radar::ingest::providers::{
    arxiv_atom::ArxivProvider,
    google_trends::{parse_trends_from_str, TrendsFeed, TrendsProvider},
    hn_rss::HnRssProvider,
};
use trend_radar::ingest::types::{ContentItem, ItemSource};

const ARXIV_XML: &str = include_str!("fixtures/arxiv_atom.xml");
const HN_XML: &str = include_str!("fixtures/hn_frontpage.xml");
const TRENDS_XML: &str = include_str!("fixtures/google_trends.xml");

#[tokio::test]
async fn arxiv_fixture_parses_entries() {
    let p = ArxivProvider::from_fixture(ARXIV_XML);
    assert_eq!(p.name(), "arxiv");
    let items = p.fetch_batch().await.expect("parse");
    assert_eq!(items.len(), 3);

    let ContentItem::Paper(first) = &items[0] else {
        panic!("expected a paper");
    };
    assert_eq!(first.title, "Sparse Transformer Scaling for Protein Folding");
    assert_eq!(first.entry_id, "http://arxiv.org/abs/2405.30001v1");
    assert_eq!(first.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2405.30001v1"));
    assert_eq!(first.authors, ["Ada Lovelace", "Alan Turing"]);
    assert_eq!(first.categories, ["cs.LG", "q-bio.BM"]);
    assert!(first.summary.starts_with("We study sparse transformer"));
    assert_eq!(
        first.published.map(|d| d.to_rfc3339()).as_deref(),
        Some("2024-05-31T12:00:00+00:00")
    );

    let ContentItem::Paper(last) = &items[2] else {
        panic!("expected a paper");
    };
    assert!(last.pdf_url.is_none());
}

#[tokio::test]
async fn hn_fixture_extracts_stats_and_links() {
    let p = HnRssProvider::from_fixture(HN_XML);
    assert_eq!(p.name(), "hackernews");
    let items = p.fetch_batch().await.expect("parse");
    assert_eq!(items.len(), 3);

    let ContentItem::Story(s) = &items[0] else {
        panic!("expected a story");
    };
    assert_eq!(s.title, "Show HN: A tiny Rust database");
    assert_eq!(s.url, "https://github.com/example/tinydb");
    assert_eq!(s.hn_url, "https://news.ycombinator.com/item?id=40000001");
    assert_eq!(s.author.as_deref(), Some("alice"));
    assert_eq!((s.points, s.comments_count), (240, 60));

    // self posts have no article link: fall back to the discussion
    let ContentItem::Story(ask) = &items[2] else {
        panic!("expected a story");
    };
    assert_eq!(ask.url, "https://news.ycombinator.com/item?id=40000003");
    assert!(ask.discussion_url.is_none());
}

#[tokio::test]
async fn hn_limit_truncates_feed() {
    let items = HnRssProvider::from_fixture(HN_XML)
        .with_limit(2)
        .fetch_batch()
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn trends_fixture_builds_digest() {
    let d = TrendsProvider::from_fixture(TRENDS_XML)
        .fetch_digest()
        .await
        .unwrap();
    assert_eq!(d.date, "2024-06-01");
    assert_eq!(d.trends.len(), 2);
    assert_eq!(d.trends[0].traffic, "200.000+");
    assert_eq!(d.trends[0].news_items[0].url, "https://sport.example.com/jadwal");
    assert!(d.trends[1].news_items.is_empty());
    assert!(d.trends[1].picture.is_none());
}

#[test]
fn malformed_feeds_are_errors() {
    assert!(ArxivProvider::parse_items_from_str("<feed><entry></feed>").is_err());
    assert!(HnRssProvider::parse_items_from_str("<rss><nochannel/></rss>", 10).is_err());
    assert!(parse_trends_from_str("", None).is_err());
}

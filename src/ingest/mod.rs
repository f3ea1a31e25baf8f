// src/ingest/mod.rs
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("provider_items_total", "Items parsed from upstream feeds.");
        describe_counter!(
            "provider_errors_total",
            "Upstream fetch/parse errors per provider."
        );
        describe_histogram!("provider_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Shared HTTP client for feed providers. Upstream calls are bounded here;
/// the source cache adds its own outer timeout on top.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent("trend-radar/0.1 (+https://github.com/trend-radar)")
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize curly quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Host part of an http(s) URL without a leading `www.`.
pub fn domain_of(url: &str) -> Option<String> {
    static RE_HOST: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_HOST.get_or_init(|| regex::Regex::new(r"^https?://(?:www\.)?([^/?#:]+)").unwrap());
    re.captures(url.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

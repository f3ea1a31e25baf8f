//! Minimal HTML rendering of the dashboard sections.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::Value;

/// Turns named view values into a page.
pub trait Renderer: Send + Sync {
    fn render(&self, sections: &[(String, Value)]) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    pub title: String,
}

impl HtmlRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn heading(name: &str) -> String {
    name.split('_')
        .map(|w| match w {
            "hn" => "Hacker News".to_string(),
            "arxiv" => "arXiv".to_string(),
            other => {
                let mut c = other.chars();
                match c.next() {
                    Some(f) => f.to_uppercase().chain(c).collect(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn link(out: &mut String, href: &str, text: &str) -> std::fmt::Result {
    write!(
        out,
        r#"<a href="{}" rel="noopener" target="_blank">{}</a>"#,
        encode_double_quoted_attribute(href),
        encode_text(text)
    )
}

fn ranked_item(out: &mut String, item: &Value) -> std::fmt::Result {
    out.push_str("<li>");
    link(out, str_field(item, "url"), str_field(item, "title"))?;
    let score = item.get("score").and_then(Value::as_f64).unwrap_or_default();
    write!(out, r#" <span class="score">{score:.1}</span>"#)?;

    let mut meta: Vec<String> = Vec::new();
    if let Some(authors) = item.get("authors").and_then(Value::as_array) {
        let names: Vec<&str> = authors.iter().filter_map(Value::as_str).take(3).collect();
        if !names.is_empty() {
            meta.push(names.join(", "));
        }
    }
    for key in ["by", "domain", "time_ago", "published"] {
        let v = str_field(item, key);
        if !v.is_empty() {
            meta.push(v.to_string());
        }
    }
    if let Some(points) = item.get("points").and_then(Value::as_u64) {
        meta.push(format!("{points} points"));
    }
    if !meta.is_empty() {
        write!(out, r#" <small>{}</small>"#, encode_text(&meta.join(" · ")))?;
    }
    let discussion = str_field(item, "discussion_url");
    if !discussion.is_empty() {
        out.push(' ');
        link(out, discussion, "discuss")?;
    }
    out.push_str("</li>");
    Ok(())
}

fn counted_list(out: &mut String, label: &str, v: Option<&Value>) -> std::fmt::Result {
    let Some(items) = v.and_then(Value::as_array).filter(|a| !a.is_empty()) else {
        return Ok(());
    };
    write!(out, "<h3>{}</h3><ul>", encode_text(label))?;
    for it in items {
        let name = it
            .get("name")
            .or_else(|| it.get("title"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let n = it
            .get("count")
            .or_else(|| it.get("ratio"))
            .map(Value::to_string)
            .unwrap_or_default();
        write!(out, "<li>{} <small>{}</small></li>", encode_text(name), encode_text(&n))?;
    }
    out.push_str("</ul>");
    Ok(())
}

fn insights(out: &mut String, v: &Value) -> std::fmt::Result {
    let avg_p = v.get("avg_points").and_then(Value::as_f64).unwrap_or_default();
    let avg_c = v.get("avg_comments").and_then(Value::as_f64).unwrap_or_default();
    write!(out, "<p>Average points {avg_p:.1}, average comments {avg_c:.1}</p>")?;
    counted_list(out, "Trending keywords", v.get("trending_keywords"))?;
    counted_list(out, "Trending domains", v.get("trending_domains"))?;
    counted_list(out, "Most agreed", v.get("most_agreed"))?;
    counted_list(out, "Most controversial", v.get("most_controversial"))
}

fn trends(out: &mut String, v: &Value) -> std::fmt::Result {
    write!(out, "<p>{}</p><ul>", encode_text(str_field(v, "date")))?;
    for t in v.get("trends").and_then(Value::as_array).into_iter().flatten() {
        write!(
            out,
            "<li>{} <small>{}</small>",
            encode_text(str_field(t, "title")),
            encode_text(str_field(t, "traffic"))
        )?;
        let news = t.get("news_items").and_then(Value::as_array);
        if let Some(news) = news.filter(|n| !n.is_empty()) {
            out.push_str("<ul>");
            for n in news {
                out.push_str("<li>");
                link(out, str_field(n, "url"), str_field(n, "title"))?;
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    Ok(())
}

fn section(out: &mut String, name: &str, value: &Value) -> std::fmt::Result {
    write!(
        out,
        r#"<section id="{}"><h2>{}</h2>"#,
        encode_double_quoted_attribute(name),
        encode_text(&heading(name))
    )?;
    match value {
        Value::Array(items) if !items.is_empty() => {
            out.push_str("<ol>");
            for it in items {
                ranked_item(out, it)?;
            }
            out.push_str("</ol>");
        }
        Value::Object(_) if value.get("trends").is_some() => trends(out, value)?,
        Value::Object(_) if value.get("avg_points").is_some() => insights(out, value)?,
        _ => out.push_str(r#"<p class="empty">No data available.</p>"#),
    }
    out.push_str("</section>");
    Ok(())
}

impl Renderer for HtmlRenderer {
    fn render(&self, sections: &[(String, Value)]) -> anyhow::Result<String> {
        let mut out = String::with_capacity(16 * 1024);
        write!(
            out,
            r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><title>{}</title></head><body><h1>{}</h1>"#,
            encode_text(&self.title),
            encode_text(&self.title)
        )?;
        for (name, value) in sections {
            section(&mut out, name, value)?;
        }
        out.push_str("</body></html>");
        Ok(out)
    }
}

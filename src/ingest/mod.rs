// src/ingest/mod.rs
pub mod providers;
pub mod types;

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::types::FeedItem;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

// <guid isPermaLink="false">...</guid>: attributes are ignored, only text matters.
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

/// Collapse whitespace runs (including newlines inside CDATA titles) and trim.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Government CMS feeds leak HTML entities that XML does not define.
pub fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&middot;", "·")
}

/// Parse an RSS 2.0 document and return its first `<item>`.
pub fn parse_first_item(xml: &str) -> Result<FeedItem, FetchError> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let first = rss
        .channel
        .item
        .into_iter()
        .next()
        .ok_or(FetchError::EmptyChannel)?;

    let title = normalize_text(first.title.as_deref().unwrap_or_default());
    let link = first.link.as_deref().unwrap_or_default().trim().to_string();
    let guid = first
        .guid
        .and_then(|g| g.value)
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty());

    let identifier = guid.unwrap_or_else(|| link.clone());
    if identifier.is_empty() {
        return Err(FetchError::Malformed(
            "first item has neither guid nor link".to_string(),
        ));
    }

    Ok(FeedItem {
        title,
        link,
        identifier,
        published_at: first
            .pub_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    })
}

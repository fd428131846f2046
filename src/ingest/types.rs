// src/ingest/types.rs
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::error::FetchError;

/// Newest entry of the feed, as extracted on one fetch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// `<guid>` when present, otherwise the link.
    pub identifier: String,
    pub published_at: Option<String>, // raw pubDate text
}

impl FeedItem {
    /// `published_at` as unix seconds, if it is valid RFC 2822.
    pub fn published_unix(&self) -> Option<i64> {
        let ts = self.published_at.as_deref()?;
        OffsetDateTime::parse(ts.trim(), &Rfc2822)
            .ok()
            .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
    }
}

/// Something that can produce the newest feed entry.
///
/// Implementations must return the first entry in document order; the feed is
/// expected to list newest entries first and no re-sorting by date happens.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<FeedItem, FetchError>;
    fn name(&self) -> &str;
}

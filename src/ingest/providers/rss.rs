// src/ingest/providers/rss.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::error::FetchError;
use crate::ingest::parse_first_item;
use crate::ingest::types::{FeedItem, FeedSource};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RssFeedProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl RssFeedProvider {
    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
                timeout: DEFAULT_FETCH_TIMEOUT,
            },
        }
    }

    /// Parses a static document on every fetch instead of going to the network.
    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    /// Per-request timeout for HTTP mode; no effect on fixtures.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Mode::Http { timeout: t, .. } = &mut self.mode {
            *t = timeout;
        }
        self
    }

    fn parse(&self, body: &str) -> Result<FeedItem, FetchError> {
        let t0 = std::time::Instant::now();
        let parsed = parse_first_item(body);
        histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        parsed
    }
}

#[async_trait]
impl FeedSource for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<FeedItem, FetchError> {
        let result = match &self.mode {
            Mode::Fixture(s) => self.parse(s),
            Mode::Http {
                url,
                client,
                timeout,
            } => fetch_http(client, url, *timeout)
                .await
                .and_then(|body| self.parse(&body)),
        };

        if let Err(e) = &result {
            tracing::warn!(error = %e, feed = %self.name, "feed fetch failed");
            counter!("watcher_fetch_errors_total").increment(1);
        }
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

async fn fetch_http(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let resp = client.get(url).timeout(timeout).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(resp.text().await?)
}

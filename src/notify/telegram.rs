use std::time::Duration;

use metrics::counter;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Notifier;
use crate::config::WatcherConfig;
use crate::error::NotifyError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramNotifier {
    credentials: Option<Credentials>,
    api_base: String,
    client: Client,
    timeout: Duration,
}

#[derive(Clone)]
struct Credentials {
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Either value missing (or blank) puts the notifier in log-only mode.
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        let nonblank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let credentials = match (nonblank(bot_token), nonblank(chat_id)) {
            (Some(bot_token), Some(chat_id)) => Some(Credentials { bot_token, chat_id }),
            _ => None,
        };
        Self {
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Credentials, API base and request timeout from the loaded watcher config.
    pub fn from_config(cfg: &WatcherConfig) -> Self {
        Self::new(cfg.bot_token.clone(), cfg.chat_id.clone())
            .with_api_base(cfg.telegram_api_base.clone())
            .with_timeout(cfg.fetch_timeout())
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let Some(creds) = &self.credentials else {
            tracing::info!(text = %text, "telegram disabled (no BOT_TOKEN/CHAT_ID), logging only");
            return Err(NotifyError::MissingCredentials);
        };

        // The URL embeds the token; errors are stripped of it before they reach logs.
        let url = format!("{}/bot{}/sendMessage", self.api_base, creds.bot_token);
        let payload = SendMessage {
            chat_id: &creds.chat_id,
            text,
            parse_mode: "HTML",
        };

        let rsp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = rsp.status();
        let body = rsp.text().await.map_err(|e| e.without_url())?;
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(ApiResponse { ok: true, .. }) => {
                counter!("watcher_notifications_sent_total").increment(1);
                Ok(())
            }
            Ok(ApiResponse { description, .. }) => Err(NotifyError::Rejected(
                description.unwrap_or_else(|| "ok=false".to_string()),
            )),
            Err(e) => Err(NotifyError::Rejected(format!("unreadable response: {e}"))),
        }
    }
}

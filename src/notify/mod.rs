// src/notify/mod.rs
pub mod telegram;

use crate::error::NotifyError;

pub use telegram::TelegramNotifier;

/// A chat destination that accepts one pre-rendered message per call.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// `text` is Telegram-HTML; anything derived from the feed must already be escaped.
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Messages the watcher can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NewItem { title: String, link: String },
    NoChange,
    FetchFailed { reason: String },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::NewItem { .. } => "new_item",
            Notification::NoChange => "no_change",
            Notification::FetchFailed { .. } => "fetch_failed",
        }
    }

    /// Render as Telegram-HTML. `feed_name` is operator config and is escaped too.
    pub fn render_html(&self, feed_name: &str) -> String {
        let feed = escape_html(feed_name);
        match self {
            Notification::NewItem { title, link } => format!(
                "📢 New {feed} press release!\n\n📰 {}\n🔗 {}",
                escape_html(title),
                escape_html(link)
            ),
            Notification::NoChange => {
                format!("ℹ️ No new {feed} press releases since the last check.")
            }
            Notification::FetchFailed { reason } => format!(
                "⚠️ Could not load the {feed} press-release feed.\n<i>{}</i>",
                escape_html(reason)
            ),
        }
    }
}

/// Escape `<`, `>` and `&` so text renders literally under `parse_mode=HTML`.
pub fn escape_html(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

//! Sends one message of each kind through the configured Telegram notifier
//! (log-only when BOT_TOKEN/CHAT_ID are unset). Handy for checking a new chat.

use anyhow::Result;
use press_watch::{Notification, Notifier, TelegramNotifier, WatcherConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = WatcherConfig::load()?;
    let notifier = TelegramNotifier::from_config(&cfg);

    let seq = [
        Notification::NewItem {
            title: "Demo <press release> & briefing".into(),
            link: "https://www.mofa.go.kr/www/brd/m_4080/view.do?seq=1&page=1".into(),
        },
        Notification::NoChange,
        Notification::FetchFailed {
            reason: "feed request timed out".into(),
        },
    ];

    for n in seq {
        let text = n.render_html(&cfg.feed_name);
        match notifier.send(&text).await {
            Ok(()) => tracing::info!(kind = n.kind(), "sent"),
            Err(e) => tracing::warn!(kind = n.kind(), error = %e, "not sent"),
        }
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    }

    println!("notify-demo done");
    Ok(())
}

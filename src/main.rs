//! press-watch: binary entrypoint.
//! Spawns the feed watcher and serves the liveness endpoint on $PORT until
//! Ctrl-C / SIGTERM, then stops the watcher.

use std::net::SocketAddr;

use anyhow::Context;
use press_watch::{Watcher, WatcherConfig};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact human logs by default, JSON lines when LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("press_watch=info,tower_http=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatcherConfig::load().context("loading configuration")?;
    tracing::info!(
        feed_url = %cfg.feed_url,
        schedule = ?cfg.schedule_mode,
        interval_secs = cfg.check_interval_secs,
        heartbeat = cfg.heartbeat,
        telegram = cfg.telegram_enabled(),
        "press-watch starting"
    );
    if !cfg.telegram_enabled() {
        tracing::warn!("BOT_TOKEN or CHAT_ID is empty; messages will only be logged");
    }

    let watcher = Watcher::from_config(&cfg).spawn();

    let app = press_watch::app(&cfg)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding liveness server on {addr}"))?;
    tracing::info!(%addr, "liveness endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("liveness server")?;

    match watcher.stop().await {
        Ok(state) => tracing::info!(last_seen = ?state.last_seen_id, "watcher stopped"),
        Err(e) => tracing::warn!(error = %e, "watcher task ended abnormally"),
    }
    Ok(())
}

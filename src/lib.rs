// src/lib.rs
// Public library surface for the binary, the demo bin and integration tests.

pub mod api;
pub mod change_detector;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::change_detector::{detect, Action, HeartbeatMode, WatcherState};
pub use crate::config::{ScheduleMode, WatcherConfig};
pub use crate::error::{FetchError, NotifyError};
pub use crate::ingest::types::{FeedItem, FeedSource};
pub use crate::notify::{Notification, Notifier, TelegramNotifier};
pub use crate::scheduler::{SchedulePolicy, Watcher, WatcherHandle};

use axum::Router;

/// Build the liveness server's router for `cfg`.
///
/// `/metrics` is only mounted (and the Prometheus recorder only installed) when
/// `metrics_enabled` is set; otherwise `/` is the whole surface.
pub fn app(cfg: &WatcherConfig) -> anyhow::Result<Router> {
    let metrics = if cfg.metrics_enabled {
        Some(metrics::Metrics::init()?)
    } else {
        None
    };
    Ok(api::create_router(metrics.as_ref()))
}

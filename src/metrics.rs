use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE.get_or_try_init(|| -> Result<PrometheusHandle> {
            let handle = PrometheusBuilder::new().install_recorder()?;
            describe();
            Ok(handle)
        })?;
        Ok(Self {
            handle: handle.clone(),
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("watcher_cycles_total", "Watcher cycles, labelled by outcome.");
    describe_counter!("watcher_new_items_total", "New feed items detected.");
    describe_counter!("watcher_fetch_errors_total", "Feed fetch/parse failures.");
    describe_counter!(
        "watcher_notify_errors_total",
        "Telegram deliveries that failed (log-only mode excluded)."
    );
    describe_counter!(
        "watcher_notifications_sent_total",
        "Messages accepted by Telegram."
    );
    describe_gauge!("watcher_last_cycle_ts", "Unix ts when the last cycle finished.");
    describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
}

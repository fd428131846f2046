// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::change_detector::{detect, Action, HeartbeatMode, WatcherState};
use crate::config::{ScheduleMode, WatcherConfig};
use crate::ingest::providers::rss::RssFeedProvider;
use crate::ingest::types::FeedSource;
use crate::notify::{Notifier, TelegramNotifier};

/// Longest single sleep while waiting for a wall-clock target. After a suspend the
/// monotonic timer may lag the wall clock; re-checking every slice bounds the delay.
const MAX_WAIT_SLICE: Duration = Duration::from_secs(30);

const SECS_PER_HOUR: i64 = 3600;

/// Wall-clock source for the aligned wait.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// Sleep this long after each cycle completes.
    FixedInterval(Duration),
    /// Fire at every top of the hour.
    HourlyAligned,
}

/// First top of the hour strictly after `now`.
pub fn next_top_of_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let next = (now.timestamp().div_euclid(SECS_PER_HOUR) + 1) * SECS_PER_HOUR;
    DateTime::from_timestamp(next, 0).unwrap_or_else(|| now + chrono::Duration::hours(1))
}

/// Unix hour index a timestamp falls in.
pub fn hour_slot(t: DateTime<Utc>) -> i64 {
    t.timestamp().div_euclid(SECS_PER_HOUR)
}

/// The fetch/detect/notify loop. Owns its `WatcherState` for its whole life.
pub struct Watcher {
    source: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    policy: SchedulePolicy,
    heartbeat: HeartbeatMode,
    run_on_start: bool,
    feed_name: String,
    clock: Clock,
    state: WatcherState,
}

impl Watcher {
    pub fn new(
        source: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
        policy: SchedulePolicy,
    ) -> Self {
        Self {
            source,
            notifier,
            policy,
            heartbeat: HeartbeatMode::default(),
            run_on_start: true,
            feed_name: "MOFA".to_string(),
            clock: Arc::new(Utc::now),
            state: WatcherState::default(),
        }
    }

    /// Live wiring: RSS over HTTP in, Telegram out.
    pub fn from_config(cfg: &WatcherConfig) -> Self {
        let source = RssFeedProvider::from_url(cfg.feed_name.clone(), cfg.feed_url.clone())
            .with_timeout(cfg.fetch_timeout());
        let notifier = TelegramNotifier::from_config(cfg);

        let policy = match cfg.schedule_mode {
            ScheduleMode::FixedInterval => SchedulePolicy::FixedInterval(cfg.check_interval()),
            ScheduleMode::HourlyAligned => SchedulePolicy::HourlyAligned,
        };

        Self::new(Arc::new(source), Arc::new(notifier), policy)
            .with_heartbeat(HeartbeatMode::from_flag(cfg.heartbeat))
            .with_run_on_start(cfg.run_on_start)
            .with_feed_name(cfg.feed_name.clone())
    }

    pub fn with_heartbeat(mut self, heartbeat: HeartbeatMode) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    pub fn with_feed_name(mut self, name: impl Into<String>) -> Self {
        self.feed_name = name.into();
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Resume from a previously returned state.
    pub fn with_state(mut self, state: WatcherState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    /// One fetch, one decision, at most one message. Never fails.
    pub async fn run_cycle(&mut self) -> Action {
        let outcome = self.source.fetch_latest().await;
        let (state, action) = detect(std::mem::take(&mut self.state), &outcome, self.heartbeat);
        self.state = state;

        match &action {
            Action::Initialize => {
                if let Ok(item) = &outcome {
                    tracing::info!(title = %item.title, id = %item.identifier, "watcher initialized");
                }
            }
            Action::NewItem(item) => {
                counter!("watcher_new_items_total").increment(1);
                tracing::info!(
                    title = %item.title,
                    link = %item.link,
                    published = ?item.published_unix(),
                    "new feed item"
                );
            }
            Action::NoChange { .. } => tracing::debug!("feed unchanged"),
            Action::FetchFailed { reason } => tracing::warn!(%reason, "fetch failed this cycle"),
        }

        if let Some(notification) = action.notification() {
            let text = notification.render_html(&self.feed_name);
            match self.notifier.send(&text).await {
                Ok(()) => tracing::info!(kind = notification.kind(), "notification sent"),
                Err(e) if e.is_disabled() => {
                    tracing::debug!(kind = notification.kind(), "delivery disabled")
                }
                Err(e) => {
                    counter!("watcher_notify_errors_total").increment(1);
                    tracing::warn!(error = %e, kind = notification.kind(), "notification failed");
                }
            }
        }

        counter!("watcher_cycles_total", "action" => action_label(&action)).increment(1);
        gauge!("watcher_last_cycle_ts").set(Utc::now().timestamp() as f64);
        action
    }

    /// Loop until `shutdown` flips to true. Returns the final state.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> WatcherState {
        tracing::info!(
            feed = %self.source.name(),
            policy = ?self.policy,
            heartbeat = ?self.heartbeat,
            "watcher started"
        );

        let stopped = *shutdown.borrow();
        if self.run_on_start && !stopped {
            self.run_cycle().await;
        }

        loop {
            let proceed = match self.policy {
                SchedulePolicy::FixedInterval(period) => {
                    sleep_or_shutdown(period, &mut shutdown).await
                }
                SchedulePolicy::HourlyAligned => self.wait_for_next_hour(&mut shutdown).await,
            };
            if !proceed {
                break;
            }
            self.run_cycle().await;
        }

        tracing::info!("watcher stopped");
        self.state
    }

    pub fn spawn(self) -> WatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        WatcherHandle { shutdown_tx, join }
    }

    async fn wait_for_next_hour(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        loop {
            let target = next_top_of_hour((self.clock)());
            tracing::debug!(%target, "waiting for top of hour");
            if !wait_until(target, &*self.clock, shutdown).await {
                return false;
            }
            let slot = hour_slot(target);
            if self.state.last_scheduled_hour == Some(slot) {
                tracing::debug!(slot, "hour already fired, skipping");
                continue;
            }
            self.state.last_scheduled_hour = Some(slot);
            return true;
        }
    }
}

fn action_label(action: &Action) -> &'static str {
    match action {
        Action::Initialize => "initialize",
        Action::NewItem(_) => "new_item",
        Action::NoChange { .. } => "no_change",
        Action::FetchFailed { .. } => "fetch_failed",
    }
}

/// Wait until the wall clock reaches `target`. Returns false on shutdown.
async fn wait_until(
    target: DateTime<Utc>,
    clock: &(dyn Fn() -> DateTime<Utc> + Send + Sync),
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        let now = clock();
        if now >= target {
            return true;
        }
        let remaining = (target - now).to_std().unwrap_or_default();
        if !sleep_or_shutdown(remaining.min(MAX_WAIT_SLICE), shutdown).await {
            return false;
        }
    }
}

/// Returns false if shutdown was requested before `period` elapsed.
/// A dropped sender means nobody can stop us, so we just sleep.
async fn sleep_or_shutdown(period: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let stopped = *shutdown.borrow();
    if stopped {
        return false;
    }
    let deadline = Instant::now() + period;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            changed = shutdown.changed() => match changed {
                Ok(()) => {
                    let stopped = *shutdown.borrow_and_update();
                    if stopped {
                        return false;
                    }
                }
                Err(_) => {
                    tokio::time::sleep_until(deadline).await;
                    return true;
                }
            },
        }
    }
}

/// Stop switch for a spawned watcher.
pub struct WatcherHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<WatcherState>,
}

impl WatcherHandle {
    /// Signal shutdown, interrupting any wait, and collect the final state.
    pub async fn stop(self) -> Result<WatcherState, tokio::task::JoinError> {
        let _ = self.shutdown_tx.send(true);
        self.join.await
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

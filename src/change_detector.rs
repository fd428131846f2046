//! change_detector.rs: decides what a fetch result means relative to what we saw last.
//!
//! `detect` is pure. The caller owns `WatcherState`, hands it in, and keeps the
//! returned value; nothing here touches the network or global state.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::ingest::types::FeedItem;
use crate::notify::Notification;

/// Process-lifetime watcher memory. A restart starts from `default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherState {
    pub last_seen_id: Option<String>,
    /// Unix hour index (`ts / 3600`) of the last aligned firing.
    pub last_scheduled_hour: Option<i64>,
}

impl WatcherState {
    pub fn is_initialized(&self) -> bool {
        self.last_seen_id.is_some()
    }
}

/// Whether an unchanged feed still produces a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatMode {
    #[default]
    Heartbeat,
    Silent,
}

impl HeartbeatMode {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            HeartbeatMode::Heartbeat
        } else {
            HeartbeatMode::Silent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// First successful fetch: remember it, say nothing.
    Initialize,
    NewItem(FeedItem),
    NoChange { heartbeat: bool },
    FetchFailed { reason: String },
}

impl Action {
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Action::Initialize => None,
            Action::NewItem(item) => Some(Notification::NewItem {
                title: item.title.clone(),
                link: item.link.clone(),
            }),
            Action::NoChange { heartbeat: true } => Some(Notification::NoChange),
            Action::NoChange { heartbeat: false } => None,
            Action::FetchFailed { reason } => Some(Notification::FetchFailed {
                reason: reason.clone(),
            }),
        }
    }
}

pub fn detect(
    mut state: WatcherState,
    outcome: &Result<FeedItem, FetchError>,
    heartbeat: HeartbeatMode,
) -> (WatcherState, Action) {
    let item = match outcome {
        Ok(item) => item,
        Err(e) => {
            return (
                state,
                Action::FetchFailed {
                    reason: e.to_string(),
                },
            )
        }
    };

    let action = match state.last_seen_id.as_deref() {
        None => Action::Initialize,
        Some(seen) if seen == item.identifier => Action::NoChange {
            heartbeat: heartbeat == HeartbeatMode::Heartbeat,
        },
        Some(_) => Action::NewItem(item.clone()),
    };

    if matches!(action, Action::Initialize | Action::NewItem(_)) {
        state.last_seen_id = Some(item.identifier.clone());
    }
    (state, action)
}

// src/error.rs
use thiserror::Error;

/// Why a feed fetch produced no item this cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("feed request timed out")]
    Timeout,

    #[error("feed responded with HTTP {0}")]
    Status(u16),

    #[error("malformed feed: {0}")]
    Malformed(String),

    #[error("feed channel has no items")]
    EmptyChannel,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e)
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("telegram responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("telegram rejected the message: {0}")]
    Rejected(String),

    #[error("BOT_TOKEN or CHAT_ID is not set")]
    MissingCredentials,
}

impl NotifyError {
    /// Log-only mode: nothing was attempted, so this is not a delivery failure.
    pub fn is_disabled(&self) -> bool {
        matches!(self, NotifyError::MissingCredentials)
    }
}

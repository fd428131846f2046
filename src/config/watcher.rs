// src/config/watcher.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr, time::Duration};

pub const ENV_CONFIG_PATH: &str = "WATCHER_CONFIG_PATH";
pub const DEFAULT_FEED_URL: &str = "https://www.mofa.go.kr/www/brd/rss.do?brdId=235";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleMode {
    #[default]
    FixedInterval,
    HourlyAligned,
}

impl FromStr for ScheduleMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fixed-interval" | "fixed" | "interval" => Ok(ScheduleMode::FixedInterval),
            "hourly-aligned" | "hourly" | "aligned" => Ok(ScheduleMode::HourlyAligned),
            other => Err(anyhow!(
                "unknown SCHEDULE_MODE '{other}' (expected fixed-interval or hourly-aligned)"
            )),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub feed_url: String,
    /// Label used in messages, e.g. "MOFA".
    pub feed_name: String,
    pub check_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub telegram_api_base: String,
    pub port: u16,
    pub schedule_mode: ScheduleMode,
    pub heartbeat: bool,
    pub run_on_start: bool,
    pub metrics_enabled: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            feed_name: "MOFA".to_string(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            fetch_timeout_secs: MAX_FETCH_TIMEOUT_SECS,
            bot_token: None,
            chat_id: None,
            telegram_api_base: crate::notify::telegram::DEFAULT_API_BASE.to_string(),
            port: 8080,
            schedule_mode: ScheduleMode::FixedInterval,
            heartbeat: true,
            run_on_start: true,
            metrics_enabled: false,
        }
    }
}

// Keep the bot token out of logs.
impl fmt::Debug for WatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherConfig")
            .field("feed_url", &self.feed_url)
            .field("feed_name", &self.feed_name)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("port", &self.port)
            .field("schedule_mode", &self.schedule_mode)
            .field("heartbeat", &self.heartbeat)
            .field("run_on_start", &self.run_on_start)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl WatcherConfig {
    /// Load from the process environment:
    /// 1) $WATCHER_CONFIG_PATH (TOML), if set
    /// 2) individual env vars on top
    pub fn load() -> Result<Self> {
        Self::load_with(|k| std::env::var(k).ok())
    }

    /// Same as `load`, with an injectable variable lookup.
    pub fn load_with<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match get(ENV_CONFIG_PATH) {
            Some(p) if !p.trim().is_empty() => Self::load_from_file(p.trim())?,
            _ => Self::default(),
        };
        cfg.apply_env(&get)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading watcher config from {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    fn apply_env<F>(&mut self, get: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| get(k).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("FEED_URL") {
            self.feed_url = v.trim().to_string();
        }
        if let Some(v) = var("FEED_NAME") {
            self.feed_name = v.trim().to_string();
        }
        // CHECK_INTERVAL_SEC is the older spelling; the long form wins.
        if let Some((k, v)) = var("CHECK_INTERVAL_SECONDS")
            .map(|v| ("CHECK_INTERVAL_SECONDS", v))
            .or_else(|| var("CHECK_INTERVAL_SEC").map(|v| ("CHECK_INTERVAL_SEC", v)))
        {
            self.check_interval_secs = parse_num(k, &v)?;
        }
        if let Some(v) = var("FETCH_TIMEOUT_SECONDS") {
            self.fetch_timeout_secs = parse_num("FETCH_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = var("BOT_TOKEN") {
            self.bot_token = Some(v.trim().to_string());
        }
        if let Some(v) = var("CHAT_ID") {
            self.chat_id = Some(v.trim().to_string());
        }
        if let Some(v) = var("TELEGRAM_API_BASE") {
            self.telegram_api_base = v.trim().to_string();
        }
        if let Some(v) = var("PORT") {
            self.port = parse_num("PORT", &v)?;
        }
        if let Some(v) = var("SCHEDULE_MODE") {
            self.schedule_mode = v.parse()?;
        }
        if let Some(v) = var("HEARTBEAT") {
            self.heartbeat = parse_bool("HEARTBEAT", &v)?;
        }
        if let Some(v) = var("RUN_ON_START") {
            self.run_on_start = parse_bool("RUN_ON_START", &v)?;
        }
        if let Some(v) = var("METRICS_ENABLED") {
            self.metrics_enabled = parse_bool("METRICS_ENABLED", &v)?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.feed_url.trim().is_empty() {
            bail!("FEED_URL must not be empty");
        }
        if self.check_interval_secs == 0 {
            bail!("CHECK_INTERVAL_SECONDS must be greater than 0");
        }
        // A file may carry `bot_token = ""`; normalise to unset.
        for v in [&mut self.bot_token, &mut self.chat_id] {
            *v = v.take().filter(|s| !s.trim().is_empty());
        }
        let clamped = self.fetch_timeout_secs.clamp(1, MAX_FETCH_TIMEOUT_SECS);
        if clamped != self.fetch_timeout_secs {
            tracing::warn!(
                requested = self.fetch_timeout_secs,
                used = clamped,
                "fetch timeout clamped"
            );
            self.fetch_timeout_secs = clamped;
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Same rule as `TelegramNotifier::new`: blank values count as unset.
    pub fn telegram_enabled(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.bot_token) && set(&self.chat_id)
    }
}

fn parse_num<T>(key: &str, v: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    v.trim()
        .parse::<T>()
        .with_context(|| format!("{key}='{v}' is not a valid number"))
}

fn parse_bool(key: &str, v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key}='{v}' is not a boolean")),
    }
}

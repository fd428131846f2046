// tests/common/mod.rs
//
// Shared test doubles: in-memory feed/notifier, plus tiny axum servers that
// stand in for the feed host and the Telegram Bot API.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use parking_lot::Mutex;
use press_watch::{FeedItem, FeedSource, FetchError, Notifier, NotifyError};

pub const TEST_TOKEN: &str = "123456-TEST";

/// Serve `router` on an ephemeral localhost port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    addr
}

pub fn item(id: &str) -> FeedItem {
    FeedItem {
        title: format!("Press release {id}"),
        link: format!("https://example.gov/press/{id}"),
        identifier: id.to_string(),
        published_at: None,
    }
}

/// What the scripted feed returns for one fetch.
pub enum Step {
    Item(FeedItem),
    Timeout,
}

/// Feed that replays a script, then repeats the last step forever.
pub struct ScriptedFeed {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<FeedItem>>,
    pub fetch_starts: Mutex<Vec<Instant>>,
}

impl ScriptedFeed {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            fetch_starts: Mutex::new(Vec::new()),
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_starts.lock().len()
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch_latest(&self) -> Result<FeedItem, FetchError> {
        self.fetch_starts.lock().push(Instant::now());
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Item(it)) => {
                *self.last.lock() = Some(it.clone());
                Ok(it)
            }
            Some(Step::Timeout) => Err(FetchError::Timeout),
            None => self.last.lock().clone().ok_or(FetchError::EmptyChannel),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Notifier that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().push(text.to_string());
        if self.fail {
            return Err(NotifyError::Status {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(())
    }
}

/// Feed host whose response can be switched between requests.
#[derive(Clone)]
pub struct FeedServer {
    pub body: Arc<Mutex<String>>,
    pub status: Arc<Mutex<StatusCode>>,
    pub delay: Arc<Mutex<Duration>>,
}

impl FeedServer {
    pub async fn start(initial_xml: &str) -> (Self, String) {
        let srv = Self {
            body: Arc::new(Mutex::new(initial_xml.to_string())),
            status: Arc::new(Mutex::new(StatusCode::OK)),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
        };
        let router = Router::new()
            .route("/rss", get(feed_handler))
            .with_state(srv.clone());
        let addr = serve(router).await;
        (srv, format!("http://{addr}/rss"))
    }

    pub fn set_body(&self, xml: &str) {
        *self.body.lock() = xml.to_string();
    }
}

async fn feed_handler(State(srv): State<FeedServer>) -> (StatusCode, String) {
    let delay = *srv.delay.lock();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let status = *srv.status.lock();
    let body = srv.body.lock().clone();
    (status, body)
}

/// Minimal Bot API: records `sendMessage` payloads and answers with a canned reply.
#[derive(Clone)]
pub struct FakeTelegram {
    pub received: Arc<Mutex<Vec<serde_json::Value>>>,
    pub reply: Arc<Mutex<(StatusCode, serde_json::Value)>>,
}

impl FakeTelegram {
    pub async fn start() -> (Self, String) {
        let fake = Self {
            received: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new((
                StatusCode::OK,
                serde_json::json!({ "ok": true, "result": { "message_id": 1 } }),
            ))),
        };
        let router = Router::new()
            .route(&format!("/bot{TEST_TOKEN}/sendMessage"), post(send_message))
            .with_state(fake.clone());
        let addr = serve(router).await;
        (fake, format!("http://{addr}"))
    }

    pub fn texts(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .filter_map(|v| v.get("text").and_then(|t| t.as_str()).map(str::to_string))
            .collect()
    }
}

async fn send_message(
    State(fake): State<FakeTelegram>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    fake.received.lock().push(body);
    let (status, reply) = fake.reply.lock().clone();
    (status, Json(reply))
}

/// Poll `cond` until it holds or `within` elapses.
pub async fn eventually<F: Fn() -> bool>(within: Duration, cond: F) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

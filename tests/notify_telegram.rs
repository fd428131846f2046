// tests/notify_telegram.rs
mod common;

use axum::http::StatusCode;
use common::{FakeTelegram, TEST_TOKEN};
use press_watch::{Notification, Notifier, NotifyError, TelegramNotifier};

fn notifier(base: &str) -> TelegramNotifier {
    TelegramNotifier::new(Some(TEST_TOKEN.into()), Some("-1001234".into())).with_api_base(base)
}

#[tokio::test]
async fn sends_html_message_to_chat() {
    let (fake, base) = FakeTelegram::start().await;
    let text = Notification::NewItem {
        title: "Talks on <trade> & security".into(),
        link: "https://example.gov/p?id=1&lang=en".into(),
    }
    .render_html("MOFA");

    notifier(&base).send(&text).await.expect("delivered");

    let got = fake.received.lock().clone();
    assert_eq!(got.len(), 1, "exactly one request per send");
    assert_eq!(got[0]["chat_id"], "-1001234");
    assert_eq!(got[0]["parse_mode"], "HTML");
    let body = got[0]["text"].as_str().unwrap();
    assert!(body.contains("Talks on &lt;trade&gt; &amp; security"));
    assert!(body.contains("https://example.gov/p?id=1&amp;lang=en"));
}

#[tokio::test]
async fn ok_false_is_rejected() {
    let (fake, base) = FakeTelegram::start().await;
    *fake.reply.lock() = (
        StatusCode::OK,
        serde_json::json!({ "ok": false, "description": "Bad Request: chat not found" }),
    );
    let err = notifier(&base).send("hi").await.unwrap_err();
    match err {
        NotifyError::Rejected(d) => assert!(d.contains("chat not found")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn http_error_carries_status() {
    let (fake, base) = FakeTelegram::start().await;
    *fake.reply.lock() = (
        StatusCode::UNAUTHORIZED,
        serde_json::json!({ "ok": false, "error_code": 401, "description": "Unauthorized" }),
    );
    let err = notifier(&base).send("hi").await.unwrap_err();
    assert!(
        matches!(err, NotifyError::Status { status: 401, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn unknown_token_path_is_404() {
    let (_fake, base) = FakeTelegram::start().await;
    let n = TelegramNotifier::new(Some("other:token".into()), Some("1".into())).with_api_base(base);
    let err = n.send("hi").await.unwrap_err();
    assert!(
        matches!(err, NotifyError::Status { status: 404, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn missing_credentials_sends_nothing() {
    let (fake, base) = FakeTelegram::start().await;
    let n = TelegramNotifier::new(None, Some("1".into())).with_api_base(base);
    let err = n.send("hi").await.unwrap_err();
    assert!(err.is_disabled());
    assert!(fake.received.lock().is_empty());
}

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{MessageFormatter, Notifier};
use crate::constants::WEBHOOK_TIMEOUT;
use crate::process_identification::types::TrackedProcess;

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    mentioned_list: &'a [String],
}

fn is_empty(list: &&[String]) -> bool {
    list.is_empty()
}

#[derive(Debug, Default, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Posts text messages to a group-bot style webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    mentions: Vec<String>,
    formatter: MessageFormatter,
}

impl WebhookNotifier {
    pub fn new(url: &str, mentions: Vec<String>, formatter: MessageFormatter) -> Result<Self> {
        Self::with_timeout(url, mentions, formatter, WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(
        url: &str,
        mentions: Vec<String>,
        formatter: MessageFormatter,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            mentions,
            formatter,
        })
    }

    async fn send(&self, content: &str, mentions: &[String]) -> Result<()> {
        let message = TextMessage {
            msgtype: "text",
            text: TextBody {
                content,
                mentioned_list: mentions,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .context("Failed to send webhook request")?;

        let status = response.status();
        if !status.is_success() {
            bail!("webhook responded with HTTP {status}");
        }

        let body: WebhookResponse = response
            .json()
            .await
            .context("Failed to parse webhook response")?;
        if body.errcode != 0 {
            bail!("webhook rejected message: errcode={} errmsg={}", body.errcode, body.errmsg);
        }

        debug!("webhook message delivered");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_completed(&self, process: &TrackedProcess) -> Result<()> {
        info!(pid = process.pid(), "sending completion notification");
        let content = self.formatter.format_completed(process);
        self.send(&content, &self.mentions).await
    }

    async fn notify_test(&self, message: &str) -> Result<()> {
        self.send(&self.formatter.format_test(message), &[]).await
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_identification::types::ProcessLocation;
    use crate::test_support::process_info;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Received = Arc<Mutex<Vec<Value>>>;

    /// Serves `reply` for every POST and records the request bodies.
    async fn serve(reply: Value) -> (String, Received) {
        let received = Received::default();
        let app = Router::new()
            .route(
                "/hook",
                post(
                    move |State(received): State<Received>, Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            received.lock().unwrap().push(body);
                            Json(reply)
                        }
                    },
                ),
            )
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        (format!("http://{addr}/hook"), received)
    }

    fn notifier(url: &str, mentions: Vec<String>) -> WebhookNotifier {
        WebhookNotifier::new(url, mentions, MessageFormatter::new(Duration::from_secs(300)))
            .unwrap()
    }

    fn completed() -> TrackedProcess {
        let now = Utc::now();
        let mut process = TrackedProcess::new(
            process_info(42, "bash backup.sh # MONITOR:nightly", now),
            ProcessLocation::Host,
            now,
        );
        process.finish(0, now);
        process
    }

    #[tokio::test]
    async fn posts_text_message_with_mentions() {
        let (url, received) = serve(json!({"errcode": 0, "errmsg": "ok"})).await;
        let notifier = notifier(&url, vec!["@all".into()]);

        notifier.notify_completed(&completed()).await.unwrap();

        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["msgtype"], "text");
        assert_eq!(bodies[0]["text"]["mentioned_list"], json!(["@all"]));
        let content = bodies[0]["text"]["content"].as_str().unwrap();
        assert!(content.contains("backup.sh completed"));
    }

    #[tokio::test]
    async fn test_message_has_no_mentions() {
        let (url, received) = serve(json!({"errcode": 0})).await;
        let notifier = notifier(&url, vec!["ops".into()]);

        notifier.notify_test("hello").await.unwrap();

        let bodies = received.lock().unwrap();
        assert!(bodies[0]["text"].get("mentioned_list").is_none());
        assert!(bodies[0]["text"]["content"].as_str().unwrap().contains("hello"));
    }

    #[tokio::test]
    async fn non_zero_errcode_is_an_error() {
        let (url, _received) = serve(json!({"errcode": 93000, "errmsg": "invalid key"})).await;
        let err = notifier(&url, Vec::new())
            .notify_test("hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("93000"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = notifier(&format!("http://{addr}/hook"), Vec::new())
            .notify_test("hello")
            .await;
        assert!(result.is_err());
    }
}

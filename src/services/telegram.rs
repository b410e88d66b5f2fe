//! Telegram Bot API transport for the command front-end.
//!
//! Long-polls `getUpdates`, hands each text message to the
//! [`CommandProcessor`], and posts the reply with `sendMessage`.

use std::time::Duration;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use super::commands::CommandProcessor;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Clone)]
pub struct TelegramBot {
    http: reqwest::Client,
    api_url: String,
    poll_timeout: u64,
    processor: CommandProcessor,
}

impl TelegramBot {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        poll_timeout: u64,
        processor: CommandProcessor,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout + 10))
            .build()
            .context("failed to build Telegram HTTP client")?;

        Ok(Self {
            http,
            api_url: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
            poll_timeout,
            processor,
        })
    }

    /// Poll until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Telegram command front-end started");
        let mut offset: i64 = 0;

        loop {
            let updates = tokio::select! {
                result = self.get_updates(offset) => result,
                _ = shutdown.changed() => break,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!("Telegram poll failed, retrying: {:#}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(RETRY_DELAY) => continue,
                        _ = shutdown.changed() => break,
                    }
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.dispatch(update).await;
            }
        }

        tracing::info!("Telegram command front-end stopped");
    }

    async fn dispatch(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let (Some(sender), Some(text)) = (message.from, message.text) else {
            return;
        };

        if let Some(reply) = self.processor.handle(sender.id, &text).await {
            if let Err(e) = self.send_message(message.chat.id, &reply).await {
                tracing::error!("Failed to reply to chat {}: {:#}", message.chat.id, e);
            }
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response: ApiResponse<Vec<Update>> = self
            .http
            .post(self.method_url("getUpdates"))
            .json(&json!({
                "offset": offset,
                "timeout": self.poll_timeout,
                "allowed_updates": ["message"],
            }))
            .send()
            .await
            .context("getUpdates request failed")?
            .json()
            .await
            .context("getUpdates returned malformed JSON")?;

        into_result(response, "getUpdates")
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .context("sendMessage request failed")?
            .json()
            .await
            .context("sendMessage returned malformed JSON")?;

        into_result(response, "sendMessage").map(|_| ())
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_url, method)
    }
}

fn into_result<T>(response: ApiResponse<T>, method: &str) -> Result<T> {
    if !response.ok {
        bail!(
            "Telegram {} failed: {}",
            method,
            response.description.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    response
        .result
        .with_context(|| format!("Telegram {} response had no result", method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{config_store::ConfigStore, item_store::ItemStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn bot(api_base: &str) -> (TempDir, TelegramBot) {
        let dir = TempDir::new().unwrap();
        let processor = CommandProcessor::new(
            Arc::new(ConfigStore::new(dir.path().join("config.json"))),
            Arc::new(ItemStore::new(dir.path().join("data.json"))),
        );
        let bot = TelegramBot::new(api_base, "123:ABC", 30, processor).unwrap();
        (dir, bot)
    }

    #[test]
    fn test_method_url() {
        let (_dir, bot) = bot("https://api.telegram.org/");
        assert_eq!(
            bot.method_url("getUpdates"),
            "https://api.telegram.org/bot123:ABC/getUpdates"
        );
    }

    #[test]
    fn test_updates_deserialize() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": -5, "type": "group"},
                 "from": {"id": 111, "is_bot": false, "first_name": "A"}, "text": "/listitems"}},
                {"update_id": 11, "edited_message": {"message_id": 1}}
            ]
        }"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = into_result(response, "getUpdates").unwrap();

        assert_eq!(updates.len(), 2);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, -5);
        assert_eq!(message.from.as_ref().unwrap().id, 111);
        assert_eq!(message.text.as_deref(), Some("/listitems"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_api_error_is_reported() {
        let raw = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let err = into_result(response, "getUpdates").unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        // Unroutable base: polls fail and the loop sits in its retry delay.
        let (_dir, bot) = bot("http://127.0.0.1:9");
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(bot.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("bot loop did not stop")
            .unwrap();
    }

    #[derive(Clone, Default)]
    struct FakeApi {
        calls: Arc<std::sync::Mutex<Vec<(String, serde_json::Value)>>>,
        delivered: Arc<std::sync::atomic::AtomicBool>,
    }

    impl FakeApi {
        fn record(&self, method: &str, body: serde_json::Value) {
            self.calls.lock().unwrap().push((method.to_string(), body));
        }

        fn calls(&self) -> Vec<(String, serde_json::Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    async fn fake_get_updates(
        axum::extract::State(api): axum::extract::State<FakeApi>,
        axum::Json(body): axum::Json<serde_json::Value>,
    ) -> axum::Json<serde_json::Value> {
        api.record("getUpdates", body);
        if !api.delivered.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return axum::Json(json!({
                "ok": true,
                "result": [{
                    "update_id": 7,
                    "message": {
                        "message_id": 1,
                        "chat": {"id": 99, "type": "private"},
                        "from": {"id": 5, "is_bot": false, "first_name": "Ada"},
                        "text": "/start"
                    }
                }]
            }));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        axum::Json(json!({ "ok": true, "result": [] }))
    }

    async fn fake_send_message(
        axum::extract::State(api): axum::extract::State<FakeApi>,
        axum::Json(body): axum::Json<serde_json::Value>,
    ) -> axum::Json<serde_json::Value> {
        api.record("sendMessage", body);
        axum::Json(json!({ "ok": true, "result": {"message_id": 2} }))
    }

    #[tokio::test]
    async fn test_poll_reply_round_trip() {
        let api = FakeApi::default();
        let router = axum::Router::new()
            .route("/botTESTTOKEN/getUpdates", axum::routing::post(fake_get_updates))
            .route("/botTESTTOKEN/sendMessage", axum::routing::post(fake_send_message))
            .with_state(api.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let dir = TempDir::new().unwrap();
        let processor = CommandProcessor::new(
            Arc::new(ConfigStore::new(dir.path().join("config.json"))),
            Arc::new(ItemStore::new(dir.path().join("data.json"))),
        );
        let bot = TelegramBot::new(&format!("http://{}", addr), "TESTTOKEN", 0, processor).unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(bot.run(rx));

        let acknowledged = |calls: &[(String, serde_json::Value)]| {
            calls
                .iter()
                .any(|(method, body)| method == "getUpdates" && body["offset"] == 8)
        };
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !acknowledged(&api.calls()) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("bot loop did not stop")
            .unwrap();

        let calls = api.calls();
        assert_eq!(calls[0].0, "getUpdates");
        assert_eq!(calls[0].1["offset"], 0);
        assert_eq!(calls[0].1["timeout"], 0);

        let sent: Vec<&serde_json::Value> = calls
            .iter()
            .filter(|(method, _)| method == "sendMessage")
            .map(|(_, body)| body)
            .collect();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["chat_id"], 99);
        assert_eq!(sent[0]["text"], crate::services::commands::HELP_TEXT);

        let reply_at = calls.iter().position(|(method, _)| method == "sendMessage").unwrap();
        let ack_at = calls
            .iter()
            .position(|(method, body)| method == "getUpdates" && body["offset"] == 8)
            .expect("offset was not advanced past the handled update");
        assert!(reply_at < ack_at);
    }
}

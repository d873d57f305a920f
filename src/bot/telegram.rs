//! Telegram Bot API transport (long polling).

use std::time::Duration;

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bot::{handle_message, InsightsApi};

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct TelegramBot {
    http: reqwest::Client,
    api_url: String,
    token: SecretString,
    poll_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
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
    pub first_name: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

impl TelegramBot {
    pub fn new(token: SecretString, poll_timeout: u64) -> Result<Self> {
        Self::with_api_url(DEFAULT_API_URL, token, poll_timeout)
    }

    pub fn with_api_url(api_url: &str, token: SecretString, poll_timeout: u64) -> Result<Self> {
        // The client timeout has to outlive the long poll.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout + 10))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token.expose_secret())
    }

    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        // reqwest errors carry the URL, which carries the token
        let resp = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Telegram {method} request failed"))?;

        let parsed: TelegramResponse<T> = resp
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Telegram {method} returned an undecodable body"))?;

        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => bail!(
                "Telegram {method} failed: {}",
                parsed.description.unwrap_or_else(|| "unknown error".to_string())
            ),
        }
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": self.poll_timeout,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self.call("sendMessage", &SendMessage { chat_id, text }).await?;
        Ok(())
    }

    /// Answer every update with a text message. Returns the next offset.
    pub async fn process_updates(&self, api: &dyn InsightsApi, updates: Vec<Update>, mut offset: i64) -> i64 {
        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.as_deref() else {
                continue;
            };

            let user_name = message.from.as_ref().map(|u| u.first_name.as_str());
            let Some(reply) = handle_message(api, text, user_name).await else {
                continue;
            };

            if let Err(e) = self.send_message(message.chat.id, &reply).await {
                warn!(chat_id = message.chat.id, error = %e, "Failed to send reply");
            }
        }
        offset
    }

    /// Poll forever.
    pub async fn run(&self, api: &dyn InsightsApi) -> Result<()> {
        info!(poll_timeout = self.poll_timeout, "Telegram bot polling");
        let mut offset = 0;

        loop {
            match self.get_updates(offset).await {
                Ok(updates) => {
                    if !updates.is_empty() {
                        debug!(count = updates.len(), "Received updates");
                    }
                    offset = self.process_updates(api, updates, offset).await;
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::AppError;
    use crate::filter::CardThreshold;
    use crate::models::{EnrichedMatch, Fixture, FixtureScope, LeagueSeason};

    struct UnavailableApi;

    #[async_trait]
    impl InsightsApi for UnavailableApi {
        async fn match_data(&self, _match_id: i64) -> crate::error::Result<EnrichedMatch> {
            Err(AppError::Fetch("down".to_string()))
        }

        async fn mismatches(
            &self,
            _scope: LeagueSeason,
            _fixture_scope: FixtureScope,
        ) -> crate::error::Result<Vec<Fixture>> {
            Err(AppError::Fetch("down".to_string()))
        }

        async fn card_filtered(
            &self,
            _season: i32,
            _threshold: CardThreshold,
        ) -> crate::error::Result<Vec<Fixture>> {
            Err(AppError::Fetch("down".to_string()))
        }
    }

    fn bot_for(server: &MockServer) -> TelegramBot {
        TelegramBot::with_api_url(&server.uri(), SecretString::from("123:abc".to_string()), 1).unwrap()
    }

    #[tokio::test]
    async fn test_get_updates_decodes_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .and(body_partial_json(serde_json::json!({"offset": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [{
                    "update_id": 5,
                    "message": {
                        "message_id": 1,
                        "chat": {"id": 42, "type": "private"},
                        "from": {"id": 9, "is_bot": false, "first_name": "Ana"},
                        "text": "/start"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let updates = bot_for(&server).get_updates(5).await.unwrap();
        assert_eq!(updates.len(), 1);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/start"));
    }

    #[tokio::test]
    async fn test_api_error_is_reported_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let err = bot_for(&server).get_updates(0).await.unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("Unauthorized"));
        assert!(!text.contains("123:abc"));
    }

    #[tokio::test]
    async fn test_process_updates_replies_and_advances_offset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": 42,
                "text": crate::bot::MATCH_DATA_ERROR
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = vec![
            Update {
                update_id: 10,
                message: Some(Message {
                    chat: Chat { id: 42 },
                    from: None,
                    text: Some("/getmatchdata 77".to_string()),
                }),
            },
            Update {
                update_id: 11,
                message: Some(Message {
                    chat: Chat { id: 42 },
                    from: None,
                    text: Some("nada a dizer".to_string()),
                }),
            },
        ];

        let offset = bot_for(&server)
            .process_updates(&UnavailableApi, updates, 0)
            .await;
        assert_eq!(offset, 12);
    }
}

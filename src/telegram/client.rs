//! Bot API HTTP client

use super::types::{ApiResponse, GetUpdatesRequest, SendMessageRequest, Update};
use super::TransportError;
use crate::runtime::{MessageSender, OutgoingMessage};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Slack on top of the long-poll timeout before the HTTP request gives up
const REQUEST_SLACK: Duration = Duration::from_secs(10);

pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built, e.g. without a TLS backend.
    pub fn new(api_base: &str, token: &str, poll_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_SLACK)
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{token}", api_base.trim_end_matches('/')),
            poll_timeout,
        })
    }

    /// Long-poll for updates with an id of at least `offset`
    ///
    /// # Errors
    ///
    /// `TransportError::Http` on network or decoding failures, and
    /// `TransportError::Api` when the Bot API answers `ok: false`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request).await
    }

    async fn call<B, T>(&self, method: &'static str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TransportError::Api {
                method,
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: message.html.then_some("HTML"),
            disable_web_page_preview: message.disable_preview,
        };
        let _sent: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }
}

use async_trait::async_trait;
use reqwest::Client;

use crate::error::BotError;
use crate::types::SlackResponse;

/// Posts a finished response to the `response_url` Slack handed us with the command.
#[async_trait]
pub trait DelayedResponder: Send + Sync {
    async fn send(&self, response_url: &str, response: &SlackResponse) -> Result<(), BotError>;
}

pub struct SlackResponder {
    client: Client,
}

impl SlackResponder {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for SlackResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DelayedResponder for SlackResponder {
    async fn send(&self, response_url: &str, response: &SlackResponse) -> Result<(), BotError> {
        let reply = self
            .client
            .post(response_url)
            .json(response)
            .send()
            .await
            .map_err(|e| BotError::Delivery(e.to_string()))?;

        let status = reply.status();
        if !status.is_success() {
            let body = reply.text().await.unwrap_or_default();
            return Err(BotError::Delivery(format!("{} {}", status, body)));
        }

        Ok(())
    }
}

//! The slash-command lifecycle shared by every bot.
//!
//! Slack gives a slash command about three seconds to answer, so a handler
//! validates and parses synchronously, acknowledges straight away, and posts
//! its real answer to the command's `response_url` from a spawned task.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::BotError;
use crate::slack::DelayedResponder;
use crate::types::{split_params, ResponsePayload, SlackCommand, SlackResponse};

#[async_trait]
pub trait SlashCommandHandler: Send + Sync {
    /// Parsed, immutable form of the command text.
    type Params: Send + 'static;

    fn name(&self) -> &'static str;

    /// Text shown in the immediate acknowledgment.
    fn acknowledgment(&self) -> String {
        format!("{} is working on it... ⏳", self.name())
    }

    /// Whether the credentials this handler needs are present.
    fn is_environment_setup(&self) -> bool;

    /// `params` is `None` when the command was sent without any text.
    fn parse_params(&self, params: Option<&[&str]>) -> Result<Self::Params, BotError>;

    async fn get_response(
        &self,
        params: Self::Params,
        user: &str,
    ) -> Result<ResponsePayload, BotError>;
}

/// Outcome of [`dispatch`].
pub enum Dispatch {
    /// Rejected before any upstream work started; the reply carries the error.
    Rejected(SlackResponse),
    /// Accepted; `delivery` finishes once the deferred response has been posted.
    Accepted {
        ack: SlackResponse,
        delivery: JoinHandle<()>,
    },
}

impl Dispatch {
    /// The body for the immediate HTTP reply.
    pub fn into_response(self) -> SlackResponse {
        match self {
            Dispatch::Rejected(response) => response,
            Dispatch::Accepted { ack, .. } => ack,
        }
    }
}

/// Runs one slash command through `handler`.
///
/// Configuration and parameter errors come back in the returned reply and
/// nothing is posted later. Once parsing succeeds the reply is an
/// acknowledgment and exactly one message, success or error, is sent to
/// `response_url` by a spawned task.
pub fn dispatch<H>(
    handler: Arc<H>,
    responder: Arc<dyn DelayedResponder>,
    command: SlackCommand,
) -> Dispatch
where
    H: SlashCommandHandler + 'static,
{
    if !handler.is_environment_setup() {
        let err = BotError::Configuration(format!(
            "{} is not configured: its credentials are missing. Ask an admin to set them.",
            handler.name()
        ));
        warn!(bot = handler.name(), user = %command.user_name, "rejected command: missing credentials");
        return Dispatch::Rejected(SlackResponse::ephemeral(err.to_string()));
    }

    if command.response_url.trim().is_empty() {
        let err = BotError::InvalidRequest("no response_url supplied".to_string());
        warn!(bot = handler.name(), user = %command.user_name, "rejected command: {}", err);
        return Dispatch::Rejected(SlackResponse::ephemeral(err.to_string()));
    }

    let tokens = split_params(&command.text);
    let params = match handler.parse_params(tokens.as_deref()) {
        Ok(params) => params,
        Err(err) => {
            warn!(
                bot = handler.name(),
                user = %command.user_name,
                text = %command.text,
                error = %err,
                "rejected command: invalid parameters"
            );
            return Dispatch::Rejected(SlackResponse::ephemeral(err.to_string()));
        }
    };

    info!(bot = handler.name(), user = %command.user_name, text = %command.text, "accepted command");
    let ack = SlackResponse::in_channel(handler.acknowledgment());

    let delivery = tokio::spawn(async move {
        let response = match handler.get_response(params, &command.user_name).await {
            Ok(payload) => payload.into_slack_response(),
            Err(err) => {
                error!(bot = handler.name(), user = %command.user_name, error = %err, "failed to produce response");
                SlackResponse::ephemeral(err.to_string())
            }
        };

        match responder.send(&command.response_url, &response).await {
            Ok(()) => info!(bot = handler.name(), user = %command.user_name, "delivered response"),
            Err(err) => error!(bot = handler.name(), user = %command.user_name, error = %err, "failed to deliver response"),
        }
    });

    Dispatch::Accepted { ack, delivery }
}

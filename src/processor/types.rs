use serde::{Deserialize, Serialize};

use crate::blocks::Block;

/// Form fields Slack posts for a slash command. Anything Slack leaves out
/// decodes as an empty string.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SlackCommand {
    pub token: String,
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
    pub response_url: String,
    pub trigger_id: String,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
    Ephemeral,
}

/// Body of both the immediate HTTP reply and the message posted to `response_url`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SlackResponse {
    pub response_type: ResponseType,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl SlackResponse {
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
            blocks: Vec::new(),
        }
    }

    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
            blocks: Vec::new(),
        }
    }
}

/// What a handler produces once its upstream work is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Text(String),
    Message {
        fallback_text: String,
        blocks: Vec<Block>,
    },
}

impl ResponsePayload {
    pub fn into_slack_response(self) -> SlackResponse {
        match self {
            ResponsePayload::Text(text) => SlackResponse::in_channel(text),
            ResponsePayload::Message {
                fallback_text,
                blocks,
            } => SlackResponse {
                response_type: ResponseType::InChannel,
                text: fallback_text,
                blocks,
            },
        }
    }
}

/// Splits the raw command text into space-delimited parameters. Blank text
/// yields `None`, which handlers treat as "no parameters given".
pub fn split_params(text: &str) -> Option<Vec<&str>> {
    let params: Vec<&str> = text.split_whitespace().collect();
    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}

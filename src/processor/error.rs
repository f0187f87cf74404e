use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Parameter(String),

    #[error("Invalid Slack request: {0}")]
    InvalidRequest(String),

    #[error("Got invalid response back when generating GeoGuessr challenge: {0}")]
    UpstreamResponse(String),

    #[error("Failed to reach GeoGuessr: {0}")]
    Network(String),

    #[error("Failed to deliver response to Slack: {0}")]
    Delivery(String),
}

impl From<reqwest::Error> for BotError {
    fn from(error: reqwest::Error) -> Self {
        BotError::Network(error.to_string())
    }
}

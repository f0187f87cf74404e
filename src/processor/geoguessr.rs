use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use tracing::warn;

use crate::config::Config;
use crate::error::BotError;

const CHALLENGES_PATH: &str = "/api/v3/challenges";

// The challenge endpoint is GeoGuessr's internal web API; it only answers
// requests that look like they came from the site itself.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "*/*"),
    ("accept-language", "en,sv;q=0.9,fi;q=0.8,nb;q=0.7"),
    (
        "sec-ch-ua",
        "\"Google Chrome\";v=\"89\", \"Chromium\";v=\"89\", \";Not A Brand\";v=\"99\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
];

/// JSON body of a challenge-creation request.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub map: String,
    pub forbid_moving: bool,
    pub forbid_rotating: bool,
    pub forbid_zooming: bool,
    pub time_limit: u32,
}

#[async_trait]
pub trait ChallengeApi: Send + Sync {
    /// Whether a session credential is available at all.
    fn has_credentials(&self) -> bool;

    /// Creates a challenge and returns its shareable URL.
    async fn create_challenge(&self, request: &ChallengeRequest) -> Result<String, BotError>;
}

pub struct GeoGuessrClient {
    client: Client,
    base_url: String,
    cookie: Option<HeaderValue>,
}

impl GeoGuessrClient {
    /// A cookie that cannot be sent as a header is treated as missing.
    pub fn new(config: &Config) -> Self {
        let cookie = config.geoguessr_cookie.as_deref().and_then(|raw| {
            match HeaderValue::from_str(raw) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    Some(value)
                }
                Err(_) => {
                    warn!("GeoGuessr cookie contains invalid characters; ignoring it");
                    None
                }
            }
        });

        Self {
            client: Client::new(),
            base_url: config.geoguessr_base_url.clone(),
            cookie,
        }
    }

    pub fn challenge_url(&self, token: &str) -> String {
        format!("{}/challenge/{}", self.base_url, token)
    }

    fn headers(&self, cookie: &HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in BROWSER_HEADERS {
            headers.insert(*name, HeaderValue::from_static(*value));
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers.insert(COOKIE, cookie.clone());

        headers
    }
}

#[async_trait]
impl ChallengeApi for GeoGuessrClient {
    fn has_credentials(&self) -> bool {
        self.cookie.is_some()
    }

    async fn create_challenge(&self, request: &ChallengeRequest) -> Result<String, BotError> {
        let cookie = self.cookie.as_ref().ok_or_else(|| {
            BotError::Configuration("GeoGuessr cookie is not configured.".to_string())
        })?;

        let response = self
            .client
            .post(format!("{}{}", self.base_url, CHALLENGES_PATH))
            .headers(self.headers(cookie))
            .json(request)
            .send()
            .await?;

        let body = response.text().await?;
        let token = extract_token(&body)?;

        Ok(self.challenge_url(&token))
    }
}

/// Pulls the challenge token out of an upstream response body. Anything
/// without a string `token` field is reported with the raw body attached.
pub fn extract_token(body: &str) -> Result<String, BotError> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("token").and_then(Value::as_str).map(str::to_string))
        .ok_or_else(|| BotError::UpstreamResponse(body.to_string()))
}

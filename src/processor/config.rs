use std::env;

use thiserror::Error;

pub const DEFAULT_GEOGUESSR_BASE_URL: &str = "https://www.geoguessr.com";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT: invalid port number \"{0}\"")]
    InvalidPort(String),
}

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub geoguessr_cookie: Option<String>,
    pub geoguessr_base_url: String,
    pub slack_signing_secret: Option<String>,
    pub bind_address: String,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("geoguessr_cookie", &self.geoguessr_cookie.as_ref().map(|_| "<redacted>"))
            .field("geoguessr_base_url", &self.geoguessr_base_url)
            .field(
                "slack_signing_secret",
                &self.slack_signing_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            geoguessr_cookie: var("GEOGUESSR_COOKIE").or_else(|| var("GeoguessrCookie")),
            geoguessr_base_url: var("GEOGUESSR_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEOGUESSR_BASE_URL.to_string()),
            slack_signing_secret: var("SLACK_SIGNING_SECRET"),
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
        })
    }
}

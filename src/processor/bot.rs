use async_trait::async_trait;

use crate::blocks::{self, Block};
use crate::error::BotError;
use crate::geoguessr::{ChallengeApi, ChallengeRequest};
use crate::handler::SlashCommandHandler;
use crate::types::ResponsePayload;

const USAGE: &str = "Expected either \"mapId\" (e.g. \"59a1514f17631e74145b6f47\"), \
\"mapId timeLimit\" (e.g. \"59a1514f17631e74145b6f47 90\"), or \
\"mapId timeLimit forbidMoving forbidRotating forbidZooming\" \
(e.g. \"59a1514f17631e74145b6f47 60 true false false\").";

const NO_RESTRICTIONS: &str = "Moving, rotating and zooming allowed";

pub struct MapAlias {
    pub alias: &'static str,
    pub id: &'static str,
    pub name: &'static str,
}

/// Short names users can type instead of a map id.
pub const MAP_ALIASES: &[MapAlias] = &[
    MapAlias {
        alias: "diverse-world",
        id: "59a1514f17631e74145b6f47",
        name: "A Diverse World",
    },
    MapAlias {
        alias: "a-diverse-world",
        id: "59a1514f17631e74145b6f47",
        name: "A Diverse World",
    },
    MapAlias {
        alias: "official-world",
        id: "world",
        name: "World",
    },
    MapAlias {
        alias: "famous-places",
        id: "famous-places",
        name: "Famous Places",
    },
];

/// Returns the canonical map id and a display label. Unknown aliases are
/// taken as literal map ids.
pub fn resolve_map(token: &str) -> (String, String) {
    match MAP_ALIASES
        .iter()
        .find(|entry| entry.alias.eq_ignore_ascii_case(token))
    {
        Some(entry) => (entry.id.to_string(), entry.name.to_string()),
        None => (token.to_string(), token.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSettings {
    pub map_id: String,
    pub map_label: String,
    pub round_time_limit: Option<u32>,
    pub forbid_moving: bool,
    pub forbid_rotating: bool,
    pub forbid_zooming: bool,
}

impl ChallengeSettings {
    fn new(map: &str) -> Self {
        let (map_id, map_label) = resolve_map(map);
        Self {
            map_id,
            map_label,
            round_time_limit: None,
            forbid_moving: false,
            forbid_rotating: false,
            forbid_zooming: false,
        }
    }

    pub fn time_limit(&self) -> u32 {
        self.round_time_limit.unwrap_or(0)
    }

    pub fn to_request(&self) -> ChallengeRequest {
        ChallengeRequest {
            map: self.map_id.clone(),
            forbid_moving: self.forbid_moving,
            forbid_rotating: self.forbid_rotating,
            forbid_zooming: self.forbid_zooming,
            time_limit: self.time_limit(),
        }
    }

    /// "None" for unlimited rounds, otherwise the limit in seconds.
    pub fn time_limit_summary(&self) -> String {
        match self.time_limit() {
            0 => "None".to_string(),
            1 => "1 second".to_string(),
            seconds => format!("{} seconds", seconds),
        }
    }

    pub fn restrictions_summary(&self) -> String {
        let restrictions: Vec<&str> = [
            (self.forbid_moving, "No moving"),
            (self.forbid_rotating, "No rotating"),
            (self.forbid_zooming, "No zooming"),
        ]
        .into_iter()
        .filter_map(|(active, label)| active.then_some(label))
        .collect();

        if restrictions.is_empty() {
            NO_RESTRICTIONS.to_string()
        } else {
            restrictions.join(", ")
        }
    }
}

fn parse_time_limit(token: &str) -> Result<u32, BotError> {
    let digits_only = !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit());
    digits_only.then(|| token.parse::<u32>().ok()).flatten().ok_or_else(|| {
        BotError::Parameter(format!(
            "Invalid timeLimit parameter: \"{}\". Expected a non-negative integer number of seconds.",
            token
        ))
    })
}

fn parse_forbid_flags(tokens: &[&str; 3]) -> Result<[bool; 3], BotError> {
    let invalid: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| *token != "true" && *token != "false")
        .collect();
    if !invalid.is_empty() {
        return Err(BotError::Parameter(format!(
            "Invalid forbid parameters: \"{}\" ({} not a boolean). All must be booleans, either \"true\" or \"false\".",
            tokens.join(" "),
            invalid
                .iter()
                .map(|token| format!("\"{}\"", token))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    Ok([tokens[0] == "true", tokens[1] == "true", tokens[2] == "true"])
}

/// Builds the Slack message announcing a freshly created challenge.
pub fn challenge_message(settings: &ChallengeSettings, user: &str, url: &str) -> ResponsePayload {
    ResponsePayload::Message {
        fallback_text: format!("Generated GeoGuessr challenge: {}", url),
        blocks: vec![
            Block::header("GeoGuessr challenge"),
            Block::fields([
                ("Generated by", user.to_string()),
                ("Map", settings.map_label.clone()),
                ("Time limit", settings.time_limit_summary()),
                ("Settings", settings.restrictions_summary()),
            ]),
            Block::text(blocks::link(url, "Play the challenge")),
            Block::context(url),
        ],
    }
}

pub struct GeoGuessrBot<A> {
    api: A,
}

impl<A: ChallengeApi> GeoGuessrBot<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: ChallengeApi> SlashCommandHandler for GeoGuessrBot<A> {
    type Params = ChallengeSettings;

    fn name(&self) -> &'static str {
        "GeoGuessrBot"
    }

    fn acknowledgment(&self) -> String {
        "Generating GeoGuessr challenge... ⏳".to_string()
    }

    fn is_environment_setup(&self) -> bool {
        self.api.has_credentials()
    }

    fn parse_params(&self, params: Option<&[&str]>) -> Result<ChallengeSettings, BotError> {
        let params = params.ok_or_else(|| {
            BotError::Parameter(format!(
                "Expected command parameters, but got none. {}",
                USAGE
            ))
        })?;

        match params {
            [map] => Ok(ChallengeSettings::new(map)),
            [map, time_limit] => Ok(ChallengeSettings {
                round_time_limit: Some(parse_time_limit(time_limit)?),
                ..ChallengeSettings::new(map)
            }),
            [map, time_limit, moving, rotating, zooming] => {
                let round_time_limit = Some(parse_time_limit(time_limit)?);
                let [forbid_moving, forbid_rotating, forbid_zooming] =
                    parse_forbid_flags(&[*moving, *rotating, *zooming])?;
                Ok(ChallengeSettings {
                    round_time_limit,
                    forbid_moving,
                    forbid_rotating,
                    forbid_zooming,
                    ..ChallengeSettings::new(map)
                })
            }
            _ => Err(BotError::Parameter(format!(
                "Invalid command parameters: \"{}\". {}",
                params.join(" "),
                USAGE
            ))),
        }
    }

    async fn get_response(
        &self,
        params: ChallengeSettings,
        user: &str,
    ) -> Result<ResponsePayload, BotError> {
        tracing::info!(user, map = %params.map_id, time_limit = params.time_limit(), "creating challenge");
        let url = self.api.create_challenge(&params.to_request()).await?;
        Ok(challenge_message(&params, user, &url))
    }
}

//! Turns `/geoguessr` slash commands into GeoGuessr challenge links.
//!
//! [`handler`] holds the generic acknowledge-then-respond lifecycle,
//! [`bot`] the GeoGuessr-specific parsing and message, and [`geoguessr`]
//! the upstream client.

pub mod blocks;
pub mod bot;
pub mod config;
pub mod error;
pub mod geoguessr;
pub mod handler;
pub mod slack;
pub mod types;

pub use bot::{ChallengeSettings, GeoGuessrBot};
pub use config::{Config, ConfigError};
pub use error::BotError;
pub use geoguessr::{ChallengeApi, ChallengeRequest, GeoGuessrClient};
pub use handler::{dispatch, Dispatch, SlashCommandHandler};
pub use slack::{DelayedResponder, SlackResponder};
pub use types::{ResponsePayload, ResponseType, SlackCommand, SlackResponse};

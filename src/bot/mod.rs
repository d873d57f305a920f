//! Chat interface over the HTTP API.
//!
//! The bot never touches the store or the provider directly; every answer
//! goes through an [`InsightsApi`], which in production is the HTTP client
//! in [`api_client`].

pub mod api_client;
pub mod commands;
pub mod format;
pub mod telegram;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::filter::CardThreshold;
use crate::models::{EnrichedMatch, Fixture, FixtureScope, LeagueSeason};

use commands::{Command, Parsed};

pub const MATCH_DATA_ERROR: &str = "Erro ao obter dados da partida. Tente novamente mais tarde.";
pub const GENERIC_ERROR: &str = "Erro ao obter dados. Tente novamente mais tarde.";
pub const GREETING: &str = "Olá! Como posso ajudar?";

const HELP: &str = "Comandos disponíveis:\n\
    /getmatchdata <id> - dados detalhados de uma partida\n\
    /mismatches <league_id> <temporada> [semana] - confrontos entre 1º e 4º quartis\n\
    /cartoes <temporada> <mínimo por time> <média somada> - confrontos com muitos cartões\n\
    /help - esta mensagem";

/// Read side of the aggregation API, as the bot sees it.
#[async_trait]
pub trait InsightsApi: Send + Sync {
    async fn match_data(&self, match_id: i64) -> Result<EnrichedMatch>;

    async fn mismatches(&self, scope: LeagueSeason, fixture_scope: FixtureScope) -> Result<Vec<Fixture>>;

    async fn card_filtered(&self, season: i32, threshold: CardThreshold) -> Result<Vec<Fixture>>;
}

/// Produce the reply for one incoming message, if any.
///
/// API failures are logged and answered with a fixed message; error details
/// never reach the chat.
pub async fn handle_message(api: &dyn InsightsApi, text: &str, user_name: Option<&str>) -> Option<String> {
    let command = match commands::parse(text) {
        Parsed::Command(command) => command,
        Parsed::Usage(hint) => return Some(hint.to_string()),
        Parsed::Ignore => return None,
    };

    let reply = match command {
        Command::Start => match user_name {
            Some(name) => format!("Oi {name}! Como posso ajudar?"),
            None => GREETING.to_string(),
        },
        Command::Help => HELP.to_string(),
        Command::Greeting => GREETING.to_string(),
        Command::MatchData(id) => match api.match_data(id).await {
            Ok(data) => format::format_match_data(&data),
            Err(e) => {
                warn!(match_id = id, error = %e, "Match data request failed");
                MATCH_DATA_ERROR.to_string()
            }
        },
        Command::Mismatches { scope, fixture_scope } => {
            match api.mismatches(scope, fixture_scope).await {
                Ok(fixtures) => {
                    let title = match fixture_scope {
                        FixtureScope::Today => format!("Confrontos de hoje ({scope})"),
                        FixtureScope::Week => format!("Confrontos da semana ({scope})"),
                    };
                    format::format_fixture_list(&title, &fixtures)
                }
                Err(e) => {
                    warn!(league = %scope, error = %e, "Mismatch request failed");
                    GENERIC_ERROR.to_string()
                }
            }
        }
        Command::Cards { season, threshold } => match api.card_filtered(season, threshold).await {
            Ok(fixtures) => format::format_fixture_list("Confrontos filtrados por cartões", &fixtures),
            Err(e) => {
                warn!(season, error = %e, "Card filter request failed");
                GENERIC_ERROR.to_string()
            }
        },
    };

    Some(reply)
}

//! Chat command parsing.

use crate::filter::CardThreshold;
use crate::models::{FixtureScope, LeagueSeason};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    MatchData(i64),
    Mismatches {
        scope: LeagueSeason,
        fixture_scope: FixtureScope,
    },
    Cards {
        season: i32,
        threshold: CardThreshold,
    },
    /// Plain-text greeting, not a slash command.
    Greeting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Command(Command),
    /// Known command with bad arguments; reply with this hint.
    Usage(&'static str),
    /// Nothing to answer.
    Ignore,
}

pub const MATCH_DATA_USAGE: &str = "Por favor, forneça um ID de partida válido. Ex.: /getmatchdata 1180512";
pub const MISMATCHES_USAGE: &str =
    "Uso: /mismatches <league_id> <temporada> [semana]. Ex.: /mismatches 71 2024";
pub const CARDS_USAGE: &str =
    "Uso: /cartoes <temporada> <mínimo por time> <média somada>. Ex.: /cartoes 2024 2.0 5.0";

pub fn parse(text: &str) -> Parsed {
    let text = text.trim();
    if !text.starts_with('/') {
        return if is_greeting(text) {
            Parsed::Command(Command::Greeting)
        } else {
            Parsed::Ignore
        };
    }

    let mut parts = text.split_whitespace();
    let Some(head) = parts.next() else {
        return Parsed::Ignore;
    };
    // "/getmatchdata@SomeBot" in group chats
    let name = head.trim_start_matches('/').split('@').next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match name.to_ascii_lowercase().as_str() {
        "start" => Parsed::Command(Command::Start),
        "help" | "ajuda" => Parsed::Command(Command::Help),
        "getmatchdata" | "partida" => match args.as_slice() {
            [id] => id
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .map_or(Parsed::Usage(MATCH_DATA_USAGE), |id| {
                    Parsed::Command(Command::MatchData(id))
                }),
            _ => Parsed::Usage(MATCH_DATA_USAGE),
        },
        "mismatches" | "quartis" => parse_mismatches(&args),
        "cartoes" | "cards" => parse_cards(&args),
        _ => Parsed::Ignore,
    }
}

fn parse_mismatches(args: &[&str]) -> Parsed {
    let (league, season, fixture_scope) = match args {
        [league, season] => (league, season, FixtureScope::Today),
        [league, season, scope] => match scope.parse::<FixtureScope>() {
            Ok(fixture_scope) => (league, season, fixture_scope),
            Err(_) => return Parsed::Usage(MISMATCHES_USAGE),
        },
        _ => return Parsed::Usage(MISMATCHES_USAGE),
    };

    match (league.parse::<i64>(), season.parse::<i32>()) {
        (Ok(league_id), Ok(season)) => Parsed::Command(Command::Mismatches {
            scope: LeagueSeason { league_id, season },
            fixture_scope,
        }),
        _ => Parsed::Usage(MISMATCHES_USAGE),
    }
}

fn parse_cards(args: &[&str]) -> Parsed {
    let [season, min_per_team, min_summed] = args else {
        return Parsed::Usage(CARDS_USAGE);
    };

    let season = season.parse::<i32>();
    let min_per_team = parse_decimal(min_per_team);
    let min_summed = parse_decimal(min_summed);

    match (season, min_per_team, min_summed) {
        (Ok(season), Some(min_per_team), Some(min_summed)) => Parsed::Command(Command::Cards {
            season,
            threshold: CardThreshold {
                min_per_team,
                min_summed,
            },
        }),
        _ => Parsed::Usage(CARDS_USAGE),
    }
}

/// Accepts both "2.5" and "2,5".
fn parse_decimal(s: &str) -> Option<f64> {
    s.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn is_greeting(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| matches!(word, "oi" | "olá" | "ola"))
}

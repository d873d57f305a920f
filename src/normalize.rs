//! Provider payload -> domain record transforms. Pure, no I/O.

use crate::error::{AppError, Result};
use crate::models::{Fixture, FixtureStatus, LeagueInfo, LeagueStanding, TeamRef, TeamStatistics};
use crate::provider::types::{RawCardBucket, RawFixtureEntry, RawStandingsEntry, RawTeam, RawTeamStatistics};

/// League metadata plus its table.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedStandings {
    pub league_info: LeagueInfo,
    pub standings: Vec<LeagueStanding>,
}

/// Uses the first group of the first response entry.
pub fn normalize_standings(entries: &[RawStandingsEntry]) -> Result<NormalizedStandings> {
    let entry = entries
        .first()
        .ok_or_else(|| AppError::InvalidPayload("standings response has no entries".to_string()))?;
    let league = &entry.league;

    let league_info = LeagueInfo {
        id: league.id,
        name: league.name.clone(),
        country: league.country.clone(),
        logo: league.logo.clone(),
        flag: league.flag.clone(),
        season: league.season,
    };

    let group = league.standings.first().ok_or_else(|| {
        AppError::InvalidPayload(format!("league {} has no standings groups", league.id))
    })?;

    let standings = group
        .iter()
        .map(|row| LeagueStanding {
            league_id: league.id,
            season: league.season,
            rank: row.rank,
            team_id: row.team.id,
            team_name: row.team.name.clone(),
            team_logo: row.team.logo.clone(),
            points: row.points,
            goal_diff: row.goals_diff,
            recent_form: row.form.clone(),
        })
        .collect();

    Ok(NormalizedStandings {
        league_info,
        standings,
    })
}

/// Keeps only the fixture and teams sub-objects; odds, events, lineups etc. are dropped.
pub fn normalize_fixture(entry: &RawFixtureEntry) -> Fixture {
    let raw = &entry.fixture;
    Fixture {
        fixture_id: raw.id,
        date: raw.date.clone(),
        timestamp: raw.timestamp,
        venue: raw.venue.name.clone(),
        venue_city: raw.venue.city.clone(),
        referee: raw.referee.clone(),
        home_team: team_ref(&entry.teams.home),
        away_team: team_ref(&entry.teams.away),
        status: FixtureStatus {
            long: raw.status.long.clone(),
            short: raw.status.short.clone(),
            elapsed: raw.status.elapsed,
        },
    }
}

fn team_ref(team: &RawTeam) -> TeamRef {
    TeamRef {
        id: team.id,
        name: team.name.clone(),
        logo: team.logo.clone(),
    }
}

/// Averages divide by matches played; a zero denominator yields 0.0.
pub fn normalize_team_statistics(
    league_id: i64,
    season: i32,
    team_id: i64,
    raw: &RawTeamStatistics,
) -> TeamStatistics {
    let played_home = raw.fixtures.played.home.unwrap_or(0);
    let played_away = raw.fixtures.played.away.unwrap_or(0);
    let matches_played = played_home + played_away;

    let yellow_cards_total = sum_cards(raw.cards.yellow.values());
    let red_cards_total = sum_cards(raw.cards.red.values());

    TeamStatistics {
        team_id,
        league_id,
        season,
        matches_played,
        goals_for: raw.goals.scored.total.total.unwrap_or(0),
        goals_against: raw.goals.against.total.total.unwrap_or(0),
        avg_goals_home: parse_average(raw.goals.scored.average.home.as_deref()),
        avg_goals_away: parse_average(raw.goals.scored.average.away.as_deref()),
        win_pct_home: percentage(raw.fixtures.wins.home.unwrap_or(0), played_home),
        win_pct_away: percentage(raw.fixtures.wins.away.unwrap_or(0), played_away),
        clean_sheet_pct_home: percentage(raw.clean_sheet.home.unwrap_or(0), played_home),
        clean_sheet_pct_away: percentage(raw.clean_sheet.away.unwrap_or(0), played_away),
        yellow_cards_total,
        yellow_cards_avg: ratio(yellow_cards_total, matches_played),
        red_cards_total,
        red_cards_avg: ratio(red_cards_total, matches_played),
        recent_form: raw.form.clone(),
    }
}

fn sum_cards<'a>(buckets: impl Iterator<Item = &'a RawCardBucket>) -> u32 {
    buckets.filter_map(|b| b.total).sum()
}

pub(crate) fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

pub(crate) fn percentage(numerator: u32, denominator: u32) -> f64 {
    ratio(numerator, denominator) * 100.0
}

fn parse_average(value: Option<&str>) -> f64 {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

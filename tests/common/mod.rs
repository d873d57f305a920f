//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use football_insights::aggregator::{Aggregator, FixtureSettings};
use football_insights::db::store::Store;
use football_insights::error::{AppError, Result};
use football_insights::provider::types::{RawFixtureEntry, RawStandingsEntry, RawTeamStatistics};
use football_insights::provider::{FixtureQuery, StatsProvider};

pub const SEASON: i32 = 2024;

/// In-process provider serving canned payloads.
///
/// Each team plays 10 matches (5 home, 5 away), so a team configured with
/// `n` yellow cards averages `n / 10` per match.
#[derive(Default)]
pub struct FakeProvider {
    /// Team ids per league, in table order.
    tables: HashMap<i64, Vec<i64>>,
    /// (fixture_id, home, away) per league.
    fixtures: HashMap<i64, Vec<(i64, i64, i64)>>,
    cards: HashMap<i64, (u32, u32)>,
    failing_leagues: HashSet<i64>,
    failing_teams: HashSet<i64>,
    pub statistics_calls: Mutex<Vec<i64>>,
    pub fixture_queries: Mutex<Vec<FixtureQuery>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, league_id: i64, team_ids: &[i64]) -> Self {
        self.tables.insert(league_id, team_ids.to_vec());
        self
    }

    pub fn with_fixture(mut self, league_id: i64, fixture_id: i64, home: i64, away: i64) -> Self {
        self.fixtures
            .entry(league_id)
            .or_default()
            .push((fixture_id, home, away));
        self
    }

    pub fn with_cards(mut self, team_id: i64, yellow: u32, red: u32) -> Self {
        self.cards.insert(team_id, (yellow, red));
        self
    }

    pub fn failing_league(mut self, league_id: i64) -> Self {
        self.failing_leagues.insert(league_id);
        self
    }

    pub fn failing_team(mut self, team_id: i64) -> Self {
        self.failing_teams.insert(team_id);
        self
    }

    fn check_league(&self, league_id: i64) -> Result<()> {
        if self.failing_leagues.contains(&league_id) {
            return Err(AppError::Fetch(format!("league {league_id} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl StatsProvider for FakeProvider {
    async fn standings(&self, league_id: i64, season: i32) -> Result<Vec<RawStandingsEntry>> {
        self.check_league(league_id)?;
        let Some(teams) = self.tables.get(&league_id) else {
            return Ok(Vec::new());
        };

        let rows: Vec<_> = teams
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "rank": i + 1,
                    "team": {"id": id, "name": format!("Team {id}"), "logo": null},
                    "points": 40 - i as i32,
                    "goalsDiff": 10 - i as i32,
                    "form": "WDL"
                })
            })
            .collect();

        Ok(serde_json::from_value(json!([{
            "league": {
                "id": league_id,
                "name": format!("League {league_id}"),
                "country": "Brazil",
                "logo": null,
                "flag": null,
                "season": season,
                "standings": [rows]
            }
        }]))?)
    }

    async fn fixtures(&self, query: &FixtureQuery) -> Result<Vec<RawFixtureEntry>> {
        self.fixture_queries
            .lock()
            .expect("lock poisoned")
            .push(query.clone());
        self.check_league(query.league_id)?;

        let entries: Vec<_> = self
            .fixtures
            .get(&query.league_id)
            .into_iter()
            .flatten()
            .map(|(id, home, away)| {
                json!({
                    "fixture": {
                        "id": id,
                        "referee": null,
                        "date": format!("{}T16:00:00-03:00", query.dates.from),
                        "timestamp": null,
                        "venue": {"name": "Estádio", "city": "Cidade"},
                        "status": {"long": "Not Started", "short": "NS", "elapsed": null}
                    },
                    "teams": {
                        "home": {"id": home, "name": format!("Team {home}"), "logo": null},
                        "away": {"id": away, "name": format!("Team {away}"), "logo": null}
                    }
                })
            })
            .collect();

        Ok(serde_json::from_value(serde_json::Value::Array(entries))?)
    }

    async fn team_statistics(
        &self,
        league_id: i64,
        _season: i32,
        team_id: i64,
    ) -> Result<RawTeamStatistics> {
        self.statistics_calls
            .lock()
            .expect("lock poisoned")
            .push(team_id);
        self.check_league(league_id)?;
        if self.failing_teams.contains(&team_id) {
            return Err(AppError::Fetch(format!("team {team_id} unavailable")));
        }

        let (yellow, red) = self.cards.get(&team_id).copied().unwrap_or((10, 0));
        Ok(serde_json::from_value(json!({
            "form": "WWDLW",
            "fixtures": {
                "played": {"home": 5, "away": 5, "total": 10},
                "wins": {"home": 3, "away": 2, "total": 5}
            },
            "goals": {
                "for": {"total": {"home": 9, "away": 6, "total": 15},
                        "average": {"home": "1.8", "away": "1.2", "total": "1.5"}},
                "against": {"total": {"home": 4, "away": 6, "total": 10},
                            "average": {"home": "0.8", "away": "1.2", "total": "1.0"}}
            },
            "clean_sheet": {"home": 2, "away": 1, "total": 3},
            "cards": {
                "yellow": {"0-15": {"total": yellow, "percentage": "100%"}},
                "red": {"76-90": {"total": red, "percentage": "100%"}}
            }
        }))?)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub async fn memory_store() -> Arc<Store> {
    Arc::new(Store::new(":memory:").await.expect("in-memory store"))
}

pub fn aggregator(provider: Arc<FakeProvider>, store: Arc<Store>) -> Aggregator {
    let settings = FixtureSettings {
        status: Some("NS".to_string()),
        timezone: chrono_tz::America::Sao_Paulo,
    };
    Aggregator::new(provider, store, settings)
}

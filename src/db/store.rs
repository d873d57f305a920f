use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::{Fixture, FixtureScope, LeagueInfo, LeagueSeason, LeagueStanding, TeamStatistics};

/// Document repository keyed by (league_id, season).
///
/// The `leagues` row is the league/season document: each JSON column is one
/// top-level field. Writes are upserts that only touch the named columns, so
/// refreshing standings never disturbs a stored fixture snapshot and vice versa.
/// Per-team statistics live in their own table, one row per team.
pub struct Store {
    pool: SqlitePool,
}

/// A whole league/season document. Fields never written are `None`;
/// `team_statistics` is empty until a team refresh has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueDocument {
    pub league_id: i64,
    pub season: i32,
    pub league_info: Option<LeagueInfo>,
    pub standings: Option<Vec<LeagueStanding>>,
    pub today_matches: Option<Vec<Fixture>>,
    pub week_matches: Option<Vec<Fixture>>,
    pub team_statistics: HashMap<i64, TeamStatistics>,
}

/// A fixture located in one of the stored snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedFixture {
    pub scope: LeagueSeason,
    pub fixture: Fixture,
}

type LeagueRow = (
    i64,
    i32,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

impl Store {
    pub async fn new(database_path: &str) -> Result<Self> {
        let in_memory = database_path == ":memory:";
        if !in_memory {
            if let Some(dir) = Path::new(database_path).parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AppError::Config(format!(
                        "cannot create database directory {}: {e}",
                        dir.display()
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every in-memory connection is its own database.
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        // Execute each statement separately (sqlx doesn't support multiple statements in one call)
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    // --- League document writes ---

    /// Overwrite league metadata and the standings table for the scope.
    pub async fn upsert_standings(
        &self,
        league_info: &LeagueInfo,
        standings: &[LeagueStanding],
        scope: LeagueSeason,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO leagues (league_id, season, league_info, standings)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(league_id, season) DO UPDATE SET
                league_info = excluded.league_info,
                standings = excluded.standings",
        )
        .bind(scope.league_id)
        .bind(scope.season)
        .bind(serde_json::to_string(league_info)?)
        .bind(serde_json::to_string(standings)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace one fixture snapshot for the scope.
    pub async fn upsert_fixtures(
        &self,
        scope: LeagueSeason,
        fixture_scope: FixtureScope,
        fixtures: &[Fixture],
    ) -> Result<()> {
        let column = fixture_scope.column();
        let sql = format!(
            "INSERT INTO leagues (league_id, season, {column})
             VALUES (?, ?, ?)
             ON CONFLICT(league_id, season) DO UPDATE SET {column} = excluded.{column}"
        );
        sqlx::query(&sql)
            .bind(scope.league_id)
            .bind(scope.season)
            .bind(serde_json::to_string(fixtures)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert or replace one team's statistics within the scope. Other teams are untouched.
    pub async fn upsert_team_statistics(&self, stats: &TeamStatistics) -> Result<()> {
        sqlx::query(
            "INSERT INTO team_statistics (league_id, season, team_id, statistics)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(league_id, season, team_id) DO UPDATE SET
                statistics = excluded.statistics,
                updated_at = datetime('now')",
        )
        .bind(stats.league_id)
        .bind(stats.season)
        .bind(stats.team_id)
        .bind(serde_json::to_string(stats)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- League document reads ---

    pub async fn get_league(&self, scope: LeagueSeason) -> Result<LeagueDocument> {
        let row = sqlx::query_as::<_, LeagueRow>(
            "SELECT league_id, season, league_info, standings, today_matches, week_matches
             FROM leagues WHERE league_id = ? AND season = ?",
        )
        .bind(scope.league_id)
        .bind(scope.season)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| league_not_found(scope))?;

        let (league_id, season, info, standings, today, week) = row;
        let team_statistics = self.get_all_team_statistics(scope).await?;
        Ok(LeagueDocument {
            league_id,
            season,
            league_info: decode_opt(info)?,
            standings: decode_opt(standings)?,
            today_matches: decode_opt(today)?,
            week_matches: decode_opt(week)?,
            team_statistics,
        })
    }

    /// Raw JSON of the stored standings column, exactly as written.
    pub async fn get_standings_json(&self, scope: LeagueSeason) -> Result<String> {
        self.get_column(scope, "standings").await
    }

    pub async fn get_standings(&self, scope: LeagueSeason) -> Result<Vec<LeagueStanding>> {
        let json = self.get_column(scope, "standings").await?;
        Ok(serde_json::from_str(&json)?)
    }

    pub async fn get_fixtures(
        &self,
        scope: LeagueSeason,
        fixture_scope: FixtureScope,
    ) -> Result<Vec<Fixture>> {
        let json = self.get_column(scope, fixture_scope.column()).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Project a single field of the document. Missing row or never-written
    /// field is `NotFound`; an empty list is returned as-is.
    async fn get_column(&self, scope: LeagueSeason, column: &'static str) -> Result<String> {
        let sql = format!("SELECT {column} FROM leagues WHERE league_id = ? AND season = ?");
        let row: Option<(Option<String>,)> = sqlx::query_as(&sql)
            .bind(scope.league_id)
            .bind(scope.season)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Err(league_not_found(scope)),
            Some((None,)) => Err(AppError::NotFound(format!(
                "no {column} stored for league {} season {}",
                scope.league_id, scope.season
            ))),
            Some((Some(json),)) => Ok(json),
        }
    }

    /// Find a fixture by id across every stored snapshot (today first, then week).
    pub async fn find_fixture(&self, fixture_id: i64) -> Result<LocatedFixture> {
        let row: Option<(i64, i32, String)> = sqlx::query_as(
            "SELECT league_id, season, value FROM (
                SELECT l.league_id, l.season, j.value, 0 AS priority
                FROM leagues l, json_each(l.today_matches) j
                WHERE json_extract(j.value, '$.fixture_id') = ?1
                UNION ALL
                SELECT l.league_id, l.season, j.value, 1 AS priority
                FROM leagues l, json_each(l.week_matches) j
                WHERE json_extract(j.value, '$.fixture_id') = ?1
             )
             ORDER BY priority
             LIMIT 1",
        )
        .bind(fixture_id)
        .fetch_optional(&self.pool)
        .await?;

        let (league_id, season, json) =
            row.ok_or_else(|| AppError::NotFound(format!("fixture {fixture_id}")))?;

        Ok(LocatedFixture {
            scope: LeagueSeason { league_id, season },
            fixture: serde_json::from_str(&json)?,
        })
    }

    /// All stored league/season pairs for a season.
    pub async fn leagues_for_season(&self, season: i32) -> Result<Vec<LeagueSeason>> {
        let rows: Vec<(i64, i32)> = sqlx::query_as(
            "SELECT league_id, season FROM leagues WHERE season = ? ORDER BY league_id",
        )
        .bind(season)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(league_id, season)| LeagueSeason { league_id, season })
            .collect())
    }

    // --- Team statistics ---

    pub async fn get_team_statistics(
        &self,
        scope: LeagueSeason,
        team_id: i64,
    ) -> Result<TeamStatistics> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT statistics FROM team_statistics
             WHERE league_id = ? AND season = ? AND team_id = ?",
        )
        .bind(scope.league_id)
        .bind(scope.season)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        let (json,) = row.ok_or_else(|| {
            AppError::NotFound(format!(
                "statistics for team {team_id} in league {} season {}",
                scope.league_id, scope.season
            ))
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Every team's statistics in the scope, keyed by team id.
    pub async fn get_all_team_statistics(
        &self,
        scope: LeagueSeason,
    ) -> Result<HashMap<i64, TeamStatistics>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT team_id, statistics FROM team_statistics WHERE league_id = ? AND season = ?",
        )
        .bind(scope.league_id)
        .bind(scope.season)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(team_id, json)| -> Result<(i64, TeamStatistics)> {
                Ok((team_id, serde_json::from_str(&json)?))
            })
            .collect()
    }
}

fn league_not_found(scope: LeagueSeason) -> AppError {
    AppError::NotFound(format!(
        "no data for league {} season {}",
        scope.league_id, scope.season
    ))
}

fn decode_opt<T: DeserializeOwned>(json: Option<String>) -> Result<Option<T>> {
    json.map(|s| serde_json::from_str(&s)).transpose().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FixtureStatus, TeamRef};

    const SCOPE: LeagueSeason = LeagueSeason {
        league_id: 71,
        season: 2024,
    };

    fn league_info() -> LeagueInfo {
        LeagueInfo {
            id: 71,
            name: "Serie A".to_string(),
            country: Some("Brazil".to_string()),
            logo: None,
            flag: None,
            season: 2024,
        }
    }

    fn standing(rank: u32, team_id: i64) -> LeagueStanding {
        LeagueStanding {
            league_id: 71,
            season: 2024,
            rank,
            team_id,
            team_name: format!("Team {team_id}"),
            team_logo: None,
            points: 50 - rank as i32,
            goal_diff: 10 - rank as i32,
            recent_form: Some("WWDLW".to_string()),
        }
    }

    fn fixture(id: i64, home: i64, away: i64) -> Fixture {
        Fixture {
            fixture_id: id,
            date: "2024-06-01T16:00:00-03:00".to_string(),
            timestamp: Some(1_717_268_400),
            venue: Some("Allianz Parque".to_string()),
            venue_city: None,
            referee: None,
            home_team: TeamRef {
                id: home,
                name: format!("Team {home}"),
                logo: None,
            },
            away_team: TeamRef {
                id: away,
                name: format!("Team {away}"),
                logo: None,
            },
            status: FixtureStatus {
                long: "Not Started".to_string(),
                short: "NS".to_string(),
                elapsed: None,
            },
        }
    }

    fn stats(team_id: i64, yellow: u32) -> TeamStatistics {
        TeamStatistics {
            team_id,
            league_id: 71,
            season: 2024,
            matches_played: 10,
            goals_for: 12,
            goals_against: 9,
            avg_goals_home: 1.4,
            avg_goals_away: 1.0,
            win_pct_home: 60.0,
            win_pct_away: 40.0,
            clean_sheet_pct_home: 20.0,
            clean_sheet_pct_away: 20.0,
            yellow_cards_total: yellow,
            yellow_cards_avg: f64::from(yellow) / 10.0,
            red_cards_total: 0,
            red_cards_avg: 0.0,
            recent_form: None,
        }
    }

    #[tokio::test]
    async fn test_store_create_and_migrate() {
        let store = Store::new(":memory:").await.expect("should create store");
        let err = store.get_league(SCOPE).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_store_creates_missing_parent_directories() {
        let root = std::env::temp_dir().join(format!("football-insights-store-{}", std::process::id()));
        let path = root.join("nested").join("dir").join("football.db");
        let _ = std::fs::remove_dir_all(&root);

        let store = Store::new(path.to_str().unwrap()).await.expect("should create store");
        store.upsert_fixtures(SCOPE, FixtureScope::Today, &[]).await.unwrap();
        assert!(path.exists());

        drop(store);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_standings_upsert_is_idempotent() {
        let store = Store::new(":memory:").await.unwrap();
        let table = vec![standing(1, 121), standing(2, 127)];

        store.upsert_standings(&league_info(), &table, SCOPE).await.unwrap();
        let first = store.get_standings_json(SCOPE).await.unwrap();
        store.upsert_standings(&league_info(), &table, SCOPE).await.unwrap();
        let second = store.get_standings_json(SCOPE).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get_standings(SCOPE).await.unwrap(), table);
    }

    #[tokio::test]
    async fn test_partial_updates_leave_sibling_fields() {
        let store = Store::new(":memory:").await.unwrap();
        store
            .upsert_fixtures(SCOPE, FixtureScope::Today, &[fixture(1, 121, 127)])
            .await
            .unwrap();
        store
            .upsert_standings(&league_info(), &[standing(1, 121)], SCOPE)
            .await
            .unwrap();
        store
            .upsert_fixtures(SCOPE, FixtureScope::Week, &[fixture(2, 127, 121)])
            .await
            .unwrap();

        store.upsert_team_statistics(&stats(121, 20)).await.unwrap();

        let doc = store.get_league(SCOPE).await.unwrap();
        assert_eq!(doc.league_info, Some(league_info()));
        assert_eq!(doc.team_statistics.len(), 1);
        assert_eq!(doc.team_statistics[&121].yellow_cards_total, 20);
        assert_eq!(doc.standings.map(|s| s.len()), Some(1));
        assert_eq!(doc.today_matches.unwrap()[0].fixture_id, 1);
        assert_eq!(doc.week_matches.unwrap()[0].fixture_id, 2);
    }

    #[tokio::test]
    async fn test_snapshot_is_replaced_not_merged() {
        let store = Store::new(":memory:").await.unwrap();
        store
            .upsert_fixtures(SCOPE, FixtureScope::Today, &[fixture(1, 1, 2), fixture(2, 3, 4)])
            .await
            .unwrap();
        store
            .upsert_fixtures(SCOPE, FixtureScope::Today, &[fixture(3, 5, 6)])
            .await
            .unwrap();

        let today = store.get_fixtures(SCOPE, FixtureScope::Today).await.unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].fixture_id, 3);
    }

    #[tokio::test]
    async fn test_missing_field_vs_empty_field() {
        let store = Store::new(":memory:").await.unwrap();
        store
            .upsert_standings(&league_info(), &[standing(1, 121)], SCOPE)
            .await
            .unwrap();

        // Document exists but today's snapshot was never written.
        let err = store.get_fixtures(SCOPE, FixtureScope::Today).await.unwrap_err();
        assert!(err.is_not_found());

        store.upsert_fixtures(SCOPE, FixtureScope::Today, &[]).await.unwrap();
        let today = store.get_fixtures(SCOPE, FixtureScope::Today).await.unwrap();
        assert!(today.is_empty());
    }

    #[tokio::test]
    async fn test_find_fixture_across_snapshots() {
        let store = Store::new(":memory:").await.unwrap();
        let other = LeagueSeason {
            league_id: 39,
            season: 2024,
        };
        store
            .upsert_fixtures(SCOPE, FixtureScope::Today, &[fixture(10, 1, 2)])
            .await
            .unwrap();
        store
            .upsert_fixtures(other, FixtureScope::Week, &[fixture(20, 3, 4), fixture(21, 5, 6)])
            .await
            .unwrap();

        let found = store.find_fixture(21).await.unwrap();
        assert_eq!(found.scope, other);
        assert_eq!(found.fixture.home_team.id, 5);

        let found = store.find_fixture(10).await.unwrap();
        assert_eq!(found.scope, SCOPE);

        let err = store.find_fixture(999).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_team_statistics_are_keyed_per_team() {
        let store = Store::new(":memory:").await.unwrap();
        store.upsert_team_statistics(&stats(121, 20)).await.unwrap();
        store.upsert_team_statistics(&stats(127, 30)).await.unwrap();
        store.upsert_team_statistics(&stats(121, 25)).await.unwrap();

        let all = store.get_all_team_statistics(SCOPE).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&121].yellow_cards_total, 25);
        assert_eq!(all[&127].yellow_cards_total, 30);

        let err = store.get_team_statistics(SCOPE, 999).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_leagues_for_season() {
        let store = Store::new(":memory:").await.unwrap();
        for league_id in [71, 39] {
            let scope = LeagueSeason {
                league_id,
                season: 2024,
            };
            store.upsert_fixtures(scope, FixtureScope::Today, &[]).await.unwrap();
        }
        let old = LeagueSeason {
            league_id: 71,
            season: 2023,
        };
        store.upsert_fixtures(old, FixtureScope::Today, &[]).await.unwrap();

        let leagues = store.leagues_for_season(2024).await.unwrap();
        assert_eq!(leagues.iter().map(|l| l.league_id).collect::<Vec<_>>(), vec![39, 71]);
    }
}

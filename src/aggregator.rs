//! Refresh pipelines and derived views.
//!
//! Refreshes are sequences of independent upserts scoped by (league, season).
//! Fixture refreshes are an explicit two-step pipeline: store the snapshot,
//! then refresh statistics for every team that appears in it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::db::store::Store;
use crate::error::{AppError, Result};
use crate::filter::{self, CardThreshold};
use crate::models::{DateRange, EnrichedMatch, Fixture, FixtureScope, LeagueSeason, TeamStatistics};
use crate::normalize;
use crate::provider::{FixtureQuery, StatsProvider};

/// How fixture refreshes query the provider.
#[derive(Debug, Clone)]
pub struct FixtureSettings {
    /// Provider status filter, e.g. "NS". `None` fetches every status.
    pub status: Option<String>,
    /// Timezone used for kick-off times and for deciding what "today" is.
    pub timezone: Tz,
}

/// A batch job run over the configured leagues.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshJob {
    Standings,
    Fixtures {
        scope: FixtureScope,
        range: Option<DateRange>,
    },
}

impl std::fmt::Display for RefreshJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standings => write!(f, "standings"),
            Self::Fixtures { scope, .. } => write!(f, "{scope}_fixtures"),
        }
    }
}

/// Outcome of refreshing statistics for a set of teams.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub updated: Vec<i64>,
    pub failed: Vec<(i64, String)>,
}

/// Outcome of a batch over several leagues. Failures do not stop the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub job: String,
    pub succeeded: Vec<LeagueSeason>,
    pub failed: Vec<(LeagueSeason, String)>,
}

pub struct Aggregator {
    provider: Arc<dyn StatsProvider>,
    store: Arc<Store>,
    settings: FixtureSettings,
}

impl Aggregator {
    pub fn new(provider: Arc<dyn StatsProvider>, store: Arc<Store>, settings: FixtureSettings) -> Self {
        Self {
            provider,
            store,
            settings,
        }
    }

    /// Today's date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.settings.timezone).date_naive()
    }

    // --- Refresh operations ---

    /// Fetch, normalize and overwrite the standings for one league/season.
    /// Returns the number of table rows stored.
    #[instrument(skip(self), fields(league_id = scope.league_id, season = scope.season))]
    pub async fn refresh_standings(&self, scope: LeagueSeason) -> Result<usize> {
        let raw = self.provider.standings(scope.league_id, scope.season).await?;
        let normalized = normalize::normalize_standings(&raw)?;

        self.store
            .upsert_standings(&normalized.league_info, &normalized.standings, scope)
            .await?;

        info!(
            league = %normalized.league_info.name,
            teams = normalized.standings.len(),
            "Standings refreshed"
        );
        Ok(normalized.standings.len())
    }

    /// Fetch not-yet-started fixtures for the scope, replace the stored snapshot
    /// and return the distinct team ids that appear in it.
    #[instrument(skip(self), fields(league_id = scope.league_id, season = scope.season))]
    pub async fn refresh_fixtures(
        &self,
        scope: LeagueSeason,
        fixture_scope: FixtureScope,
        range: Option<DateRange>,
    ) -> Result<Vec<i64>> {
        let dates = self.resolve_range(fixture_scope, range)?;
        let query = FixtureQuery {
            league_id: scope.league_id,
            season: scope.season,
            dates,
            status: self.settings.status.clone(),
            timezone: Some(self.settings.timezone.name().to_string()),
        };

        let raw = self.provider.fixtures(&query).await?;
        let fixtures: Vec<Fixture> = raw.iter().map(normalize::normalize_fixture).collect();

        self.store
            .upsert_fixtures(scope, fixture_scope, &fixtures)
            .await?;

        let team_ids = distinct_team_ids(&fixtures);
        info!(
            %fixture_scope,
            from = %dates.from,
            to = %dates.to,
            fixtures = fixtures.len(),
            teams = team_ids.len(),
            "Fixtures refreshed"
        );
        Ok(team_ids)
    }

    /// Fetch, normalize and store one team's statistics.
    pub async fn refresh_team_statistics(
        &self,
        scope: LeagueSeason,
        team_id: i64,
    ) -> Result<TeamStatistics> {
        let raw = self
            .provider
            .team_statistics(scope.league_id, scope.season, team_id)
            .await?;
        let stats = normalize::normalize_team_statistics(scope.league_id, scope.season, team_id, &raw);
        self.store.upsert_team_statistics(&stats).await?;

        debug!(
            league_id = scope.league_id,
            season = scope.season,
            team_id,
            matches_played = stats.matches_played,
            "Team statistics refreshed"
        );
        Ok(stats)
    }

    /// Refresh each team in turn. A failing team is logged and skipped.
    pub async fn refresh_statistics_for_teams(
        &self,
        scope: LeagueSeason,
        team_ids: &[i64],
    ) -> StatisticsReport {
        let mut report = StatisticsReport::default();

        for &team_id in team_ids {
            match self.refresh_team_statistics(scope, team_id).await {
                Ok(_) => report.updated.push(team_id),
                Err(e) => {
                    warn!(
                        league_id = scope.league_id,
                        season = scope.season,
                        team_id,
                        error = %e,
                        "Team statistics refresh failed"
                    );
                    report.failed.push((team_id, e.to_string()));
                }
            }
        }

        info!(
            league_id = scope.league_id,
            season = scope.season,
            updated = report.updated.len(),
            failed = report.failed.len(),
            "Team statistics batch finished"
        );
        report
    }

    /// `refresh_fixtures` followed by `refresh_statistics_for_teams` for the teams it returned.
    pub async fn refresh_league_fixtures(
        &self,
        scope: LeagueSeason,
        fixture_scope: FixtureScope,
        range: Option<DateRange>,
    ) -> Result<StatisticsReport> {
        let team_ids = self.refresh_fixtures(scope, fixture_scope, range).await?;
        Ok(self.refresh_statistics_for_teams(scope, &team_ids).await)
    }

    pub async fn refresh_league(&self, scope: LeagueSeason, job: &RefreshJob) -> Result<()> {
        match job {
            RefreshJob::Standings => self.refresh_standings(scope).await.map(|_| ()),
            RefreshJob::Fixtures { scope: fixture_scope, range } => self
                .refresh_league_fixtures(scope, *fixture_scope, *range)
                .await
                .map(|_| ()),
        }
    }

    /// Run `job` for every league in order. Per-league failures are logged
    /// and collected; the batch always completes.
    pub async fn refresh_all_leagues(&self, leagues: &[LeagueSeason], job: &RefreshJob) -> BatchReport {
        let mut report = BatchReport {
            job: job.to_string(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for &scope in leagues {
            match self.refresh_league(scope, job).await {
                Ok(()) => report.succeeded.push(scope),
                Err(e) => {
                    warn!(
                        job = %job,
                        league_id = scope.league_id,
                        season = scope.season,
                        error = %e,
                        "League refresh failed"
                    );
                    report.failed.push((scope, e.to_string()));
                }
            }
        }

        info!(
            job = %job,
            provider = self.provider.name(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Batch refresh finished"
        );
        report
    }

    // --- Views ---

    /// Stored fixture joined with both teams' current statistics.
    /// Participants without stored statistics come back as `None`.
    pub async fn get_enriched_match(&self, fixture_id: i64) -> Result<EnrichedMatch> {
        let located = self.store.find_fixture(fixture_id).await?;
        let home_statistics = self
            .optional_statistics(located.scope, located.fixture.home_team.id)
            .await?;
        let away_statistics = self
            .optional_statistics(located.scope, located.fixture.away_team.id)
            .await?;

        Ok(EnrichedMatch {
            league_id: located.scope.league_id,
            season: located.scope.season,
            fixture: located.fixture,
            home_statistics,
            away_statistics,
        })
    }

    /// Top-quartile vs bottom-quartile fixtures of the stored snapshot.
    pub async fn get_mismatches(
        &self,
        scope: LeagueSeason,
        fixture_scope: FixtureScope,
    ) -> Result<Vec<Fixture>> {
        let standings = self.store.get_standings(scope).await?;
        let fixtures = self.store.get_fixtures(scope, fixture_scope).await?;
        Ok(filter::select_mismatches(&fixtures, &standings))
    }

    /// Card-heavy fixtures across every stored league of `season`.
    pub async fn get_card_filtered(
        &self,
        season: i32,
        threshold: CardThreshold,
        fixture_scope: FixtureScope,
    ) -> Result<Vec<Fixture>> {
        for (name, value) in [
            ("min_per_team", threshold.min_per_team),
            ("min_summed", threshold.min_summed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        let mut selected = Vec::new();
        for scope in self.store.leagues_for_season(season).await? {
            let fixtures = match self.store.get_fixtures(scope, fixture_scope).await {
                Ok(fixtures) => fixtures,
                Err(e) if e.is_not_found() => {
                    debug!(league_id = scope.league_id, %fixture_scope, "No snapshot stored, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let statistics = self.store.get_all_team_statistics(scope).await?;
            selected.extend(filter::select_by_card_average(&fixtures, &statistics, threshold));
        }

        Ok(selected)
    }

    async fn optional_statistics(
        &self,
        scope: LeagueSeason,
        team_id: i64,
    ) -> Result<Option<TeamStatistics>> {
        match self.store.get_team_statistics(scope, team_id).await {
            Ok(stats) => Ok(Some(stats)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Today scope defaults to today; week scope to today plus six days.
    fn resolve_range(&self, fixture_scope: FixtureScope, range: Option<DateRange>) -> Result<DateRange> {
        if let Some(range) = range {
            return DateRange::new(range.from, range.to);
        }

        let today = self.today();
        Ok(match fixture_scope {
            FixtureScope::Today => DateRange::single(today),
            FixtureScope::Week => DateRange {
                from: today,
                to: today.checked_add_days(Days::new(6)).unwrap_or(today),
            },
        })
    }
}

/// Home and away team ids in first-appearance order, without repeats.
pub fn distinct_team_ids(fixtures: &[Fixture]) -> Vec<i64> {
    let mut seen = HashSet::new();
    fixtures
        .iter()
        .flat_map(|f| [f.home_team.id, f.away_team.id])
        .filter(|id| seen.insert(*id))
        .collect()
}

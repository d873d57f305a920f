pub mod api_football;
pub mod rate_limit;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::DateRange;
use crate::provider::types::{RawFixtureEntry, RawStandingsEntry, RawTeamStatistics};

/// Fixture search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureQuery {
    pub league_id: i64,
    pub season: i32,
    pub dates: DateRange,
    /// Provider status code filter, e.g. "NS" for not started.
    pub status: Option<String>,
    /// IANA timezone the provider should render kick-off times in.
    pub timezone: Option<String>,
}

/// Source of raw football statistics.
/// One request per call; failures come back as `AppError::Fetch`.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn standings(&self, league_id: i64, season: i32) -> Result<Vec<RawStandingsEntry>>;

    async fn fixtures(&self, query: &FixtureQuery) -> Result<Vec<RawFixtureEntry>>;

    async fn team_statistics(
        &self,
        league_id: i64,
        season: i32,
        team_id: i64,
    ) -> Result<RawTeamStatistics>;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A (league, season) pair. Primary partition key for everything we store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeagueSeason {
    pub league_id: i64,
    pub season: i32,
}

impl std::fmt::Display for LeagueSeason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.league_id, self.season)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    pub logo: Option<String>,
    pub flag: Option<String>,
    pub season: i32,
}

/// One row of a league table. Ranks within one snapshot are dense 1..=N.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueStanding {
    pub league_id: i64,
    pub season: i32,
    pub rank: u32,
    pub team_id: i64,
    pub team_name: String,
    pub team_logo: Option<String>,
    pub points: i32,
    pub goal_diff: i32,
    pub recent_form: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureStatus {
    pub long: String,
    pub short: String,
    pub elapsed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub fixture_id: i64,
    /// ISO-8601 kick-off as sent by the provider (already in the requested timezone).
    pub date: String,
    pub timestamp: Option<i64>,
    pub venue: Option<String>,
    pub venue_city: Option<String>,
    pub referee: Option<String>,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub status: FixtureStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub team_id: i64,
    pub league_id: i64,
    pub season: i32,
    pub matches_played: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub avg_goals_home: f64,
    pub avg_goals_away: f64,
    pub win_pct_home: f64,
    pub win_pct_away: f64,
    pub clean_sheet_pct_home: f64,
    pub clean_sheet_pct_away: f64,
    pub yellow_cards_total: u32,
    pub yellow_cards_avg: f64,
    pub red_cards_total: u32,
    pub red_cards_avg: f64,
    pub recent_form: Option<String>,
}

impl TeamStatistics {
    /// Yellow plus red cards per match.
    pub fn card_average(&self) -> f64 {
        self.yellow_cards_avg + self.red_cards_avg
    }
}

/// Fixture joined with both participants' current statistics. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMatch {
    pub league_id: i64,
    pub season: i32,
    pub fixture: Fixture,
    pub home_statistics: Option<TeamStatistics>,
    pub away_statistics: Option<TeamStatistics>,
}

/// Which stored fixture snapshot an operation targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureScope {
    #[default]
    Today,
    Week,
}

impl FixtureScope {
    /// Column holding this scope's snapshot.
    pub fn column(self) -> &'static str {
        match self {
            Self::Today => "today_matches",
            Self::Week => "week_matches",
        }
    }
}

impl std::fmt::Display for FixtureScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Week => write!(f, "week"),
        }
    }
}

impl std::str::FromStr for FixtureScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" | "hoje" => Ok(Self::Today),
            "week" | "semana" => Ok(Self::Week),
            other => Err(format!("unknown fixture scope '{other}'")),
        }
    }
}

/// Inclusive date range in the provider's `YYYY-MM-DD` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Range from `from` to `to`, both inclusive. A reversed range is `InvalidInput`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(AppError::InvalidInput(format!(
                "start date {from} is after end date {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    pub fn is_single_day(&self) -> bool {
        self.from == self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_rejects_reversed_dates() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 8, day).unwrap();
        let range = DateRange::new(d(10), d(16)).unwrap();
        assert!(!range.is_single_day());
        assert!(DateRange::new(d(10), d(10)).unwrap().is_single_day());

        let err = DateRange::new(d(17), d(10)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("today".parse::<FixtureScope>().unwrap(), FixtureScope::Today);
        assert_eq!("WEEK".parse::<FixtureScope>().unwrap(), FixtureScope::Week);
        assert_eq!("semana".parse::<FixtureScope>().unwrap(), FixtureScope::Week);
        assert!("month".parse::<FixtureScope>().is_err());
    }

    #[test]
    fn test_scope_serializes_lowercase() {
        let json = serde_json::to_string(&FixtureScope::Week).unwrap();
        assert_eq!(json, "\"week\"");
    }
}

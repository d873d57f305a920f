//! API-Football v3 response types.
//!
//! Only the fields we read are modelled. The provider is loose with nulls,
//! so almost everything is `Option` or `#[serde(default)]`.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// `[]` when fine, an object of messages when the provider rejects the call.
    #[serde(default)]
    pub errors: serde_json::Value,
    pub response: T,
}

impl<T> ApiEnvelope<T> {
    /// Provider-reported errors, if any. These arrive with a 200 status.
    pub fn error_message(&self) -> Option<String> {
        match &self.errors {
            serde_json::Value::Array(items) if !items.is_empty() => Some(self.errors.to_string()),
            serde_json::Value::Object(map) if !map.is_empty() => Some(self.errors.to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

// --- /standings ---

#[derive(Debug, Clone, Deserialize)]
pub struct RawStandingsEntry {
    pub league: RawStandingsLeague,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStandingsLeague {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    pub logo: Option<String>,
    pub flag: Option<String>,
    pub season: i32,
    /// One inner list per group; ordinary leagues have exactly one.
    #[serde(default)]
    pub standings: Vec<Vec<RawStandingRow>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStandingRow {
    pub rank: u32,
    pub team: RawTeam,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub goals_diff: i32,
    pub form: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTeam {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
}

// --- /fixtures ---

#[derive(Debug, Clone, Deserialize)]
pub struct RawFixtureEntry {
    pub fixture: RawFixture,
    pub teams: RawFixtureTeams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFixture {
    pub id: i64,
    pub referee: Option<String>,
    pub date: String,
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub venue: RawVenue,
    pub status: RawFixtureStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVenue {
    pub name: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFixtureStatus {
    pub long: String,
    pub short: String,
    pub elapsed: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFixtureTeams {
    pub home: RawTeam,
    pub away: RawTeam,
}

// --- /teams/statistics ---

#[derive(Debug, Clone, Deserialize)]
pub struct RawTeamStatistics {
    pub form: Option<String>,
    pub fixtures: RawFixtureCounts,
    pub goals: RawGoals,
    #[serde(default)]
    pub clean_sheet: RawHomeAway,
    #[serde(default)]
    pub cards: RawCards,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFixtureCounts {
    pub played: RawHomeAway,
    pub wins: RawHomeAway,
}

/// Home/away/total counters. Null counters count as zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHomeAway {
    #[serde(default)]
    pub home: Option<u32>,
    #[serde(default)]
    pub away: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGoals {
    #[serde(rename = "for")]
    pub scored: RawGoalSide,
    pub against: RawGoalSide,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGoalSide {
    pub total: RawHomeAway,
    #[serde(default)]
    pub average: RawGoalAverage,
}

/// Averages arrive as decimal strings ("1.5").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGoalAverage {
    pub home: Option<String>,
    pub away: Option<String>,
    pub total: Option<String>,
}

/// Card counts bucketed by minute range ("0-15", "16-30", ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCards {
    #[serde(default)]
    pub yellow: BTreeMap<String, RawCardBucket>,
    #[serde(default)]
    pub red: BTreeMap<String, RawCardBucket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCardBucket {
    pub total: Option<u32>,
    pub percentage: Option<String>,
}

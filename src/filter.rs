//! Fixture filters over pairs of team attributes.
//!
//! Both the quartile mismatch filter and the card-average filter are the same
//! shape: look up one attribute per participant, keep the fixture when a
//! predicate over the (home, away) pair holds. Fixtures with a participant
//! whose attribute is unknown are skipped. Input order is preserved.

use std::collections::HashMap;

use crate::models::{Fixture, LeagueStanding, TeamStatistics};

/// Keep fixtures whose (home, away) attribute pair satisfies `predicate`.
pub fn select_paired<A, L, P>(fixtures: &[Fixture], lookup: L, predicate: P) -> Vec<Fixture>
where
    L: Fn(i64) -> Option<A>,
    P: Fn(&A, &A) -> bool,
{
    fixtures
        .iter()
        .filter(|fixture| {
            let (Some(home), Some(away)) = (lookup(fixture.home_team.id), lookup(fixture.away_team.id))
            else {
                return false;
            };
            predicate(&home, &away)
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Top,
    Middle,
    Bottom,
}

/// Rank lookup with quartile boundaries derived from the table size.
#[derive(Debug, Clone)]
pub struct TierTable {
    threshold: u32,
    ranks: HashMap<i64, u32>,
}

impl TierTable {
    pub fn new(standings: &[LeagueStanding]) -> Self {
        let threshold = (standings.len() / 4) as u32;
        let ranks = standings.iter().map(|s| (s.team_id, s.rank)).collect();
        Self { threshold, ranks }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Top is rank <= threshold, bottom is rank > 3 * threshold.
    /// With fewer than four teams the threshold is 0 and nobody is top.
    pub fn tier_of_rank(&self, rank: u32) -> Tier {
        if rank <= self.threshold {
            Tier::Top
        } else if rank > 3 * self.threshold {
            Tier::Bottom
        } else {
            Tier::Middle
        }
    }

    pub fn tier(&self, team_id: i64) -> Option<Tier> {
        self.ranks.get(&team_id).map(|&rank| self.tier_of_rank(rank))
    }
}

/// Fixtures pairing a top-quartile team with a bottom-quartile team, either way round.
pub fn select_mismatches(fixtures: &[Fixture], standings: &[LeagueStanding]) -> Vec<Fixture> {
    let table = TierTable::new(standings);
    select_paired(
        fixtures,
        |team_id| table.tier(team_id),
        |home, away| {
            matches!(
                (home, away),
                (Tier::Top, Tier::Bottom) | (Tier::Bottom, Tier::Top)
            )
        },
    )
}

/// Card-average thresholds for the "confrontos filtrados" view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardThreshold {
    /// Each team's cards-per-match must reach this.
    pub min_per_team: f64,
    /// The two teams' cards-per-match summed must reach this.
    pub min_summed: f64,
}

/// Fixtures where both sides are card-heavy enough.
pub fn select_by_card_average(
    fixtures: &[Fixture],
    statistics: &HashMap<i64, TeamStatistics>,
    threshold: CardThreshold,
) -> Vec<Fixture> {
    select_paired(
        fixtures,
        |team_id| statistics.get(&team_id).map(TeamStatistics::card_average),
        |home, away| {
            *home >= threshold.min_per_team
                && *away >= threshold.min_per_team
                && home + away >= threshold.min_summed
        },
    )
}

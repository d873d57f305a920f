//! Daily refresh trigger.
//!
//! Sleeps until the configured local time, then refreshes standings and
//! today's fixtures for every configured league. Runs until aborted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::aggregator::{Aggregator, RefreshJob};
use crate::config::{load_leagues, SchedulerConfig};
use crate::models::FixtureScope;
use crate::monitoring::health::HealthState;

/// A fixed wall-clock time in a timezone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySchedule {
    at: NaiveTime,
    tz: Tz,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32, tz: Tz) -> Option<Self> {
        Some(Self {
            at: NaiveTime::from_hms_opt(hour, minute, 0)?,
            tz,
        })
    }

    pub fn from_config(config: &SchedulerConfig) -> Result<Self> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid scheduler timezone: {e}"))?;
        Self::new(config.hour, config.minute, tz).with_context(|| {
            format!("invalid scheduler time {:02}:{:02}", config.hour, config.minute)
        })
    }

    /// First occurrence strictly after `now`. Local times skipped by a DST
    /// jump fall through to the next day.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.tz).date_naive();

        for _ in 0..3 {
            if let Some(candidate) = self.tz.from_local_datetime(&date.and_time(self.at)).earliest() {
                let candidate = candidate.with_timezone(&Utc);
                if candidate > now {
                    return candidate;
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        now + chrono::Duration::days(1)
    }
}

/// The jobs a scheduled run performs, in order.
pub fn daily_jobs() -> [RefreshJob; 2] {
    [
        RefreshJob::Standings,
        RefreshJob::Fixtures {
            scope: FixtureScope::Today,
            range: None,
        },
    ]
}

/// Spawn the daily refresh loop. Returns a handle that can be aborted.
pub fn spawn_daily_refresh(
    aggregator: Arc<Aggregator>,
    schedule: DailySchedule,
    leagues_path: PathBuf,
    health: HealthState,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = schedule.next_run_after(now);
            info!(next_run = %next, "Next scheduled refresh");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            run_scheduled_refresh(&aggregator, &leagues_path, &health).await;
        }
    })
}

async fn run_scheduled_refresh(aggregator: &Aggregator, leagues_path: &Path, health: &HealthState) {
    let leagues = match load_leagues(leagues_path) {
        Ok(leagues) => leagues,
        Err(e) => {
            error!(error = %e, path = %leagues_path.display(), "Scheduled refresh skipped: leagues file unreadable");
            return;
        }
    };

    for job in daily_jobs() {
        let report = aggregator.refresh_all_leagues(&leagues, &job).await;
        health.record_batch(&report).await;
    }
}

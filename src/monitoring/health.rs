//! Service health view.
//!
//! Records the outcome of the most recent batch refresh per job so `/health`
//! can show whether the daily run happened and how many leagues failed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::aggregator::BatchReport;

/// Shared health state updated by refresh runs.
#[derive(Clone)]
pub struct HealthState {
    inner: Arc<RwLock<HealthData>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthData {
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub last_runs: BTreeMap<String, JobRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRun {
    pub finished_at: DateTime<Utc>,
    pub leagues_succeeded: usize,
    pub leagues_failed: usize,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HealthData {
                status: "ok".to_string(),
                started_at: Utc::now(),
                uptime_seconds: 0,
                last_runs: BTreeMap::new(),
            })),
        }
    }

    pub async fn record_batch(&self, report: &BatchReport) {
        let mut data = self.inner.write().await;
        data.last_runs.insert(
            report.job.clone(),
            JobRun {
                finished_at: Utc::now(),
                leagues_succeeded: report.succeeded.len(),
                leagues_failed: report.failed.len(),
            },
        );
        // A batch where every league failed usually means a bad key or an exhausted plan.
        data.status = if data
            .last_runs
            .values()
            .any(|run| run.leagues_failed > 0 && run.leagues_succeeded == 0)
        {
            "degraded".to_string()
        } else {
            "ok".to_string()
        };
    }

    pub async fn snapshot(&self) -> HealthData {
        let mut data = self.inner.read().await.clone();
        data.uptime_seconds = (Utc::now() - data.started_at).num_seconds();
        data
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
